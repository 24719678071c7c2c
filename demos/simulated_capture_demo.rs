use env_logger::Env;
use facecap::configuration::Config;
use facecap::controller::Controller;
use facecap::image_capture::SimulatedBackend;
use facecap::storage::DatabaseStorage;
use log::info;
use sea_orm::{ConnectionTrait, Database};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    // Initialize logger (RUST_LOG can override; default to info)
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();

    // Choose an output directory for the image and the SQLite file
    let out_dir: PathBuf = env::var("FACECAP_DEMO_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            env::current_dir()
                .expect("cwd")
                .join("target")
                .join("facecap_demo")
        });
    fs::create_dir_all(&out_dir).expect("create output dir");

    let db_path = out_dir.join("facecap_demo.sqlite3");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    // The application never creates the table; the demo plays the DBA
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    rt.block_on(async {
        let db = Database::connect(database_url.as_str())
            .await
            .expect("open demo db");
        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS user_images (user_id TEXT NOT NULL, image BLOB NOT NULL)",
        )
        .await
        .expect("create user_images");
        db.close().await.expect("close demo db");
    });
    info!("Using SQLite database at {}", db_path.display());

    let config = Config {
        database_url: database_url.clone(),
        output_dir: out_dir.clone(),
        ..Config::default()
    };
    let store = DatabaseStorage::from_url(database_url, Duration::from_secs(5)).expect("store");
    let backend = SimulatedBackend::new(320, 240)
        .with_color([40, 90, 160])
        .with_key_script([None, None, Some(32)]);
    let probe = backend.probe();

    let mut controller = Controller::new(&config, Box::new(backend), Box::new(store));
    let captured = controller.run_capture("demo_user").expect("capture");
    info!(
        "Captured {} byte(s) into {} after {} frame(s)",
        captured.bytes.len(),
        captured.path.display(),
        probe.frames_read()
    );

    let records = controller.list_images("demo_user").expect("list");
    info!("{} record(s) stored for demo_user", records.len());
    for (i, record) in records.iter().enumerate() {
        info!("  #{}: {} bytes", i + 1, record.len());
    }
}
