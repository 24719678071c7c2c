use clap::{Parser, Subcommand};
use facecap::configuration::{Config, ConfigOverrides};
use facecap::controller::Controller;
use facecap::error_handling::types::ControllerError;
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facecap")]
#[command(version)]
#[command(about = "Capture a still image from the camera and store it for a user")]
struct Args {
    #[command(flatten)]
    overrides: ConfigOverrides,

    /// Use a simulated camera that triggers on its first frame
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Preview the camera, press SPACE to capture and store the image (default)
    Capture {
        /// User identifier; prompted on stdin when omitted
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Store an existing image file for a user without using the camera
    Import {
        #[arg(long)]
        user_id: String,
        file: PathBuf,
    },
    /// Show the images stored for a user
    List {
        #[arg(long)]
        user_id: String,
    },
}

fn prompt_user_id() -> Result<String, ControllerError> {
    print!("Enter your user ID: ");
    io::stdout().flush().map_err(ControllerError::Input)?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(ControllerError::Input)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn run(args: Args) -> Result<(), ControllerError> {
    info!("Importing configuration");
    let config = Config::load(&args.overrides)?;
    let mut controller = Controller::from_config(&config, args.simulate)?;

    match args.command.unwrap_or(Command::Capture { user_id: None }) {
        Command::Capture { user_id } => {
            let user_id = match user_id {
                Some(id) => id,
                None => prompt_user_id()?,
            };
            let captured = controller.run_capture(&user_id)?;
            println!("Image successfully saved to database.");
            println!("Image file kept at {}", captured.path.display());
        }
        Command::Import { user_id, file } => {
            let size = controller.import_image(&user_id, &file)?;
            println!("Image successfully saved to database ({} bytes).", size);
        }
        Command::List { user_id } => {
            let records = controller.list_images(&user_id)?;
            println!("{} image(s) stored for '{}'", records.len(), user_id);
            for (i, record) in records.iter().enumerate() {
                println!("  #{}: {} bytes", i + 1, record.len());
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{}", e);
        println!("Error: {}", e);
        std::process::exit(1);
    }
}
