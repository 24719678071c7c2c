use std::time::Duration;

use log::{debug, error, info, warn};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait,
};

use crate::configuration::Config;
use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::ImageStore;
use crate::storage::types::ImageRecord;

const INSERT_IMAGE_SQL: &str = "INSERT INTO user_images (user_id, image) VALUES (?, ?)";
const SELECT_IMAGES_SQL: &str = "SELECT user_id, image FROM user_images WHERE user_id = ?";

/// Relational backend writing to a pre-existing `user_images(user_id, image)`
/// table.
///
/// No connection is kept between calls: each operation connects, runs its
/// statement and disconnects, on success and on failure alike. The async
/// driver runs on a private current-thread runtime so callers stay
/// synchronous.
pub struct DatabaseStorage {
    rt: tokio::runtime::Runtime,
    url: String,
    connect_timeout: Duration,
}

impl DatabaseStorage {
    pub fn new(config: &Config) -> Result<Self, StorageError> {
        Self::from_url(
            config.database_url.clone(),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    pub fn from_url(
        url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            rt,
            url: url.into(),
            connect_timeout,
        })
    }

    async fn connect(&self) -> Result<DatabaseConnection, StorageError> {
        let mut opts = ConnectOptions::new(self.url.clone());
        opts.max_connections(1)
            .min_connections(0)
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(false);
        let db = Database::connect(opts).await.map_err(|e| {
            error!("Database connection failed: {}", e);
            StorageError::ConnectionFailed(e.to_string())
        })?;
        debug!("Connected to {:?} database", db.get_database_backend());
        Ok(db)
    }
}

async fn disconnect(db: DatabaseConnection) {
    if let Err(e) = db.close().await {
        warn!("Error while closing database connection: {}", e);
    }
}

async fn insert_image(
    db: &DatabaseConnection,
    user_id: &str,
    image: &[u8],
) -> Result<(), StorageError> {
    let write_failed = |e: sea_orm::DbErr| {
        error!("Failed to store image for '{}': {}", user_id, e);
        StorageError::WriteFailed(e.to_string())
    };

    // Dropping an uncommitted transaction rolls it back.
    let txn = db.begin().await.map_err(write_failed)?;
    txn.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        INSERT_IMAGE_SQL,
        [user_id.into(), image.to_vec().into()],
    ))
    .await
    .map_err(write_failed)?;
    txn.commit().await.map_err(write_failed)?;
    Ok(())
}

async fn select_images(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<ImageRecord>, StorageError> {
    let read_failed = |e: sea_orm::DbErr| StorageError::ReadFailed(e.to_string());

    let rows = db
        .query_all(Statement::from_sql_and_values(
            db.get_database_backend(),
            SELECT_IMAGES_SQL,
            [user_id.into()],
        ))
        .await
        .map_err(read_failed)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(ImageRecord {
            user_id: row.try_get::<String>("", "user_id").map_err(read_failed)?,
            image: row.try_get::<Vec<u8>>("", "image").map_err(read_failed)?,
        });
    }
    Ok(out)
}

impl ImageStore for DatabaseStorage {
    fn save_image(&self, user_id: &str, image: &[u8]) -> Result<(), StorageError> {
        if image.is_empty() {
            return Err(StorageError::InvalidInput(
                "refusing to store an empty image".into(),
            ));
        }
        self.rt.block_on(async {
            let db = self.connect().await?;
            let result = insert_image(&db, user_id, image).await;
            disconnect(db).await;
            if result.is_ok() {
                info!("Stored {} byte(s) for user '{}'", image.len(), user_id);
            }
            result
        })
    }

    fn get_images(&self, user_id: &str) -> Result<Vec<ImageRecord>, StorageError> {
        self.rt.block_on(async {
            let db = self.connect().await?;
            let result = select_images(&db, user_id).await;
            disconnect(db).await;
            result
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use sea_orm::{ConnectionTrait, Database};

    /// URL of a SQLite file that is created if missing.
    pub(crate) fn sqlite_url(path: &Path) -> String {
        format!("sqlite://{}?mode=rwc", path.display())
    }

    /// Creates the SQLite file at `path` with an empty `user_images` table.
    pub(crate) fn create_user_images_db(path: &Path) -> String {
        let url = sqlite_url(path);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let db = Database::connect(url.as_str()).await.unwrap();
            db.execute_unprepared(
                "CREATE TABLE user_images (user_id TEXT NOT NULL, image BLOB NOT NULL)",
            )
            .await
            .unwrap();
            db.close().await.unwrap();
        });
        url
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{create_user_images_db, sqlite_url};
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, DatabaseStorage) {
        let dir = TempDir::new().unwrap();
        let url = create_user_images_db(&dir.path().join("test.sqlite3"));
        let storage = DatabaseStorage::from_url(url, Duration::from_secs(5)).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_save_and_get_image() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (_dir, storage) = temp_db();
        let payload: Vec<u8> = (0..=255).collect();

        storage.save_image("alice", &payload).unwrap();

        let records = storage.get_images("alice").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "alice");
        assert_eq!(records[0].image, payload);
        assert!(storage.get_images("bob").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_user_rows_are_allowed() {
        let (_dir, storage) = temp_db();

        storage.save_image("alice", b"first").unwrap();
        storage.save_image("alice", b"second").unwrap();

        let images: Vec<Vec<u8>> = storage
            .get_images("alice")
            .unwrap()
            .into_iter()
            .map(|r| r.image)
            .collect();
        assert_eq!(images.len(), 2);
        assert!(images.contains(&b"first".to_vec()));
        assert!(images.contains(&b"second".to_vec()));
    }

    #[test]
    fn test_empty_payload_rejected() {
        let (_dir, storage) = temp_db();
        let err = storage.save_image("alice", &[]).unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
        assert!(storage.get_images("alice").unwrap().is_empty());
    }

    #[test]
    fn test_connection_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let url = format!(
            "sqlite://{}",
            dir.path().join("missing").join("db.sqlite3").display()
        );
        let storage = DatabaseStorage::from_url(url, Duration::from_secs(1)).unwrap();

        let err = storage.save_image("alice", b"bytes").unwrap_err();
        assert!(matches!(err, StorageError::ConnectionFailed(_)));
    }

    #[test]
    fn test_missing_table_is_a_write_failure() {
        let dir = TempDir::new().unwrap();
        let url = sqlite_url(&dir.path().join("empty.sqlite3"));
        let storage = DatabaseStorage::from_url(url, Duration::from_secs(1)).unwrap();

        let err = storage.save_image("alice", b"bytes").unwrap_err();
        assert!(matches!(err, StorageError::WriteFailed(_)));
    }
}
