//! Repository layer: the `Store` trait (spec §4.2) and its rusqlite-backed
//! implementation.

mod store;

pub use store::CorpusRepository;

use std::path::Path;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::Connection;
use thiserror::Error;

use crate::models::{Comic, DbStats};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Convert a rusqlite `Result<T>` to `Result<Option<T>>`, treating
/// `QueryReturnedNoRows` as `None` rather than an error.
pub fn to_option<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Open a connection with the same pragma batch the teacher applies to
/// every SQLite connection it opens: WAL journaling, a busy timeout so
/// concurrent readers and the persister don't collide, and a handful of
/// performance pragmas.
pub fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 30000;
        PRAGMA cache_size = -64000;
        PRAGMA temp_store = MEMORY;
    "#,
    )?;

    Ok(conn)
}

/// Execute a blocking database operation with retry logic for lock errors.
/// Retries up to 5 times with exponential backoff (100/200/400/800/1600ms).
pub fn with_retry<T, F>(mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_retries = 5;
    let mut delay_ms = 100;

    for attempt in 0..max_retries {
        match operation() {
            Ok(result) => return Ok(result),
            Err(RepositoryError::Database(ref e)) => {
                let is_lock_error = e.to_string().contains("database is locked")
                    || e.to_string().contains("SQLITE_BUSY")
                    || e.to_string().contains("SQLITE_LOCKED");

                if is_lock_error && attempt < max_retries - 1 {
                    tracing::debug!(attempt, delay_ms, "database locked, retrying");
                    thread::sleep(Duration::from_millis(delay_ms));
                    delay_ms *= 2;
                    continue;
                }
                return Err(RepositoryError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(
                        e.sqlite_error_code()
                            .unwrap_or(rusqlite::ffi::ErrorCode::Unknown)
                            as i32,
                    ),
                    Some(e.to_string()),
                )));
            }
            Err(e) => return Err(e),
        }
    }

    operation()
}

/// Capability interface for comic persistence (spec §4.2). Implementations
/// only need to tolerate concurrent readers - the stemmer is invoked only
/// from the ingester's single-threaded persister stage (spec §4.3), so
/// the store itself never needs to be writer-thread-safe beyond what
/// SQLite's own locking provides.
#[async_trait]
pub trait Store: Send + Sync {
    async fn add(&self, comic: Comic) -> Result<()>;
    async fn get(&self, id: i64) -> Result<Comic>;
    async fn search(&self, keyword: &str) -> Result<Vec<i64>>;
    async fn last_id(&self) -> Result<i64>;
    async fn ids(&self) -> Result<Vec<i64>>;
    async fn stats(&self) -> Result<DbStats>;
    async fn drop_all(&self) -> Result<()>;
}
