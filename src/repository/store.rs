//! `CorpusRepository`: a rusqlite-backed `Store` (spec §4.2) over a single
//! `comics(id, url, words)` table, following the teacher's
//! `repository/document/mod.rs` shape - a struct holding the db path,
//! schema created idempotently in the constructor, blocking rusqlite
//! calls pushed onto a blocking thread at the async boundary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::models::{Comic, DbStats};

use super::{connect, with_retry, RepositoryError, Result, Store};

pub struct CorpusRepository {
    db_path: PathBuf,
}

impl CorpusRepository {
    pub fn new(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    fn connect(&self) -> Result<rusqlite::Connection> {
        connect(&self.db_path)
    }

    /// Idempotent DDL batch, following
    /// `repository/document/schema.rs::init_schema` - no migration
    /// framework, just `CREATE TABLE IF NOT EXISTS` run every startup.
    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS comics (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL,
                words TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comics_id ON comics(id);
        "#,
        )?;
        Ok(())
    }
}

fn row_to_comic(id: i64, url: String, words_json: String) -> Result<Comic> {
    let keywords: BTreeSet<String> = serde_json::from_str(&words_json)?;
    Ok(Comic { id, url, keywords })
}

#[async_trait]
impl Store for CorpusRepository {
    async fn add(&self, comic: Comic) -> Result<()> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;

            let exists: Option<i64> = conn
                .query_row("SELECT id FROM comics WHERE id = ?1", params![comic.id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_some() {
                return Err(RepositoryError::NotFound(format!(
                    "comic {} already exists",
                    comic.id
                )));
            }

            let words_json = serde_json::to_string(&comic.keywords)?;
            with_retry(|| {
                conn.execute(
                    "INSERT INTO comics (id, url, words) VALUES (?1, ?2, ?3)",
                    params![comic.id, comic.url, words_json],
                )
                .map_err(RepositoryError::Database)
            })?;
            Ok(())
        })
        .await?
    }

    async fn get(&self, id: i64) -> Result<Comic> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            let row = conn
                .query_row(
                    "SELECT id, url, words FROM comics WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            match row {
                Some((id, url, words_json)) => row_to_comic(id, url, words_json),
                None => Err(RepositoryError::NotFound(format!("comic {id} not found"))),
            }
        })
        .await?
    }

    async fn search(&self, keyword: &str) -> Result<Vec<i64>> {
        let db_path = self.db_path.clone();
        let pattern = format!("%\"{keyword}\"%");
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            let mut stmt =
                conn.prepare("SELECT id FROM comics WHERE words LIKE ?1 ORDER BY id ASC")?;
            let ids: Vec<i64> = stmt
                .query_map(params![pattern], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            Ok(ids)
        })
        .await?
    }

    async fn last_id(&self) -> Result<i64> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            let last: Option<i64> =
                conn.query_row("SELECT MAX(id) FROM comics", [], |row| row.get(0))?;
            Ok(last.unwrap_or(0))
        })
        .await?
    }

    async fn ids(&self) -> Result<Vec<i64>> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            let mut stmt = conn.prepare("SELECT id FROM comics ORDER BY id ASC")?;
            let ids: Vec<i64> = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            Ok(ids)
        })
        .await?
    }

    async fn stats(&self) -> Result<DbStats> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            let comics_fetched: i64 =
                conn.query_row("SELECT COUNT(*) FROM comics", [], |row| row.get(0))?;

            let mut stmt = conn.prepare("SELECT words FROM comics")?;
            let mut words_total: u64 = 0;
            let mut unique = std::collections::HashSet::new();
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            for words_json in rows {
                let words: BTreeSet<String> = serde_json::from_str(&words_json?)?;
                words_total += words.len() as u64;
                unique.extend(words);
            }

            Ok(DbStats {
                words_total,
                words_unique: unique.len() as u64,
                comics_fetched: comics_fetched as u64,
            })
        })
        .await?
    }

    async fn drop_all(&self) -> Result<()> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            conn.execute("DELETE FROM comics", [])?;
            Ok(())
        })
        .await?
    }
}
