//! Data model shared by the store, ingester, index, and search engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single XKCD comic as persisted by the store.
///
/// `id == 404` is a domain convention, not an HTTP status: XKCD has no
/// comic numbered 404, and the upstream source is never queried for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    pub id: i64,
    pub url: String,
    pub keywords: BTreeSet<String>,
}

impl Comic {
    /// The synthetic record persisted for the id=404 gap (see spec §4.3 / §9).
    pub fn not_found_placeholder() -> Self {
        Self {
            id: 404,
            url: String::new(),
            keywords: BTreeSet::new(),
        }
    }
}

/// Transient upstream fetch result, produced by a fetcher and consumed by
/// the persister. Never stored directly - `description` is stemmed into
/// `Comic::keywords` before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XkcdInfo {
    pub id: i64,
    pub url: String,
    pub description: String,
}

impl XkcdInfo {
    pub fn not_found_placeholder() -> Self {
        Self {
            id: 404,
            url: String::new(),
            description: "404 Not found".to_string(),
        }
    }
}

/// Store-level stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStats {
    pub words_total: u64,
    pub words_unique: u64,
    pub comics_fetched: u64,
}

/// `DbStats` plus the ingester's view of the upstream corpus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub words_total: u64,
    pub words_unique: u64,
    pub comics_fetched: u64,
    pub comics_total: u64,
}

impl ServiceStats {
    pub fn new(db: DbStats, comics_total: u64) -> Self {
        Self {
            words_total: db.words_total,
            words_unique: db.words_unique,
            comics_fetched: db.comics_fetched,
            comics_total,
        }
    }
}

/// Ingester run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Idle,
    Running,
    Unknown,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Unknown => "unknown",
        }
    }
}

/// A comic paired with its relevance score for a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredComic {
    pub id: i64,
    pub url: String,
    pub score: u32,
}

/// The subject embedded in a signed bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSubject {
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superuser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_status_as_str() {
        assert_eq!(UpdateStatus::Idle.as_str(), "idle");
        assert_eq!(UpdateStatus::Running.as_str(), "running");
        assert_eq!(UpdateStatus::Unknown.as_str(), "unknown");
    }

    #[test]
    fn service_stats_combines_db_and_total() {
        let db = DbStats {
            words_total: 10,
            words_unique: 5,
            comics_fetched: 2,
        };
        let stats = ServiceStats::new(db, 9);
        assert_eq!(stats.comics_total, 9);
        assert_eq!(stats.words_total, 10);
    }

    #[test]
    fn not_found_placeholder_has_empty_keywords_and_url() {
        let comic = Comic::not_found_placeholder();
        assert_eq!(comic.id, 404);
        assert!(comic.url.is_empty());
        assert!(comic.keywords.is_empty());
    }
}
