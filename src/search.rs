//! The search engine (spec §4.5): `search` (DB-backed) and `search_index`
//! (index-backed) share a single scoring/sort/limit/hydrate algorithm.
//! Grounded directly on the Go `search/core/service.go` `fetch` helper -
//! a structural 1:1 port of the control flow, reimplemented idiomatically
//! (`HashMap<i64, u32>` scores, `sort_unstable_by_key` descending).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::index::InvertedIndex;
use crate::models::ScoredComic;
use crate::repository::{RepositoryError, Store};
use crate::stemmer;

/// The default applied when a caller's `limit` is zero (spec §4.5 notes
/// this is an RPC-boundary convention, not an engine-level default).
pub const DEFAULT_LIMIT: usize = 10;

pub struct SearchEngine {
    store: Arc<dyn Store>,
    index: Arc<InvertedIndex>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn Store>, index: Arc<InvertedIndex>) -> Self {
        Self { store, index }
    }

    /// DB-backed search: posting lists come from `Store::search`.
    pub async fn search(&self, phrase: &str, limit: usize) -> AppResult<Vec<ScoredComic>> {
        self.fetch(phrase, limit, false).await
    }

    /// Index-backed search: posting lists come from the in-memory
    /// `InvertedIndex`.
    pub async fn search_index(&self, phrase: &str, limit: usize) -> AppResult<Vec<ScoredComic>> {
        self.fetch(phrase, limit, true).await
    }

    async fn fetch(&self, phrase: &str, limit: usize, use_index: bool) -> AppResult<Vec<ScoredComic>> {
        let keywords = stemmer::normalize(phrase)?;

        let mut scores: HashMap<i64, u32> = HashMap::new();
        for keyword in &keywords {
            let ids = if use_index {
                self.index.get(keyword).await
            } else {
                self.store.search(keyword).await?
            };
            for id in ids {
                *scores.entry(id).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(i64, u32)> = scores.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1));

        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        ranked.truncate(limit);

        let mut hydrated = Vec::with_capacity(ranked.len());
        for (id, score) in ranked {
            match self.store.get(id).await {
                Ok(comic) => hydrated.push(ScoredComic {
                    id: comic.id,
                    url: comic.url,
                    score,
                }),
                Err(RepositoryError::NotFound(_)) => continue,
                Err(e) => return Err(AppError::from(e)),
            }
        }

        Ok(hydrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Result as RepoResult;
    use crate::models::{Comic, DbStats};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeStore {
        comics: StdMutex<HashMap<i64, Comic>>,
    }

    #[async_trait]
    impl Store for FakeStore {
        async fn add(&self, comic: Comic) -> RepoResult<()> {
            self.comics.lock().unwrap().insert(comic.id, comic);
            Ok(())
        }

        async fn get(&self, id: i64) -> RepoResult<Comic> {
            self.comics
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| RepositoryError::NotFound(format!("comic {id}")))
        }

        async fn search(&self, keyword: &str) -> RepoResult<Vec<i64>> {
            let comics = self.comics.lock().unwrap();
            let mut ids: Vec<i64> = comics
                .values()
                .filter(|c| c.keywords.contains(keyword))
                .map(|c| c.id)
                .collect();
            ids.sort_unstable();
            Ok(ids)
        }

        async fn last_id(&self) -> RepoResult<i64> {
            Ok(self.comics.lock().unwrap().keys().copied().max().unwrap_or(0))
        }

        async fn ids(&self) -> RepoResult<Vec<i64>> {
            Ok(self.comics.lock().unwrap().keys().copied().collect())
        }

        async fn stats(&self) -> RepoResult<DbStats> {
            Ok(DbStats::default())
        }

        async fn drop_all(&self) -> RepoResult<()> {
            self.comics.lock().unwrap().clear();
            Ok(())
        }
    }

    fn kw(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded_engine() -> SearchEngine {
        let store: Arc<dyn Store> = Arc::new(FakeStore::default());
        store
            .add(Comic {
                id: 1,
                url: "https://imgs.xkcd.com/comics/tree.png".to_string(),
                keywords: kw(&["binari", "christma", "tree"]),
            })
            .await
            .unwrap();
        store
            .add(Comic {
                id: 2,
                url: "https://imgs.xkcd.com/comics/ant.png".to_string(),
                keywords: kw(&["ant"]),
            })
            .await
            .unwrap();
        let index = Arc::new(InvertedIndex::new());
        index.rebuild(store.as_ref()).await.unwrap();
        SearchEngine::new(store, index)
    }

    #[tokio::test]
    async fn db_search_ranks_by_keyword_overlap() {
        let engine = seeded_engine().await;
        let results = engine.search("binary christmas tree", 10).await.unwrap();
        assert_eq!(results[0].id, 1);
        assert_eq!(results[0].url, "https://imgs.xkcd.com/comics/tree.png");
    }

    #[tokio::test]
    async fn limit_truncates_results() {
        let engine = seeded_engine().await;
        let results = engine.search("tree ant", 1).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn zero_limit_defaults_to_ten() {
        let engine = seeded_engine().await;
        let results = engine.search("tree ant", 0).await.unwrap();
        assert!(results.len() <= DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn index_backed_search_matches_db_backed() {
        let engine = seeded_engine().await;
        let db_results = engine.search("tree", 10).await.unwrap();
        let index_results = engine.search_index("tree", 10).await.unwrap();
        assert_eq!(db_results, index_results);
    }

    #[tokio::test]
    async fn no_keywords_yields_empty_results() {
        let engine = seeded_engine().await;
        let results = engine.search("the a an", 10).await.unwrap();
        assert!(results.is_empty());
    }
}
