//! The in-memory inverted index (spec §4.4): `keyword -> ordered id list`
//! behind a `RwLock`, rebuilt wholesale on a timer and on `corpus.updated`
//! events. Grounded on the Go `search/core/models.go` `Index` type
//! (`sync.RWMutex`, clone-on-read) and the teacher's `rate_limiter`
//! concurrency discipline (`Arc<RwLock<HashMap<...>>>`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::events::{Notifier, TOPIC_CORPUS_UPDATED};
use crate::repository::Store;

#[derive(Default)]
pub struct InvertedIndex {
    postings: RwLock<HashMap<String, Vec<i64>>>,
    /// Serializes `rebuild()` calls so a ticker-driven rebuild and an
    /// event-driven rebuild never interleave `clear`/`put` (spec §9, open
    /// question resolved in favor of serialization).
    rebuild_lock: Mutex<()>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole map under the writer lock.
    pub async fn clear(&self) {
        let mut postings = self.postings.write().await;
        postings.clear();
    }

    /// Append `id` to every keyword's posting list. Callers must call
    /// this at most once per id per rebuild cycle, or a posting list will
    /// contain duplicate ids.
    pub async fn put(&self, id: i64, keywords: &std::collections::BTreeSet<String>) {
        let mut postings = self.postings.write().await;
        for keyword in keywords {
            postings.entry(keyword.clone()).or_default().push(id);
        }
    }

    /// Returns a defensive copy of the posting list for `keyword`.
    pub async fn get(&self, keyword: &str) -> Vec<i64> {
        let postings = self.postings.read().await;
        postings.get(keyword).cloned().unwrap_or_default()
    }

    /// Clear, then repopulate from the store: `1..=last_id`, skipping ids
    /// the store doesn't have (the id=404 gap, or anything not yet
    /// persisted).
    pub async fn rebuild(&self, store: &dyn Store) -> crate::repository::Result<()> {
        let _guard = self.rebuild_lock.lock().await;

        self.clear().await;
        let last_id = store.last_id().await?;

        for id in 1..=last_id {
            match store.get(id).await {
                Ok(comic) => self.put(id, &comic.keywords).await,
                Err(crate::repository::RepositoryError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

/// Drives the two independent rebuild triggers described in spec §4.4: a
/// periodic ticker at `index_ttl`, and a subscription to the
/// `corpus.updated` topic (bounded at 5s per message, per spec §5).
pub async fn run_rebuild_loop(
    index: Arc<InvertedIndex>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    index_ttl: Duration,
) {
    if let Err(error) = index.rebuild(store.as_ref()).await {
        tracing::warn!(%error, "initial index build failed");
    }

    let mut ticker = tokio::time::interval(index_ttl);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut events = notifier.subscribe(TOPIC_CORPUS_UPDATED);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(error) = index.rebuild(store.as_ref()).await {
                    tracing::warn!(%error, "periodic index rebuild failed");
                }
            }
            event = events.recv() => {
                match event {
                    Ok(_payload) => {
                        let rebuild = tokio::time::timeout(
                            Duration::from_secs(5),
                            index.rebuild(store.as_ref()),
                        );
                        match rebuild.await {
                            Ok(Ok(())) => {}
                            Ok(Err(error)) => tracing::warn!(%error, "event-triggered index rebuild failed"),
                            Err(_) => tracing::warn!("event-triggered index rebuild timed out"),
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "index rebuild event subscriber lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn kw(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn put_then_get_returns_copy() {
        let index = InvertedIndex::new();
        index.put(1, &kw(&["tree", "christmas"])).await;
        index.put(2, &kw(&["tree"])).await;

        let mut postings = index.get("tree").await;
        postings.sort_unstable();
        assert_eq!(postings, vec![1, 2]);

        // Mutating the returned Vec must not affect the index.
        let mut copy = index.get("tree").await;
        copy.push(99);
        assert_eq!(index.get("tree").await.len(), 2);
    }

    #[tokio::test]
    async fn clear_empties_all_postings() {
        let index = InvertedIndex::new();
        index.put(1, &kw(&["tree"])).await;
        index.clear().await;
        assert!(index.get("tree").await.is_empty());
    }

    #[tokio::test]
    async fn get_missing_keyword_is_empty() {
        let index = InvertedIndex::new();
        assert!(index.get("nonexistent").await.is_empty());
    }
}
