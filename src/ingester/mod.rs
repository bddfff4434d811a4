//! The ingester (spec §4.3): a process-wide singleton that drives one
//! ingestion pass at a time over the producer/fetchers/persister
//! pipeline in `pipeline`. Grounded on the Go `update/core/service.go`
//! singleton (`sync.Mutex` + `atomic.Bool`, try-lock, set in-progress,
//! defer clear) - this is the direct source for the control flow.

pub mod pipeline;
pub mod upstream;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::events::Notifier;
use crate::ingester::upstream::UpstreamSource;
use crate::models::{ServiceStats, UpdateStatus};
use crate::repository::Store;

pub struct Ingester {
    store: Arc<dyn Store>,
    upstream: Arc<dyn UpstreamSource>,
    notifier: Arc<dyn Notifier>,
    fetch_concurrency: usize,
    in_progress: Arc<AtomicBool>,
    run_guard: Mutex<()>,
}

impl Ingester {
    pub fn new(
        store: Arc<dyn Store>,
        upstream: Arc<dyn UpstreamSource>,
        notifier: Arc<dyn Notifier>,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            store,
            upstream,
            notifier,
            fetch_concurrency,
            in_progress: Arc::new(AtomicBool::new(false)),
            run_guard: Mutex::new(()),
        }
    }

    /// Run one ingestion pass. Only one call can be in flight at a time
    /// per process; a concurrent caller observes `AlreadyExists` rather
    /// than blocking (spec §4.3, §8's singleton property).
    pub async fn update(&self, cancel: CancellationToken) -> AppResult<()> {
        let guard = match self.run_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                return Err(AppError::AlreadyExists(
                    "an update is already running".to_string(),
                ))
            }
        };

        self.in_progress.store(true, Ordering::SeqCst);
        let result = pipeline::run(
            Arc::clone(&self.store),
            Arc::clone(&self.upstream),
            Arc::clone(&self.notifier),
            self.fetch_concurrency,
            cancel,
        )
        .await;
        self.in_progress.store(false, Ordering::SeqCst);
        drop(guard);

        result.map_err(|e| AppError::Internal(e.to_string()))
    }

    pub fn status(&self) -> UpdateStatus {
        if self.in_progress.load(Ordering::SeqCst) {
            UpdateStatus::Running
        } else {
            UpdateStatus::Idle
        }
    }

    pub async fn stats(&self) -> AppResult<ServiceStats> {
        let db_stats = self.store.stats().await?;
        let comics_total = self.upstream.latest_id().await.unwrap_or(0);
        Ok(ServiceStats::new(db_stats, comics_total.max(0) as u64))
    }

    /// Truncate the store and publish a notification so index rebuild
    /// subscribers catch up (spec §4.3).
    pub async fn drop_all(&self) -> AppResult<()> {
        self.store.drop_all().await?;
        self.notifier
            .publish(crate::events::TOPIC_CORPUS_UPDATED, "comics dropped".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BroadcastNotifier;
    use crate::models::{Comic, DbStats, XkcdInfo};
    use crate::repository::Result as RepoResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
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
                .ok_or_else(|| crate::repository::RepositoryError::NotFound(id.to_string()))
        }
        async fn search(&self, _keyword: &str) -> RepoResult<Vec<i64>> {
            Ok(vec![])
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

    struct FakeUpstream {
        latest: i64,
    }

    #[async_trait]
    impl UpstreamSource for FakeUpstream {
        async fn fetch(&self, id: i64) -> AppResult<XkcdInfo> {
            Ok(XkcdInfo {
                id,
                url: format!("https://x/{id}.png"),
                description: "a fun comic".to_string(),
            })
        }
        async fn latest_id(&self) -> AppResult<i64> {
            Ok(self.latest)
        }
    }

    fn test_ingester(latest: i64) -> Ingester {
        Ingester::new(
            Arc::new(FakeStore::default()),
            Arc::new(FakeUpstream { latest }),
            BroadcastNotifier::new(),
            2,
        )
    }

    #[tokio::test]
    async fn status_is_idle_before_and_after_update() {
        let ingester = test_ingester(3);
        assert_eq!(ingester.status(), UpdateStatus::Idle);
        ingester.update(CancellationToken::new()).await.unwrap();
        assert_eq!(ingester.status(), UpdateStatus::Idle);
    }

    #[tokio::test]
    async fn update_ingests_all_ids_up_to_latest() {
        let ingester = test_ingester(3);
        ingester.update(CancellationToken::new()).await.unwrap();
        let stats = ingester.stats().await.unwrap();
        assert_eq!(stats.comics_fetched, 3);
    }

    #[tokio::test]
    async fn concurrent_update_reports_already_exists() {
        let ingester = Arc::new(test_ingester(1));
        let _held = ingester.run_guard.lock().await;
        let err = ingester.update(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn drop_all_resets_store() {
        let ingester = test_ingester(2);
        ingester.update(CancellationToken::new()).await.unwrap();
        ingester.drop_all().await.unwrap();
        let stats = ingester.stats().await.unwrap();
        assert_eq!(stats.comics_fetched, 0);
    }
}
