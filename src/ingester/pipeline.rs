//! The three-stage ingestion pipeline (spec §4.3): a single ID generator,
//! N parallel fetchers, and a single persister, wired by bounded
//! `mpsc` channels. Grounded on the teacher's `scrapers/mod.rs`
//! `ScrapeStream` (mpsc receiver + worker pattern) and the Go
//! `generateIDs`/`getComics` channel pipeline.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::events::{Notifier, TOPIC_CORPUS_UPDATED};
use crate::ingester::upstream::UpstreamSource;
use crate::models::{Comic, XkcdInfo};
use crate::repository::{RepositoryError, Store};
use crate::stemmer;

/// Channel capacities are kept small and bounded - an unbounded channel
/// would let a slow persister buffer unboundedly many in-flight fetches
/// (spec §4.3's backpressure note).
const CHANNEL_CAPACITY: usize = 32;

/// Runs one full ingestion pass: generate missing ids, fetch each from
/// upstream with `concurrency` parallel workers, stem and persist each
/// result. Returns `Err` if any per-item failure occurred during the run
/// (fail-soft: the pipeline still drains to completion before reporting).
pub async fn run(
    store: Arc<dyn Store>,
    upstream: Arc<dyn UpstreamSource>,
    notifier: Arc<dyn Notifier>,
    concurrency: usize,
    cancel: CancellationToken,
) -> Result<(), RepositoryError> {
    let (id_tx, id_rx) = mpsc::channel::<i64>(CHANNEL_CAPACITY);
    let (info_tx, mut info_rx) = mpsc::channel::<XkcdInfo>(CHANNEL_CAPACITY);

    let errors_found = Arc::new(AtomicBool::new(false));

    let generator = tokio::spawn(generate_ids(
        Arc::clone(&store),
        Arc::clone(&upstream),
        id_tx,
        cancel.clone(),
    ));

    let id_rx = Arc::new(tokio::sync::Mutex::new(id_rx));
    let mut fetchers = tokio::task::JoinSet::new();
    for _ in 0..concurrency.max(1) {
        let id_rx = Arc::clone(&id_rx);
        let upstream = Arc::clone(&upstream);
        let info_tx = info_tx.clone();
        let cancel = cancel.clone();
        fetchers.spawn(fetch_worker(id_rx, upstream, info_tx, cancel));
    }
    drop(info_tx);

    let persister_errors = Arc::clone(&errors_found);
    let persister = tokio::spawn(async move {
        while let Some(info) = info_rx.recv().await {
            if let Err(error) = persist_one(store.as_ref(), info).await {
                tracing::error!(%error, "failed to persist comic");
                persister_errors.store(true, Ordering::SeqCst);
            }
        }
    });

    let _ = generator.await;
    while fetchers.join_next().await.is_some() {}
    let _ = persister.await;

    if errors_found.load(Ordering::SeqCst) {
        return Err(RepositoryError::NotFound(
            "one or more comics failed to ingest".to_string(),
        ));
    }

    notifier.publish(TOPIC_CORPUS_UPDATED, "comics database updated".to_string());
    Ok(())
}

/// Single producer: reads persisted ids, computes the upstream last id,
/// and emits every id in `[1, last_id]` not already persisted.
async fn generate_ids(
    store: Arc<dyn Store>,
    upstream: Arc<dyn UpstreamSource>,
    tx: mpsc::Sender<i64>,
    cancel: CancellationToken,
) {
    let persisted: HashSet<i64> = match store.ids().await {
        Ok(ids) => ids.into_iter().collect(),
        Err(error) => {
            tracing::error!(%error, "failed to read persisted ids");
            return;
        }
    };

    let last_id = match upstream.latest_id().await {
        Ok(id) => id,
        Err(error) => {
            tracing::error!(%error, "failed to fetch latest comic id");
            return;
        }
    };

    for id in 1..=last_id {
        if cancel.is_cancelled() {
            return;
        }
        if persisted.contains(&id) {
            continue;
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            send = tx.send(id) => {
                if send.is_err() {
                    return;
                }
            }
        }
    }
}

/// One of N parallel workers pulling ids off the shared receiver and
/// fetching each from upstream. Id 404 bypasses the upstream call
/// entirely (spec §4.3/§9); a 404 HTTP response for any other id is
/// silently skipped, not fatal.
async fn fetch_worker(
    id_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<i64>>>,
    upstream: Arc<dyn UpstreamSource>,
    tx: mpsc::Sender<XkcdInfo>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let id = {
            let mut rx = id_rx.lock().await;
            rx.recv().await
        };
        let Some(id) = id else {
            return;
        };

        if id == 404 {
            if tx.send(XkcdInfo::not_found_placeholder()).await.is_err() {
                return;
            }
            continue;
        }

        match upstream.fetch(id).await {
            Ok(info) => {
                if tx.send(info).await.is_err() {
                    return;
                }
            }
            Err(crate::error::AppError::NotFound(_)) => {
                tracing::debug!(id, "upstream reports no comic at this id, skipping");
            }
            Err(error) => {
                // Fetch-stage failures (network errors, 5xx, decode errors) are
                // transient and never sticky - the id simply stays unpersisted
                // and gets retried on the next update (spec §4.3/§7). Only
                // persister-stage failures mark the run as failed.
                tracing::warn!(id, %error, "failed to fetch comic, will retry next update");
            }
        }
    }
}

/// Single consumer: stems each result and persists it. The stemmer is
/// only ever called from here, so it never needs to be thread-safe
/// against itself (spec §4.3).
async fn persist_one(store: &dyn Store, info: XkcdInfo) -> Result<(), RepositoryError> {
    let keywords = if info.id == 404 {
        BTreeSet::new()
    } else {
        stemmer::normalize(&info.description)
            .map_err(|e| RepositoryError::Invalid(e.to_string()))?
            .into_iter()
            .collect()
    };

    store
        .add(Comic {
            id: info.id,
            url: info.url,
            keywords,
        })
        .await
}
