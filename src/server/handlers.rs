//! Route handlers (spec §6). Grounded directly on the Go `rest/api.go`
//! (one handler per route, the same JSON shapes) and on the teacher's
//! `server/handlers/api.rs` split - thin handlers delegating to
//! services, with the error type doing all status-code translation.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::UpdateStatus;

use super::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<String>> {
    let token = state.auth.login(&body.name, &body.password)?;
    Ok(Json(token))
}

#[derive(Serialize)]
pub struct PingResponse {
    pub replies: HashMap<String, String>,
}

/// Probes every downstream collaborator and reports `"ok"` or
/// `"unavailable"` per name. Never returns a non-200 (spec §6) - a
/// failing collaborator is reflected in the body, not the status code.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let mut replies = HashMap::new();

    let store_status = match state.store.last_id().await {
        Ok(_) => "ok",
        Err(_) => "unavailable",
    };
    replies.insert("store".to_string(), store_status.to_string());

    let stemmer_status = match crate::stemmer::normalize("ping") {
        Ok(_) => "ok",
        Err(_) => "unavailable",
    };
    replies.insert("stemmer".to_string(), stemmer_status.to_string());

    let ingester_status = match state.ingester.stats().await {
        Ok(_) => "ok",
        Err(_) => "unavailable",
    };
    replies.insert("ingester".to_string(), ingester_status.to_string());

    Json(PingResponse { replies })
}

pub async fn db_stats(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let stats = state.ingester.stats().await?;
    Ok(Json(serde_json::json!({
        "words_total": stats.words_total,
        "words_unique": stats.words_unique,
        "comics_fetched": stats.comics_fetched,
        "comics_total": stats.comics_total,
    })))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

pub async fn db_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = match state.ingester.status() {
        UpdateStatus::Running => "running",
        _ => "idle",
    };
    Json(StatusResponse { status })
}

/// `POST /api/db/update`: runs one ingestion pass to completion before
/// responding 200. A concurrent call observes `AlreadyExists`, which the
/// error mapping turns into 202 (spec §6/§7).
pub async fn db_update(State(state): State<AppState>) -> AppResult<Json<StatusResponse>> {
    state
        .ingester
        .update(tokio_util::sync::CancellationToken::new())
        .await?;
    Ok(Json(StatusResponse { status: "idle" }))
}

pub async fn db_drop(State(state): State<AppState>) -> AppResult<Json<StatusResponse>> {
    state.ingester.drop_all().await?;
    Ok(Json(StatusResponse { status: "idle" }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub phrase: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ComicsReply {
    pub comics: Vec<crate::models::ScoredComic>,
    pub total: usize,
}

fn validate_limit(limit: Option<i64>) -> AppResult<usize> {
    match limit {
        None => Ok(0),
        Some(n) if n < 0 => {
            Err(AppError::BadArguments("limit must be non-negative".to_string()))
        }
        Some(n) => Ok(n as usize),
    }
}

/// `GET /api/search`: DB-backed, wrapped in the concurrency gate.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ComicsReply>> {
    let limit = validate_limit(query.limit)?;
    let comics = state.search_engine.search(&query.phrase, limit).await?;
    let total = comics.len();
    Ok(Json(ComicsReply { comics, total }))
}

/// `GET /api/isearch`: index-backed, wrapped in the rate limiter.
pub async fn isearch(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ComicsReply>> {
    let limit = validate_limit(query.limit)?;
    let comics = state
        .search_engine
        .search_index(&query.phrase, limit)
        .await?;
    let total = comics.len();
    Ok(Json(ComicsReply { comics, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_limit_rejects_negative() {
        let err = validate_limit(Some(-1)).unwrap_err();
        assert!(matches!(err, AppError::BadArguments(_)));
    }

    #[test]
    fn validate_limit_absent_means_default() {
        assert_eq!(validate_limit(None).unwrap(), 0);
    }

    #[test]
    fn validate_limit_explicit_value_passes_through() {
        assert_eq!(validate_limit(Some(2)).unwrap(), 2);
    }
}
