//! Read-only export endpoints: the activity snapshot, aggregate stats, and
//! lifetime-history lookups. None of these can mutate tracker state.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use sift_core::{
  history::HistoryEntry,
  identifier::IdentifierKind,
  store::{SnapshotRow, StateStore},
  tracker::TrackerStats,
};

use crate::{AppState, error::ApiError};

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SnapshotParams {
  /// Restrict to one `YYYY-MM-DD` day stamp.
  pub date:      Option<String>,
  /// Restrict to one sender id (across chats).
  pub sender_id: Option<i64>,
}

/// `GET /snapshot[?date=YYYY-MM-DD][&sender_id=...]`
pub async fn rows<S>(
  State(state): State<Arc<AppState<S>>>,
  Query(params): Query<SnapshotParams>,
) -> Json<Vec<SnapshotRow>>
where
  S: StateStore,
{
  let tracker = state.tracker.lock().await;
  Json(tracker.snapshot(params.date.as_deref(), params.sender_id))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn stats<S>(
  State(state): State<Arc<AppState<S>>>,
) -> Json<TrackerStats>
where
  S: StateStore,
{
  let tracker = state.tracker.lock().await;
  Json(tracker.stats())
}

// ─── History lookup ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  /// `phone` or `handle`.
  pub kind: String,
  /// The normalized key (digits-only phone, or lowercased `@handle`).
  pub key:  String,
}

/// `GET /history?kind=phone|handle&key=...`
pub async fn history<S>(
  State(state): State<Arc<AppState<S>>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryEntry>, ApiError>
where
  S: StateStore,
{
  let kind = match params.kind.as_str() {
    "phone" => IdentifierKind::Phone,
    "handle" => IdentifierKind::Handle,
    other => {
      return Err(ApiError::BadRequest(format!(
        "unknown identifier kind: {other:?}"
      )));
    }
  };

  let tracker = state.tracker.lock().await;
  tracker
    .history_entry(kind, &params.key)
    .map(Json)
    .ok_or_else(|| {
      ApiError::NotFound(format!("no history for {}", params.key))
    })
}
