//! Handler for `POST /messages` — the inbound seam for chat-client
//! collaborators.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sift_core::{store::StateStore, tracker::TrackResult};
use tracing::debug;

use crate::AppState;

/// Plain message data as forwarded by a chat-client collaborator. No
/// platform-specific payloads cross this boundary.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
  pub chat_id:     i64,
  pub sender_id:   i64,
  /// Accepted for collaborator convenience and logging only; plays no part
  /// in tracking.
  pub sender_name: Option<String>,
  pub text:        String,
  /// Defaults to the current wall clock when absent.
  pub received_at: Option<DateTime<Utc>>,
}

/// `POST /messages` — classify one message and return the counts.
///
/// The caller renders any human-readable reply itself; a zero-match result
/// (all counts zero) is its cue to stay silent.
pub async fn ingest<S>(
  State(state): State<Arc<AppState<S>>>,
  Json(body): Json<IncomingMessage>,
) -> Json<TrackResult>
where
  S: StateStore,
{
  let now = body.received_at.unwrap_or_else(Utc::now);
  let mut tracker = state.tracker.lock().await;
  let result = tracker
    .process(body.chat_id, body.sender_id, &body.text, now)
    .await;
  debug!(
    chat_id = body.chat_id,
    sender_id = body.sender_id,
    sender_name = body.sender_name.as_deref(),
    new = result.new_count,
    duplicate = result.duplicate_count,
    "message tracked"
  );
  Json(result)
}
