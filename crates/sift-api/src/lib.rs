//! JSON ingest/export surface for the Sift tracker.
//!
//! Exposes an axum [`Router`] backed by any [`StateStore`]. The
//! chat-platform client is an external collaborator: it POSTs plain message
//! data and renders the returned counts itself; this crate never produces
//! presentation strings.

pub mod error;
pub mod messages;
pub mod snapshot;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use sift_core::{config::TrackerConfig, store::StateStore, tracker::Tracker};
use tokio::sync::Mutex;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with a
/// `SIFT_`-prefixed environment overlay.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: std::path::PathBuf,
  /// Normalization and rollover tuning.
  pub tracker:    TrackerConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: std::path::PathBuf::from("sift.db"),
      tracker:    TrackerConfig::default(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
///
/// One message is fully processed under the lock before the next begins.
/// That serialization is what keeps per-scope counting at-most-once: two
/// concurrent messages carrying the same identifier can never both observe
/// it as NEW.
pub struct AppState<S: StateStore> {
  pub tracker: Mutex<Tracker<S>>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
  S: StateStore + 'static,
{
  Router::new()
    .route("/messages", post(messages::ingest::<S>))
    .route("/snapshot", get(snapshot::rows::<S>))
    .route("/stats", get(snapshot::stats::<S>))
    .route("/history", get(snapshot::history::<S>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
