//! The [`StateStore`] persistence trait and its serializable state layout.
//!
//! The trait is implemented by storage backends (e.g. `sift-store-sqlite`).
//! The tracker depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  history::HistoryEntry,
  identifier::Identifier,
  sender::SenderKey,
};

// ─── Persisted layout ────────────────────────────────────────────────────────

/// One sender's durable state: stamps plus both time-bounded sets. Key
/// ordering within the sets is irrelevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSender {
  pub key:        SenderKey,
  pub last_day:   String,
  pub last_month: String,
  pub day_set:    Vec<Identifier>,
  pub month_set:  Vec<Identifier>,
}

/// One lifetime-history entry in durable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedHistory {
  pub identifier: Identifier,
  pub entry:      HistoryEntry,
}

/// One row of the per-(sender, day) activity ledger — the unit served by the
/// read-only snapshot accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
  pub chat_id:         i64,
  pub sender_id:       i64,
  /// `YYYY-MM-DD` stamp in the configured offset.
  pub date:            String,
  pub new_count:       u64,
  pub duplicate_count: u64,
  pub day_total:       u64,
  pub month_total:     u64,
}

/// Everything needed to resume tracking exactly where a previous process
/// stopped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
  pub history:  Vec<PersistedHistory>,
  pub senders:  Vec<PersistedSender>,
  pub activity: Vec<SnapshotRow>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a tracker persistence backend.
///
/// Every write is an idempotent overwrite — replaying the same save is
/// harmless, which is what makes write-behind persistence safe to retry.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load the full persisted state at startup.
  fn load(
    &self,
  ) -> impl Future<Output = Result<PersistedState, Self::Error>> + Send + '_;

  /// Overwrite one sender's stamps and scope sets.
  fn save_sender<'a>(
    &'a self,
    sender: &'a PersistedSender,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Upsert lifetime entries touched by one message (new insertions and
  /// bumped counts alike).
  fn record_history<'a>(
    &'a self,
    entries: &'a [PersistedHistory],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Upsert one activity-ledger row.
  fn record_activity<'a>(
    &'a self,
    row: &'a SnapshotRow,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Ephemeral adapter ───────────────────────────────────────────────────────

/// A [`StateStore`] that keeps nothing: every load starts empty and every
/// save is dropped. For tests and explicitly ephemeral runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

impl StateStore for MemoryStore {
  type Error = std::convert::Infallible;

  async fn load(&self) -> Result<PersistedState, Self::Error> {
    Ok(PersistedState::default())
  }

  async fn save_sender(&self, _sender: &PersistedSender) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn record_history(
    &self,
    _entries: &[PersistedHistory],
  ) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn record_activity(&self, _row: &SnapshotRow) -> Result<(), Self::Error> {
    Ok(())
  }
}
