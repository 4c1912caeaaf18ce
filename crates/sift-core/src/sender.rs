//! Per-sender tracking state.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeSet;

/// Structured composite lookup key for a sender within a chat. Using a tuple
/// key instead of a concatenated string rules out format collisions between
/// ids.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct SenderKey {
  pub chat_id:   i64,
  pub sender_id: i64,
}

/// The rolling-window state for one (chat, sender) pair.
///
/// Created on the first message from the pair and kept for the life of the
/// process; rollover clears the scopes but never deletes the record.
///
/// Invariant: the day scope is always a subset of the month scope — every
/// identifier added today was also added to this month.
#[derive(Debug, Clone)]
pub struct SenderRecord {
  pub key:         SenderKey,
  /// `YYYY-MM-DD` stamp of the last processed message, in the configured
  /// offset.
  pub last_day:    String,
  /// `YYYY-MM` stamp of the last processed message.
  pub last_month:  String,
  pub day_scope:   ScopeSet,
  pub month_scope: ScopeSet,
}

impl SenderRecord {
  /// A fresh record stamped with the current day and month.
  pub fn new(key: SenderKey, day: String, month: String) -> Self {
    Self {
      key,
      last_day: day,
      last_month: month,
      day_scope: ScopeSet::new(),
      month_scope: ScopeSet::new(),
    }
  }
}
