//! The process-wide lifetime membership set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Reporting data carried alongside lifetime membership. Membership alone
/// decides NEW vs DUPLICATE; these fields only feed exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  /// Total times the identifier has been seen, first occurrence included.
  pub seen_count:    u64,
  /// The sender who first introduced the identifier.
  pub first_seen_by: i64,
}

/// The single lifetime scope, shared by every sender in every chat.
///
/// Never cleared by rollover; entries are only ever added or bumped. Grows
/// for the life of the persisted store.
#[derive(Debug, Clone, Default)]
pub struct GlobalHistory {
  entries: HashMap<Identifier, HistoryEntry>,
}

impl GlobalHistory {
  pub fn contains(&self, id: &Identifier) -> bool {
    self.entries.contains_key(id)
  }

  pub fn get(&self, id: &Identifier) -> Option<&HistoryEntry> {
    self.entries.get(id)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// First sighting: membership plus a count of one.
  pub fn record_new(&mut self, id: Identifier, sender_id: i64) {
    self.entries.insert(id, HistoryEntry {
      seen_count:    1,
      first_seen_by: sender_id,
    });
  }

  /// Repeat sighting: bump the count. No-op for an unknown key.
  pub fn record_duplicate(&mut self, id: &Identifier) {
    if let Some(entry) = self.entries.get_mut(id) {
      entry.seen_count += 1;
    }
  }

  /// Rebuild from persisted entries at startup.
  pub fn from_entries(
    entries: impl IntoIterator<Item = (Identifier, HistoryEntry)>,
  ) -> Self {
    Self { entries: entries.into_iter().collect() }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &HistoryEntry)> {
    self.entries.iter()
  }
}
