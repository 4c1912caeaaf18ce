//! The tracker — orchestrates extraction, normalization, rollover, scope
//! membership, and persistence for one incoming message at a time.
//!
//! The caller is responsible for serializing calls to [`Tracker::process`]
//! (one message fully processed before the next begins); under that regime
//! no identifier can be counted NEW twice in any scope.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
  Result,
  config::TrackerConfig,
  extract,
  history::{GlobalHistory, HistoryEntry},
  identifier::{Identifier, IdentifierKind},
  normalize::normalize,
  rollover::{self, day_stamp, month_stamp},
  sender::{SenderKey, SenderRecord},
  store::{
    PersistedHistory, PersistedSender, PersistedState, SnapshotRow,
    StateStore,
  },
};

// ─── Results ─────────────────────────────────────────────────────────────────

/// The classification outcome for one message. Structured data only —
/// rendering a human-readable reply is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackResult {
  pub new_count:       u64,
  pub duplicate_count: u64,
  /// Normalized keys classified DUPLICATE, in classification order.
  pub duplicate_keys:  Vec<String>,
  /// Size of the sender's day scope after this message.
  pub day_total:       u64,
  /// Size of the sender's month scope after this message.
  pub month_total:     u64,
}

/// Aggregate figures for the whole tracker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackerStats {
  pub senders:        usize,
  pub lifetime_total: usize,
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Owns all tracking state: the per-sender map, the lifetime history, and
/// the activity ledger. Constructed at process start, loaded and saved
/// through a [`StateStore`].
pub struct Tracker<S> {
  config:   TrackerConfig,
  offset:   FixedOffset,
  store:    S,
  history:  GlobalHistory,
  senders:  HashMap<SenderKey, SenderRecord>,
  /// Per-(sender, day) rows served by [`Tracker::snapshot`].
  activity: HashMap<(SenderKey, String), SnapshotRow>,
}

impl<S: StateStore> Tracker<S> {
  /// Construct with empty state. Fails only on an invalid configured
  /// offset.
  pub fn new(config: TrackerConfig, store: S) -> Result<Self> {
    let offset = config.offset()?;
    Ok(Self {
      config,
      offset,
      store,
      history: GlobalHistory::default(),
      senders: HashMap::new(),
      activity: HashMap::new(),
    })
  }

  /// Construct and restore persisted state.
  ///
  /// A failed or unreadable load fails closed: the tracker starts empty and
  /// the failure is logged as a startup warning, never propagated.
  pub async fn load(config: TrackerConfig, store: S) -> Result<Self> {
    let mut tracker = Self::new(config, store)?;
    match tracker.store.load().await {
      Ok(state) => tracker.restore(state),
      Err(e) => {
        warn!(error = %e, "failed to load persisted state; starting empty");
      }
    }
    Ok(tracker)
  }

  fn restore(&mut self, state: PersistedState) {
    self.history = GlobalHistory::from_entries(
      state.history.into_iter().map(|h| (h.identifier, h.entry)),
    );
    self.senders = state
      .senders
      .into_iter()
      .map(|p| {
        (p.key, SenderRecord {
          key:         p.key,
          last_day:    p.last_day,
          last_month:  p.last_month,
          day_scope:   p.day_set.into_iter().collect(),
          month_scope: p.month_set.into_iter().collect(),
        })
      })
      .collect();
    self.activity = state
      .activity
      .into_iter()
      .map(|row| {
        let key = SenderKey { chat_id: row.chat_id, sender_id: row.sender_id };
        ((key, row.date.clone()), row)
      })
      .collect();
  }

  // ── Processing ────────────────────────────────────────────────────────────

  /// Classify every identifier in one message and update all scopes.
  ///
  /// An identifier is DUPLICATE when it is already in the lifetime history
  /// or in the sender's month scope; otherwise it is NEW and joins the
  /// sender's day scope, month scope, and the lifetime history in one step.
  /// Phones are classified before handles, each list in extraction order,
  /// so the second occurrence of a value within one message is DUPLICATE
  /// against the first.
  ///
  /// A message with zero matches is a deliberate short-circuit: no rollover
  /// bookkeeping, no state change, no writes.
  pub async fn process(
    &mut self,
    chat_id: i64,
    sender_id: i64,
    text: &str,
    now: DateTime<Utc>,
  ) -> TrackResult {
    let extraction = extract::extract(text);
    if extraction.is_empty() {
      return TrackResult::default();
    }

    let key = SenderKey { chat_id, sender_id };
    let day = day_stamp(now, self.offset);
    let month = month_stamp(now, self.offset);
    let record = self
      .senders
      .entry(key)
      .or_insert_with(|| SenderRecord::new(key, day, month));
    rollover::reconcile(record, now, self.offset);

    let mut result = TrackResult::default();
    let mut touched: Vec<Identifier> = Vec::new();

    let candidates = extraction
      .phones
      .iter()
      .map(|raw| (raw, IdentifierKind::Phone))
      .chain(
        extraction
          .handles
          .iter()
          .map(|raw| (raw, IdentifierKind::Handle)),
      );

    for (raw, kind) in candidates {
      let Some(id) = normalize(raw, kind, &self.config) else {
        // NormalizationRejected: dropped silently, counted nowhere.
        continue;
      };

      if self.history.contains(&id) || record.month_scope.contains(&id) {
        result.duplicate_count += 1;
        result.duplicate_keys.push(id.key.clone());
        self.history.record_duplicate(&id);
      } else {
        record.day_scope.insert(id.clone());
        record.month_scope.insert(id.clone());
        self.history.record_new(id.clone(), sender_id);
        result.new_count += 1;
      }
      touched.push(id);
    }

    result.day_total = record.day_scope.len() as u64;
    result.month_total = record.month_scope.len() as u64;
    let date = record.last_day.clone();

    let row = self
      .activity
      .entry((key, date.clone()))
      .or_insert_with(|| SnapshotRow {
        chat_id,
        sender_id,
        date,
        new_count: 0,
        duplicate_count: 0,
        day_total: 0,
        month_total: 0,
      });
    row.new_count += result.new_count;
    row.duplicate_count += result.duplicate_count;
    row.day_total = result.day_total;
    row.month_total = result.month_total;
    let row = row.clone();

    self.persist(key, &touched, &row).await;

    result
  }

  /// Write-behind persistence for one processed message.
  ///
  /// In-memory state is authoritative: the caller's reply already reflects
  /// the mutation, so a failed write is logged for the operator and never
  /// rolls anything back. A crash here loses at most this one message's
  /// writes.
  async fn persist(
    &self,
    key: SenderKey,
    touched: &[Identifier],
    row: &SnapshotRow,
  ) {
    if !touched.is_empty() {
      let entries: Vec<PersistedHistory> = touched
        .iter()
        .filter_map(|id| {
          self.history.get(id).map(|entry| PersistedHistory {
            identifier: id.clone(),
            entry:      *entry,
          })
        })
        .collect();
      if let Err(e) = self.store.record_history(&entries).await {
        error!(error = %e, "failed to persist lifetime history");
      }
    }

    if let Some(record) = self.senders.get(&key) {
      let persisted = PersistedSender {
        key:        record.key,
        last_day:   record.last_day.clone(),
        last_month: record.last_month.clone(),
        day_set:    record.day_scope.iter().cloned().collect(),
        month_set:  record.month_scope.iter().cloned().collect(),
      };
      if let Err(e) = self.store.save_sender(&persisted).await {
        error!(error = %e, "failed to persist sender state");
      }
    }

    if let Err(e) = self.store.record_activity(row).await {
      error!(error = %e, "failed to persist activity row");
    }
  }

  // ── Read-only accessors ───────────────────────────────────────────────────

  /// The activity ledger, optionally filtered by day stamp and/or sender.
  /// Rows are sorted by (date, chat, sender) for stable output. Never
  /// mutates state.
  pub fn snapshot(
    &self,
    date: Option<&str>,
    sender_id: Option<i64>,
  ) -> Vec<SnapshotRow> {
    let mut rows: Vec<SnapshotRow> = self
      .activity
      .values()
      .filter(|r| date.is_none_or(|d| r.date == d))
      .filter(|r| sender_id.is_none_or(|s| r.sender_id == s))
      .cloned()
      .collect();
    rows.sort_by(|a, b| {
      (a.date.as_str(), a.chat_id, a.sender_id)
        .cmp(&(b.date.as_str(), b.chat_id, b.sender_id))
    });
    rows
  }

  /// Lifetime reporting data for one identifier, if it has ever been seen.
  pub fn history_entry(
    &self,
    kind: IdentifierKind,
    key: &str,
  ) -> Option<HistoryEntry> {
    self
      .history
      .get(&Identifier { kind, key: key.to_owned() })
      .copied()
  }

  /// Number of identifiers in the lifetime history.
  pub fn lifetime_total(&self) -> usize {
    self.history.len()
  }

  /// Number of (chat, sender) pairs ever seen.
  pub fn sender_count(&self) -> usize {
    self.senders.len()
  }

  pub fn stats(&self) -> TrackerStats {
    TrackerStats {
      senders:        self.senders.len(),
      lifetime_total: self.history.len(),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use thiserror::Error;

  use super::*;
  use crate::store::MemoryStore;

  const MSG: &str = "call +1 555 12345678 or @john_doe";

  fn tracker() -> Tracker<MemoryStore> {
    Tracker::new(TrackerConfig::default(), MemoryStore).unwrap()
  }

  fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
  }

  // ── Scenarios from first principles ─────────────────────────────────────

  #[tokio::test]
  async fn first_sighting_counts_everything_new() {
    let mut t = tracker();
    let r = t.process(1, 100, MSG, at(2024, 3, 14, 10)).await;
    assert_eq!(r.new_count, 2);
    assert_eq!(r.duplicate_count, 0);
    assert!(r.duplicate_keys.is_empty());
    assert_eq!(r.day_total, 2);
    assert_eq!(r.month_total, 2);
  }

  #[tokio::test]
  async fn verbatim_repeat_is_all_duplicates() {
    let mut t = tracker();
    t.process(1, 100, MSG, at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, MSG, at(2024, 3, 14, 11)).await;
    assert_eq!(r.new_count, 0);
    assert_eq!(r.duplicate_count, 2);
    assert_eq!(r.duplicate_keys, vec!["155512345678", "@john_doe"]);
    assert_eq!(r.day_total, 2);
    assert_eq!(r.month_total, 2);
  }

  #[tokio::test]
  async fn other_sender_hits_global_history() {
    let mut t = tracker();
    t.process(1, 100, "my number is +1 555 12345678", at(2024, 3, 14, 10))
      .await;
    // S2 has never sent anything; the global history still flags it.
    let r = t
      .process(1, 200, "+1 555 12345678", at(2024, 3, 14, 12))
      .await;
    assert_eq!(r.new_count, 0);
    assert_eq!(r.duplicate_count, 1);
    assert_eq!(r.duplicate_keys, vec!["155512345678"]);
    assert_eq!(r.day_total, 0);
    assert_eq!(r.month_total, 0);
  }

  #[tokio::test]
  async fn day_rollover_resets_day_but_not_month() {
    let mut t = tracker();
    t.process(1, 100, "@first_day", at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, "@second_day", at(2024, 3, 15, 10)).await;
    assert_eq!(r.new_count, 1);
    assert_eq!(r.day_total, 1); // only today's identifier
    assert_eq!(r.month_total, 2); // both days' identifiers
  }

  #[tokio::test]
  async fn month_rollover_resets_both_scopes() {
    let mut t = tracker();
    t.process(1, 100, "@march_handle", at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, "@april_handle", at(2024, 4, 2, 10)).await;
    assert_eq!(r.day_total, 1);
    assert_eq!(r.month_total, 1);
    // The March handle is still a lifetime duplicate.
    let r = t.process(1, 100, "@march_handle", at(2024, 4, 2, 11)).await;
    assert_eq!(r.new_count, 0);
    assert_eq!(r.duplicate_count, 1);
  }

  // ── Invariants ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn global_counting_is_at_most_once() {
    let mut t = tracker();
    let r = t.process(1, 100, "@shared", at(2024, 3, 14, 10)).await;
    assert_eq!(r.new_count, 1);
    // Every later encounter, any sender, any chat, any month: duplicate.
    for (chat, sender, when) in [
      (1, 100, at(2024, 3, 14, 11)),
      (1, 200, at(2024, 3, 20, 9)),
      (2, 300, at(2024, 5, 1, 9)),
    ] {
      let r = t.process(chat, sender, "@shared", when).await;
      assert_eq!(r.new_count, 0, "chat {chat} sender {sender}");
      assert_eq!(r.duplicate_count, 1);
    }
    assert_eq!(t.lifetime_total(), 1);
  }

  #[tokio::test]
  async fn day_scope_is_subset_of_month_scope() {
    let mut t = tracker();
    t.process(1, 100, "@one @two 79261234567", at(2024, 3, 14, 10)).await;
    t.process(1, 100, "@three", at(2024, 3, 15, 10)).await;
    let record = &t.senders[&SenderKey { chat_id: 1, sender_id: 100 }];
    for id in record.day_scope.iter() {
      assert!(record.month_scope.contains(id));
    }
  }

  #[tokio::test]
  async fn repeat_within_one_message_is_duplicate() {
    let mut t = tracker();
    let r = t
      .process(1, 100, "@twice and again @twice", at(2024, 3, 14, 10))
      .await;
    assert_eq!(r.new_count, 1);
    assert_eq!(r.duplicate_count, 1);
    assert_eq!(r.duplicate_keys, vec!["@twice"]);
    assert_eq!(r.day_total, 1);
  }

  #[tokio::test]
  async fn handle_case_variants_collapse_to_one_identifier() {
    let mut t = tracker();
    t.process(1, 100, "@John_Doe", at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, "@JOHN_DOE", at(2024, 3, 14, 11)).await;
    assert_eq!(r.duplicate_count, 1);
    assert_eq!(r.duplicate_keys, vec!["@john_doe"]);
  }

  #[tokio::test]
  async fn formatting_variants_of_a_phone_collapse() {
    let mut t = tracker();
    t.process(1, 100, "+7 926 123-45-67", at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, "79261234567", at(2024, 3, 14, 11)).await;
    assert_eq!(r.new_count, 0);
    assert_eq!(r.duplicate_count, 1);
  }

  #[tokio::test]
  async fn zero_match_message_changes_nothing() {
    let mut t = tracker();
    t.process(1, 100, "@seed", at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, "nothing to see here", at(2024, 3, 15, 10)).await;
    assert_eq!(r, TrackResult::default());
    // Short-circuit: not even rollover bookkeeping ran.
    let record = &t.senders[&SenderKey { chat_id: 1, sender_id: 100 }];
    assert_eq!(record.last_day, "2024-03-14");
    assert_eq!(record.day_scope.len(), 1);
  }

  #[tokio::test]
  async fn rejected_normalization_counts_nowhere() {
    let mut t = tracker();
    // Seven digits matches the coarse extraction shape but fails the
    // configured eight-digit minimum.
    let r = t.process(1, 100, "pin 1234567 @real_one", at(2024, 3, 14, 10)).await;
    assert_eq!(r.new_count, 1);
    assert_eq!(r.duplicate_count, 0);
    assert_eq!(r.day_total, 1);
  }

  #[tokio::test]
  async fn adjacent_phone_numbers_are_tracked_separately() {
    let mut t = tracker();
    let r = t
      .process(1, 100, "contact 79261234567 79261234568", at(2024, 3, 14, 10))
      .await;
    assert_eq!(r.new_count, 2);
    assert_eq!(r.day_total, 2);
    // Each number is its own key; no fused key exists anywhere.
    assert!(
      t.history_entry(IdentifierKind::Phone, "79261234567").is_some()
    );
    assert!(
      t.history_entry(IdentifierKind::Phone, "79261234568").is_some()
    );
    assert!(
      t.history_entry(IdentifierKind::Phone, "7926123456779261234")
        .is_none()
    );
  }

  #[tokio::test]
  async fn overlong_digit_run_counts_nowhere() {
    let mut t = tracker();
    // 20 unbroken digits: not a phone under any numbering plan.
    let r = t
      .process(1, 100, "ref 12345678901234567890 @real_one", at(2024, 3, 14, 10))
      .await;
    assert_eq!(r.new_count, 1);
    assert_eq!(r.day_total, 1);
    assert_eq!(t.lifetime_total(), 1);
  }

  #[tokio::test]
  async fn backward_clock_jump_is_not_a_rollover() {
    let mut t = tracker();
    t.process(1, 100, "@today", at(2024, 3, 14, 10)).await;
    let r = t.process(1, 100, "@today", at(2024, 3, 13, 10)).await;
    assert_eq!(r.duplicate_count, 1);
    assert_eq!(r.day_total, 1);
  }

  // ── Supplemental reporting ──────────────────────────────────────────────

  #[tokio::test]
  async fn history_entry_tracks_occurrences_and_first_sender() {
    let mut t = tracker();
    t.process(1, 100, "@popular", at(2024, 3, 14, 10)).await;
    t.process(1, 200, "@popular", at(2024, 3, 14, 11)).await;
    t.process(1, 300, "@popular", at(2024, 3, 14, 12)).await;

    let entry = t.history_entry(IdentifierKind::Handle, "@popular").unwrap();
    assert_eq!(entry.seen_count, 3);
    assert_eq!(entry.first_seen_by, 100);
    assert!(t.history_entry(IdentifierKind::Phone, "@popular").is_none());
  }

  #[tokio::test]
  async fn snapshot_accumulates_per_sender_per_day() {
    let mut t = tracker();
    t.process(1, 100, "@aaa @bbb", at(2024, 3, 14, 10)).await;
    t.process(1, 100, "@aaa @ccc", at(2024, 3, 14, 11)).await;
    t.process(1, 200, "@aaa", at(2024, 3, 14, 12)).await;
    t.process(1, 100, "@ddd", at(2024, 3, 15, 9)).await;

    let all = t.snapshot(None, None);
    assert_eq!(all.len(), 3);

    let s1_day1 = t.snapshot(Some("2024-03-14"), Some(100));
    assert_eq!(s1_day1.len(), 1);
    let row = &s1_day1[0];
    assert_eq!(row.new_count, 3);
    assert_eq!(row.duplicate_count, 1);
    assert_eq!(row.day_total, 3);
    assert_eq!(row.month_total, 3);

    let s1_day2 = t.snapshot(Some("2024-03-15"), Some(100));
    assert_eq!(s1_day2[0].new_count, 1);
    assert_eq!(s1_day2[0].day_total, 1);
    assert_eq!(s1_day2[0].month_total, 4);
  }

  #[tokio::test]
  async fn stats_reflect_senders_and_lifetime() {
    let mut t = tracker();
    t.process(1, 100, "@one @two", at(2024, 3, 14, 10)).await;
    t.process(2, 200, "@three", at(2024, 3, 14, 10)).await;
    let stats = t.stats();
    assert_eq!(stats.senders, 2);
    assert_eq!(stats.lifetime_total, 3);
  }

  // ── Failure behavior ────────────────────────────────────────────────────

  #[derive(Debug, Clone, Copy, Error)]
  #[error("backing store unavailable")]
  struct Unavailable;

  /// Fails every operation; used to prove failures stay contained.
  #[derive(Debug, Clone, Copy)]
  struct BrokenStore;

  impl StateStore for BrokenStore {
    type Error = Unavailable;

    async fn load(&self) -> Result<PersistedState, Self::Error> {
      Err(Unavailable)
    }

    async fn save_sender(
      &self,
      _sender: &PersistedSender,
    ) -> Result<(), Self::Error> {
      Err(Unavailable)
    }

    async fn record_history(
      &self,
      _entries: &[PersistedHistory],
    ) -> Result<(), Self::Error> {
      Err(Unavailable)
    }

    async fn record_activity(
      &self,
      _row: &SnapshotRow,
    ) -> Result<(), Self::Error> {
      Err(Unavailable)
    }
  }

  #[tokio::test]
  async fn load_failure_fails_closed_to_empty_state() {
    let t = Tracker::load(TrackerConfig::default(), BrokenStore)
      .await
      .unwrap();
    assert_eq!(t.lifetime_total(), 0);
    assert_eq!(t.sender_count(), 0);
  }

  #[tokio::test]
  async fn write_failure_never_rolls_back_the_mutation() {
    let mut t = Tracker::new(TrackerConfig::default(), BrokenStore).unwrap();
    let r = t.process(1, 100, "@kept_anyway", at(2024, 3, 14, 10)).await;
    assert_eq!(r.new_count, 1);
    // The reported classification stands despite the failed writes.
    let r = t.process(1, 100, "@kept_anyway", at(2024, 3, 14, 11)).await;
    assert_eq!(r.duplicate_count, 1);
  }
}
