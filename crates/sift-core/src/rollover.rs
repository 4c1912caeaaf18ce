//! Day/month boundary detection and scope clearing.
//!
//! Stamps are plain strings (`YYYY-MM-DD`, `YYYY-MM`) rendered in one
//! configured fixed offset, so lexicographic order is chronological order.

use chrono::{DateTime, FixedOffset, Utc};

use crate::sender::SenderRecord;

/// Render the day stamp for `now` in `offset`.
pub fn day_stamp(now: DateTime<Utc>, offset: FixedOffset) -> String {
  now.with_timezone(&offset).format("%Y-%m-%d").to_string()
}

/// Render the month stamp for `now` in `offset`.
pub fn month_stamp(now: DateTime<Utc>, offset: FixedOffset) -> String {
  now.with_timezone(&offset).format("%Y-%m").to_string()
}

/// Clear whichever scopes `now` has rolled past. Called before any scope
/// lookup or update for the sender.
///
/// The day and month checks are independent: a message after a month
/// boundary clears both scopes, a message after a day boundary within the
/// same month clears only the day scope. A stamp that moved backward
/// (system clock anomaly) clears nothing and leaves the recorded stamps
/// alone, so a later corrected clock still rolls over at the real boundary.
/// The lifetime history is never touched here.
pub fn reconcile(
  record: &mut SenderRecord,
  now: DateTime<Utc>,
  offset: FixedOffset,
) {
  let day = day_stamp(now, offset);
  if day > record.last_day {
    record.day_scope.clear();
    record.last_day = day;
  }

  let month = month_stamp(now, offset);
  if month > record.last_month {
    record.month_scope.clear();
    record.last_month = month;
  }
}
