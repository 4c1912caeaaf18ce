//! Tracker configuration.

use chrono::FixedOffset;
use serde::Deserialize;

use crate::{Error, Result};

/// Tuning knobs for normalization and rollover stamping.
///
/// All day/month stamps are rendered in one fixed UTC offset so every
/// component observes the same calendar boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
  /// Fixed UTC offset, in minutes, used to render day and month stamps.
  pub utc_offset_minutes: i32,
  /// Minimum digit count for a normalized phone key; shorter digit runs are
  /// dropped rather than tracked.
  pub min_phone_digits:   usize,
  /// Maximum digit count for a normalized phone key. Longer runs are not
  /// phones (no real numbering plan exceeds 15 digits) and are dropped.
  pub max_phone_digits:   usize,
}

impl Default for TrackerConfig {
  fn default() -> Self {
    Self {
      utc_offset_minutes: 0,
      min_phone_digits:   8,
      max_phone_digits:   15,
    }
  }
}

impl TrackerConfig {
  /// The configured offset as a chrono [`FixedOffset`].
  pub fn offset(&self) -> Result<FixedOffset> {
    FixedOffset::east_opt(self.utc_offset_minutes * 60)
      .ok_or(Error::InvalidUtcOffset(self.utc_offset_minutes))
  }
}
