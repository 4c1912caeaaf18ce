//! Canonicalization of extracted values into comparison keys.

use crate::{
  config::TrackerConfig,
  identifier::{Identifier, IdentifierKind},
};

/// Canonicalize one raw match into an [`Identifier`].
///
/// Phones are reduced to their digits; a result outside the configured
/// `min_phone_digits..=max_phone_digits` range is rejected (`None`), so
/// stray short digit runs and over-long runs that no numbering plan could
/// produce never enter any scope. Handles are lowercased and keep their
/// leading `@`.
///
/// Pure and idempotent: feeding a returned key back through yields the same
/// key.
pub fn normalize(
  raw: &str,
  kind: IdentifierKind,
  config: &TrackerConfig,
) -> Option<Identifier> {
  match kind {
    IdentifierKind::Phone => {
      let digits: String =
        raw.chars().filter(char::is_ascii_digit).collect();
      let in_range = (config.min_phone_digits..=config.max_phone_digits)
        .contains(&digits.len());
      in_range.then(|| Identifier::phone(digits))
    }
    IdentifierKind::Handle => Some(Identifier::handle(raw.to_lowercase())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg() -> TrackerConfig {
    TrackerConfig::default()
  }

  #[test]
  fn phone_strips_every_non_digit() {
    let id =
      normalize("+1 555 12345678", IdentifierKind::Phone, &cfg()).unwrap();
    assert_eq!(id.key, "155512345678");
    assert_eq!(id.kind, IdentifierKind::Phone);
  }

  #[test]
  fn phone_below_minimum_is_rejected() {
    assert!(normalize("+1 (23) 45-6", IdentifierKind::Phone, &cfg()).is_none());
  }

  #[test]
  fn phone_above_maximum_is_rejected() {
    // 19 digits: longer than any real number; typically two numbers fused
    // across a separator.
    let fused = "7926123456779261234";
    assert!(normalize(fused, IdentifierKind::Phone, &cfg()).is_none());
  }

  #[test]
  fn handle_is_lowercased_and_keeps_marker() {
    let id = normalize("@John_Doe", IdentifierKind::Handle, &cfg()).unwrap();
    assert_eq!(id.key, "@john_doe");
    assert_eq!(id.kind, IdentifierKind::Handle);
  }

  #[test]
  fn normalization_is_idempotent() {
    for (raw, kind) in [
      ("+7 (926) 123-45-67", IdentifierKind::Phone),
      ("@Some_User", IdentifierKind::Handle),
    ] {
      let once = normalize(raw, kind, &cfg()).unwrap();
      let twice = normalize(&once.key, kind, &cfg()).unwrap();
      assert_eq!(once, twice);
    }
  }
}
