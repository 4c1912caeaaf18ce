//! Identifier — the normalized unit of deduplication.

use serde::{Deserialize, Serialize};

/// The shape of an extracted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
  Phone,
  Handle,
}

impl IdentifierKind {
  /// Stable name stored in database `kind` columns.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Phone => "phone",
      Self::Handle => "handle",
    }
  }
}

/// A canonical comparison key plus its kind tag.
///
/// Two raw extractions that normalize to the same `Identifier` are the same
/// identifier for dedup purposes. The kind participates in equality and
/// hashing, so phone and handle namespaces can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
  pub kind: IdentifierKind,
  pub key:  String,
}

impl Identifier {
  pub fn phone(key: impl Into<String>) -> Self {
    Self { kind: IdentifierKind::Phone, key: key.into() }
  }

  pub fn handle(key: impl Into<String>) -> Self {
    Self { kind: IdentifierKind::Handle, key: key.into() }
  }
}
