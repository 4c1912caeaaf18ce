//! Encoding helpers between domain enums and the plain-text column values.

use sift_core::identifier::{Identifier, IdentifierKind};

use crate::{Error, Result};

pub const SCOPE_DAY: &str = "day";
pub const SCOPE_MONTH: &str = "month";

pub fn encode_kind(kind: IdentifierKind) -> &'static str {
  kind.as_str()
}

pub fn decode_kind(s: &str) -> Result<IdentifierKind> {
  match s {
    "phone" => Ok(IdentifierKind::Phone),
    "handle" => Ok(IdentifierKind::Handle),
    other => Err(Error::UnknownKind(other.to_owned())),
  }
}

pub fn decode_identifier(kind: &str, key: String) -> Result<Identifier> {
  Ok(Identifier { kind: decode_kind(kind)?, key })
}
