//! Error types for `sift-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid utc offset: {0} minutes")]
  InvalidUtcOffset(i32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
