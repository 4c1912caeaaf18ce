//! Error type for `sift-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("unknown identifier kind: {0:?}")]
  UnknownKind(String),

  #[error("unknown scope name: {0:?}")]
  UnknownScope(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
