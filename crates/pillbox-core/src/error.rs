//! Error types for `pillbox-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date {0:?}; expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("history entry not found: {0}")]
  EntryNotFound(Uuid),

  #[error("history entry {entry_id} references unknown supplement {supplement_id}")]
  UnresolvedSupplement { entry_id: Uuid, supplement_id: Uuid },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
