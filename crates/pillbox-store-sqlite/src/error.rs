//! Error type for `pillbox-store-sqlite`.

use pillbox_core::store::StoreError;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown day slot: {0:?}")]
  UnknownSlot(String),

  #[error("week number out of range: {0}")]
  UnknownWeek(i64),
}

impl StoreError for Error {
  fn is_unique_violation(&self) -> bool {
    let Self::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      e,
      _,
    ))) = self
    else {
      return false;
    };
    matches!(
      e.extended_code,
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
