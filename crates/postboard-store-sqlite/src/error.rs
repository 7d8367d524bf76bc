//! Error type for `postboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row referenced a user that does not exist.
  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  /// A chat row was written but could not be read back.
  #[error("chat not found: {0}")]
  ChatNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
