//! Error type for `cep-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("column decode error: {0}")]
  Decode(String),

  /// The UNIQUE constraint on `courses.code` rejected an insert.
  #[error("course code already stored: {0}")]
  DuplicateCode(String),

  #[error("area code already taken: {0}")]
  AreaCodeTaken(String),

  #[error("course slug already taken: {0}")]
  SlugTaken(String),

  #[error("staff email already taken: {0}")]
  EmailTaken(String),

  /// A write reached the connection thread after its deadline and was not
  /// applied.
  #[error("write deadline expired before the write ran")]
  WriteTimeout,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for cep_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::DuplicateCode(code) => cep_core::Error::DuplicateCode(code),
      Error::WriteTimeout => cep_core::Error::StorageTimeout,
      Error::AreaCodeTaken(code) => {
        cep_core::Error::Conflict(format!("area code {code} is already taken"))
      }
      Error::SlugTaken(slug) => {
        cep_core::Error::Conflict(format!("course slug {slug} is already taken"))
      }
      Error::EmailTaken(email) => {
        cep_core::Error::Conflict(format!("staff email {email} is already taken"))
      }
      other => cep_core::Error::Storage(Box::new(other)),
    }
  }
}

/// `true` if `err` is SQLite refusing a row because of a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  unique_violation(err).is_some()
}

/// The `table.column` a UNIQUE constraint failure names, or `""` if SQLite
/// gave no message. `None` for any other error.
pub(crate) fn unique_violation(err: &tokio_rusqlite::Error) -> Option<&str> {
  match err {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, msg))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      Some(
        msg
          .as_deref()
          .and_then(|m| m.strip_prefix("UNIQUE constraint failed: "))
          .unwrap_or_default(),
      )
    }
    _ => None,
  }
}
