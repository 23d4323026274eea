//! Error types for `cep-core`.
//!
//! This is the taxonomy every layer reports in. Storage backends convert
//! their own errors into it; the API maps each variant to a status code.

use thiserror::Error;
use uuid::Uuid;

use crate::policy::Resource;

#[derive(Debug, Error)]
pub enum Error {
  #[error("forbidden")]
  Forbidden,

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("area not found: {0}")]
  AreaNotFound(Uuid),

  #[error("{0} record not found: {1}")]
  NotFound(Resource, Uuid),

  #[error("invalid course category: {0:?}")]
  InvalidCategory(String),

  #[error("existing course code is malformed: {0:?}")]
  CorruptExistingCode(String),

  #[error("no sequence numbers left for prefix {0:?}")]
  SequenceExhausted(String),

  #[error("course code already taken: {0}")]
  DuplicateCode(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("storage call timed out")]
  StorageTimeout,

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
