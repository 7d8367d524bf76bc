//! Error types for `postboard-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::validate::FieldError;

#[derive(Debug, Error)]
pub enum Error {
  /// The caller is authenticated but does not own the resource.
  #[error("user {subject_id} does not own this resource")]
  Forbidden { subject_id: Uuid },

  /// One or more input fields failed validation.
  #[error("validation failed: {}", summarize(.0))]
  Validation(Vec<FieldError>),
}

fn summarize(errors: &[FieldError]) -> String {
  errors
    .iter()
    .map(|e| format!("{}: {}", e.field, e.message))
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
