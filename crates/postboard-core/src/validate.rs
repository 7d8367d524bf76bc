//! Field-level input validation.
//!
//! A [`Validator`] collects every failing field instead of stopping at the
//! first one, so callers can report all problems in a single response.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minimum trimmed length for post titles and bodies.
pub const MIN_TEXT_LEN: usize = 5;

/// Minimum trimmed length for passwords.
pub const MIN_PASSWORD_LEN: usize = 5;

/// A single failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

#[derive(Debug, Default)]
pub struct Validator {
  errors: Vec<FieldError>,
}

impl Validator {
  pub fn new() -> Self { Self::default() }

  /// Record a failure unconditionally.
  pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
    self.errors.push(FieldError {
      field:   field.to_owned(),
      message: message.into(),
    });
    self
  }

  /// Fail when `value` is blank after trimming.
  pub fn non_empty(
    &mut self,
    field: &str,
    value: &str,
    message: &str,
  ) -> &mut Self {
    if value.trim().is_empty() {
      self.push(field, message);
    }
    self
  }

  /// Fail when `value` has fewer than `min` characters after trimming.
  pub fn min_len(
    &mut self,
    field: &str,
    value: &str,
    min: usize,
    message: &str,
  ) -> &mut Self {
    if value.trim().chars().count() < min {
      self.push(field, message);
    }
    self
  }

  pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
    if !is_valid_email(value) {
      self.push(field, "E-mail must be a valid address");
    }
    self
  }

  pub fn is_empty(&self) -> bool { self.errors.is_empty() }

  /// `Ok(())` if nothing failed, otherwise [`Error::Validation`] with every
  /// recorded failure in insertion order.
  pub fn finish(self) -> Result<()> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(self.errors))
    }
  }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// A deliberately small syntactic check: one `@`, a non-empty local part, and
/// a dotted domain with no empty labels or whitespace.
pub fn is_valid_email(email: &str) -> bool {
  let email = email.trim();
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collects_every_failure() {
    let mut v = Validator::new();
    v.min_len("title", "abc", MIN_TEXT_LEN, "too short")
      .min_len("content", "    ", MIN_TEXT_LEN, "too short")
      .non_empty("name", "Bruno", "required");
    let err = v.finish().unwrap_err();
    let Error::Validation(fields) = err else { panic!("expected validation error") };
    let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(names, ["title", "content"]);
  }

  #[test]
  fn min_len_counts_trimmed_chars() {
    let mut v = Validator::new();
    v.min_len("title", "  héllo  ", MIN_TEXT_LEN, "too short");
    assert!(v.is_empty());
  }

  #[test]
  fn email_syntax() {
    assert!(is_valid_email("a@a.com"));
    assert!(is_valid_email(" user.name@example.co.uk "));
    assert!(!is_valid_email("a@a"));
    assert!(!is_valid_email("@a.com"));
    assert!(!is_valid_email("a@@a.com"));
    assert!(!is_valid_email("a b@a.com"));
    assert!(!is_valid_email("a@a..com"));
  }

  #[test]
  fn normalizes_case_and_whitespace() {
    assert_eq!(normalize_email("  Test@Example.COM "), "test@example.com");
  }
}
