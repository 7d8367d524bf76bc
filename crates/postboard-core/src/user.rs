//! Users — the accounts that own posts and take part in chats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  validate::{MIN_PASSWORD_LEN, Validator, normalize_email},
};

/// Status assigned to every new account.
pub const DEFAULT_STATUS: &str = "I am new";

/// The public representation of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub email:      String,
  pub name:       String,
  pub status:     String,
  pub created_at: DateTime<Utc>,
}

/// The slice of a user shown in directory listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  #[serde(rename = "id")]
  pub user_id: Uuid,
  pub name:    String,
}

/// A user paired with the stored password hash; returned only by the
/// credentials lookup used at login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::FeedStore::add_user`]. The email must already be
/// normalised and the password hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
}

/// Raw signup fields as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
  pub email:    String,
  pub name:     String,
  pub password: String,
}

impl Signup {
  pub fn validate(&self) -> Result<()> {
    let mut v = Validator::new();
    v.email("email", &self.email)
      .non_empty("name", &self.name, "Enter a valid username")
      .min_len(
        "password",
        &self.password,
        MIN_PASSWORD_LEN,
        "Password must be at least 5 characters long",
      );
    v.finish()
  }

  pub fn normalized_email(&self) -> String { normalize_email(&self.email) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn signup(email: &str, name: &str, password: &str) -> Signup {
    Signup {
      email:    email.into(),
      name:     name.into(),
      password: password.into(),
    }
  }

  #[test]
  fn valid_signup_passes() {
    assert!(signup("a@a.com", "A", "secret").validate().is_ok());
  }

  #[test]
  fn short_password_and_bad_email_are_both_reported() {
    let Err(Error::Validation(fields)) = signup("nope", "A", "abc").validate()
    else {
      panic!("expected validation error");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].field, "email");
    assert_eq!(fields[1].field, "password");
  }

  #[test]
  fn summary_serialises_id_field() {
    let summary = UserSummary { user_id: Uuid::nil(), name: "A".into() };
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["id"], Uuid::nil().to_string());
    assert_eq!(json["name"], "A");
  }
}
