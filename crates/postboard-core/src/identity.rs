//! The authenticated caller and the ownership guard.
//!
//! An [`Identity`] is derived from a verified bearer credential and lives only
//! for the duration of one request. It is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, chat::Chat};

/// Who is making the current call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub subject_id: Uuid,
  pub email:      String,
  pub issued_at:  DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

// ─── Ownership guard ─────────────────────────────────────────────────────────

/// Permit a mutation only when `owner_id` is the caller's own subject id.
///
/// There is no role hierarchy and no group ownership: equality is the whole
/// rule.
pub fn ensure_owner(owner_id: Uuid, identity: &Identity) -> Result<()> {
  if owner_id == identity.subject_id {
    Ok(())
  } else {
    Err(Error::Forbidden { subject_id: identity.subject_id })
  }
}

/// A chat has two owners; either participant may read and append to it.
pub fn is_participant(chat: &Chat, identity: &Identity) -> bool {
  chat.participants.contains(&identity.subject_id)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn identity(subject_id: Uuid) -> Identity {
    let now = Utc::now();
    Identity {
      subject_id,
      email: "a@a.com".into(),
      issued_at: now,
      expires_at: now + Duration::hours(1),
    }
  }

  #[test]
  fn owner_passes() {
    let id = Uuid::new_v4();
    assert!(ensure_owner(id, &identity(id)).is_ok());
  }

  #[test]
  fn other_subject_is_forbidden() {
    let caller = Uuid::new_v4();
    let err = ensure_owner(Uuid::new_v4(), &identity(caller)).unwrap_err();
    assert!(matches!(err, Error::Forbidden { subject_id } if subject_id == caller));
  }

  #[test]
  fn participants_are_recognised() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let chat = Chat {
      chat_id:      Uuid::new_v4(),
      participants: [a, b],
      messages:     vec![],
    };
    assert!(is_participant(&chat, &identity(a)));
    assert!(is_participant(&chat, &identity(b)));
    assert!(!is_participant(&chat, &identity(Uuid::new_v4())));
  }
}
