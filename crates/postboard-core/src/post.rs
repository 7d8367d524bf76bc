//! Posts — the shared resources of the feed.
//!
//! Every post records its creator; only that user may edit or delete it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  validate::{MIN_TEXT_LEN, Validator},
};

/// The author of a post or chat message, as shown to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub user_id: Uuid,
  pub name:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    Uuid,
  pub title:      String,
  pub content:    String,
  /// Path relative to the server root, e.g. `images/<file>.png`.
  pub image_url:  String,
  pub creator:    Author,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Post {
  /// The subject id the ownership guard compares against.
  pub fn owner_id(&self) -> Uuid { self.creator.user_id }
}

/// Input to [`crate::store::FeedStore::add_post`]. Timestamps are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title:      String,
  pub content:    String,
  pub image_url:  String,
  pub creator_id: Uuid,
}

/// Replacement values for the mutable fields of a post.
#[derive(Debug, Clone)]
pub struct PostPatch {
  pub title:     String,
  pub content:   String,
  pub image_url: String,
}

/// Post text as submitted by a client, before validation. The image is
/// checked by the caller, which knows whether it is an upload or a path.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
  pub title:   String,
  pub content: String,
}

impl PostDraft {
  /// Record length failures for the title and content into `v`.
  pub fn check(&self, v: &mut Validator) {
    v.min_len(
      "title",
      &self.title,
      MIN_TEXT_LEN,
      "Invalid title, text must be at least 5 characters long",
    )
    .min_len(
      "content",
      &self.content,
      MIN_TEXT_LEN,
      "Invalid content, text must be at least 5 characters long",
    );
  }

  pub fn validate(&self) -> Result<()> {
    let mut v = Validator::new();
    self.check(&mut v);
    v.finish()
  }

  /// The title and content with surrounding whitespace removed.
  pub fn trimmed(self) -> (String, String) {
    (self.title.trim().to_owned(), self.content.trim().to_owned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn draft(title: &str, content: &str) -> PostDraft {
    PostDraft { title: title.into(), content: content.into() }
  }

  #[test]
  fn valid_draft_is_trimmed() {
    let d = draft("  First post ", "Hello there");
    assert!(d.validate().is_ok());
    assert_eq!(d.trimmed(), ("First post".into(), "Hello there".into()));
  }

  #[test]
  fn both_fields_reported() {
    let Err(Error::Validation(fields)) = draft("Hey", " abc ").validate() else {
      panic!("expected validation error");
    };
    let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(names, ["title", "content"]);
  }

  #[test]
  fn check_appends_to_existing_validator() {
    let mut v = Validator::new();
    v.push("image", "No image provided");
    draft("Hey", "Hello there").check(&mut v);
    let Err(Error::Validation(fields)) = v.finish() else {
      panic!("expected validation error");
    };
    assert_eq!(fields.len(), 2);
  }
}
