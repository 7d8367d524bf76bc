//! Post change events published to real-time subscribers.
//!
//! The wire form is `{"action": "create" | "update", "post": <Post>}` or
//! `{"action": "delete", "post": "<post id>"}`.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::post::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PostAction {
  Create,
  Update,
  Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "post", rename_all = "lowercase")]
pub enum PostEvent {
  Create(Post),
  Update(Post),
  Delete(Uuid),
}

impl PostEvent {
  pub fn action(&self) -> PostAction {
    match self {
      Self::Create(_) => PostAction::Create,
      Self::Update(_) => PostAction::Update,
      Self::Delete(_) => PostAction::Delete,
    }
  }

  pub fn post_id(&self) -> Uuid {
    match self {
      Self::Create(p) | Self::Update(p) => p.post_id,
      Self::Delete(id) => *id,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn delete_event_carries_only_the_id() {
    let id = Uuid::new_v4();
    let json = serde_json::to_value(PostEvent::Delete(id)).unwrap();
    assert_eq!(json, serde_json::json!({ "action": "delete", "post": id }));
  }

  #[test]
  fn action_names_are_lowercase() {
    assert_eq!(PostAction::Create.to_string(), "create");
    assert_eq!(PostAction::Delete.as_ref(), "delete");
  }
}
