//! Two-party chats.
//!
//! A chat is created lazily the first time two users open a conversation.
//! Messages are append-only and are always presented most-recent-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::post::Author;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
  pub chat_id:      Uuid,
  /// The two users in the conversation, in creation order.
  pub participants: [Uuid; 2],
  /// Newest first.
  pub messages:     Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub message_id: Uuid,
  pub content:    String,
  /// The sender's name is captured at send time.
  pub sender:     Author,
  pub sent_at:    DateTime<Utc>,
}

/// Input to [`crate::store::FeedStore::append_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub chat_id: Uuid,
  pub content: String,
  pub sender:  Author,
}
