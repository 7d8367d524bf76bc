//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use postboard_core::{
  chat::{Chat, ChatMessage},
  post::{Author, Post},
  user::{User, UserSummary},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Current time truncated to the precision stored in the database, so values
/// returned from writes compare equal to values read back later.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub name:       String,
  pub status:     String,
  pub created_at: String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, email, name, status, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      email:      row.get(1)?,
      name:       row.get(2)?,
      status:     row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      name:       self.name,
      status:     self.status,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawUserSummary {
  pub user_id: String,
  pub name:    String,
}

impl RawUserSummary {
  pub fn into_summary(self) -> Result<UserSummary> {
    Ok(UserSummary {
      user_id: decode_uuid(&self.user_id)?,
      name:    self.name,
    })
  }
}

/// Raw strings read from a `posts` row joined with its creator.
pub struct RawPost {
  pub post_id:      String,
  pub title:        String,
  pub content:      String,
  pub image_url:    String,
  pub creator_id:   String,
  pub creator_name: String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawPost {
  /// `SELECT` prefix shared by every post query; callers append the
  /// `WHERE` / `ORDER BY` tail.
  pub const SELECT: &'static str = "SELECT
       p.post_id, p.title, p.content, p.image_url,
       p.creator_id, u.name, p.created_at, p.updated_at
     FROM posts p
     JOIN users u ON u.user_id = p.creator_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:      row.get(0)?,
      title:        row.get(1)?,
      content:      row.get(2)?,
      image_url:    row.get(3)?,
      creator_id:   row.get(4)?,
      creator_name: row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:    decode_uuid(&self.post_id)?,
      title:      self.title,
      content:    self.content,
      image_url:  self.image_url,
      creator:    Author {
        user_id: decode_uuid(&self.creator_id)?,
        name:    self.creator_name,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from a `chat_messages` row.
pub struct RawMessage {
  pub message_id:  String,
  pub content:     String,
  pub sender_id:   String,
  pub sender_name: String,
  pub sent_at:     String,
}

impl RawMessage {
  pub fn into_message(self) -> Result<ChatMessage> {
    Ok(ChatMessage {
      message_id: decode_uuid(&self.message_id)?,
      content:    self.content,
      sender:     Author {
        user_id: decode_uuid(&self.sender_id)?,
        name:    self.sender_name,
      },
      sent_at:    decode_dt(&self.sent_at)?,
    })
  }
}

/// A `chats` row plus its messages, newest first.
pub struct RawChat {
  pub chat_id:  String,
  pub user_a:   String,
  pub user_b:   String,
  pub messages: Vec<RawMessage>,
}

impl RawChat {
  pub fn into_chat(self) -> Result<Chat> {
    Ok(Chat {
      chat_id:      decode_uuid(&self.chat_id)?,
      participants: [decode_uuid(&self.user_a)?, decode_uuid(&self.user_b)?],
      messages:     self
        .messages
        .into_iter()
        .map(RawMessage::into_message)
        .collect::<Result<_>>()?,
    })
  }
}
