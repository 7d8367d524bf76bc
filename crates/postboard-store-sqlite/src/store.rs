//! [`SqliteStore`] — the SQLite implementation of [`FeedStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use postboard_core::{
  chat::{Chat, NewMessage},
  page::{Page, PageRequest},
  post::{NewPost, Post, PostPatch},
  store::FeedStore,
  user::{DEFAULT_STATUS, NewUser, User, UserCredentials, UserSummary},
};

use crate::{
  Error, Result,
  encode::{
    RawChat, RawMessage, RawPost, RawUser, RawUserSummary, decode_uuid,
    encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Postboard store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Append a row to one of the per-user link tables. Re-linking an existing
  /// pair is a no-op.
  async fn link(
    &self,
    table: &'static str,
    column: &'static str,
    user_id: Uuid,
    item_id: Uuid,
  ) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR IGNORE INTO {table} (user_id, {column}) VALUES (?1, ?2)"
          ),
          rusqlite::params![user_str, item_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Convert a page request into SQLite `LIMIT` / `OFFSET` values.
fn limit_offset(page: PageRequest) -> (i64, i64) {
  (
    i64::try_from(page.limit()).unwrap_or(i64::MAX),
    i64::try_from(page.offset()).unwrap_or(i64::MAX),
  )
}

fn count_to_total(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── FeedStore impl ──────────────────────────────────────────────────────────

impl FeedStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      email:      input.email,
      name:       input.name,
      status:     DEFAULT_STATUS.to_owned(),
      created_at: now(),
    };

    let id_str = encode_uuid(user.user_id);
    let email  = user.email.clone();
    let name   = user.name.clone();
    let status = user.status.clone();
    let at_str = encode_dt(user.created_at);
    let hash   = input.password_hash;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, name, password_hash, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, email, name, hash, status, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
    let email = email.to_owned();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {}, password_hash FROM users WHERE email = ?1",
                RawUser::COLUMNS
              ),
              rusqlite::params![email],
              |row| Ok((RawUser::from_row(row)?, row.get(5)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(user, password_hash)| {
        Ok(UserCredentials { user: user.into_user()?, password_hash })
      })
      .transpose()
  }

  async fn list_users(&self, page: PageRequest) -> Result<Page<UserSummary>> {
    let (limit, offset) = limit_offset(page);

    let (total, raws): (i64, Vec<RawUserSummary>) = self
      .conn
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        let mut stmt = conn.prepare(
          "SELECT user_id, name FROM users
           ORDER BY created_at, rowid
           LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], |row| {
            Ok(RawUserSummary {
              user_id: row.get(0)?,
              name:    row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    Ok(Page {
      items: raws
        .into_iter()
        .map(RawUserSummary::into_summary)
        .collect::<Result<_>>()?,
      total: count_to_total(total),
    })
  }

  async fn set_status(&self, id: Uuid, status: String) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET status = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, status],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  async fn link_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
    self.link("user_posts", "post_id", user_id, post_id).await
  }

  async fn unlink_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let post_str = encode_uuid(post_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM user_posts WHERE user_id = ?1 AND post_id = ?2",
          rusqlite::params![user_str, post_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_post_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
    let user_str = encode_uuid(user_id);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT post_id FROM user_posts WHERE user_id = ?1 ORDER BY seq")?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn add_post(&self, input: NewPost) -> Result<Post> {
    let post_id    = Uuid::new_v4();
    let created_at = now();

    let id_str      = encode_uuid(post_id);
    let creator_str = encode_uuid(input.creator_id);
    let at_str      = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, title, content, image_url, creator_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            id_str,
            input.title,
            input.content,
            input.image_url,
            creator_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self
      .get_post(post_id)
      .await?
      .ok_or(Error::UserNotFound(input.creator_id))
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{} WHERE p.post_id = ?1", RawPost::SELECT),
              rusqlite::params![id_str],
              RawPost::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self, page: PageRequest) -> Result<Page<Post>> {
    let (limit, offset) = limit_offset(page);

    let (total, raws): (i64, Vec<RawPost>) = self
      .conn
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))?;
        let mut stmt = conn.prepare(&format!(
          "{} ORDER BY p.created_at DESC, p.rowid DESC LIMIT ?1 OFFSET ?2",
          RawPost::SELECT
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    Ok(Page {
      items: raws
        .into_iter()
        .map(RawPost::into_post)
        .collect::<Result<_>>()?,
      total: count_to_total(total),
    })
  }

  async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE posts
           SET title = ?2, content = ?3, image_url = ?4, updated_at = ?5
           WHERE post_id = ?1",
          rusqlite::params![id_str, patch.title, patch.content, patch.image_url, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_post(id).await
  }

  async fn remove_post(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM posts WHERE post_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn posts_with_image(&self, image_url: &str) -> Result<Vec<Uuid>> {
    let url = image_url.to_owned();

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT post_id FROM posts WHERE image_url = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![url], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Chats ─────────────────────────────────────────────────────────────────

  async fn find_chat(&self, a: Uuid, b: Uuid) -> Result<Option<Chat>> {
    let a_str = encode_uuid(a);
    let b_str = encode_uuid(b);

    let chat_id: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT chat_id FROM chats
               WHERE (user_a = ?1 AND user_b = ?2) OR (user_a = ?2 AND user_b = ?1)
               ORDER BY rowid
               LIMIT 1",
              rusqlite::params![a_str, b_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    match chat_id {
      Some(id) => self.get_chat(decode_uuid(&id)?).await,
      None => Ok(None),
    }
  }

  async fn add_chat(&self, a: Uuid, b: Uuid) -> Result<Chat> {
    let chat = Chat {
      chat_id:      Uuid::new_v4(),
      participants: [a, b],
      messages:     Vec::new(),
    };

    let id_str = encode_uuid(chat.chat_id);
    let a_str  = encode_uuid(a);
    let b_str  = encode_uuid(b);
    let at_str = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO chats (chat_id, user_a, user_b, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, a_str, b_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(chat)
  }

  async fn link_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<()> {
    self.link("user_chats", "chat_id", user_id, chat_id).await
  }

  async fn get_chat(&self, id: Uuid) -> Result<Option<Chat>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawChat> = self
      .conn
      .call(move |conn| {
        let head: Option<(String, String, String)> = conn
          .query_row(
            "SELECT chat_id, user_a, user_b FROM chats WHERE chat_id = ?1",
            rusqlite::params![id_str],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;

        let Some((chat_id, user_a, user_b)) = head else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT message_id, content, sender_id, sender_name, sent_at
           FROM chat_messages
           WHERE chat_id = ?1
           ORDER BY seq DESC",
        )?;
        let messages = stmt
          .query_map(rusqlite::params![chat_id], |row| {
            Ok(RawMessage {
              message_id:  row.get(0)?,
              content:     row.get(1)?,
              sender_id:   row.get(2)?,
              sender_name: row.get(3)?,
              sent_at:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(RawChat { chat_id, user_a, user_b, messages }))
      })
      .await?;

    raw.map(RawChat::into_chat).transpose()
  }

  async fn append_message(&self, input: NewMessage) -> Result<Option<Chat>> {
    let chat_id     = input.chat_id;
    let message_str = encode_uuid(Uuid::new_v4());
    let chat_str    = encode_uuid(chat_id);
    let sender_str  = encode_uuid(input.sender.user_id);
    let at_str      = encode_dt(now());

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM chats WHERE chat_id = ?1",
            rusqlite::params![chat_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO chat_messages (message_id, chat_id, content, sender_id, sender_name, sent_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            message_str,
            chat_str,
            input.content,
            sender_str,
            input.sender.name,
            at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Ok(None);
    }
    self
      .get_chat(chat_id)
      .await?
      .ok_or(Error::ChatNotFound(chat_id))
      .map(Some)
  }
}
