//! Two-party chats. A chat is created lazily the first time either user
//! opens it and is visible only to its participants.

use postboard_core::{
  chat::{Chat, NewMessage},
  identity::{Identity, is_participant},
  post::Author,
  store::FeedStore,
  validate::Validator,
};
use uuid::Uuid;

use super::require_user;
use crate::{AppState, error::Error};

fn chat_not_found() -> Error {
  Error::NotFound("Could not find the desired chat".to_owned())
}

/// The chat between the caller and `recipient_id`, created if absent.
pub async fn open<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  recipient_id: Uuid,
) -> Result<Chat, Error> {
  if recipient_id == identity.subject_id {
    return Err(Error::invalid(
      "recipient_id",
      "Cannot open a chat with yourself",
    ));
  }
  let me = require_user(state, identity.subject_id).await?;
  let other = require_user(state, recipient_id).await?;

  if let Some(chat) = state
    .store
    .find_chat(me.user_id, other.user_id)
    .await
    .map_err(Error::store)?
  {
    return Ok(chat);
  }

  let chat = state
    .store
    .add_chat(me.user_id, other.user_id)
    .await
    .map_err(Error::store)?;
  for user_id in [me.user_id, other.user_id] {
    state
      .store
      .link_chat(user_id, chat.chat_id)
      .await
      .map_err(Error::store)?;
  }
  tracing::info!(chat_id = %chat.chat_id, "chat opened");
  Ok(chat)
}

/// Append a message from the caller and return the updated chat.
pub async fn send<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  chat_id: Uuid,
  content: &str,
) -> Result<Chat, Error> {
  let mut v = Validator::new();
  v.non_empty("msg_content", content, "Message must not be empty");
  v.finish()?;

  let chat = state
    .store
    .get_chat(chat_id)
    .await
    .map_err(Error::store)?
    .filter(|chat| is_participant(chat, identity))
    .ok_or_else(chat_not_found)?;
  let sender = require_user(state, identity.subject_id).await?;

  state
    .store
    .append_message(NewMessage {
      chat_id: chat.chat_id,
      content: content.trim().to_owned(),
      sender:  Author { user_id: sender.user_id, name: sender.name },
    })
    .await
    .map_err(Error::store)?
    .ok_or_else(chat_not_found)
}
