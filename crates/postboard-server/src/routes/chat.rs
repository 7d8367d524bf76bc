//! Handlers for `/chat` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/chat/{recipient_id}` | Returns the chat, creating it on first use |
//! | `POST` | `/chat/send-message/{chat_id}` | Body: `{"msg_content"}` |

use axum::{
  extract::{Path, State},
  http::StatusCode,
};
use postboard_core::{chat::Chat, store::FeedStore};
use serde::{Deserialize, Serialize};

use super::{ApiJson, Reply};
use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  lifecycle::{chats, parse_id},
};

#[derive(Debug, Serialize)]
pub struct ChatReply {
  pub message: &'static str,
  pub chat:    Chat,
}

/// `GET /chat/{recipient_id}`
pub async fn open<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  Path(recipient_id): Path<String>,
) -> Result<Reply<ChatReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let recipient_id = parse_id("recipient_id", &recipient_id)?;
  let chat = chats::open(&state, &identity, recipient_id).await?;
  Ok(Reply::new(ChatReply { message: "Chat fetched", chat }))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub msg_content: String,
}

/// `POST /chat/send-message/{chat_id}`
pub async fn send<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  Path(chat_id): Path<String>,
  ApiJson(body): ApiJson<SendBody>,
) -> Result<Reply<ChatReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let chat_id = parse_id("chat_id", &chat_id)?;
  let chat = chats::send(&state, &identity, chat_id, &body.msg_content).await?;
  Ok(
    Reply::new(ChatReply { message: "Message sent", chat })
      .status(StatusCode::CREATED),
  )
}
