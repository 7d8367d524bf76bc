//! `GET /ws` — a websocket stream of post events as JSON text frames.
//!
//! Browsers cannot set headers on a websocket handshake, so the bearer token
//! may also be passed as `?token=`.

use axum::{
  extract::{
    State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  http::HeaderMap,
  response::Response,
};
use postboard_core::{event::PostEvent, store::FeedStore};
use serde::Deserialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use uuid::Uuid;

use super::ApiQuery;
use crate::{AppState, auth::verify_request, error::Error};

#[derive(Debug, Deserialize)]
pub struct WsParams {
  pub token: Option<String>,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  ApiQuery(params): ApiQuery<WsParams>,
  ws: WebSocketUpgrade,
) -> Result<Response, Error>
where
  S: FeedStore + Clone + 'static,
{
  let identity = match params.token {
    Some(token) => state.tokens.verify(&token)?,
    None => verify_request(&headers, &state.tokens)?,
  };
  let events = state.notifier.subscribe();
  Ok(ws.on_upgrade(move |socket| forward(socket, events, identity.subject_id)))
}

/// Relay events until either side goes away.
async fn forward(mut socket: WebSocket, mut events: Receiver<PostEvent>, subscriber: Uuid) {
  tracing::debug!(%subscriber, "event subscriber connected");
  loop {
    tokio::select! {
      event = events.recv() => match event {
        Ok(event) => {
          let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
              tracing::error!(error = %e, "failed to encode post event");
              continue;
            }
          };
          if socket.send(Message::Text(text.into())).await.is_err() {
            break;
          }
        }
        Err(RecvError::Lagged(skipped)) => {
          tracing::warn!(%subscriber, skipped, "event subscriber lagged");
        }
        Err(RecvError::Closed) => break,
      },
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
    }
  }
  tracing::debug!(%subscriber, "event subscriber disconnected");
}
