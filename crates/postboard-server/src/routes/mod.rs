//! REST handlers.
//!
//! | Module | Paths |
//! |--------|-------|
//! | [`users`] | `/auth/*`, `/feed/status`, `/chat/users` |
//! | [`feed`]  | `/feed/posts`, `/feed/post*` |
//! | [`chat`]  | `/chat/{recipient_id}`, `/chat/send-message/{chat_id}` |
//! | [`ws`]    | `/ws` |

pub mod chat;
pub mod feed;
pub mod users;
pub mod ws;

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Query},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// [`Json`] whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// [`Query`] whose rejections use the API error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// A JSON body with a status code, `200 OK` unless set.
pub struct Reply<T> {
  status: StatusCode,
  body:   T,
}

impl<T: Serialize> Reply<T> {
  pub fn new(body: T) -> Self { Self { status: StatusCode::OK, body } }

  pub fn status(mut self, status: StatusCode) -> Self {
    self.status = status;
    self
  }
}

impl<T: Serialize> IntoResponse for Reply<T> {
  fn into_response(self) -> Response {
    (self.status, Json(self.body)).into_response()
  }
}

/// `?page=<k>`, 1-based.
#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub page: Option<u32>,
}
