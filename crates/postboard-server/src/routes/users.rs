//! Handlers for account endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `PUT`   | `/auth/signup` | Body: `{"email", "name", "password"}` |
//! | `POST`  | `/auth/login`  | Body: `{"email", "password"}` |
//! | `GET`   | `/feed/status` | The caller's status |
//! | `PATCH` | `/feed/status` | Body: `{"status"}` |
//! | `GET`   | `/chat/users`  | Optional `?page=k` |

use axum::{
  extract::State,
  http::StatusCode,
};
use postboard_core::{
  store::FeedStore,
  user::{Signup, User, UserSummary},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiJson, ApiQuery, PageParams, Reply};
use crate::{AppState, auth::CurrentUser, error::Error, lifecycle::users};

// ─── Signup / login ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SignupReply {
  pub message: &'static str,
  pub user:    User,
}

/// `PUT /auth/signup`
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<Signup>,
) -> Result<Reply<SignupReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let user = users::signup(&state, body).await?;
  Ok(
    Reply::new(SignupReply { message: "User created", user })
      .status(StatusCode::CREATED),
  )
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginReply {
  pub token:   String,
  pub user_id: Uuid,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<LoginBody>,
) -> Result<Reply<LoginReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let session = users::login(&state, &body.email, &body.password).await?;
  Ok(Reply::new(LoginReply {
    token:   session.token,
    user_id: session.user_id,
  }))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `GET /feed/status`
pub async fn get_status<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
) -> Result<Reply<StatusBody>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let user = users::me(&state, &identity).await?;
  Ok(Reply::new(StatusBody { status: user.status }))
}

/// `PATCH /feed/status`
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  ApiJson(body): ApiJson<StatusBody>,
) -> Result<Reply<StatusBody>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let user = users::update_status(&state, &identity, &body.status).await?;
  Ok(Reply::new(StatusBody { status: user.status }))
}

// ─── Directory ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UsersReply {
  pub users:       Vec<UserSummary>,
  pub total_items: u64,
}

/// `GET /chat/users[?page=k]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Reply<UsersReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let page = users::list(&state, params.page).await?;
  Ok(Reply::new(UsersReply {
    users:       page.items,
    total_items: page.total,
  }))
}
