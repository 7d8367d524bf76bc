//! Accounts: signup, login, the user directory, and status.

use postboard_core::{
  identity::Identity,
  page::{Page, PageRequest},
  post::Post,
  store::FeedStore,
  user::{NewUser, Signup, User, UserSummary},
  validate::{Validator, normalize_email},
};
use uuid::Uuid;

use super::require_user;
use crate::{
  AppState,
  auth::{hash_password, verify_password},
  error::Error,
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
  pub token:   String,
  pub user_id: Uuid,
}

/// Create an account. Emails are normalised and must be unique.
pub async fn signup<S: FeedStore>(
  state: &AppState<S>,
  input: Signup,
) -> Result<User, Error> {
  input.validate()?;
  let email = input.normalized_email();

  let existing = state
    .store
    .find_credentials(&email)
    .await
    .map_err(Error::store)?;
  if existing.is_some() {
    return Err(Error::invalid("email", "E-mail address already exists"));
  }

  let user = state
    .store
    .add_user(NewUser {
      email,
      name: input.name.trim().to_owned(),
      password_hash: hash_password(&input.password)?,
    })
    .await
    .map_err(Error::store)?;
  tracing::info!(user_id = %user.user_id, "user signed up");
  Ok(user)
}

/// Check a password and issue a bearer token. Unknown emails and wrong
/// passwords fail identically.
pub async fn login<S: FeedStore>(
  state: &AppState<S>,
  email: &str,
  password: &str,
) -> Result<Session, Error> {
  let email = normalize_email(email);
  let creds = state
    .store
    .find_credentials(&email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthenticated(BAD_CREDENTIALS))?;

  if !verify_password(password, &creds.password_hash) {
    tracing::debug!(user_id = %creds.user.user_id, "wrong password");
    return Err(Error::Unauthenticated(BAD_CREDENTIALS));
  }

  let token = state.tokens.issue(&creds.user)?;
  Ok(Session { token, user_id: creds.user.user_id })
}

pub async fn list<S: FeedStore>(
  state: &AppState<S>,
  page: Option<u32>,
) -> Result<Page<UserSummary>, Error> {
  let req = PageRequest::new(page, state.config.users_per_page);
  state.store.list_users(req).await.map_err(Error::store)
}

/// The caller's own account.
pub async fn me<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
) -> Result<User, Error> {
  require_user(state, identity.subject_id).await
}

pub async fn update_status<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  status: &str,
) -> Result<User, Error> {
  let mut v = Validator::new();
  v.non_empty("status", status, "Status must not be empty");
  v.finish()?;

  state
    .store
    .set_status(identity.subject_id, status.trim().to_owned())
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("Could not find user".to_owned()))
}

/// The user's posts in link order. Links whose post has gone are skipped.
pub async fn posts_of<S: FeedStore>(
  state: &AppState<S>,
  user_id: Uuid,
) -> Result<Vec<Post>, Error> {
  let ids = state
    .store
    .user_post_ids(user_id)
    .await
    .map_err(Error::store)?;
  let mut posts = Vec::with_capacity(ids.len());
  for id in ids {
    if let Some(post) = state.store.get_post(id).await.map_err(Error::store)? {
      posts.push(post);
    }
  }
  Ok(posts)
}
