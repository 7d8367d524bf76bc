//! Resource lifecycle handlers shared by the REST routes and the GraphQL
//! resolvers.
//!
//! Each function takes the application state and, where the operation is
//! guarded, the caller's [`Identity`](postboard_core::identity::Identity).
//! Multi-step operations are composed from single store calls and are not
//! atomic.

pub mod chats;
pub mod posts;
pub mod users;

use postboard_core::{store::FeedStore, user::User};
use uuid::Uuid;

use crate::{AppState, error::Error};

/// Load a user the caller refers to, mapping absence to `NotFound`.
pub(crate) async fn require_user<S: FeedStore>(
  state: &AppState<S>,
  user_id: Uuid,
) -> Result<User, Error> {
  state
    .store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("Could not find user".to_owned()))
}

/// Parse a client-supplied id; malformed ids are invalid input.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, Error> {
  Uuid::parse_str(raw.trim())
    .map_err(|_| Error::invalid(field, format!("Invalid {field}")))
}
