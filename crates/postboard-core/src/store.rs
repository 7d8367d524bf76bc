//! The `FeedStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `postboard-store-sqlite`).
//! The server depends on this abstraction, not on any concrete backend.
//!
//! Each method is a single persistence step. Multi-step operations (save a
//! post, then link it into its creator's list) are composed by callers and are
//! not atomic.

use std::future::Future;

use uuid::Uuid;

use crate::{
  chat::{Chat, NewMessage},
  page::{Page, PageRequest},
  post::{NewPost, Post, PostPatch},
  user::{NewUser, User, UserCredentials, UserSummary},
};

/// Abstraction over a Postboard storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FeedStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user with the default status.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by (normalised) email.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + 'a;

  /// One page of the user directory, oldest accounts first.
  fn list_users(
    &self,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<UserSummary>, Self::Error>> + Send + '_;

  /// Replace a user's status. Returns `None` if the user does not exist.
  fn set_status(
    &self,
    id: Uuid,
    status: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Append `post_id` to the user's own post list.
  fn link_post(
    &self,
    user_id: Uuid,
    post_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove `post_id` from the user's post list; a missing link is not an
  /// error.
  fn unlink_post(
    &self,
    user_id: Uuid,
    post_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user's post list, in link order.
  fn user_post_ids(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Persist a new post. Fails if the creator does not exist.
  fn add_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// One page of all posts, newest first.
  fn list_posts(
    &self,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Post>, Self::Error>> + Send + '_;

  /// Replace the mutable fields of a post and bump `updated_at`.
  /// Returns `None` if the post does not exist.
  fn update_post(
    &self,
    id: Uuid,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Delete a post. Returns `false` if it did not exist.
  fn remove_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Ids of the posts whose image is `image_url`.
  fn posts_with_image<'a>(
    &'a self,
    image_url: &'a str,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;

  // ── Chats ─────────────────────────────────────────────────────────────

  /// The chat between `a` and `b`, in either order.
  fn find_chat(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<Option<Chat>, Self::Error>> + Send + '_;

  /// Create an empty chat between `a` and `b`.
  fn add_chat(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<Chat, Self::Error>> + Send + '_;

  /// Append `chat_id` to the user's chat list.
  fn link_chat(
    &self,
    user_id: Uuid,
    chat_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_chat(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Chat>, Self::Error>> + Send + '_;

  /// Append a message and return the updated chat. Returns `None` if the chat
  /// does not exist.
  fn append_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Option<Chat>, Self::Error>> + Send + '_;
}
