//! `POST /graphql` — the GraphQL view of the feed.
//!
//! Resolvers call the same lifecycle handlers as the REST routes. The
//! request's [`Identity`], when the bearer credential verifies, is placed in
//! the per-request context; guarded resolvers require it.

use std::marker::PhantomData;

use async_graphql::{
  Context, EmptySubscription, ID, InputObject, Object, Schema, SimpleObject,
};
use axum::{
  Extension, Json,
  extract::State,
  http::{HeaderMap, header::AUTHORIZATION},
};
use postboard_core::{
  identity::Identity,
  post::{Author, Post, PostDraft},
  store::FeedStore,
  user::{Signup, User},
};

use crate::{
  AppState,
  auth::verify_request,
  error::Error,
  images::ImageSource,
  lifecycle::{parse_id, posts, users},
};

pub type FeedSchema<S> = Schema<QueryRoot<S>, MutationRoot<S>, EmptySubscription>;

type GqlResult<T> = async_graphql::Result<T>;

pub fn build_schema<S>() -> FeedSchema<S>
where
  S: FeedStore + Clone + 'static,
{
  Schema::build(
    QueryRoot(PhantomData),
    MutationRoot(PhantomData),
    EmptySubscription,
  )
  .finish()
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Extension(schema): Extension<FeedSchema<S>>,
  headers: HeaderMap,
  Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response>
where
  S: FeedStore + Clone + 'static,
{
  let mut request = request.data(state.clone());
  if headers.contains_key(AUTHORIZATION) {
    match verify_request(&headers, &state.tokens) {
      Ok(identity) => request = request.data(identity),
      Err(e) => tracing::debug!(error = %e, "graphql request without identity"),
    }
  }
  Json(schema.execute(request).await)
}

// ─── Context helpers ──────────────────────────────────────────────────────────

fn app<'a, S>(ctx: &Context<'a>) -> GqlResult<&'a AppState<S>>
where
  S: FeedStore + Clone + 'static,
{
  ctx.data::<AppState<S>>()
}

fn identity<'a>(ctx: &Context<'a>) -> GqlResult<&'a Identity> {
  ctx
    .data_opt::<Identity>()
    .ok_or_else(|| Error::Unauthenticated("Not authenticated").into_graphql())
}

fn gql<T>(result: Result<T, Error>) -> GqlResult<T> {
  result.map_err(Error::into_graphql)
}

// ─── Output types ─────────────────────────────────────────────────────────────

#[derive(SimpleObject)]
#[graphql(name = "Creator")]
pub struct CreatorObject {
  pub id:   ID,
  pub name: String,
}

impl From<Author> for CreatorObject {
  fn from(a: Author) -> Self {
    Self { id: ID(a.user_id.to_string()), name: a.name }
  }
}

#[derive(SimpleObject)]
#[graphql(name = "Post")]
pub struct PostObject {
  pub id:         ID,
  pub title:      String,
  pub content:    String,
  pub image_url:  String,
  pub creator:    CreatorObject,
  pub created_at: String,
  pub updated_at: String,
}

impl From<Post> for PostObject {
  fn from(p: Post) -> Self {
    Self {
      id:         ID(p.post_id.to_string()),
      title:      p.title,
      content:    p.content,
      image_url:  p.image_url,
      creator:    p.creator.into(),
      created_at: p.created_at.to_rfc3339(),
      updated_at: p.updated_at.to_rfc3339(),
    }
  }
}

#[derive(SimpleObject)]
#[graphql(name = "User")]
pub struct UserObject {
  pub id:     ID,
  pub name:   String,
  pub email:  String,
  pub status: String,
  pub posts:  Vec<PostObject>,
}

impl UserObject {
  fn new(user: User, posts: Vec<Post>) -> Self {
    Self {
      id:     ID(user.user_id.to_string()),
      name:   user.name,
      email:  user.email,
      status: user.status,
      posts:  posts.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(SimpleObject)]
pub struct AuthData {
  pub token:   String,
  pub user_id: ID,
}

#[derive(SimpleObject)]
pub struct PostData {
  pub posts:       Vec<PostObject>,
  pub total_posts: u64,
}

// ─── Input types ──────────────────────────────────────────────────────────────

#[derive(InputObject)]
pub struct UserInputData {
  pub email:    String,
  pub name:     String,
  pub password: String,
}

#[derive(InputObject)]
pub struct UserLoginData {
  pub email:    String,
  pub password: String,
}

#[derive(InputObject)]
pub struct PostInputData {
  pub title:     String,
  pub content:   String,
  pub image_url: String,
}

#[derive(InputObject)]
pub struct EditPostData {
  pub post_id:   ID,
  pub title:     String,
  pub content:   String,
  /// Omit to keep the current image.
  pub image_url: Option<String>,
}

// ─── Queries ──────────────────────────────────────────────────────────────────

pub struct QueryRoot<S>(PhantomData<S>);

#[Object(name = "RootQuery")]
impl<S> QueryRoot<S>
where
  S: FeedStore + Clone + 'static,
{
  async fn login_user(
    &self,
    ctx: &Context<'_>,
    login_input: UserLoginData,
  ) -> GqlResult<AuthData> {
    let state = app::<S>(ctx)?;
    let session = gql(
      users::login(state, &login_input.email, &login_input.password).await,
    )?;
    Ok(AuthData {
      token:   session.token,
      user_id: ID(session.user_id.to_string()),
    })
  }

  async fn get_posts(
    &self,
    ctx: &Context<'_>,
    page: Option<u32>,
  ) -> GqlResult<PostData> {
    identity(ctx)?;
    let page = gql(posts::list(app::<S>(ctx)?, page).await)?;
    Ok(PostData {
      total_posts: page.total,
      posts:       page.items.into_iter().map(Into::into).collect(),
    })
  }

  async fn get_post(&self, ctx: &Context<'_>, post_id: ID) -> GqlResult<PostObject> {
    identity(ctx)?;
    let post_id = gql(parse_id("postId", &post_id))?;
    let post = gql(posts::get(app::<S>(ctx)?, post_id).await)?;
    Ok(post.into())
  }

  async fn get_user_status(&self, ctx: &Context<'_>) -> GqlResult<UserObject> {
    let identity = identity(ctx)?;
    let state = app::<S>(ctx)?;
    let user = gql(users::me(state, identity).await)?;
    let posts = gql(users::posts_of(state, user.user_id).await)?;
    Ok(UserObject::new(user, posts))
  }
}

// ─── Mutations ────────────────────────────────────────────────────────────────

pub struct MutationRoot<S>(PhantomData<S>);

#[Object(name = "RootMutation")]
impl<S> MutationRoot<S>
where
  S: FeedStore + Clone + 'static,
{
  async fn create_user(
    &self,
    ctx: &Context<'_>,
    user_input: UserInputData,
  ) -> GqlResult<UserObject> {
    let signup = Signup {
      email:    user_input.email,
      name:     user_input.name,
      password: user_input.password,
    };
    let user = gql(users::signup(app::<S>(ctx)?, signup).await)?;
    Ok(UserObject::new(user, Vec::new()))
  }

  async fn create_post(
    &self,
    ctx: &Context<'_>,
    post_input: PostInputData,
  ) -> GqlResult<PostObject> {
    let identity = identity(ctx)?;
    let draft = PostDraft {
      title:   post_input.title,
      content: post_input.content,
    };
    let image = ImageSource::from_parts(None, Some(post_input.image_url));
    let post =
      gql(posts::create(app::<S>(ctx)?, identity, draft, image).await)?;
    Ok(post.into())
  }

  async fn edit_post(
    &self,
    ctx: &Context<'_>,
    post_input: EditPostData,
  ) -> GqlResult<PostObject> {
    let identity = identity(ctx)?;
    let post_id = gql(parse_id("postId", &post_input.post_id))?;
    let draft = PostDraft {
      title:   post_input.title,
      content: post_input.content,
    };
    let image = match post_input.image_url {
      Some(url) => ImageSource::from_parts(None, Some(url)),
      None => ImageSource::Keep,
    };
    let post = gql(
      posts::update(app::<S>(ctx)?, identity, post_id, draft, image).await,
    )?;
    Ok(post.into())
  }

  async fn delete_post(
    &self,
    ctx: &Context<'_>,
    post_id: ID,
  ) -> GqlResult<PostObject> {
    let identity = identity(ctx)?;
    let post_id = gql(parse_id("postId", &post_id))?;
    let post = gql(posts::delete(app::<S>(ctx)?, identity, post_id).await)?;
    Ok(post.into())
  }

  async fn update_status(
    &self,
    ctx: &Context<'_>,
    status_input: String,
  ) -> GqlResult<UserObject> {
    let identity = identity(ctx)?;
    let state = app::<S>(ctx)?;
    let user = gql(users::update_status(state, identity, &status_input).await)?;
    let posts = gql(users::posts_of(state, user.user_id).await)?;
    Ok(UserObject::new(user, posts))
  }
}

#[cfg(test)]
mod tests {
  use postboard_store_sqlite::SqliteStore;

  use super::*;

  #[test]
  fn schema_exposes_feed_operations() {
    let sdl = build_schema::<SqliteStore>().sdl();
    for field in [
      "loginUser",
      "getPosts",
      "getPost",
      "getUserStatus",
      "createUser",
      "createPost",
      "editPost",
      "deletePost",
      "updateStatus",
    ] {
      assert!(sdl.contains(field), "missing {field}");
    }
  }
}
