//! Handlers for `/feed` post endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/feed/posts`      | Optional `?page=k`, newest first |
//! | `POST`   | `/feed/post`       | Multipart: `title`, `content`, `image` |
//! | `GET`    | `/feed/post/{id}`  | 404 if not found |
//! | `PUT`    | `/feed/post/{id}`  | Multipart: `title`, `content`, `image` or `image_url` |
//! | `DELETE` | `/feed/post/{id}`  | Owner only |
//! | `PUT`    | `/feed/post-image` | Multipart: `image`, optional `old_path` |

use axum::{
  extract::{Multipart, Path, State, multipart::MultipartError},
  http::StatusCode,
};
use postboard_core::{
  post::{Post, PostDraft},
  store::FeedStore,
};
use serde::Serialize;

use super::{ApiQuery, PageParams, Reply};
use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  images::{ImageSource, Upload},
  lifecycle::{parse_id, posts},
};

// ─── Multipart ────────────────────────────────────────────────────────────────

/// Fields accepted by the post and image forms. Unknown fields are ignored.
#[derive(Debug, Default)]
struct PostForm {
  title:     String,
  content:   String,
  image:     Option<Upload>,
  image_url: Option<String>,
  old_path:  Option<String>,
}

impl PostForm {
  async fn read(mut multipart: Multipart) -> Result<Self, Error> {
    let mut form = Self::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
      let name = field.name().unwrap_or_default().to_owned();
      match name.as_str() {
        "title" => form.title = field.text().await.map_err(bad_body)?,
        "content" => form.content = field.text().await.map_err(bad_body)?,
        "image_url" => {
          form.image_url = Some(field.text().await.map_err(bad_body)?)
        }
        "old_path" => {
          form.old_path = Some(field.text().await.map_err(bad_body)?)
        }
        "image" => {
          let content_type = field.content_type().map(str::to_owned);
          let bytes = field.bytes().await.map_err(bad_body)?;
          if !bytes.is_empty() {
            form.image = Some(Upload { content_type, bytes });
          }
        }
        _ => {}
      }
    }
    Ok(form)
  }

  fn into_parts(self) -> (PostDraft, ImageSource) {
    let draft = PostDraft { title: self.title, content: self.content };
    (draft, ImageSource::from_parts(self.image, self.image_url))
  }
}

fn bad_body(e: MultipartError) -> Error {
  Error::invalid("body", e.body_text())
}

// ─── List / read ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PostsReply {
  pub posts:       Vec<Post>,
  pub total_items: u64,
}

/// `GET /feed/posts[?page=k]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Reply<PostsReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let page = posts::list(&state, params.page).await?;
  Ok(Reply::new(PostsReply {
    posts:       page.items,
    total_items: page.total,
  }))
}

#[derive(Debug, Serialize)]
pub struct PostReply {
  pub message: &'static str,
  pub post:    Post,
}

/// `GET /feed/post/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Reply<PostReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let post = posts::get(&state, parse_id("post_id", &id)?).await?;
  Ok(Reply::new(PostReply { message: "Post fetched", post }))
}

// ─── Mutations ────────────────────────────────────────────────────────────────

/// `POST /feed/post`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  multipart: Multipart,
) -> Result<Reply<PostReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let (draft, image) = PostForm::read(multipart).await?.into_parts();
  let post = posts::create(&state, &identity, draft, image).await?;
  Ok(
    Reply::new(PostReply { message: "Post created", post })
      .status(StatusCode::CREATED),
  )
}

/// `PUT /feed/post/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  Path(id): Path<String>,
  multipart: Multipart,
) -> Result<Reply<PostReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let post_id = parse_id("post_id", &id)?;
  let (draft, image) = PostForm::read(multipart).await?.into_parts();
  let post = posts::update(&state, &identity, post_id, draft, image).await?;
  Ok(Reply::new(PostReply { message: "Post updated", post }))
}

#[derive(Debug, Serialize)]
pub struct DeleteReply {
  pub message: &'static str,
  pub post_id: uuid::Uuid,
}

/// `DELETE /feed/post/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  Path(id): Path<String>,
) -> Result<Reply<DeleteReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let post = posts::delete(&state, &identity, parse_id("post_id", &id)?).await?;
  Ok(Reply::new(DeleteReply {
    message: "Post deleted",
    post_id: post.post_id,
  }))
}

#[derive(Debug, Serialize)]
pub struct ImageReply {
  pub message:   &'static str,
  pub file_path: String,
}

/// `PUT /feed/post-image`
pub async fn upload_image<S>(
  State(state): State<AppState<S>>,
  CurrentUser(identity): CurrentUser,
  multipart: Multipart,
) -> Result<Reply<ImageReply>, Error>
where
  S: FeedStore + Clone + 'static,
{
  let form = PostForm::read(multipart).await?;
  let file_path =
    posts::upload_image(&state, &identity, form.image, form.old_path).await?;
  Ok(
    Reply::new(ImageReply { message: "File stored", file_path })
      .status(StatusCode::CREATED),
  )
}
