//! Posts: `absent -> exists -> absent`, mutable in place while they exist.
//!
//! Every successful mutation publishes a [`PostEvent`].

use postboard_core::{
  event::PostEvent,
  identity::{Identity, ensure_owner},
  page::{Page, PageRequest},
  post::{NewPost, Post, PostDraft, PostPatch},
  store::FeedStore,
  validate::Validator,
};
use uuid::Uuid;

use super::require_user;
use crate::{
  AppState,
  error::Error,
  images::{ImageSource, Upload, managed_file_name},
};

fn not_found(post_id: Uuid) -> Error {
  Error::NotFound(format!("Could not find post {post_id}"))
}

/// Validate text and image together so every failing field is reported.
fn check(draft: &PostDraft, image: &ImageSource) -> Result<(), Error> {
  let mut v = Validator::new();
  draft.check(&mut v);
  image.check(&mut v);
  Ok(v.finish()?)
}

/// A reused image url must be unreferenced or already shown by `post_id`.
async fn ensure_unclaimed<S: FeedStore>(
  state: &AppState<S>,
  image: &ImageSource,
  post_id: Option<Uuid>,
) -> Result<(), Error> {
  let ImageSource::Existing(url) = image else {
    return Ok(());
  };
  let holders = state
    .store
    .posts_with_image(url)
    .await
    .map_err(Error::store)?;
  if holders.iter().any(|id| Some(*id) != post_id) {
    tracing::debug!(image_url = %url, "image url already used by another post");
    return Err(Error::invalid("image", "Image belongs to another post"));
  }
  Ok(())
}

/// Remove `image_url` once no post shows it any more.
async fn release_image<S: FeedStore>(state: &AppState<S>, image_url: &str) {
  match state.store.posts_with_image(image_url).await {
    Ok(holders) if holders.is_empty() => state.images.clear(image_url),
    Ok(_) => tracing::debug!(image_url, "image still in use, keeping file"),
    Err(e) => {
      tracing::warn!(image_url, error = %e, "failed to check image use");
    }
  }
}

pub async fn list<S: FeedStore>(
  state: &AppState<S>,
  page: Option<u32>,
) -> Result<Page<Post>, Error> {
  let req = PageRequest::new(page, state.config.posts_per_page);
  state.store.list_posts(req).await.map_err(Error::store)
}

pub async fn get<S: FeedStore>(
  state: &AppState<S>,
  post_id: Uuid,
) -> Result<Post, Error> {
  state
    .store
    .get_post(post_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| not_found(post_id))
}

pub async fn create<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  draft: PostDraft,
  image: ImageSource,
) -> Result<Post, Error> {
  check(&draft, &image)?;
  let creator = require_user(state, identity.subject_id).await?;
  ensure_unclaimed(state, &image, None).await?;
  let uploaded = matches!(image, ImageSource::Upload(_));
  let image_url = state.images.resolve(image, None).await?;
  let (title, content) = draft.trimmed();

  let added = state
    .store
    .add_post(NewPost {
      title,
      content,
      image_url: image_url.clone(),
      creator_id: creator.user_id,
    })
    .await;
  let post = match added {
    Ok(post) => post,
    Err(e) => {
      if uploaded {
        state.images.clear(&image_url);
      }
      return Err(Error::store(e));
    }
  };
  state
    .store
    .link_post(creator.user_id, post.post_id)
    .await
    .map_err(Error::store)?;

  tracing::info!(post_id = %post.post_id, user_id = %creator.user_id, "post created");
  state.notifier.publish(PostEvent::Create(post.clone()));
  Ok(post)
}

pub async fn update<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  post_id: Uuid,
  draft: PostDraft,
  image: ImageSource,
) -> Result<Post, Error> {
  let current = get(state, post_id).await?;
  ensure_owner(current.owner_id(), identity)?;
  check(&draft, &image)?;
  ensure_unclaimed(state, &image, Some(post_id)).await?;

  let uploaded = matches!(image, ImageSource::Upload(_));
  let image_url = state
    .images
    .resolve(image, Some(&current.image_url))
    .await?;
  let (title, content) = draft.trimmed();

  let updated = state
    .store
    .update_post(post_id, PostPatch {
      title,
      content,
      image_url: image_url.clone(),
    })
    .await
    .map_err(Error::store)
    .and_then(|post| post.ok_or_else(|| not_found(post_id)));
  let post = match updated {
    Ok(post) => post,
    Err(e) => {
      if uploaded {
        state.images.clear(&image_url);
      }
      return Err(e);
    }
  };

  if post.image_url != current.image_url {
    release_image(state, &current.image_url).await;
  }

  tracing::info!(%post_id, "post updated");
  state.notifier.publish(PostEvent::Update(post.clone()));
  Ok(post)
}

/// Delete a post and return its last state.
pub async fn delete<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  post_id: Uuid,
) -> Result<Post, Error> {
  let post = get(state, post_id).await?;
  ensure_owner(post.owner_id(), identity)?;

  let removed = state
    .store
    .remove_post(post_id)
    .await
    .map_err(Error::store)?;
  if !removed {
    return Err(not_found(post_id));
  }
  state
    .store
    .unlink_post(post.owner_id(), post_id)
    .await
    .map_err(Error::store)?;
  release_image(state, &post.image_url).await;

  tracing::info!(%post_id, "post deleted");
  state.notifier.publish(PostEvent::Delete(post_id));
  Ok(post)
}

/// Store an image ahead of a post mutation and return its url.
///
/// `old_path` is removed only when it is the image of one of the caller's
/// own posts.
pub async fn upload_image<S: FeedStore>(
  state: &AppState<S>,
  identity: &Identity,
  upload: Option<Upload>,
  old_path: Option<String>,
) -> Result<String, Error> {
  let upload =
    upload.ok_or_else(|| Error::invalid("image", "No file provided"))?;
  let url = state.images.save(&upload).await?;

  if let Some(old) = old_path.filter(|p| managed_file_name(p).is_some()) {
    let own = super::users::posts_of(state, identity.subject_id).await?;
    if own.iter().any(|p| p.image_url == old) {
      state.images.clear(&old);
    } else {
      tracing::debug!(old_path = %old, "ignoring old_path not owned by caller");
    }
  }
  Ok(url)
}
