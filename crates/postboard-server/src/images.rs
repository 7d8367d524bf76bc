//! Uploaded image files.
//!
//! Images live flat in one directory under fresh UUID names and are referred
//! to as `images/<file>`. Removal is best-effort: failures are logged and
//! never reach the client.

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

use bytes::Bytes;
use postboard_core::validate::Validator;
use uuid::Uuid;

use crate::error::Error;

/// URL prefix under which stored images are served.
pub const URL_PREFIX: &str = "images";

const UNSUPPORTED_TYPE: &str = "Image must be a png, jpg or jpeg file";

/// File extension for an accepted image MIME type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
  match content_type {
    "image/png" => Some("png"),
    "image/jpg" => Some("jpg"),
    "image/jpeg" => Some("jpeg"),
    _ => None,
  }
}

/// The bare file name of a managed `images/<file>` url, or `None` if the url
/// could point anywhere else.
pub fn managed_file_name(image_url: &str) -> Option<&str> {
  let name = image_url
    .trim_start_matches('/')
    .strip_prefix(URL_PREFIX)?
    .strip_prefix('/')?;
  let safe = !name.is_empty()
    && !name.starts_with('.')
    && !name.contains(['/', '\\']);
  safe.then_some(name)
}

/// An image file received in a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

impl Upload {
  fn extension(&self) -> Option<&'static str> {
    self.content_type.as_deref().and_then(extension_for)
  }
}

/// Where a post's image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
  /// A new file to store.
  Upload(Upload),
  /// A url previously returned by the image upload route.
  Existing(String),
  /// Leave the post's current image in place.
  Keep,
  Missing,
}

impl ImageSource {
  /// Pick an upload over a url; a blank url counts as missing.
  pub fn from_parts(upload: Option<Upload>, image_url: Option<String>) -> Self {
    match (upload, image_url) {
      (Some(upload), _) => ImageSource::Upload(upload),
      (None, Some(url)) if !url.trim().is_empty() => ImageSource::Existing(url),
      _ => ImageSource::Missing,
    }
  }

  /// Record image problems into `v` without touching the filesystem.
  pub fn check(&self, v: &mut Validator) {
    match self {
      ImageSource::Upload(upload) if upload.extension().is_none() => {
        v.push("image", UNSUPPORTED_TYPE);
      }
      ImageSource::Existing(url) if managed_file_name(url).is_none() => {
        v.push("image", "Image must be a previously uploaded image path");
      }
      ImageSource::Missing => {
        v.push("image", "No image provided");
      }
      _ => {}
    }
  }
}

// ─── Storage ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ImageStore {
  dir: Arc<PathBuf>,
}

impl ImageStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: Arc::new(dir.into()) }
  }

  pub fn dir(&self) -> &Path { &self.dir }

  /// Create the directory if needed.
  pub async fn init(&self) -> io::Result<()> {
    tokio::fs::create_dir_all(self.dir.as_path()).await
  }

  /// Write `upload` under a fresh name and return its `images/<file>` url.
  pub async fn save(&self, upload: &Upload) -> Result<String, Error> {
    let ext = upload
      .extension()
      .ok_or_else(|| Error::invalid("image", UNSUPPORTED_TYPE))?;
    let file = format!("{}.{ext}", Uuid::new_v4());
    let path = self.dir.join(&file);
    tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
      Error::Internal(format!("failed to write {}: {e}", path.display()))
    })?;
    tracing::debug!(%file, bytes = upload.bytes.len(), "stored image");
    Ok(format!("{URL_PREFIX}/{file}"))
  }

  /// Resolve `src` to a file url, storing it first if it is an upload.
  /// `Keep` resolves to `current`.
  pub async fn resolve(
    &self,
    src: ImageSource,
    current: Option<&str>,
  ) -> Result<String, Error> {
    match src {
      ImageSource::Upload(upload) => self.save(&upload).await,
      ImageSource::Existing(url) => Ok(url),
      ImageSource::Keep => current
        .map(str::to_owned)
        .ok_or_else(|| Error::invalid("image", "No image provided")),
      ImageSource::Missing => Err(Error::invalid("image", "No image provided")),
    }
  }

  /// Delete the file behind `image_url`. Returns `false` if the url is not a
  /// managed image or the file was already gone.
  pub async fn remove(&self, image_url: &str) -> io::Result<bool> {
    let Some(name) = managed_file_name(image_url) else {
      tracing::warn!(image_url, "refusing to remove image outside images dir");
      return Ok(false);
    };
    match tokio::fs::remove_file(self.dir.join(name)).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }

  /// Remove `image_url` on a detached task.
  pub fn clear(&self, image_url: &str) {
    let store = self.clone();
    let image_url = image_url.to_owned();
    tokio::spawn(async move {
      if let Err(e) = store.remove(&image_url).await {
        tracing::warn!(%image_url, error = %e, "failed to remove image");
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn upload(content_type: &str) -> Upload {
    Upload {
      content_type: Some(content_type.into()),
      bytes:        Bytes::from_static(b"\x89PNG fake"),
    }
  }

  #[test]
  fn only_managed_urls_resolve() {
    assert_eq!(managed_file_name("images/a.png"), Some("a.png"));
    assert_eq!(managed_file_name("/images/a.png"), Some("a.png"));
    assert_eq!(managed_file_name("images/../secret"), None);
    assert_eq!(managed_file_name("images/.hidden"), None);
    assert_eq!(managed_file_name("images/"), None);
    assert_eq!(managed_file_name("other/a.png"), None);
    assert_eq!(managed_file_name("imagesa.png"), None);
  }

  #[test]
  fn source_checks() {
    let failures = |src: ImageSource| {
      let mut v = Validator::new();
      src.check(&mut v);
      !v.is_empty()
    };
    assert!(!failures(ImageSource::Upload(upload("image/png"))));
    assert!(failures(ImageSource::Upload(upload("text/plain"))));
    assert!(!failures(ImageSource::Existing("images/a.png".into())));
    assert!(failures(ImageSource::Existing("/etc/passwd".into())));
    assert!(failures(ImageSource::Missing));
    assert!(!failures(ImageSource::Keep));
  }

  #[test]
  fn upload_wins_over_url() {
    let src = ImageSource::from_parts(
      Some(upload("image/jpeg")),
      Some("images/a.png".into()),
    );
    assert!(matches!(src, ImageSource::Upload(_)));
    assert!(matches!(
      ImageSource::from_parts(None, Some("  ".into())),
      ImageSource::Missing
    ));
  }

  #[tokio::test]
  async fn save_then_remove() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());

    let url = store.save(&upload("image/png")).await.unwrap();
    assert!(url.starts_with("images/") && url.ends_with(".png"));
    let name = managed_file_name(&url).unwrap();
    assert!(dir.path().join(name).exists());

    assert!(store.remove(&url).await.unwrap());
    assert!(!dir.path().join(name).exists());
    assert!(!store.remove(&url).await.unwrap());
  }

  #[tokio::test]
  async fn save_rejects_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());
    let err = store.save(&upload("image/gif")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
  }

  #[tokio::test]
  async fn remove_refuses_paths_outside_dir() {
    let dir = tempfile::tempdir().unwrap();
    let outside = dir.path().join("keep.txt");
    std::fs::write(&outside, b"x").unwrap();

    let store = ImageStore::new(dir.path().join("images"));
    assert!(!store.remove("images/../keep.txt").await.unwrap());
    assert!(outside.exists());
  }
}
