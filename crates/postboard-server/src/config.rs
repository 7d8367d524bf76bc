//! Runtime configuration, read from a TOML file layered with `POSTBOARD_*`
//! environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default = "default_images_dir")]
  pub images_dir:       PathBuf,
  /// HMAC secret for bearer tokens.
  pub jwt_secret:       String,
  #[serde(default = "default_page_size")]
  pub posts_per_page:   u32,
  #[serde(default = "default_page_size")]
  pub users_per_page:   u32,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("postboard.db") }
fn default_images_dir() -> PathBuf { PathBuf::from("images") }
fn default_page_size() -> u32 { 2 }
fn default_max_upload_bytes() -> usize { 8 * 1024 * 1024 }

impl ServerConfig {
  /// Read `path` (if it exists) and apply environment overrides.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("POSTBOARD"))
      .build()?
      .try_deserialize()
  }

  /// A configuration with defaults everywhere except the secret.
  pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      images_dir:       default_images_dir(),
      jwt_secret:       jwt_secret.into(),
      posts_per_page:   default_page_size(),
      users_per_page:   default_page_size(),
      max_upload_bytes: default_max_upload_bytes(),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
      file,
      "port = 9000\njwt_secret = \"s3cret\"\nposts_per_page = 10"
    )
    .unwrap();

    let cfg = ServerConfig::load(file.path()).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.jwt_secret, "s3cret");
    assert_eq!(cfg.posts_per_page, 10);
    assert_eq!(cfg.users_per_page, 2);
    assert_eq!(cfg.images_dir, PathBuf::from("images"));
  }

  #[test]
  fn missing_secret_is_an_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "port = 9000").unwrap();
    assert!(ServerConfig::load(file.path()).is_err());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/feed.db")),
      PathBuf::from(home).join("data/feed.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}
