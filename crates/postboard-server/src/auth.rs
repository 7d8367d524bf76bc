//! Bearer-token issuance and verification, identity propagation, and
//! password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header::AUTHORIZATION, request::Parts},
  middleware::Next,
  response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use postboard_core::{identity::Identity, store::FeedStore, user::User};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::Error};

/// Lifetime of an issued token, in seconds.
pub const TOKEN_VALIDITY_SECS: i64 = 60 * 60;

const NOT_AUTHENTICATED: &str = "Not authenticated";
const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:   String,
  email: String,
  iat:   i64,
  exp:   i64,
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// Signing and verification keys derived from the configured secret.
pub struct TokenKeys {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl TokenKeys {
  pub fn new(secret: &str) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
    }
  }

  /// Sign a token for `user`, valid for [`TOKEN_VALIDITY_SECS`] from now.
  pub fn issue(&self, user: &User) -> Result<String, Error> {
    self.issue_at(user.user_id, &user.email, Utc::now())
  }

  fn issue_at(
    &self,
    subject_id: Uuid,
    email: &str,
    issued_at: DateTime<Utc>,
  ) -> Result<String, Error> {
    let expires_at = issued_at + Duration::seconds(TOKEN_VALIDITY_SECS);
    let claims = Claims {
      sub:   subject_id.to_string(),
      email: email.to_owned(),
      iat:   issued_at.timestamp(),
      exp:   expires_at.timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
  }

  /// Check signature and expiry and extract the embedded identity.
  pub fn verify(&self, token: &str) -> Result<Identity, Error> {
    let claims = decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        Error::Unauthenticated(INVALID_TOKEN)
      })?
      .claims;

    let subject_id = Uuid::parse_str(&claims.sub)
      .map_err(|_| Error::Unauthenticated(INVALID_TOKEN))?;
    let issued_at = DateTime::from_timestamp(claims.iat, 0)
      .ok_or(Error::Unauthenticated(INVALID_TOKEN))?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0)
      .ok_or(Error::Unauthenticated(INVALID_TOKEN))?;

    Ok(Identity {
      subject_id,
      email: claims.email,
      issued_at,
      expires_at,
    })
  }
}

/// The token from an `Authorization: Bearer <token>` header. The header must
/// consist of exactly two space-separated parts.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
  let value = headers
    .get(AUTHORIZATION)
    .ok_or(Error::Unauthenticated(NOT_AUTHENTICATED))?
    .to_str()
    .map_err(|_| Error::Unauthenticated(NOT_AUTHENTICATED))?;

  let mut parts = value.split(' ');
  match (parts.next(), parts.next(), parts.next()) {
    (Some(scheme), Some(token), None)
      if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
    {
      Ok(token)
    }
    _ => Err(Error::Unauthenticated(NOT_AUTHENTICATED)),
  }
}

/// Verify the bearer credential carried by `headers`.
pub fn verify_request(
  headers: &HeaderMap,
  keys: &TokenKeys,
) -> Result<Identity, Error> {
  keys.verify(bearer_token(headers)?)
}

// ─── Identity propagation ────────────────────────────────────────────────────

/// Middleware for guarded routes: verifies the credential and attaches the
/// [`Identity`] to the request before any handler runs.
pub async fn require_identity<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: FeedStore + Clone + 'static,
{
  let identity = verify_request(req.headers(), &state.tokens)?;
  req.extensions_mut().insert(identity);
  Ok(next.run(req).await)
}

/// The identity attached by [`require_identity`].
pub struct CurrentUser(pub Identity);

impl<St> FromRequestParts<St> for CurrentUser
where
  St: Send + Sync,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Identity>()
      .cloned()
      .map(CurrentUser)
      .ok_or(Error::Unauthenticated(NOT_AUTHENTICATED))
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

/// `true` when `password` matches the stored PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    tracing::warn!("stored password hash is not a valid PHC string");
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn keys() -> TokenKeys { TokenKeys::new("test-secret") }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn issued_token_round_trips_identity() {
    let keys = keys();
    let id = Uuid::new_v4();
    let now = Utc::now();
    let token = keys.issue_at(id, "a@a.com", now).unwrap();

    let identity = keys.verify(&token).unwrap();
    assert_eq!(identity.subject_id, id);
    assert_eq!(identity.email, "a@a.com");
    assert_eq!(
      identity.expires_at.timestamp() - identity.issued_at.timestamp(),
      TOKEN_VALIDITY_SECS
    );
  }

  #[test]
  fn expired_token_is_rejected() {
    let keys = keys();
    let issued = Utc::now() - Duration::seconds(TOKEN_VALIDITY_SECS + 5);
    let token = keys.issue_at(Uuid::new_v4(), "a@a.com", issued).unwrap();
    assert!(matches!(keys.verify(&token), Err(Error::Unauthenticated(_))));
  }

  #[test]
  fn foreign_signature_is_rejected() {
    let token = TokenKeys::new("other-secret")
      .issue_at(Uuid::new_v4(), "a@a.com", Utc::now())
      .unwrap();
    assert!(matches!(keys().verify(&token), Err(Error::Unauthenticated(_))));
  }

  #[test]
  fn non_uuid_subject_is_rejected() {
    let keys = keys();
    let claims = Claims {
      sub:   "not-a-uuid".into(),
      email: "a@a.com".into(),
      iat:   Utc::now().timestamp(),
      exp:   Utc::now().timestamp() + 60,
    };
    let token =
      encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
    assert!(matches!(keys.verify(&token), Err(Error::Unauthenticated(_))));
  }

  #[test]
  fn header_must_have_two_parts() {
    assert_eq!(bearer_token(&headers("Bearer abc")).unwrap(), "abc");
    assert!(bearer_token(&headers("Bearer")).is_err());
    assert!(bearer_token(&headers("abc")).is_err());
    assert!(bearer_token(&headers("Bearer a b")).is_err());
    assert!(bearer_token(&headers("Basic abc")).is_err());
    assert!(bearer_token(&HeaderMap::new()).is_err());
  }

  #[test]
  fn password_hash_verifies() {
    let hash = hash_password("secret").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secret", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("secret", "not a hash"));
  }
}
