//! Error taxonomy shared by the REST routes and GraphQL resolvers, with its
//! [`axum::response::IntoResponse`] implementation.

use async_graphql::ErrorExtensions;
use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use postboard_core::validate::FieldError;
use serde_json::json;
use thiserror::Error;

/// The message every internal failure is reported with.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthenticated: {0}")]
  Unauthenticated(&'static str),

  #[error("forbidden")]
  Forbidden,

  #[error("{message}")]
  InvalidInput {
    message: String,
    fields:  Vec<FieldError>,
  },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  /// Box a backend error. Usable directly as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }

  /// A single-field validation failure.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    let message = message.into();
    Error::InvalidInput {
      fields:  vec![FieldError {
        field:   field.to_owned(),
        message: message.clone(),
      }],
      message,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Store(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// The message shown to the client. Internal failures are logged here and
  /// replaced by [`INTERNAL_MESSAGE`].
  fn public_message(&self) -> String {
    match self {
      Error::Unauthenticated(m) => (*m).to_owned(),
      Error::Forbidden => "Not authorized".to_owned(),
      Error::InvalidInput { message, .. } => message.clone(),
      Error::NotFound(m) => m.clone(),
      Error::Store(_) | Error::Internal(_) => {
        tracing::error!(error = %self, "request failed");
        INTERNAL_MESSAGE.to_owned()
      }
    }
  }

  /// Convert into a GraphQL error carrying `extensions.code` and, for
  /// invalid input, `extensions.data`.
  pub fn into_graphql(self) -> async_graphql::Error {
    let code = i32::from(self.status().as_u16());
    let data = match &self {
      Error::InvalidInput { fields, .. } => async_graphql::to_value(fields).ok(),
      _ => None,
    };
    async_graphql::Error::new(self.public_message()).extend_with(|_, ext| {
      ext.set("code", code);
      if let Some(data) = data {
        ext.set("data", data);
      }
    })
  }
}

impl From<postboard_core::Error> for Error {
  fn from(e: postboard_core::Error) -> Self {
    match e {
      postboard_core::Error::Forbidden { subject_id } => {
        tracing::debug!(%subject_id, "ownership check failed");
        Error::Forbidden
      }
      postboard_core::Error::Validation(fields) => Error::InvalidInput {
        message: "Validation failed, entered data is incorrect".to_owned(),
        fields,
      },
    }
  }
}

impl From<JsonRejection> for Error {
  fn from(e: JsonRejection) -> Self { Error::invalid("body", e.body_text()) }
}

impl From<QueryRejection> for Error {
  fn from(e: QueryRejection) -> Self { Error::invalid("query", e.body_text()) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = self.public_message();
    let body = match self {
      Error::InvalidInput { fields, .. } => {
        json!({ "message": message, "data": fields })
      }
      _ => json!({ "message": message }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn body_json(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn store_failure_hides_details() {
    let err = Error::store(std::io::Error::other("disk on fire"));
    let res = err.into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(res).await, json!({ "message": INTERNAL_MESSAGE }));
  }

  #[tokio::test]
  async fn invalid_input_lists_fields() {
    let res = Error::invalid("image", "No image provided").into_response();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
      body_json(res).await,
      json!({
        "message": "No image provided",
        "data": [{ "field": "image", "message": "No image provided" }],
      })
    );
  }

  #[test]
  fn core_errors_map_to_taxonomy() {
    let forbidden: Error = postboard_core::Error::Forbidden {
      subject_id: uuid::Uuid::new_v4(),
    }
    .into();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let invalid: Error = postboard_core::Error::Validation(vec![]).into();
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[test]
  fn graphql_error_carries_code() {
    let err = Error::NotFound("Could not find post".into()).into_graphql();
    assert_eq!(err.message, "Could not find post");
    let ext = err.extensions.expect("extensions");
    assert_eq!(ext.get("code"), Some(&async_graphql::Value::from(404)));
  }
}
