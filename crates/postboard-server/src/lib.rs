//! HTTP surface of Postboard: REST routes, GraphQL endpoint, and the
//! websocket stream of post events.
//!
//! Exposes an axum [`Router`] backed by any [`FeedStore`].

pub mod auth;
pub mod config;
pub mod error;
pub mod graphql;
pub mod images;
pub mod lifecycle;
pub mod notify;
pub mod routes;

pub use config::ServerConfig;
pub use error::Error;

use std::sync::Arc;

use axum::{
  Extension, Json, Router,
  extract::DefaultBodyLimit,
  http::{Method, header},
  middleware,
  routing::{get, post, put},
};
use postboard_core::store::FeedStore;
use serde_json::{Value, json};
use tower_http::{
  cors::{Any, CorsLayer},
  services::ServeDir,
  trace::TraceLayer,
};

use auth::TokenKeys;
use images::ImageStore;
use notify::ChangeNotifier;
use routes::{chat, feed, users, ws};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers and resolvers.
#[derive(Clone)]
pub struct AppState<S: FeedStore> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub tokens:   Arc<TokenKeys>,
  pub notifier: ChangeNotifier,
  pub images:   ImageStore,
}

impl<S: FeedStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig, notifier: ChangeNotifier) -> Self {
    Self {
      store: Arc::new(store),
      tokens: Arc::new(TokenKeys::new(&config.jwt_secret)),
      images: ImageStore::new(config.images_dir.clone()),
      notifier,
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: FeedStore + Clone + 'static,
{
  let guarded = Router::new()
    // Feed
    .route("/feed/posts", get(feed::list::<S>))
    .route("/feed/post", post(feed::create::<S>))
    .route(
      "/feed/post/{id}",
      get(feed::get_one::<S>)
        .put(feed::update::<S>)
        .delete(feed::delete::<S>),
    )
    .route("/feed/post-image", put(feed::upload_image::<S>))
    .route(
      "/feed/status",
      get(users::get_status::<S>).patch(users::update_status::<S>),
    )
    // Chat
    .route("/chat/users", get(users::list::<S>))
    .route("/chat/{recipient_id}", get(chat::open::<S>))
    .route("/chat/send-message/{chat_id}", post(chat::send::<S>))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_identity::<S>,
    ));

  Router::new()
    .route("/health", get(health))
    .route("/auth/signup", put(users::signup::<S>))
    .route("/auth/login", post(users::login::<S>))
    .route("/graphql", post(graphql::handler::<S>))
    .route("/ws", get(ws::handler::<S>))
    .merge(guarded)
    .nest_service("/images", ServeDir::new(state.images.dir()))
    .layer(Extension(graphql::build_schema::<S>()))
    .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
    .layer(cors())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

fn cors() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::PATCH,
      Method::DELETE,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
