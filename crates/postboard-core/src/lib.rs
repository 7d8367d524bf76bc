//! Core types and trait definitions for the Postboard feed service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod chat;
pub mod error;
pub mod event;
pub mod identity;
pub mod page;
pub mod post;
pub mod store;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
