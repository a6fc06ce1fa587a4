//! HTTP route handlers.
//!
//! Each submodule exposes typed Rocket handlers annotated with `#[openapi]`
//! so `rocket_okapi` can derive an OpenAPI document automatically. The
//! multipart upload handler is left out of the document.

pub mod catchers;
pub mod health;
pub mod send;
pub mod upload;
