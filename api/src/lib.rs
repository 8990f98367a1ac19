//! # Warden API
//!
//! HTTP surface of the Warden token lifecycle: access-control middleware,
//! the `/api/v1/auth` routes and the application factory.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use app::{configure, create_app};
pub use routes::AppState;
