//! Therapist API crate - axum HTTP server and route handlers.
//!
//! Exposes the chat relay (`POST /chat`), a greeting root, health, and
//! session inspection endpoints.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
