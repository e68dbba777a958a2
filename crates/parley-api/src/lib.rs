//! Parley API crate - HTTP surface of the chat server.
//!
//! Provides the axum router, bearer-session authentication, rate
//! limiting, and all endpoint handlers including the SSE chat stream.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod throttle;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
