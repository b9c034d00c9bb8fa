//! HTTP API Layer
//!
//! Liveness endpoint of the Homewatch daemon: `GET /status`.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use handler::build_router;
pub use server::{StatusServer, StatusServerConfig};
