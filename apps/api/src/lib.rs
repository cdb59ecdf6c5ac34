//! Parley API library
//!
//! Exposes the realtime core, its HTTP surface and configuration for the
//! binary, integration tests, and any service embedding the hub.

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod websocket;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use services::NotificationService;
pub use websocket::{Notifier, RealtimeHub};
