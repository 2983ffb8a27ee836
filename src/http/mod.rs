//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → websocket.rs (upgrade, per-session streaming protocol)
//! ```

pub mod auth;
pub mod server;
pub mod websocket;

pub use server::{AppState, HttpServer, WS_PATH};
pub use websocket::StreamMessage;
