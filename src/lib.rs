//! Live host reachability monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!  per-host monitor tasks          status hub            stream sessions
//! ┌──────────────────────┐   ┌──────────────────┐   ┌─────────────────────┐
//! │ timer → probe →      │   │ ingest loop:     │   │ snapshot ("list")   │
//! │ classify → emit ─────┼──▶│ update table,    ├──▶│ updates ("status")  │
//! │ (one task per host)  │   │ fan out copies   │   │ keepalive, teardown │
//! └──────────────────────┘   └──────────────────┘   └─────────────────────┘
//!             ▲                        ▲                       ▲
//!             └────────────────────────┴───────────────────────┘
//!                        shutdown broadcast (lifecycle)
//! ```
//!
//! The hub exclusively owns the host table; monitors work on private copies
//! and subscribers receive independent copies. A single stop signal drains
//! the whole pipeline within a bounded grace period.

// Core subsystems
pub mod config;
pub mod hub;
pub mod monitor;

// Transport
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;

pub use config::AppConfig;
pub use http::HttpServer;
pub use hub::StatusHub;
pub use lifecycle::Shutdown;
