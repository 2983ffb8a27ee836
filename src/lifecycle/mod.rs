//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     first SIGTERM/SIGINT → Shutdown::trigger (graceful stop)
//!     second SIGTERM/SIGINT → forced process exit
//!
//! Shutdown (shutdown.rs):
//!     broadcast stop signal → monitors stop probing,
//!     hub stops ingesting, listener stops accepting and drains
//! ```
//!
//! Ordered shutdown: stop producers, stop accepting, drain within the grace
//! period, exit. Drain overrun is reported with a non-zero exit code.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
