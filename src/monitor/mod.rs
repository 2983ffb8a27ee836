//! Host monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Per-host timer
//!     → prober.rs (one round of probe packets, bounded timeout)
//!     → monitor.rs (classify, update private state, emission policy)
//!     → shared record channel
//!     → hub ingest loop
//! ```
//!
//! Exactly one monitor task owns probing for a given host id. The shared
//! record channel is never closed by the monitors; the hub stops reading on
//! the shutdown broadcast, and a monitor whose send fails knows the hub is
//! gone and exits.

pub mod monitor;
pub mod prober;

pub use monitor::{classify, HostMonitor};
pub use prober::{IcmpProber, ProbeError, ProbeReport, Prober};

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::UpdatePolicy;
use crate::hub::Host;
use crate::lifecycle::Shutdown;

/// Capacity of the shared record channel. Sized to absorb a burst from many
/// monitors ticking together while the hub drains continuously.
pub const RECORD_CHANNEL_CAPACITY: usize = 16;

/// Spawn one monitor task per host and return the shared record channel's
/// receiving end, for the hub's ingest loop.
pub fn spawn_monitors(
    hosts: Vec<Host>,
    prober: Arc<dyn Prober>,
    policy: UpdatePolicy,
    shutdown: &Shutdown,
) -> mpsc::Receiver<Host> {
    let (records_tx, records_rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);

    for host in hosts {
        let monitor = HostMonitor::new(host, Arc::clone(&prober), policy, records_tx.clone());
        tokio::spawn(monitor.run(shutdown.subscribe()));
    }

    records_rx
}
