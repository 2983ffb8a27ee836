//! Host model: identity and live state of one monitored target.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::schema::{HostConfig, ProbeDefaults};

/// Reachability classification of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Online,
    Unstable,
    Offline,
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostStatus::Online => write!(f, "online"),
            HostStatus::Unstable => write!(f, "unstable"),
            HostStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Effective probe settings for one host, materialized at config load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Packets sent per probe round.
    pub count: u32,
    /// Probe packet payload size in bytes.
    pub payload_size: usize,
    /// Time between probe rounds.
    pub interval: Duration,
    /// Per-packet reply timeout.
    pub timeout: Duration,
}

/// One monitored host.
///
/// Identity (`id`, `name`, `addr`) and `probe` are immutable after load.
/// The status fields are mutated only by the hub's ingest path; monitors work
/// on their own private copies. Probe settings are never serialized to
/// clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Stable for the process lifetime, assigned in config-load order.
    pub id: u32,
    pub name: String,
    pub addr: String,
    pub status: HostStatus,
    pub status_text: String,
    /// Epoch seconds of the last status transition. Zero until the first one.
    pub status_change_time: i64,
    #[serde(skip)]
    pub probe: ProbeSettings,
}

impl Host {
    /// Materialize a runtime host record from its configuration entry.
    ///
    /// Per-host probe values that are absent or zero substitute the global
    /// defaults. Hosts start offline with an empty status text.
    pub fn from_config(id: u32, config: &HostConfig, defaults: &ProbeDefaults) -> Self {
        Self {
            id,
            name: config.name.clone(),
            addr: config.addr.clone(),
            status: HostStatus::Offline,
            status_text: String::new(),
            status_change_time: 0,
            probe: ProbeSettings {
                count: pick(config.count, defaults.count),
                payload_size: pick(config.payload_size, defaults.payload_size),
                interval: Duration::from_secs(pick(
                    config.interval_secs,
                    defaults.interval_secs,
                )),
                timeout: Duration::from_secs(pick(config.timeout_secs, defaults.timeout_secs)),
            },
        }
    }
}

/// Build the full host table from a configuration, ids in load order.
pub fn materialize_hosts(
    hosts: &[HostConfig],
    defaults: &ProbeDefaults,
) -> Vec<Host> {
    hosts
        .iter()
        .enumerate()
        .map(|(index, config)| Host::from_config(index as u32, config, defaults))
        .collect()
}

fn pick<T>(value: Option<T>, default: T) -> T
where
    T: Copy + PartialEq + From<u8>,
{
    match value {
        Some(v) if v != T::from(0u8) => v,
        _ => default,
    }
}
