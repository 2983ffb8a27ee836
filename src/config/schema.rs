//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the monitoring server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Global probe defaults, applied to hosts without overrides.
    pub probe: ProbeDefaults,

    /// Streaming session settings.
    pub stream: StreamConfig,

    /// Shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Monitored host definitions.
    pub hosts: Vec<HostConfig>,

    /// Optional basic-auth credential list. Empty list disables auth.
    pub basic_auth: Vec<BasicAuthCredentials>,
}

impl AppConfig {
    /// True if at least one credential pair is configured.
    pub fn has_basic_auth(&self) -> bool {
        !self.basic_auth.is_empty()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Global probe defaults.
///
/// Per-host values of zero (or absent) substitute these.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeDefaults {
    /// Packets sent per probe round.
    pub count: u32,

    /// Probe packet payload size in bytes.
    pub payload_size: usize,

    /// Seconds between probe rounds.
    pub interval_secs: u64,

    /// Per-packet reply timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeDefaults {
    fn default() -> Self {
        Self {
            count: 1,
            payload_size: 64,
            interval_secs: 1,
            timeout_secs: 1,
        }
    }
}

/// Streaming session settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Seconds of session silence before a keepalive ping frame.
    pub keepalive_secs: u64,

    /// When monitors emit records: on status changes only, or every sample.
    pub updates: UpdatePolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: 10,
            updates: UpdatePolicy::Changes,
        }
    }
}

/// Record emission policy for host monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Emit a record only when the classified status differs from the last.
    #[default]
    Changes,
    /// Emit a record for every classified sample.
    All,
}

/// Shutdown settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Seconds allowed for in-flight work to drain after the stop signal.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 5 }
    }
}

/// One monitored host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Display name.
    pub name: String,

    /// Address to probe: an IP or a resolvable hostname.
    pub addr: String,

    /// Per-host override of `probe.count`.
    #[serde(default)]
    pub count: Option<u32>,

    /// Per-host override of `probe.payload_size`.
    #[serde(default)]
    pub payload_size: Option<usize>,

    /// Per-host override of `probe.interval_secs`.
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Per-host override of `probe.timeout_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// One basic-auth credential pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}
