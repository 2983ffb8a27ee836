//! Reachability probe primitive.
//!
//! The rest of the system consumes probing through the [`Prober`] trait: one
//! round of packets against an address, a report of sent/received counts and
//! average round-trip time, or an error. The default implementation sends
//! unprivileged ICMP echo requests via `surge-ping`; tests substitute
//! scripted implementations.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};
use thiserror::Error;

/// Outcome of one probe round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// Packets sent in this round.
    pub sent: u32,
    /// Echo replies received before their timeout.
    pub received: u32,
    /// Mean round-trip time over the received replies; zero if none arrived.
    pub avg_rtt: Duration,
}

impl ProbeReport {
    /// Packet loss in percent.
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            100.0 * f64::from(self.sent - self.received) / f64::from(self.sent)
        }
    }
}

/// Why a probe round produced no report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The target address cannot be resolved. Fatal to that host's monitor:
    /// there is no point retrying an unusable target forever.
    #[error("cannot resolve {0}")]
    Resolve(String),

    /// The probe could not be sent at all. The sample is skipped and the
    /// previous status retained.
    #[error("probe transport failure: {0}")]
    Transport(String),
}

/// One-round reachability probe with a bounded timeout.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Send `count` packets of `payload_size` bytes to `addr`, waiting at
    /// most `timeout` for each reply.
    async fn probe(
        &self,
        addr: &str,
        count: u32,
        payload_size: usize,
        timeout: Duration,
    ) -> Result<ProbeReport, ProbeError>;
}

/// ICMP echo prober over unprivileged datagram sockets.
///
/// On Linux this requires the ping group range sysctl, the same constraint
/// the CLI help text documents.
pub struct IcmpProber {
    v4: Client,
    v6: Option<Client>,
}

impl IcmpProber {
    pub fn new() -> std::io::Result<Self> {
        let v4 = Client::new(&Config::default())?;
        let v6 = match Client::new(&Config::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(error) => {
                tracing::warn!(%error, "ICMPv6 socket unavailable, IPv6 hosts cannot be probed");
                None
            }
        };
        Ok(Self { v4, v6 })
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(
        &self,
        addr: &str,
        count: u32,
        payload_size: usize,
        timeout: Duration,
    ) -> Result<ProbeReport, ProbeError> {
        let ip = resolve(addr).await?;

        let client = match ip {
            IpAddr::V4(_) => &self.v4,
            IpAddr::V6(_) => self.v6.as_ref().ok_or_else(|| {
                ProbeError::Transport("ICMPv6 socket unavailable".to_string())
            })?,
        };

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        let payload = vec![0u8; payload_size];
        let mut received = 0u32;
        let mut rtt_total = Duration::ZERO;

        for seq in 0..count {
            match pinger.ping(PingSequence(seq as u16), &payload).await {
                Ok((_, rtt)) => {
                    received += 1;
                    rtt_total += rtt;
                }
                // A lost packet is a data point, not a transport failure.
                Err(SurgeError::Timeout { .. }) => {}
                Err(error) => return Err(ProbeError::Transport(error.to_string())),
            }
        }

        let avg_rtt = if received > 0 {
            rtt_total / received
        } else {
            Duration::ZERO
        };

        Ok(ProbeReport {
            sent: count,
            received,
            avg_rtt,
        })
    }
}

/// Resolve a configured address to an IP, preferring a literal parse over a
/// DNS lookup.
async fn resolve(addr: &str) -> Result<IpAddr, ProbeError> {
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut candidates = tokio::net::lookup_host((addr, 0u16))
        .await
        .map_err(|e| ProbeError::Resolve(format!("{}: {}", addr, e)))?;

    candidates
        .next()
        .map(|socket_addr| socket_addr.ip())
        .ok_or_else(|| ProbeError::Resolve(format!("{}: no addresses", addr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_percent() {
        let full = ProbeReport {
            sent: 5,
            received: 5,
            avg_rtt: Duration::from_millis(10),
        };
        assert_eq!(full.loss_percent(), 0.0);

        let partial = ProbeReport {
            sent: 5,
            received: 3,
            avg_rtt: Duration::from_millis(10),
        };
        assert_eq!(partial.loss_percent(), 40.0);

        let degenerate = ProbeReport {
            sent: 0,
            received: 0,
            avg_rtt: Duration::ZERO,
        };
        assert_eq!(degenerate.loss_percent(), 0.0);
    }

    #[tokio::test]
    async fn test_resolve_literal_ip() {
        assert_eq!(
            resolve("127.0.0.1").await.unwrap(),
            "127.0.0.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            resolve("::1").await.unwrap(),
            "::1".parse::<IpAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_resolve_failure_is_resolve_error() {
        let err = resolve("definitely-not-a-real-host.invalid")
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Resolve(_)));
    }
}
