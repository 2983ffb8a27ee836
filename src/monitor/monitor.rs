//! Per-host probing loop.
//!
//! # Responsibilities
//! - Wake on a per-host interval and run one probe round
//! - Classify the result into a status
//! - Emit a record onto the shared channel per the configured policy
//! - Exit on the shutdown broadcast

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::config::UpdatePolicy;
use crate::hub::{Host, HostStatus};
use crate::monitor::prober::{ProbeError, ProbeReport, Prober};

/// Classify one probe report.
///
/// `None` means the sample is skipped: nothing was sent, so nothing can be
/// concluded and the previous status stands.
pub fn classify(report: &ProbeReport) -> Option<HostStatus> {
    if report.sent == 0 {
        None
    } else if report.received == 0 {
        Some(HostStatus::Offline)
    } else if report.received < report.sent {
        Some(HostStatus::Unstable)
    } else {
        Some(HostStatus::Online)
    }
}

fn status_text(addr: &str, report: &ProbeReport, elapsed: Duration) -> String {
    format!(
        "ping {}: {} packets transmitted, {} received, {:.2}% packet loss, time {:?}, avg rtt {:?}",
        addr,
        report.sent,
        report.received,
        report.loss_percent(),
        round_to_millis(elapsed),
        round_to_millis(report.avg_rtt),
    )
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}

fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// One probing task.
///
/// Owns a private working copy of its host record; the hub's shared table is
/// never touched from here. Records flow out through the shared channel only.
pub struct HostMonitor {
    host: Host,
    prober: Arc<dyn Prober>,
    policy: UpdatePolicy,
    records: mpsc::Sender<Host>,
}

impl HostMonitor {
    pub fn new(
        host: Host,
        prober: Arc<dyn Prober>,
        policy: UpdatePolicy,
        records: mpsc::Sender<Host>,
    ) -> Self {
        Self {
            host,
            prober,
            policy,
            records,
        }
    }

    /// Run until the stop signal fires, the hub goes away, or the host's
    /// address turns out to be unusable.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.host.probe.interval);
        // A probe round can outlast the interval; don't burst afterwards.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sample().await {
                        Ok(Some(record)) => {
                            // Blocking send: brief hub backpressure stalls
                            // this monitor, nothing else.
                            if self.records.send(record).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(error) => {
                            tracing::error!(
                                host = %self.host.name,
                                addr = %self.host.addr,
                                %error,
                                "unusable address, monitor stopping"
                            );
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::debug!(host = %self.host.name, "host monitor stopped");
    }

    /// One probe round. `Err` is the per-host fatal case.
    async fn sample(&mut self) -> Result<Option<Host>, ProbeError> {
        let started = Instant::now();
        let outcome = self
            .prober
            .probe(
                &self.host.addr,
                self.host.probe.count,
                self.host.probe.payload_size,
                self.host.probe.timeout,
            )
            .await;

        match outcome {
            Ok(report) => Ok(self.observe(&report, started.elapsed(), epoch_seconds())),
            Err(error @ ProbeError::Resolve(_)) => Err(error),
            Err(ProbeError::Transport(reason)) => {
                tracing::warn!(
                    host = %self.host.name,
                    addr = %self.host.addr,
                    error = %reason,
                    "probe skipped"
                );
                Ok(None)
            }
        }
    }

    /// Apply one classified report to the private state.
    ///
    /// The status text is recomputed on every classified sample; the change
    /// time moves only on an actual transition. Returns the record to emit,
    /// if the policy calls for one.
    fn observe(&mut self, report: &ProbeReport, elapsed: Duration, now: i64) -> Option<Host> {
        let new_status = classify(report)?;

        self.host.status_text = status_text(&self.host.addr, report, elapsed);

        let changed = new_status != self.host.status;
        if changed {
            self.host.status = new_status;
            self.host.status_change_time = now;
        }

        if changed || self.policy == UpdatePolicy::All {
            Some(self.host.clone())
        } else {
            None
        }
    }
}
