//! Status hub subsystem.
//!
//! # Data Flow
//! ```text
//! HostMonitor records (shared channel)
//!     → run loop (single reader)
//!     → ingest: update host table, then copy record to every subscriber queue
//!
//! StreamSession
//!     → subscribe: point-in-time snapshot + bounded record queue
//!     → detach (idempotent, also performed by the subscription guard on drop)
//! ```
//!
//! The host table and the subscriber table live behind one mutex. Nothing
//! slow ever runs under it: probes happen in monitor tasks, transport writes
//! in session tasks, and fan-out uses non-blocking sends.

pub mod host;

pub use host::{materialize_hosts, Host, HostStatus, ProbeSettings};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Capacity of each subscriber queue. Sized for bursts of a few updates;
/// a subscriber that falls further behind loses updates rather than
/// throttling its siblings.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 32;

/// Authoritative registry of current host states.
///
/// Exclusive owner of the host table after startup: monitors emit records,
/// only `ingest` mutates the table, subscribers receive copies.
pub struct StatusHub {
    inner: Mutex<HubInner>,
}

struct HubInner {
    hosts: Vec<Host>,
    subscribers: HashMap<u64, mpsc::Sender<Host>>,
    next_subscription_id: u64,
}

impl StatusHub {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                hosts,
                subscribers: HashMap::new(),
                next_subscription_id: 0,
            }),
        }
    }

    /// Independent copy of the full host table, consistent at a single point
    /// in time.
    pub fn snapshot(&self) -> Vec<Host> {
        self.inner.lock().unwrap().hosts.clone()
    }

    /// Register a subscriber queue.
    ///
    /// The snapshot carried by the returned subscription is taken under the
    /// same lock as the registration, so no update delivered to the queue is
    /// ever also visible in the snapshot.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_subscription_id;
        inner.next_subscription_id += 1;
        inner.subscribers.insert(id, tx);
        let hosts = inner.hosts.clone();
        drop(inner);

        tracing::debug!(subscription = id, "subscriber attached");

        Subscription {
            id,
            hosts,
            rx,
            hub: Arc::clone(self),
        }
    }

    /// Remove a subscriber queue. Removing an unknown id is a no-op.
    pub fn unsubscribe(&self, id: u64) {
        if self.inner.lock().unwrap().subscribers.remove(&id).is_some() {
            tracing::debug!(subscription = id, "subscriber detached");
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }

    /// Merge one emitted record into the table and fan it out.
    ///
    /// Only the status fields of the table entry are overwritten; identity
    /// and probe settings are untouched. Sends to subscriber queues never
    /// block: a queue that is full or already gone is skipped.
    pub fn ingest(&self, record: Host) {
        let mut inner = self.inner.lock().unwrap();

        if let Some(host) = inner.hosts.iter_mut().find(|h| h.id == record.id) {
            host.status = record.status;
            host.status_text = record.status_text.clone();
            host.status_change_time = record.status_change_time;
        }

        tracing::info!(
            host = %record.name,
            addr = %record.addr,
            status = %record.status,
            "status update"
        );

        for (id, queue) in &inner.subscribers {
            match queue.try_send(record.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscription = id,
                        host = %record.name,
                        "subscriber queue full, dropping update"
                    );
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Drive ingestion until the stop signal fires or all monitors are gone.
    ///
    /// The shared record channel is never closed by senders; the stop
    /// broadcast is authoritative. On exit the subscriber table is cleared so
    /// every session observes its queue closing, and the record receiver is
    /// dropped so any monitor blocked on a send unblocks with an error.
    pub async fn run(
        self: Arc<Self>,
        mut records: mpsc::Receiver<Host>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                record = records.recv() => match record {
                    Some(record) => self.ingest(record),
                    // Every monitor is gone; keep serving snapshots from the
                    // last known state until told to stop.
                    None => {
                        let _ = shutdown.recv().await;
                        break;
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        let mut inner = self.inner.lock().unwrap();
        let dropped = inner.subscribers.len();
        inner.subscribers.clear();
        tracing::info!(subscribers = dropped, "status hub stopped");
    }
}

/// One live subscriber registration.
///
/// Holds the point-in-time snapshot taken at attach and the receiving end of
/// the record queue. Detaches from the hub exactly once: explicitly via
/// [`Subscription::detach`] or implicitly on drop.
pub struct Subscription {
    id: u64,
    hosts: Vec<Host>,
    rx: mpsc::Receiver<Host>,
    hub: Arc<StatusHub>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Host table as it was at subscribe time.
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// Next broadcast record; `None` once the hub has shut down or this
    /// subscription was detached.
    pub async fn recv(&mut self) -> Option<Host> {
        self.rx.recv().await
    }

    /// Remove this subscription from the hub. Safe to call more than once.
    pub fn detach(&self) {
        self.hub.unsubscribe(self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HostConfig, ProbeDefaults};
    use crate::hub::host::materialize_hosts;

    fn test_hosts(count: usize) -> Vec<Host> {
        let configs: Vec<HostConfig> = (0..count)
            .map(|i| HostConfig {
                name: format!("host-{}", i),
                addr: format!("10.0.0.{}", i + 1),
                count: None,
                payload_size: None,
                interval_secs: None,
                timeout_secs: None,
            })
            .collect();
        materialize_hosts(&configs, &ProbeDefaults::default())
    }

    fn record_for(hub: &StatusHub, id: u32, status: HostStatus, change_time: i64) -> Host {
        let mut record = hub
            .snapshot()
            .into_iter()
            .find(|h| h.id == id)
            .unwrap();
        record.status = status;
        record.status_text = format!("probe says {}", status);
        record.status_change_time = change_time;
        record
    }

    #[test]
    fn test_ingest_overwrites_status_fields_only() {
        let hub = Arc::new(StatusHub::new(test_hosts(2)));

        let mut record = record_for(&hub, 1, HostStatus::Online, 42);
        record.name = "impostor".to_string();
        hub.ingest(record);

        let table = hub.snapshot();
        assert_eq!(table[1].status, HostStatus::Online);
        assert_eq!(table[1].status_change_time, 42);
        // Identity is never taken from a record.
        assert_eq!(table[1].name, "host-1");
        assert_eq!(table[0].status, HostStatus::Offline);
    }

    #[tokio::test]
    async fn test_snapshot_taken_at_subscribe_time() {
        let hub = Arc::new(StatusHub::new(test_hosts(1)));

        let mut subscription = hub.subscribe();
        hub.ingest(record_for(&hub, 0, HostStatus::Online, 7));

        // The pre-update snapshot, and the update only on the queue.
        assert_eq!(subscription.hosts()[0].status, HostStatus::Offline);
        let update = subscription.recv().await.unwrap();
        assert_eq!(update.status, HostStatus::Online);
    }

    #[tokio::test]
    async fn test_subscribers_see_same_order() {
        let hub = Arc::new(StatusHub::new(test_hosts(1)));
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        for (status, t) in [
            (HostStatus::Online, 1),
            (HostStatus::Unstable, 2),
            (HostStatus::Offline, 3),
        ] {
            hub.ingest(record_for(&hub, 0, status, t));
        }

        for subscription in [&mut first, &mut second] {
            let mut seen = Vec::new();
            for _ in 0..3 {
                seen.push(subscription.recv().await.unwrap().status);
            }
            assert_eq!(
                seen,
                vec![HostStatus::Online, HostStatus::Unstable, HostStatus::Offline]
            );
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_final() {
        let hub = Arc::new(StatusHub::new(test_hosts(1)));
        let mut subscription = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        subscription.detach();
        subscription.detach();
        assert_eq!(hub.subscriber_count(), 0);

        // Ingest after detach: skipped for this queue, no panic, no delivery.
        hub.ingest(record_for(&hub, 0, HostStatus::Online, 1));
        assert!(subscription.recv().await.is_none());
    }

    #[test]
    fn test_drop_detaches() {
        let hub = Arc::new(StatusHub::new(test_hosts(1)));
        let subscription = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_for_that_subscriber_only() {
        let hub = Arc::new(StatusHub::new(test_hosts(1)));
        let mut slow = hub.subscribe();
        let mut live = hub.subscribe();

        let total = SUBSCRIBER_QUEUE_CAPACITY + 5;
        for t in 0..total {
            hub.ingest(record_for(&hub, 0, HostStatus::Online, t as i64));
            // Keep the live subscriber drained so its queue never fills.
            assert!(live.recv().await.is_some());
        }

        // The slow subscriber kept only what its queue could hold.
        let mut delivered = 0;
        while slow.rx.try_recv().is_ok() {
            delivered += 1;
        }
        assert_eq!(delivered, SUBSCRIBER_QUEUE_CAPACITY);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_and_closes_queues() {
        let hub = Arc::new(StatusHub::new(test_hosts(1)));
        let (records_tx, records_rx) = mpsc::channel(4);
        let (stop_tx, _) = broadcast::channel(1);

        let mut subscription = hub.subscribe();
        let task = tokio::spawn(Arc::clone(&hub).run(records_rx, stop_tx.subscribe()));

        let record = record_for(&hub, 0, HostStatus::Online, 1);
        records_tx.send(record).await.unwrap();
        assert_eq!(
            subscription.recv().await.unwrap().status,
            HostStatus::Online
        );

        stop_tx.send(()).unwrap();
        task.await.unwrap();

        // Queue closed by the hub clearing its subscriber table.
        assert!(subscription.recv().await.is_none());
        // Further sends fail: the hub dropped the record receiver.
        let leftover = record_for(&hub, 0, HostStatus::Offline, 2);
        assert!(records_tx.send(leftover).await.is_err());
    }
}
