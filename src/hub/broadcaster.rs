//! Broadcast Fan-out
//!
//! Delivers one message to every open connection in a registry snapshot
//! except the excluded sender. Each recipient is handled independently:
//! a closed or saturated connection is counted and logged, and the loop
//! moves on.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::connection::{ConnectionHandle, ConnectionId, Payload};
use super::registry::Registry;

/// Outcome of a single broadcast pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Recipients whose outbound queue accepted the message
    pub delivered: usize,
    /// Recipients found not open when their turn came
    pub skipped: usize,
    /// Recipients whose send failed
    pub failed: usize,
}

impl BroadcastReport {
    /// Number of recipients considered (excluded sender not counted)
    pub fn recipients(&self) -> usize {
        self.delivered + self.skipped + self.failed
    }
}

/// Cumulative counters across all broadcasts
#[derive(Debug, Default)]
pub struct BroadcastStats {
    broadcasts: AtomicU64,
    delivered: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of [`BroadcastStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub broadcasts: u64,
    pub delivered: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl BroadcastStats {
    fn record(&self, report: &BroadcastReport) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.skipped.fetch_add(report.skipped as u64, Ordering::Relaxed);
        self.failed.fetch_add(report.failed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Fans messages out to the connections held by a [`Registry`]
pub struct Broadcaster {
    registry: Arc<Registry>,
    stats: BroadcastStats,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            stats: BroadcastStats::default(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Broadcast a message to every open connection except `exclude`
    ///
    /// Connections registered after the snapshot is taken do not receive
    /// this message.
    pub async fn broadcast(&self, message: &str, exclude: Option<&ConnectionId>) -> BroadcastReport {
        let snapshot = self.registry.snapshot().await;
        self.deliver(&snapshot, Payload::from(message), exclude)
    }

    /// Relay a message received on `origin` to all of its peers
    ///
    /// Empty frames are deliberately not relayed; non-empty text is the only
    /// message rule. Delivery problems are logged only; the origin never
    /// hears about them.
    pub async fn relay_from_peer(
        &self,
        origin: &ConnectionId,
        payload: &str,
    ) -> Option<BroadcastReport> {
        if payload.is_empty() {
            tracing::debug!(connection_id = %origin, "Ignoring empty message");
            return None;
        }

        tracing::debug!(connection_id = %origin, bytes = payload.len(), "Relaying message");
        Some(self.broadcast(payload, Some(origin)).await)
    }

    /// Deliver to a previously taken snapshot
    ///
    /// Runs without holding the registry lock, so add/remove proceed while
    /// the loop is in progress.
    pub(crate) fn deliver(
        &self,
        snapshot: &[ConnectionHandle],
        payload: Payload,
        exclude: Option<&ConnectionId>,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for handle in snapshot {
            let id = handle.id();
            if exclude == Some(&id) {
                continue;
            }

            if !handle.is_open() {
                report.skipped += 1;
                continue;
            }

            match handle.send(Arc::clone(&payload)) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(connection_id = %id, error = %e, "Delivery failed");
                    report.failed += 1;
                }
            }
        }

        self.stats.record(&report);

        tracing::debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "Broadcast complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn setup(n: usize) -> (Broadcaster, Vec<(ConnectionHandle, mpsc::Receiver<Payload>)>) {
        let registry = Arc::new(Registry::new());
        let mut conns = Vec::new();
        for _ in 0..n {
            let (handle, rx) = ConnectionHandle::channel(16);
            registry.add(handle.clone()).await;
            conns.push((handle, rx));
        }
        (Broadcaster::new(registry), conns)
    }

    #[tokio::test]
    async fn test_sender_excluded_from_own_message() {
        for n in 1..=5 {
            let (broadcaster, mut conns) = setup(n).await;
            let sender = conns[0].0.id();

            let report = broadcaster.broadcast("hello", Some(&sender)).await;

            assert_eq!(report.delivered, n - 1);
            assert_eq!(report.recipients(), n - 1);
            assert!(conns[0].1.try_recv().is_err());
            for (_, rx) in conns.iter_mut().skip(1) {
                assert_eq!(&*rx.try_recv().unwrap(), "hello");
                assert!(rx.try_recv().is_err());
            }
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_exclusion_reaches_all() {
        let (broadcaster, mut conns) = setup(3).await;

        let report = broadcaster.broadcast("all", None).await;

        assert_eq!(report.delivered, 3);
        for (_, rx) in conns.iter_mut() {
            assert_eq!(&*rx.try_recv().unwrap(), "all");
        }
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let (broadcaster, _) = setup(0).await;
        let report = broadcaster.broadcast("anyone?", None).await;
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_failing_recipient_is_isolated() {
        let registry = Arc::new(Registry::new());
        let (ok_a, mut rx_a) = ConnectionHandle::channel(16);
        let (ok_b, mut rx_b) = ConnectionHandle::channel(16);
        let (stuck, _rx_stuck) = ConnectionHandle::channel(1);
        stuck.send(Payload::from("backlog")).unwrap();

        registry.add(ok_a).await;
        registry.add(stuck).await;
        registry.add(ok_b).await;
        let broadcaster = Broadcaster::new(registry);

        let report = broadcaster.broadcast("ping", None).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(&*rx_a.try_recv().unwrap(), "ping");
        assert_eq!(&*rx_b.try_recv().unwrap(), "ping");
    }

    #[tokio::test]
    async fn test_removed_mid_broadcast_is_skipped() {
        let (broadcaster, mut conns) = setup(3).await;
        let snapshot = broadcaster.registry().snapshot().await;

        let removed = conns[1].0.id();
        broadcaster.registry().remove(&removed).await;

        let report = broadcaster.deliver(&snapshot, Payload::from("late"), None);

        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);
        assert!(conns[1].1.try_recv().is_err());
        assert_eq!(&*conns[0].1.try_recv().unwrap(), "late");
        assert_eq!(&*conns[2].1.try_recv().unwrap(), "late");
    }

    #[tokio::test]
    async fn test_connection_added_after_snapshot_misses_message() {
        let (broadcaster, _conns) = setup(1).await;
        let snapshot = broadcaster.registry().snapshot().await;

        let (late, mut late_rx) = ConnectionHandle::channel(4);
        broadcaster.registry().add(late).await;

        broadcaster.deliver(&snapshot, Payload::from("before"), None);
        assert!(late_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_from_peer_ignores_empty_payload() {
        let (broadcaster, mut conns) = setup(2).await;
        let origin = conns[0].0.id();

        assert!(broadcaster.relay_from_peer(&origin, "").await.is_none());
        assert!(conns[1].1.try_recv().is_err());

        let report = broadcaster.relay_from_peer(&origin, "hi").await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(&*conns[1].1.try_recv().unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_stats_accumulate() {
        let (broadcaster, _conns) = setup(2).await;

        broadcaster.broadcast("one", None).await;
        broadcaster.broadcast("two", None).await;

        let stats = broadcaster.stats();
        assert_eq!(stats.broadcasts, 2);
        assert_eq!(stats.delivered, 4);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_concurrent_churn_during_broadcast() {
        let (broadcaster, _conns) = setup(8).await;
        let broadcaster = Arc::new(broadcaster);
        let mut tasks = Vec::new();

        for i in 0..32 {
            let broadcaster = Arc::clone(&broadcaster);
            tasks.push(tokio::spawn(async move {
                let (handle, _rx) = ConnectionHandle::channel(64);
                let id = handle.id();
                broadcaster.registry().add(handle).await;
                broadcaster.broadcast(&format!("msg {}", i), Some(&id)).await;
                broadcaster.registry().remove(&id).await;
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(broadcaster.registry().len().await, 8);
        assert_eq!(broadcaster.stats().broadcasts, 32);
    }
}
