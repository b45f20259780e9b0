#[cfg(test)]
mod tests {
    use crate::cluster::types::NodeId;
    use crate::metrics::recorder::{Metrics, PeerOutcome};
    use std::time::Duration;

    #[test]
    fn test_operation_counters_accumulate() {
        let metrics = Metrics::new();

        metrics.record_read(Duration::from_millis(5), true);
        metrics.record_read(Duration::from_millis(7), false);
        metrics.record_write(Duration::from_millis(3), true);
        metrics.record_delete(Duration::from_millis(2), false);
        metrics.record_conflict();
        metrics.record_read_repair(true);
        metrics.record_read_repair(false);
        metrics.record_dropped_repair();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.operations.reads, 2);
        assert_eq!(snapshot.operations.writes, 1);
        assert_eq!(snapshot.operations.deletes, 1);
        assert_eq!(snapshot.operations.conflicts_returned, 1);
        assert_eq!(snapshot.operations.read_repairs, 1);
        assert_eq!(snapshot.operations.read_repair_failures, 1);
        assert_eq!(snapshot.operations.dropped_repairs, 1);
        // One read and one delete quorum failure.
        assert_eq!(snapshot.operations.quorum_failures, 2);
    }

    #[test]
    fn test_quorum_rates() {
        let metrics = Metrics::new();

        for _ in 0..3 {
            metrics.record_write(Duration::from_millis(1), true);
        }
        metrics.record_write(Duration::from_millis(1), false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.quorum.write_successes, 3);
        assert_eq!(snapshot.quorum.write_failures, 1);
        assert!((snapshot.quorum.write_success_rate - 0.75).abs() < f64::EPSILON);
        // No reads recorded: the rate must not divide by zero.
        assert_eq!(snapshot.quorum.read_success_rate, 0.0);
    }

    #[test]
    fn test_latency_stats_over_window() {
        let metrics = Metrics::new();

        for ms in 1..=100u64 {
            metrics.record_read(Duration::from_millis(ms), true);
        }

        let stats = metrics.snapshot().latency_ms.read;
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert!((stats.avg - 50.5).abs() < 0.001);
        assert_eq!(stats.p95, 96.0);
    }

    #[test]
    fn test_empty_latency_stats_are_zero() {
        let metrics = Metrics::new();
        let stats = metrics.snapshot().latency_ms.delete;

        assert_eq!(stats.avg, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.p95, 0.0);
    }

    #[test]
    fn test_peer_health_rates() {
        let metrics = Metrics::new();
        let peer = NodeId("127.0.0.1:5002".to_string());

        metrics.record_peer_response(&peer, PeerOutcome::Success);
        metrics.record_peer_response(&peer, PeerOutcome::Success);
        metrics.record_peer_response(&peer, PeerOutcome::Timeout);
        metrics.record_peer_response(&peer, PeerOutcome::Failure);

        let snapshot = metrics.snapshot();
        let health = &snapshot.peer_health["127.0.0.1:5002"];

        assert_eq!(health.total_requests, 4);
        assert_eq!(health.successes, 2);
        assert_eq!(health.timeouts, 1);
        assert!((health.success_rate - 0.5).abs() < f64::EPSILON);
        assert!((health.timeout_rate - 0.25).abs() < f64::EPSILON);
    }
}
