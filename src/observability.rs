use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Lifecycle transition counters
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    pub transitions_committed: AtomicU64,
    pub invalid_transitions: AtomicU64,
    pub precondition_failures: AtomicU64,
    pub stale_conflicts: AtomicU64,
    pub sweep_escalations: AtomicU64,
}

impl LifecycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&self) {
        self.transitions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.invalid_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_precondition_failure(&self) {
        self.precondition_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_conflict(&self) {
        self.stale_conflicts.fetch_add(1, Ordering::Relaxed);
        warn!("Transition lost a concurrent update race");
    }

    pub fn record_sweep_escalation(&self) {
        self.sweep_escalations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> LifecycleStats {
        LifecycleStats {
            transitions_committed: self.transitions_committed.load(Ordering::Relaxed),
            invalid_transitions: self.invalid_transitions.load(Ordering::Relaxed),
            precondition_failures: self.precondition_failures.load(Ordering::Relaxed),
            stale_conflicts: self.stale_conflicts.load(Ordering::Relaxed),
            sweep_escalations: self.sweep_escalations.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Lifecycle metrics: committed={}, invalid={}, precondition_failures={}, stale={}, escalations={}",
            stats.transitions_committed,
            stats.invalid_transitions,
            stats.precondition_failures,
            stats.stale_conflicts,
            stats.sweep_escalations
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleStats {
    pub transitions_committed: u64,
    pub invalid_transitions: u64,
    pub precondition_failures: u64,
    pub stale_conflicts: u64,
    pub sweep_escalations: u64,
}

/// Global metrics instance
static LIFECYCLE_METRICS: std::sync::LazyLock<LifecycleMetrics> =
    std::sync::LazyLock::new(LifecycleMetrics::new);

pub fn lifecycle_metrics() -> &'static LifecycleMetrics {
    &LIFECYCLE_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
