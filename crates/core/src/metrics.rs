use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct RouterMetrics {
    utterances: AtomicU64,
    dispatched: AtomicU64,
    unknown: AtomicU64,
    blocked: AtomicU64,
    faulted: AtomicU64,
}

impl RouterMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_utterances(&self) {
        self.utterances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_faulted(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RouterMetricsSnapshot {
        RouterMetricsSnapshot {
            utterances: self.utterances.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterMetricsSnapshot {
    pub utterances: u64,
    pub dispatched: u64,
    pub unknown: u64,
    pub blocked: u64,
    pub faulted: u64,
}

impl RouterMetricsSnapshot {
    /// Share of invoked actions that completed without a fault.
    pub fn action_success_rate(&self) -> f64 {
        let invoked = self.dispatched + self.faulted;
        if invoked == 0 {
            return 1.0;
        }
        self.dispatched as f64 / invoked as f64
    }
}
