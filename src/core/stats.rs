use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    processed: u64,
    success: u64,
    failure: u64,
}

/// Running totals shared between the processing worker and stats readers.
/// The three values are updated together, so a snapshot always satisfies
/// `processed == success + failure`.
#[derive(Debug, Default)]
pub struct ProcessorCounters {
    counts: Mutex<Counts>,
}

/// What the status surface reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub processed_messages: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub is_running: bool,
}

impl ProcessorCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new processed total.
    pub fn record_success(&self) -> u64 {
        self.update(|c| c.success += 1)
    }

    /// Returns the new processed total.
    pub fn record_failure(&self) -> u64 {
        self.update(|c| c.failure += 1)
    }

    pub fn snapshot(&self, is_running: bool) -> StatsSnapshot {
        let c = *self.counts.lock().unwrap_or_else(|e| e.into_inner());
        StatsSnapshot {
            processed_messages: c.processed,
            success_count: c.success,
            failure_count: c.failure,
            is_running,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Counts)) -> u64 {
        let mut c = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut c);
        c.processed += 1;
        c.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero() {
        let counters = ProcessorCounters::new();
        assert_eq!(
            counters.snapshot(false),
            StatsSnapshot {
                processed_messages: 0,
                success_count: 0,
                failure_count: 0,
                is_running: false,
            }
        );
    }

    #[test]
    fn processed_tracks_both_outcomes() {
        let counters = ProcessorCounters::new();
        counters.record_success();
        counters.record_failure();
        assert_eq!(counters.record_success(), 3);
        let snap = counters.snapshot(true);
        assert_eq!(snap.processed_messages, 3);
        assert_eq!(snap.success_count, 2);
        assert_eq!(snap.failure_count, 1);
        assert!(snap.is_running);
    }

    #[test]
    fn concurrent_updates_not_lost() {
        let counters = Arc::new(ProcessorCounters::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if i % 2 == 0 {
                            counters.record_success();
                        } else {
                            counters.record_failure();
                        }
                        let snap = counters.snapshot(true);
                        assert_eq!(snap.processed_messages, snap.success_count + snap.failure_count);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = counters.snapshot(false);
        assert_eq!(snap.processed_messages, 4000);
        assert_eq!(snap.success_count, 2000);
        assert_eq!(snap.failure_count, 2000);
    }
}
