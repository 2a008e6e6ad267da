use serde::{Deserialize, Serialize};

/// Running statistics for one query execution.
///
/// Reset for every query and owned by the orchestrator. Counters only move
/// forward; `qualified` never decrements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    pub(crate) processed: u32,
    pub(crate) qualified: u32,
    pub(crate) speedup_locked: bool,
    pub(crate) fail_fast_triggered: bool,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-filtered documents seen so far.
    pub fn processed(&self) -> u32 {
        self.processed
    }

    pub fn qualified(&self) -> u32 {
        self.qualified
    }

    pub fn is_speedup_locked(&self) -> bool {
        self.speedup_locked
    }

    pub fn is_fail_fast_triggered(&self) -> bool {
        self.fail_fast_triggered
    }

    /// `qualified / processed`, or `0` before anything was processed.
    pub fn current_yield(&self) -> f32 {
        if self.processed == 0 {
            0.0
        } else {
            self.qualified as f32 / self.processed as f32
        }
    }

    pub fn snapshot(&self) -> YieldSnapshot {
        YieldSnapshot {
            processed: self.processed,
            qualified: self.qualified,
            yield_rate: self.current_yield(),
            speedup_locked: self.speedup_locked,
            fail_fast_triggered: self.fail_fast_triggered,
        }
    }

    pub(crate) fn record_processed(&mut self) {
        self.processed = self.processed.saturating_add(1);
    }

    pub(crate) fn record_qualified(&mut self) {
        self.qualified = self.qualified.saturating_add(1);
    }
}

/// Immutable view of [`CycleState`] taken after a document is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldSnapshot {
    pub processed: u32,
    pub qualified: u32,
    pub yield_rate: f32,
    pub speedup_locked: bool,
    pub fail_fast_triggered: bool,
}
