//! Per-document qualification.
//!
//! [`DecisionEngine`] combines pre-filter scores, the running [`CycleState`] and
//! the speedup policy to pick a terminal [`QualificationOutcome`], calling the
//! judgment oracle only when neither the fast path nor fail-fast applies.
//!
//! The engine never holds state of its own: the caller passes the current
//! [`CycleState`] in and commits the returned one only once a document is
//! finalized, so a cancelled judgment leaves no trace.

pub mod control;
pub mod engine;
pub mod judgment;
pub mod outcome;
pub mod state;

#[cfg(test)]
mod tests;

pub use control::{OperatorAction, OperatorCommand, OperatorControl, OverrideInbox, operator_channel};
pub use engine::{Classification, Decision, DecisionEngine, EngineSignal, JudgmentContext};
pub use judgment::{JudgmentResolution, race_judgment};
pub use outcome::{QualificationOutcome, RejectReason};
pub use state::{CycleState, YieldSnapshot};

/// Returned when cooperative cancellation interrupts a document before it is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("qualification cancelled")]
pub struct Cancelled;
