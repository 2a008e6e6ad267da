//! Query orchestration and the result feed.
//!
//! [`Orchestrator`] pages through a [`crate::CandidateSource`], embeds and
//! scores each document, hands it to the [`crate::DecisionEngine`] and writes
//! the finalized [`QualificationRecord`] to a [`ResultSink`]. Progress is
//! broadcast on an [`EventBus`].

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod sink;
pub mod types;


pub use error::{PipelineError, SinkError};
pub use events::{EventBus, PipelineEvent, spawn_event_logger};
pub use orchestrator::Orchestrator;
pub use sink::{ChannelSink, MemorySink, ResultSink};
pub use types::{QualificationRecord, QueryRequest, QuerySummary, QueryTermination};
