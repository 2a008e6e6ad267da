//! Cross-cutting, shared constants.
//!
//! The scoring constants below are fixed: they were tuned against real search
//! traffic and are intentionally not exposed through [`crate::config`].

use std::time::Duration;

/// Raw similarity a rule must exceed to be recorded as a [`crate::RuleMatch`].
pub const RULE_MATCH_FLOOR: f32 = 0.35;

/// Number of strongest signed contributions averaged into the composite score.
pub const COMPOSITE_TOP_K: usize = 6;

/// Maximum number of rule matches kept per document.
pub const MAX_TOP_MATCHES: usize = 3;

/// Upper bound of the oracle's score and probability scale.
pub const ORACLE_SCALE_MAX: f32 = 10.0;

/// Oracle score at or above which a document qualifies regardless of the oracle's boolean.
pub const ORACLE_SCORE_OVERRIDE: f32 = 5.0;

/// Default for the probability leg of the qualification override.
pub const DEFAULT_PROBABILITY_MIN: f32 = 5.0;

pub const DEFAULT_VECTOR_MIN: f32 = 0.45;
pub const DEFAULT_COMPOSITE_MIN: f32 = 0.40;

pub const DEFAULT_SAMPLE_SIZE: u32 = 10;
pub const DEFAULT_TARGET_QUALIFY_RATE: f32 = 0.5;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_RECORD_LIMIT: usize = 500;

/// Documents embedded concurrently per chunk.
pub const DEFAULT_EMBED_CHUNK_SIZE: usize = 5;
pub const DEFAULT_EMBED_CHUNK_DELAY: Duration = Duration::from_millis(200);

/// Ceiling for a single judgment call before it is treated as failed.
pub const DEFAULT_JUDGMENT_TIMEOUT: Duration = Duration::from_secs(45);

/// Upper bound on operator-requested retries of one document's judgment.
pub const MAX_OPERATOR_RETRIES: u32 = 3;

pub const DEFAULT_SOURCE_RETRIES: usize = 3;
pub const DEFAULT_SOURCE_BACKOFF: Duration = Duration::from_millis(750);

/// Capacity of the pipeline event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum entries held by the embedding cache.
pub const EMBEDDING_CACHE_CAPACITY: u64 = 10_000;
