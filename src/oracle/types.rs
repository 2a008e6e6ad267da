use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::ORACLE_SCALE_MAX;
use crate::document::Document;

/// Maps a raw oracle number onto the `[0, 10]` scale.
///
/// Values in `(0, 1]` are read as 0..1-normalized and scaled by ten. Everything
/// is then clamped; non-finite values become `0`.
pub fn normalize_scale(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let scaled = if value > 0.0 && value <= 1.0 {
        value * ORACLE_SCALE_MAX
    } else {
        value
    };
    scaled.clamp(0.0, ORACLE_SCALE_MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// What the oracle said about a document.
pub struct OracleVerdict {
    /// The oracle's own boolean. Advisory only.
    pub qualified: bool,
    /// Relevance score in `[0, 10]`.
    pub score: f32,
    /// Probability of relevance in `[0, 10]`.
    pub probability: f32,
    pub summary: String,
    pub tags: Vec<String>,
    /// Extracted entity fields (population, method, ...), free-form.
    pub entities: BTreeMap<String, String>,
}

impl OracleVerdict {
    pub fn new(qualified: bool, score: f32, probability: f32) -> Self {
        Self {
            qualified,
            score,
            probability,
            summary: String::new(),
            tags: Vec::new(),
            entities: BTreeMap::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Returns a copy with `score` and `probability` on the `[0, 10]` scale.
    pub fn normalized(mut self) -> Self {
        self.score = normalize_scale(self.score);
        self.probability = normalize_scale(self.probability);
        self
    }

    /// Qualification rule: the oracle's boolean, or either number clears its bar.
    ///
    /// The boolean alone under-reports positives, so numeric evidence overrides it.
    pub fn qualifies(&self, score_min: f32, probability_min: f32) -> bool {
        self.qualified || self.score >= score_min || self.probability >= probability_min
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Context for the single corrective re-query.
pub struct CorrectionContext {
    pub vector_score: f32,
    pub composite_score: f32,
    /// Summary the oracle gave alongside its zero probability.
    pub previous_summary: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Input to [`crate::JudgmentOracle::judge`].
pub struct JudgmentRequest {
    pub document: Document,
    pub topics: Vec<String>,
    /// Set when re-asking after a contradictory zero probability.
    pub correction: Option<CorrectionContext>,
}

impl JudgmentRequest {
    pub fn new(document: Document, topics: Vec<String>) -> Self {
        Self {
            document,
            topics,
            correction: None,
        }
    }

    /// Same document and topics, amended with the contradiction.
    pub fn corrective(&self, context: CorrectionContext) -> Self {
        Self {
            document: self.document.clone(),
            topics: self.topics.clone(),
            correction: Some(context),
        }
    }

    pub fn is_corrective(&self) -> bool {
        self.correction.is_some()
    }
}
