use serde::{Deserialize, Serialize};

use crate::document::Embedding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Whether a rule's similarity counts for or against a document.
pub enum RulePolarity {
    /// Similarity contributes positively.
    Requirement,
    /// Similarity is negated.
    Penalty,
}

impl RulePolarity {
    /// Applies the polarity to a raw similarity.
    pub fn sign(&self, raw_similarity: f32) -> f32 {
        match self {
            RulePolarity::Requirement => raw_similarity,
            RulePolarity::Penalty => -raw_similarity,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A configured semantic rule. Immutable for the duration of a query.
pub struct SemanticRule {
    pub id: String,
    /// Natural-language statement that gets embedded.
    pub text: String,
    pub polarity: RulePolarity,
    /// Free-form grouping label surfaced in matches.
    #[serde(default)]
    pub tag: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SemanticRule {
    pub fn requirement(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            polarity: RulePolarity::Requirement,
            tag: String::new(),
            enabled: true,
        }
    }

    pub fn penalty(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            polarity: RulePolarity::Penalty,
            ..Self::requirement(id, text)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A rule paired with its precomputed embedding (absent if embedding failed).
pub struct PreparedRule {
    pub rule: SemanticRule,
    pub embedding: Option<Embedding>,
}

impl PreparedRule {
    pub fn new(rule: SemanticRule, embedding: Option<Embedding>) -> Self {
        Self { rule, embedding }
    }

    /// Returns the embedding if the rule is enabled and has a non-empty vector.
    pub fn usable_embedding(&self) -> Option<&[f32]> {
        if !self.rule.enabled {
            return None;
        }
        self.embedding
            .as_deref()
            .filter(|embedding| !embedding.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Explainability record for a rule that clearly matched a document.
pub struct RuleMatch {
    pub rule_id: String,
    pub tag: String,
    pub raw_similarity: f32,
    pub signed_contribution: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Output of [`crate::RuleScorer::score`].
pub struct RuleScore {
    /// Mean of the strongest signed contributions (0 when nothing was evaluated).
    pub composite: f32,
    /// Matches above the relevance floor, highest raw similarity first.
    pub matches: Vec<RuleMatch>,
    /// Number of rules that produced a contribution.
    pub rules_evaluated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Per-document scores and pre-filter verdicts.
pub struct ScoreResult {
    /// Cosine similarity between query and document.
    pub vector_score: f32,
    pub composite_score: f32,
    /// At most three matches, highest raw similarity first.
    pub top_matches: Vec<RuleMatch>,
    pub passed_vector_filter: bool,
    pub passed_composite_filter: bool,
}

impl ScoreResult {
    /// Builds a score result and applies the pre-filter thresholds.
    ///
    /// Without usable rules the composite is 0 and is compared like any other
    /// value, so a non-positive `composite_min` still passes it.
    pub fn evaluate(
        vector_score: f32,
        rule_score: RuleScore,
        vector_min: f32,
        composite_min: f32,
    ) -> Self {
        Self {
            vector_score,
            composite_score: rule_score.composite,
            top_matches: rule_score.matches,
            passed_vector_filter: vector_score >= vector_min,
            passed_composite_filter: rule_score.composite >= composite_min,
        }
    }

    /// The pre-filter: either threshold is enough.
    pub fn passed(&self) -> bool {
        self.passed_vector_filter || self.passed_composite_filter
    }
}
