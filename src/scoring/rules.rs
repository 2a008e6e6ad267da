use std::cmp::Ordering;

use tracing::trace;

use crate::constants::{COMPOSITE_TOP_K, MAX_TOP_MATCHES, RULE_MATCH_FLOOR};

use super::types::{PreparedRule, RuleMatch, RuleScore};
use super::vector::cosine_similarity;

/// Scores document embeddings against a fixed set of prepared rules.
#[derive(Debug, Clone, Default)]
pub struct RuleScorer {
    rules: Vec<PreparedRule>,
}

impl RuleScorer {
    pub fn new(rules: Vec<PreparedRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PreparedRule] {
        &self.rules
    }

    /// Number of enabled rules with a usable embedding.
    pub fn usable_rules(&self) -> usize {
        self.rules
            .iter()
            .filter(|rule| rule.usable_embedding().is_some())
            .count()
    }

    /// Computes the composite score and the strongest matches.
    ///
    /// The composite is the mean of the top [`COMPOSITE_TOP_K`] signed
    /// contributions, sorted descending. Only the multiset of contributions
    /// matters, so the result does not depend on rule order.
    pub fn score(&self, doc_embedding: Option<&[f32]>) -> RuleScore {
        let Some(doc_embedding) = doc_embedding.filter(|e| !e.is_empty()) else {
            return RuleScore::default();
        };

        let mut contributions = Vec::with_capacity(self.rules.len());
        let mut matches = Vec::new();

        for prepared in &self.rules {
            let Some(rule_embedding) = prepared.usable_embedding() else {
                continue;
            };

            let raw_similarity = cosine_similarity(doc_embedding, rule_embedding);
            let signed_contribution = prepared.rule.polarity.sign(raw_similarity);
            contributions.push(signed_contribution);

            if raw_similarity > RULE_MATCH_FLOOR {
                matches.push(RuleMatch {
                    rule_id: prepared.rule.id.clone(),
                    tag: prepared.rule.tag.clone(),
                    raw_similarity,
                    signed_contribution,
                });
            }
        }

        if contributions.is_empty() {
            return RuleScore::default();
        }

        contributions.sort_by(|a, b| b.total_cmp(a));
        let top = &contributions[..contributions.len().min(COMPOSITE_TOP_K)];
        let composite = top.iter().sum::<f32>() / top.len() as f32;

        matches.sort_by(|a, b| {
            b.raw_similarity
                .partial_cmp(&a.raw_similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        matches.truncate(MAX_TOP_MATCHES);

        trace!(
            rules_evaluated = contributions.len(),
            composite,
            matches = matches.len(),
            "Rule scoring complete"
        );

        RuleScore {
            composite,
            matches,
            rules_evaluated: contributions.len(),
        }
    }
}
