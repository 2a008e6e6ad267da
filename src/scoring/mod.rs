//! Vector and semantic-rule scoring.
//!
//! - [`vector`] computes cosine similarity between embeddings.
//! - [`rules`] folds a weighted rule set into a single composite score.
//!
//! Both are pure: absent embeddings score zero instead of failing, so a broken
//! embedding call can never abort a document or a query.

pub mod rules;
pub mod types;
pub mod vector;


pub use rules::RuleScorer;
pub use types::{PreparedRule, RuleMatch, RulePolarity, RuleScore, ScoreResult, SemanticRule};
pub use vector::cosine_similarity;
