//! Prompt construction for LLM-backed oracles.

use std::fmt::Write;

use super::types::JudgmentRequest;

const MAX_ABSTRACT_CHARS: usize = 6000;

pub const SYSTEM_PROMPT: &str = "You are a meticulous research assistant screening literature \
search results. Judge whether a document is relevant to the user's topics. Respond with a \
single JSON object and nothing else.";

const RESPONSE_SHAPE: &str = r#"Respond with JSON of exactly this shape:
{
  "qualified": true | false,
  "score": <relevance from 0 to 10>,
  "probability": <probability from 0 to 10 that the document is relevant>,
  "summary": "<one or two sentences>",
  "tags": ["<short keyword>", ...],
  "entities": {"<field>": "<value>", ...}
}"#;

/// Builds the user prompt for `request`.
pub fn build_user_prompt(request: &JudgmentRequest) -> String {
    let doc = &request.document;
    let mut prompt = String::new();

    if request.topics.is_empty() {
        prompt.push_str("Topics: (none given, judge general scholarly relevance)\n\n");
    } else {
        let _ = writeln!(prompt, "Topics:");
        for topic in &request.topics {
            let _ = writeln!(prompt, "- {}", topic);
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "Title: {}", doc.title.trim());
    if !doc.authors.is_empty() {
        let _ = writeln!(prompt, "Authors: {}", doc.authors.join(", "));
    }
    if let Some(year) = doc.year {
        let _ = writeln!(prompt, "Year: {}", year);
    }
    let abstract_text: String = doc.abstract_text.trim().chars().take(MAX_ABSTRACT_CHARS).collect();
    if abstract_text.is_empty() {
        prompt.push_str("Abstract: (not available)\n");
    } else {
        let _ = writeln!(prompt, "Abstract: {}", abstract_text);
    }
    prompt.push('\n');

    if let Some(correction) = &request.correction {
        let _ = writeln!(
            prompt,
            "Note: you previously rated this document's relevance probability as 0, but it \
             already passed a semantic similarity screen against these topics (vector score \
             {:.2}, rule score {:.2}). Re-read it carefully and give a calibrated probability.",
            correction.vector_score, correction.composite_score
        );
        if !correction.previous_summary.trim().is_empty() {
            let _ = writeln!(
                prompt,
                "Your previous summary was: {}",
                correction.previous_summary.trim()
            );
        }
        prompt.push('\n');
    }

    prompt.push_str(RESPONSE_SHAPE);
    prompt
}
