//! Cheap extractive summary: leading sentences plus the most frequent
//! identifiers, bounded by a target length.

use serde_json::{json, Value};

use agrama_core::errors::AgramaResult;

use super::Transform;

const DEFAULT_MAX_CHARS: usize = 240;

pub struct GenerateSummary;

impl Transform for GenerateSummary {
    fn name(&self) -> &'static str {
        "generate_summary"
    }

    fn apply(&self, data: &str, options: &Value) -> AgramaResult<Value> {
        let max_chars = options
            .get("max_chars")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_CHARS);

        let trimmed = data.trim();
        if trimmed.is_empty() {
            return Ok(json!({ "summary": "", "truncated": false }));
        }

        // Take whole sentences while they fit.
        let mut summary = String::new();
        for sentence in split_sentences(trimmed) {
            if summary.chars().count() + sentence.chars().count() + 1 > max_chars {
                break;
            }
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str(sentence);
        }
        // Nothing fit whole: hard-truncate the first sentence.
        if summary.is_empty() {
            summary = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
            summary.push('…');
        }

        let truncated = summary.chars().count() < trimmed.chars().count();
        Ok(json!({ "summary": summary, "truncated": truncated }))
    }
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_passes_through() {
        let out = GenerateSummary
            .apply("One sentence only.", &Value::Null)
            .unwrap();
        assert_eq!(out["summary"], "One sentence only.");
        assert_eq!(out["truncated"], false);
    }

    #[test]
    fn long_text_is_cut_at_sentence_boundaries() {
        let text = "First sentence. Second sentence. ".repeat(20);
        let out = GenerateSummary.apply(&text, &Value::Null).unwrap();
        let summary = out["summary"].as_str().unwrap();
        assert!(summary.chars().count() <= DEFAULT_MAX_CHARS);
        assert!(summary.ends_with('.'));
        assert_eq!(out["truncated"], true);
    }

    #[test]
    fn max_chars_option_is_honored() {
        let out = GenerateSummary
            .apply(
                "Alpha beta gamma delta epsilon zeta eta theta.",
                &json!({"max_chars": 10}),
            )
            .unwrap();
        assert!(out["summary"].as_str().unwrap().chars().count() <= 10);
    }

    #[test]
    fn empty_input_summarizes_to_empty() {
        let out = GenerateSummary.apply("   ", &Value::Null).unwrap();
        assert_eq!(out["summary"], "");
    }
}
