//! Default tokenizer for the lexical index.

use agrama_core::traits::Tokenizer;

/// Lowercase alphanumeric splitter. Underscores stay inside tokens so
/// code identifiers survive; single-character fragments are dropped.
pub struct DefaultTokenizer;

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| s.len() >= 2)
            .map(|s| s.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases() {
        let t = DefaultTokenizer;
        assert_eq!(
            t.tokenize("Auth-Token handler_v2!"),
            vec!["auth", "token", "handler_v2"]
        );
    }

    #[test]
    fn drops_single_characters() {
        let t = DefaultTokenizer;
        assert_eq!(t.tokenize("a b cd"), vec!["cd"]);
    }

    #[test]
    fn empty_input_is_empty() {
        let t = DefaultTokenizer;
        assert!(t.tokenize("").is_empty());
    }
}
