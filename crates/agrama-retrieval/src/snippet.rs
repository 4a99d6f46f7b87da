//! Snippet extraction: the first window of content containing a query
//! term, ellipsized at cut edges.

/// Default snippet window in characters.
const WINDOW_CHARS: usize = 80;

/// Extract a snippet around the first case-insensitive occurrence of any
/// query term. Returns `None` when no term matches or content is empty.
pub fn extract_snippet(content: &str, query_terms: &[String]) -> Option<String> {
    if content.is_empty() {
        return None;
    }
    let lower = content.to_lowercase();
    let mut first: Option<usize> = None;
    for term in query_terms {
        if term.is_empty() {
            continue;
        }
        if let Some(pos) = lower.find(&term.to_lowercase()) {
            first = Some(first.map_or(pos, |f| f.min(pos)));
        }
    }
    let hit = first?;

    // Center the window on the hit, clamped to char boundaries.
    let half = WINDOW_CHARS / 2;
    let mut start = hit.saturating_sub(half);
    while start > 0 && !content.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (hit + half).min(content.len());
    while end < content.len() && !content.is_char_boundary(end) {
        end += 1;
    }

    let mut snippet = String::new();
    if start > 0 {
        snippet.push('…');
    }
    snippet.push_str(content[start..end].trim());
    if end < content.len() {
        snippet.push('…');
    }
    Some(snippet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ts: &[&str]) -> Vec<String> {
        ts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn finds_term_case_insensitively() {
        let s = extract_snippet("The Authentication Token handler", &terms(&["token"]));
        assert!(s.unwrap().contains("Token"));
    }

    #[test]
    fn no_match_returns_none() {
        assert!(extract_snippet("unrelated content", &terms(&["missing"])).is_none());
        assert!(extract_snippet("", &terms(&["x"])).is_none());
    }

    #[test]
    fn long_content_is_windowed_with_ellipses() {
        let filler = "x".repeat(200);
        let content = format!("{filler} needle {filler}");
        let s = extract_snippet(&content, &terms(&["needle"])).unwrap();
        assert!(s.contains("needle"));
        assert!(s.starts_with('…'));
        assert!(s.ends_with('…'));
        assert!(s.chars().count() < 120);
    }

    #[test]
    fn earliest_term_wins() {
        let s = extract_snippet("alpha then beta", &terms(&["beta", "alpha"])).unwrap();
        assert!(s.contains("alpha"));
    }

    #[test]
    fn multibyte_content_respects_char_boundaries() {
        let content = "ユニコード文字列 with a needle inside ユニコード文字列";
        let s = extract_snippet(content, &terms(&["needle"])).unwrap();
        assert!(s.contains("needle"));
    }
}
