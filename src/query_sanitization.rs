// Query sanitization for full-text search: phrase-tokenizes a raw user query and escapes
// FTS5 MATCH-expression special characters. This index never reaches a shell, a path, or
// an LDAP directory, so only the FTS5 syntax needs escaping here.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters kept verbatim; everything else becomes a split point.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));

/// The result of sanitizing a free-text search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery {
    /// A conjunction of double-quoted phrase tokens, ready to pass to `MATCH`.
    pub expression: String,
    /// The individual lowercase tokens that make up `expression`.
    pub tokens: Vec<String>,
}

impl SanitizedQuery {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Lowercase, strip everything but word characters/spaces/hyphens, split on whitespace,
/// drop empty tokens, wrap each surviving token in double quotes, join with spaces.
///
/// A query containing only punctuation sanitizes to the empty expression, which the
/// Search Engine treats identically to an empty query (§8: "query containing only
/// punctuation yields the same result as an empty query").
pub fn sanitize_search_query(query: &str) -> SanitizedQuery {
    let lowered = query.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, " ");

    let tokens: Vec<String> = stripped
        .split_whitespace()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect();

    let expression = tokens
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ");

    SanitizedQuery { expression, tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_query_is_wrapped_per_token() {
        let q = sanitize_search_query("filesystem access");
        assert_eq!(q.expression, "\"filesystem\" \"access\"");
        assert_eq!(q.tokens, vec!["filesystem", "access"]);
    }

    #[test]
    fn punctuation_only_is_empty() {
        let q = sanitize_search_query("!!! ??? ---");
        assert!(q.is_empty());
        assert_eq!(q.expression, "");
    }

    #[test]
    fn hyphenated_tokens_are_preserved() {
        let q = sanitize_search_query("dev-tools");
        assert_eq!(q.tokens, vec!["dev-tools"]);
    }

    #[test]
    fn mixed_case_is_lowercased() {
        let q = sanitize_search_query("GitHub Search");
        assert_eq!(q.tokens, vec!["github", "search"]);
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(sanitize_search_query("").is_empty());
        assert!(sanitize_search_query("   ").is_empty());
    }
}
