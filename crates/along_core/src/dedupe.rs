//! crates/along_core/src/dedupe.rs
//!
//! Exact-normalized-name deduplication for place lists. The key is the
//! lowercase name with all whitespace removed; the first occurrence wins and
//! input order is preserved. No cross-field fuzzy matching: "Cafe Kitsune"
//! and "Café Kitsuné" are distinct keys, a known limitation.

use std::collections::HashSet;

/// The dedup key: lowercase, whitespace removed.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Removes repeats from `items`, keyed by `name_of`, keeping the first
/// occurrence in input order. Deterministic, O(n).
pub fn dedupe_by_name<T, F>(items: Vec<T>, name_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(normalize_name(name_of(item))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[String]) -> Vec<&str> {
        items.iter().map(String::as_str).collect()
    }

    #[test]
    fn drops_case_and_whitespace_variants_keeping_first() {
        let input = vec![
            "Cafe A".to_string(),
            "cafe a".to_string(),
            "Cafe B".to_string(),
        ];
        let out = dedupe_by_name(input, |s| s.as_str());
        assert_eq!(names(&out), vec!["Cafe A", "Cafe B"]);
    }

    #[test]
    fn is_idempotent() {
        let input = vec![
            "Tsukiji Market".to_string(),
            "tsukiji  market".to_string(),
            "Golden Gai".to_string(),
            "Golden Gai".to_string(),
        ];
        let once = dedupe_by_name(input, |s| s.as_str());
        let twice = dedupe_by_name(once.clone(), |s| s.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out: Vec<String> = dedupe_by_name(vec![], |s: &String| s.as_str());
        assert!(out.is_empty());
    }
}
