use crate::config::{DEFAULT_NAME_FUZZY_THRESHOLD, DEFAULT_NAME_TOKEN_FLOOR};
use crate::score::token_containment;

const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatchKind {
    Exact,
    Fuzzy,
}

/// Lowercase, strip punctuation and generational suffixes, collapse whitespace.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            ',' | '&' | '/' | '-' | ';' => Some(' '),
            _ => None,
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !SUFFIXES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compare a first/last pair against a full-name field at default thresholds.
pub fn name_match(first: &str, last: &str, full_name: &str) -> Option<(NameMatchKind, f64)> {
    name_match_with(
        first,
        last,
        full_name,
        DEFAULT_NAME_FUZZY_THRESHOLD,
        DEFAULT_NAME_TOKEN_FLOOR,
    )
}

/// Compare a first/last pair against a full-name field.
///
/// Both `first` and `last` must be non-empty after normalization; a lone
/// first or last name never matches. A fuzzy match also needs every
/// last-name token present in `full_name`. Returns the match kind and its score
/// (1.0 for exact).
pub fn name_match_with(
    first: &str,
    last: &str,
    full_name: &str,
    threshold: f64,
    token_floor: f64,
) -> Option<(NameMatchKind, f64)> {
    let first = normalize_name(first);
    let last = normalize_name(last);
    if first.is_empty() || last.is_empty() {
        return None;
    }

    let candidate = normalize_name(full_name);
    if candidate.is_empty() {
        return None;
    }

    let query = format!("{first} {last}");
    if query == candidate {
        return Some((NameMatchKind::Exact, 1.0));
    }

    let query_tokens: Vec<&str> = query.split(' ').collect();
    let candidate_tokens: Vec<&str> = candidate.split(' ').collect();

    // Surnames must appear verbatim; only the given name may be a spelling variant.
    if !last.split(' ').all(|t| candidate_tokens.contains(&t)) {
        return None;
    }

    let score = token_containment(&query_tokens, &candidate_tokens, token_floor);
    if score >= threshold {
        Some((NameMatchKind::Fuzzy, score))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_suffixes() {
        assert_eq!(normalize_name("  John  Smith, Jr. "), "john smith");
        assert_eq!(normalize_name("ROBERT O'NEIL III"), "robert oneil");
        assert_eq!(normalize_name("Mary-Kate Olsen"), "mary kate olsen");
    }

    #[test]
    fn exact_match() {
        assert_eq!(
            name_match("John", "Smith", "JOHN SMITH JR"),
            Some((NameMatchKind::Exact, 1.0))
        );
    }

    #[test]
    fn reordered_name_is_fuzzy() {
        let (kind, score) = name_match("John", "Smith", "SMITH, JOHN").unwrap();
        assert_eq!(kind, NameMatchKind::Fuzzy);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn household_name_is_fuzzy() {
        let (kind, _) = name_match("Mary", "Smith", "JOHN & MARY SMITH").unwrap();
        assert_eq!(kind, NameMatchKind::Fuzzy);
    }

    #[test]
    fn typo_is_fuzzy() {
        let (kind, score) = name_match("Jonathon", "Smith", "JONATHAN SMITH").unwrap();
        assert_eq!(kind, NameMatchKind::Fuzzy);
        assert!(score >= 0.85 && score < 1.0);
    }

    #[test]
    fn surname_sharing_a_prefix_rejected() {
        assert_eq!(name_match("John", "Smith", "JOHN SMITHERS"), None);
        assert_eq!(name_match("Ann", "Lee", "ANN LEEDS"), None);
        assert_eq!(name_match("Carl", "Johns", "CARL JOHNSON"), None);
    }

    #[test]
    fn different_first_name_rejected() {
        assert_eq!(name_match("Jane", "Smith", "JOHN SMITH"), None);
    }

    #[test]
    fn requires_first_and_last() {
        assert_eq!(name_match("", "Smith", "SMITH"), None);
        assert_eq!(name_match("John", "  ", "JOHN"), None);
        assert_eq!(name_match("John", "Smith", ""), None);
    }
}
