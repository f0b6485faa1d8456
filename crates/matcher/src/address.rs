use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DEFAULT_ADDRESS_FUZZY_THRESHOLD;

/// Street-type and directional words collapsed by [`normalize`].
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("street", "st"),
    ("avenue", "ave"),
    ("av", "ave"),
    ("road", "rd"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("court", "ct"),
    ("boulevard", "blvd"),
    ("place", "pl"),
    ("circle", "cir"),
    ("highway", "hwy"),
    ("parkway", "pkwy"),
    ("terrace", "ter"),
    ("trail", "trl"),
    ("square", "sq"),
    ("apartment", "apt"),
    ("suite", "ste"),
    ("north", "n"),
    ("south", "s"),
    ("east", "e"),
    ("west", "w"),
    ("northeast", "ne"),
    ("northwest", "nw"),
    ("southeast", "se"),
    ("southwest", "sw"),
];

/// Normalized tokens that end a road name.
const ROAD_TYPES: &[&str] = &[
    "st", "ave", "rd", "dr", "ln", "ct", "blvd", "pl", "cir", "hwy", "pkwy", "ter", "trl", "sq",
    "way", "pike", "run",
];

/// Normalized directional tokens.
const DIRECTIONALS: &[&str] = &["n", "s", "e", "w", "ne", "nw", "se", "sw"];

static STATE_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z]{1,3})-(\d+)\b").expect("state route pattern is valid")
});

fn abbreviate(token: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(full, _)| *full == token)
        .map(|(_, abbr)| *abbr)
        .unwrap_or(token)
}

/// Lowercase, strip punctuation, abbreviate street types and directionals.
///
/// Hyphens, slashes, commas and ampersands separate words; every other
/// non-alphanumeric character is dropped.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            '-' | '/' | ',' | '&' | ';' | ':' => Some(' '),
            _ => None,
        })
        .collect();

    cleaned
        .split_whitespace()
        .map(abbreviate)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Five-digit prefix of a ZIP or ZIP+4, otherwise the trimmed input.
pub fn normalize_postal(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 5 {
        Some(digits[..5].to_string())
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// True when the address contains a `<letters>-<digits>` route designator.
pub fn is_state_route(raw: &str) -> bool {
    STATE_ROUTE.is_match(raw)
}

/// Equivalent spellings of a `<letters>-<digits>` route designator.
///
/// `OH-314` yields `OH 314`, `SR 314`, `STATE ROUTE 314` and the original.
/// Text around the designator is preserved, so `1010 OH-314` yields
/// `1010 SR 314` and so on.
pub fn normalize_state_route(raw: &str) -> Vec<String> {
    let Some(caps) = STATE_ROUTE.captures(raw) else {
        return vec![raw.to_string()];
    };
    let (Some(whole), Some(letters), Some(number)) = (caps.get(0), caps.get(1), caps.get(2))
    else {
        return vec![raw.to_string()];
    };

    let before = &raw[..whole.start()];
    let after = &raw[whole.end()..];
    let number = number.as_str();

    let forms = [
        format!("{} {number}", letters.as_str()),
        format!("SR {number}"),
        format!("STATE ROUTE {number}"),
    ];

    let mut variants: Vec<String> = forms
        .iter()
        .map(|form| format!("{before}{form}{after}"))
        .collect();
    variants.push(raw.to_string());
    dedup_in_order(variants)
}

/// Candidate decompositions of a hyphenated road name.
///
/// `360 Cadiz-New Athens Rd` yields the original, `360 Cadiz New Athens Rd`,
/// `360 Cadiz Rd` and `360 New Athens Rd`. A leading house number and a
/// trailing road-type token are carried onto every form; numbered road names
/// such as `1st-2nd` are decomposed like any other.
pub fn normalize_hyphenated(raw: &str) -> Vec<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    let prefix_len = usize::from(tokens.first().is_some_and(|t| is_house_number(t)));

    let road_type = tokens
        .last()
        .filter(|_| tokens.len() > prefix_len + 1)
        .filter(|t| ROAD_TYPES.contains(&normalize(t).as_str()))
        .copied();
    let name_end = if road_type.is_some() { tokens.len() - 1 } else { tokens.len() };

    let name = tokens[prefix_len..name_end].join(" ");
    let components: Vec<&str> = name
        .split('-')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if components.len() < 2 {
        return vec![raw.to_string()];
    }

    let assemble = |road: &str| {
        let mut parts: Vec<&str> = tokens[..prefix_len].to_vec();
        parts.push(road);
        if let Some(suffix) = road_type {
            parts.push(suffix);
        }
        parts.join(" ")
    };

    let mut variants = vec![raw.to_string(), assemble(&components.join(" "))];
    variants.extend(components.iter().map(|c| assemble(c)));
    dedup_in_order(variants)
}

/// `12`, `12A` or a range such as `12-14`.
fn is_house_number(token: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if let Some((low, high)) = token.split_once('-') {
        return all_digits(low) && all_digits(high);
    }
    let base = token
        .strip_suffix(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(token);
    all_digits(base)
}

fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Normalized equality.
pub fn exact_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Fuzzy address comparison at the default threshold.
pub fn fuzzy_match(a: &str, b: &str) -> (bool, f64) {
    fuzzy_match_with(a, b, DEFAULT_ADDRESS_FUZZY_THRESHOLD)
}

/// Fuzzy address comparison.
///
/// The leading street numbers must both be present and identical; otherwise
/// the result is `(false, 0.0)` regardless of how close the street names are.
/// A leading directional present on both sides must also agree (`N Main` is
/// not `S Main`); one side omitting it is tolerated. The rest of the
/// normalized address is scored by normalized edit distance.
pub fn fuzzy_match_with(a: &str, b: &str, threshold: f64) -> (bool, f64) {
    let a = normalize(a);
    let b = normalize(b);
    let (Some((num_a, rest_a)), Some((num_b, rest_b))) = (split_number(&a), split_number(&b))
    else {
        return (false, 0.0);
    };
    if num_a != num_b {
        return (false, 0.0);
    }
    if let (Some(dir_a), Some(dir_b)) = (directional(rest_a), directional(rest_b)) {
        if dir_a != dir_b {
            return (false, 0.0);
        }
    }

    let score = crate::score::edit_similarity(rest_a, rest_b);
    (score >= threshold, score)
}

/// Leading directional of a normalized street remainder, if any.
fn directional(rest: &str) -> Option<&str> {
    rest.split(' ')
        .next()
        .filter(|t| DIRECTIONALS.contains(t))
}

/// Split a normalized address into its leading street number and the rest.
fn split_number(normalized: &str) -> Option<(&str, &str)> {
    let (first, rest) = normalized
        .split_once(' ')
        .unwrap_or((normalized, ""));
    if first.starts_with(|c: char| c.is_ascii_digit()) {
        Some((first, rest))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_abbreviates_and_strips() {
        assert_eq!(normalize("123 North Main Street"), "123 n main st");
        assert_eq!(normalize("45 W. Elm Ave., Apt #4"), "45 w elm ave apt 4");
        assert_eq!(normalize("  9  OAK   Road "), "9 oak rd");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_splits_on_hyphen() {
        assert_eq!(normalize("360 Cadiz-New Athens Rd"), "360 cadiz new athens rd");
    }

    #[test]
    fn exact_match_ignores_formatting() {
        assert!(exact_match("123 Main Street", "123 MAIN ST"));
        assert!(!exact_match("123 Main Street", "124 MAIN ST"));
    }

    #[test]
    fn postal_uses_five_digit_prefix() {
        assert_eq!(normalize_postal("43907-1234").as_deref(), Some("43907"));
        assert_eq!(normalize_postal(" 43907 ").as_deref(), Some("43907"));
        assert_eq!(normalize_postal("K1A 0B1").as_deref(), Some("k1a 0b1"));
        assert_eq!(normalize_postal("  "), None);
    }

    #[test]
    fn state_route_expansion() {
        let variants = normalize_state_route("OH-314");
        assert!(variants.contains(&"OH 314".to_string()));
        assert!(variants.contains(&"SR 314".to_string()));
        assert!(variants.contains(&"STATE ROUTE 314".to_string()));
        assert!(variants.contains(&"OH-314".to_string()));
    }

    #[test]
    fn state_route_keeps_house_number() {
        let variants = normalize_state_route("1010 OH-314");
        assert!(variants.contains(&"1010 SR 314".to_string()));
        assert!(variants.contains(&"1010 STATE ROUTE 314".to_string()));
        assert!(is_state_route("1010 OH-314"));
    }

    #[test]
    fn state_route_passthrough() {
        assert_eq!(normalize_state_route("12 Main St"), vec!["12 Main St".to_string()]);
        assert!(!is_state_route("360 Cadiz-New Athens Rd"));
    }

    #[test]
    fn hyphenated_decomposition() {
        let variants = normalize_hyphenated("360 Cadiz-New Athens Rd");
        assert_eq!(
            variants,
            vec![
                "360 Cadiz-New Athens Rd".to_string(),
                "360 Cadiz New Athens Rd".to_string(),
                "360 Cadiz Rd".to_string(),
                "360 New Athens Rd".to_string(),
            ]
        );
    }

    #[test]
    fn hyphenated_numbered_roads() {
        let variants = normalize_hyphenated("12 1st-2nd St");
        assert_eq!(
            variants,
            vec![
                "12 1st-2nd St".to_string(),
                "12 1st 2nd St".to_string(),
                "12 1st St".to_string(),
                "12 2nd St".to_string(),
            ]
        );
    }

    #[test]
    fn hyphenated_house_number_forms() {
        let lettered = normalize_hyphenated("12A Cadiz-Hopedale Rd");
        assert!(lettered.contains(&"12A Hopedale Rd".to_string()));
        // a numeric range is the house number, not a road to split
        assert_eq!(
            normalize_hyphenated("12-14 Main St"),
            vec!["12-14 Main St".to_string()]
        );
        assert!(is_house_number("360"));
        assert!(!is_house_number("1st"));
        assert!(!is_house_number("12-"));
    }

    #[test]
    fn hyphenated_without_road_type() {
        let variants = normalize_hyphenated("77 Cadiz-Harrisville");
        assert!(variants.contains(&"77 Cadiz".to_string()));
        assert!(variants.contains(&"77 Harrisville".to_string()));
    }

    #[test]
    fn hyphenated_passthrough() {
        assert_eq!(normalize_hyphenated("12 Main St"), vec!["12 Main St".to_string()]);
        assert_eq!(normalize_hyphenated(""), vec![String::new()]);
    }

    #[test]
    fn fuzzy_gate_on_street_number() {
        assert_eq!(fuzzy_match("123 Main St", "456 Main St"), (false, 0.0));
        assert_eq!(fuzzy_match("Main St", "Main St"), (false, 0.0));
    }

    #[test]
    fn fuzzy_gate_on_directional() {
        assert_eq!(fuzzy_match("118 N Main St", "118 S Main St"), (false, 0.0));
        assert_eq!(fuzzy_match("118 North Mian St", "118 S MAIN ST"), (false, 0.0));
        // a directional on one side only still scores
        let (ok, score) = fuzzy_match("118 Main St", "118 N MAIN ST");
        assert!(ok, "score {score}");
    }

    #[test]
    fn fuzzy_accepts_close_street_names() {
        let (ok, score) = fuzzy_match("123 Mian Street", "123 MAIN ST");
        assert!(ok, "score {score}");
        assert!(score >= 0.70 && score < 1.0);
    }

    #[test]
    fn fuzzy_rejects_distant_street_names() {
        let (ok, score) = fuzzy_match("123 Main St", "123 Lighthouse Pointe Blvd");
        assert!(!ok);
        assert!(score < 0.70);
    }
}
