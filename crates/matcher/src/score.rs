//! Similarity scorers and candidate ranking shared by the strategies.

use std::cmp::{Ordering, Reverse};

use ordered_float::OrderedFloat;
use strsim::{jaro, normalized_levenshtein};

/// 1.0 for identical (trimmed) strings, else 0.0.
pub fn exact(a: &str, b: &str) -> f64 {
    if a.trim() == b.trim() {
        1.0
    } else {
        0.0
    }
}

/// 1.0 when both sides normalize to the same non-empty form, else 0.0.
pub fn normalized_exact(a: &str, b: &str, normalize: impl Fn(&str) -> String) -> f64 {
    let a = normalize(a);
    if !a.is_empty() && a == normalize(b) {
        1.0
    } else {
        0.0
    }
}

/// Normalized Levenshtein similarity in [0, 1].
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// How well the query tokens are covered by the candidate tokens.
///
/// Each query token takes its best Jaro score against any candidate token;
/// scores under `token_floor` count as zero. Plain Jaro has no shared-prefix
/// bonus, so `smith` against `smithers` stays under a 0.90 floor. The result
/// is the mean over query tokens, so word order and extra candidate tokens do
/// not lower it.
pub fn token_containment(query: &[&str], candidate: &[&str], token_floor: f64) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let total: f64 = query
        .iter()
        .map(|q| {
            let best = candidate
                .iter()
                .map(|c| jaro(q, c))
                .fold(0.0_f64, f64::max);
            if best >= token_floor {
                best
            } else {
                0.0
            }
        })
        .sum();
    total / query.len() as f64
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Ordering key for accepted candidates: highest score first, then lowest
/// parcel id (records without one sort last), then lowest record id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey<'a> {
    score: Reverse<OrderedFloat<f64>>,
    no_parcel: bool,
    parcel_id: &'a str,
    record_id: &'a str,
}

/// Keeps the best accepted candidate seen so far during a scan.
#[derive(Debug)]
pub struct BestCandidate<'a, T> {
    best: Option<(RankKey<'a>, &'a T)>,
}

impl<'a, T> Default for BestCandidate<'a, T> {
    fn default() -> Self {
        Self { best: None }
    }
}

impl<'a, T> BestCandidate<'a, T> {
    pub fn offer(
        &mut self,
        score: f64,
        parcel_id: Option<&'a str>,
        record_id: &'a str,
        item: &'a T,
    ) {
        let key = RankKey {
            score: Reverse(OrderedFloat(score)),
            no_parcel: parcel_id.is_none(),
            parcel_id: parcel_id.unwrap_or(""),
            record_id,
        };
        let replace = match &self.best {
            None => true,
            Some((current, _)) => key.cmp(current) == Ordering::Less,
        };
        if replace {
            self.best = Some((key, item));
        }
    }

    /// The winning candidate and its score.
    pub fn into_best(self) -> Option<(&'a T, f64)> {
        self.best.map(|(key, item)| (item, key.score.0.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_trims() {
        assert_eq!(exact(" 12 MAIN ST", "12 MAIN ST "), 1.0);
        assert_eq!(exact("12 Main St", "12 MAIN ST"), 0.0);
    }

    #[test]
    fn normalized_exact_rejects_empty() {
        let lower = |s: &str| s.trim().to_lowercase();
        assert_eq!(normalized_exact("ABC", "abc", lower), 1.0);
        assert_eq!(normalized_exact("  ", "", lower), 0.0);
    }

    #[test]
    fn containment_is_order_insensitive() {
        let score = token_containment(&["john", "smith"], &["smith", "john"], 0.9);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn containment_floor_zeroes_weak_tokens() {
        // "jane" vs "john" is well under the floor
        let score = token_containment(&["jane", "smith"], &["john", "smith"], 0.9);
        assert_eq!(score, 0.5);
    }

    #[test]
    fn containment_ignores_shared_prefixes() {
        assert_eq!(token_containment(&["smith"], &["smithers"], 0.9), 0.0);
        assert_eq!(token_containment(&["lee"], &["leeds"], 0.9), 0.0);
        // a one-letter spelling slip still clears the floor
        assert!(token_containment(&["jonathon"], &["jonathan"], 0.9) > 0.9);
    }

    #[test]
    fn containment_empty_is_zero() {
        assert_eq!(token_containment(&[], &["a"], 0.9), 0.0);
        assert_eq!(token_containment(&["a"], &[], 0.9), 0.0);
    }

    #[test]
    fn best_candidate_prefers_score_then_parcel() {
        let items = ["a", "b", "c", "d"];
        let mut best = BestCandidate::default();
        best.offer(0.8, Some("P9"), "1", &items[0]);
        best.offer(0.9, Some("P5"), "2", &items[1]);
        best.offer(0.9, Some("P3"), "3", &items[2]);
        best.offer(0.9, None, "0", &items[3]);
        let (item, score) = best.into_best().unwrap();
        assert_eq!(*item, "c");
        assert_eq!(score, 0.9);
    }

    #[test]
    fn best_candidate_empty() {
        let best: BestCandidate<'_, u8> = BestCandidate::default();
        assert!(best.into_best().is_none());
    }
}
