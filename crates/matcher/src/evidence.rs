use std::collections::{BTreeMap, BTreeSet};

use crate::model::{MatchMethod, MatchRequest, MatchResult, MatchSummary};

/// Compute data-quality counts for a batch. `requests` and `results` are
/// parallel slices as returned by `Matcher::match_batch`.
pub fn compute_summary(requests: &[MatchRequest], results: &[MatchResult]) -> MatchSummary {
    let mut method_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut missing_counties: BTreeSet<String> = BTreeSet::new();
    let mut summary = MatchSummary {
        total: results.len(),
        ..Default::default()
    };

    for (req, r) in requests.iter().zip(results) {
        *method_counts.entry(r.method.to_string()).or_insert(0) += 1;

        match r.method {
            MatchMethod::NoMatch => summary.no_match += 1,
            MatchMethod::InsufficientInput => summary.insufficient_input += 1,
            MatchMethod::CollectionNotFound => {
                summary.collection_not_found += 1;
                missing_counties.insert(req.county.trim().to_string());
            }
            MatchMethod::Fuzzy | MatchMethod::NameFuzzy => {
                summary.matched += 1;
                summary.fuzzy += 1;
            }
            _ => summary.matched += 1,
        }
    }

    summary.method_counts = method_counts;
    summary.missing_counties = missing_counties.into_iter().collect();
    summary
}
