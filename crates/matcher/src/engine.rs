use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::MatchingConfig;
use crate::error::LinkError;
use crate::model::{
    ContactFragment, DemographicRef, MatchRequest, MatchResult, PropertyRef,
};
use crate::partition::ReferenceAccessor;
use crate::strategy::{cascade, Hit, MatchContext, Strategy};

/// Runs the strategy cascade. Holds configuration only, so one `Matcher`
/// can serve any number of threads and reference snapshots.
pub struct Matcher {
    config: MatchingConfig,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl Matcher {
    /// Build the cascade, leaving out strategies the config disables.
    pub fn new(config: MatchingConfig) -> Self {
        let strategies = cascade()
            .into_iter()
            .filter(|s| config.is_enabled(s.kind()))
            .collect();
        Self { config, strategies }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Resolve one contact against one county.
    ///
    /// Blank input yields `InsufficientInput` and an unknown county yields
    /// `CollectionNotFound`, both before any strategy runs. Otherwise the
    /// first strategy to accept a candidate decides the result.
    pub fn match_contact(
        &self,
        accessor: &dyn ReferenceAccessor,
        fragment: &ContactFragment,
        county: &str,
    ) -> MatchResult {
        if !fragment.has_signal() {
            debug!(county, "insufficient input");
            return MatchResult::insufficient_input();
        }
        if !accessor.partition_exists(county) {
            debug!(county, "no reference partition");
            return MatchResult::collection_not_found();
        }

        let ctx = MatchContext {
            accessor,
            county,
            config: &self.config,
        };

        for strategy in &self.strategies {
            match strategy.try_match(fragment, &ctx) {
                Ok(Some(hit)) => {
                    let result = assemble(county, hit);
                    debug!(county, method = %result.tag(), score = result.score, "matched");
                    return result;
                }
                Ok(None) => {}
                Err(LinkError::PartitionNotFound(_)) => {
                    debug!(county, strategy = %strategy.kind(), "partition vanished mid-cascade");
                    return MatchResult::collection_not_found();
                }
                Err(e) => {
                    warn!(county, strategy = %strategy.kind(), error = %e, "strategy failed");
                }
            }
        }

        MatchResult::no_match()
    }

    /// Resolve a batch in parallel. Results line up with `requests`.
    pub fn match_batch(
        &self,
        accessor: &dyn ReferenceAccessor,
        requests: &[MatchRequest],
    ) -> Vec<MatchResult> {
        info!(contacts = requests.len(), "matching batch");
        requests
            .par_iter()
            .map(|req| self.match_contact(accessor, &req.contact, &req.county))
            .collect()
    }
}

fn assemble(county: &str, hit: Hit<'_>) -> MatchResult {
    MatchResult {
        property_ref: hit.property.map(|p| PropertyRef {
            county: county.to_string(),
            parcel_id: p.parcel_id.clone(),
        }),
        demographic_ref: hit.demographic.map(|d| DemographicRef {
            county: county.to_string(),
            record_id: d.record_id.clone(),
            parcel_id: d.parcel_id.clone(),
        }),
        method: hit.method,
        score: hit.score,
    }
}
