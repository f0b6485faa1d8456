//! The eight match strategies, in cascade order.
//!
//! Each strategy either returns the records it resolved or declines. Reads go
//! through the [`ReferenceAccessor`]; an unknown county surfaces as
//! [`LinkError::PartitionNotFound`] so the matcher can stop the cascade.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::address;
use crate::config::MatchingConfig;
use crate::error::LinkError;
use crate::model::{ContactFragment, DemographicRecord, MatchMethod, PropertyRecord};
use crate::name::{name_match_with, NameMatchKind};
use crate::partition::ReferenceAccessor;
use crate::phone::phone_match;
use crate::score::{self, BestCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Email,
    Name,
    Phone,
    ExactAddress,
    NormalizedAddress,
    StateRoute,
    Hyphenated,
    FuzzyAddress,
}

impl StrategyKind {
    /// Cascade order.
    pub const ALL: [StrategyKind; 8] = [
        Self::Email,
        Self::Name,
        Self::Phone,
        Self::ExactAddress,
        Self::NormalizedAddress,
        Self::StateRoute,
        Self::Hyphenated,
        Self::FuzzyAddress,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Name => write!(f, "name"),
            Self::Phone => write!(f, "phone"),
            Self::ExactAddress => write!(f, "exact_address"),
            Self::NormalizedAddress => write!(f, "normalized_address"),
            Self::StateRoute => write!(f, "state_route"),
            Self::Hyphenated => write!(f, "hyphenated"),
            Self::FuzzyAddress => write!(f, "fuzzy_address"),
        }
    }
}

/// Everything a strategy may read during one match call.
pub struct MatchContext<'a> {
    pub accessor: &'a dyn ReferenceAccessor,
    pub county: &'a str,
    pub config: &'a MatchingConfig,
}

/// Records resolved by a successful strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a> {
    pub property: Option<&'a PropertyRecord>,
    pub demographic: Option<&'a DemographicRecord>,
    pub method: MatchMethod,
    pub score: f64,
}

pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// `Ok(None)` when the precondition fails or no candidate is accepted.
    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError>;
}

/// The full cascade, in priority order.
pub fn cascade() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(EmailStrategy),
        Box::new(NameStrategy),
        Box::new(PhoneStrategy),
        Box::new(ExactAddressStrategy),
        Box::new(NormalizedAddressStrategy),
        Box::new(StateRouteStrategy),
        Box::new(HyphenatedStrategy),
        Box::new(FuzzyAddressStrategy),
    ]
}

// ---------------------------------------------------------------------------
// Joins
// ---------------------------------------------------------------------------

/// Demographic-first hit, joined to its property when the parcel resolves.
fn demographic_hit<'a>(
    ctx: &MatchContext<'a>,
    demographic: &'a DemographicRecord,
    method: MatchMethod,
    score: f64,
) -> Result<Hit<'a>, LinkError> {
    let property = match demographic.parcel_id.as_deref() {
        Some(parcel) => ctx.accessor.lookup_property_by_parcel_id(ctx.county, parcel)?,
        None => None,
    };
    Ok(Hit {
        property,
        demographic: Some(demographic),
        method,
        score,
    })
}

/// Property-first hit, joined to the demographic row sharing its parcel.
fn property_hit<'a>(
    ctx: &MatchContext<'a>,
    property: &'a PropertyRecord,
    method: MatchMethod,
    score: f64,
) -> Result<Hit<'a>, LinkError> {
    let demographic = ctx
        .accessor
        .lookup_demographic_by_parcel_id(ctx.county, &property.parcel_id)?;
    Ok(Hit {
        property: Some(property),
        demographic,
        method,
        score,
    })
}

/// Scan the (postal-filtered) property partition and keep the best accepted
/// candidate. `accept` returns a score for accepted candidates.
fn best_property<'a>(
    ctx: &MatchContext<'a>,
    fragment: &ContactFragment,
    accept: impl Fn(&PropertyRecord) -> Option<f64>,
) -> Result<Option<(&'a PropertyRecord, f64)>, LinkError> {
    let mut best = BestCandidate::default();
    let mut scanned = 0usize;
    for candidate in ctx.accessor.scan_property(ctx.county, fragment.postal_code())? {
        scanned += 1;
        if let Some(score) = accept(candidate) {
            best.offer(score, Some(candidate.parcel_id.as_str()), &candidate.parcel_id, candidate);
        }
    }
    trace!(county = ctx.county, scanned, "property scan");
    Ok(best.into_best())
}

// ---------------------------------------------------------------------------
// 1. Email
// ---------------------------------------------------------------------------

pub struct EmailStrategy;

impl Strategy for EmailStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Email
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(email) = fragment.email() else {
            return Ok(None);
        };
        match ctx.accessor.lookup_demographic_by_email(ctx.county, email)? {
            Some(d) => demographic_hit(ctx, d, MatchMethod::Email, 1.0).map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Name
// ---------------------------------------------------------------------------

pub struct NameStrategy;

impl Strategy for NameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Name
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let (Some(first), Some(last)) = (fragment.first_name(), fragment.last_name()) else {
            return Ok(None);
        };

        let mut exact = BestCandidate::default();
        let mut fuzzy = BestCandidate::default();
        for d in ctx.accessor.scan_demographic(ctx.county, fragment.postal_code())? {
            let Some(full_name) = d.customer_name.as_deref() else {
                continue;
            };
            let outcome = name_match_with(
                first,
                last,
                full_name,
                ctx.config.name_fuzzy_threshold,
                ctx.config.name_token_floor,
            );
            match outcome {
                Some((NameMatchKind::Exact, s)) => {
                    exact.offer(s, d.parcel_id.as_deref(), &d.record_id, d)
                }
                Some((NameMatchKind::Fuzzy, s)) => {
                    fuzzy.offer(s, d.parcel_id.as_deref(), &d.record_id, d)
                }
                None => {}
            }
        }

        if let Some((d, s)) = exact.into_best() {
            return demographic_hit(ctx, d, MatchMethod::NameExact, s).map(Some);
        }
        match fuzzy.into_best() {
            Some((d, s)) => demographic_hit(ctx, d, MatchMethod::NameFuzzy, s).map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Phone
// ---------------------------------------------------------------------------

pub struct PhoneStrategy;

impl Strategy for PhoneStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Phone
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(phone) = fragment.phone() else {
            return Ok(None);
        };

        let mut best = BestCandidate::default();
        for d in ctx.accessor.scan_demographic(ctx.county, None)? {
            if d.mobile.as_deref().is_some_and(|m| phone_match(phone, m)) {
                best.offer(1.0, d.parcel_id.as_deref(), &d.record_id, d);
            }
        }
        match best.into_best() {
            Some((d, _)) => demographic_hit(ctx, d, MatchMethod::Phone, 1.0).map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Exact address
// ---------------------------------------------------------------------------

pub struct ExactAddressStrategy;

impl Strategy for ExactAddressStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ExactAddress
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(addr) = fragment.address() else {
            return Ok(None);
        };
        let best = best_property(ctx, fragment, |p| {
            Some(score::exact(addr, &p.address)).filter(|s| *s == 1.0)
        })?;
        match best {
            Some((p, _)) => property_hit(ctx, p, MatchMethod::ExactAddress, 1.0).map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Normalized address
// ---------------------------------------------------------------------------

pub struct NormalizedAddressStrategy;

impl Strategy for NormalizedAddressStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NormalizedAddress
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(addr) = fragment.address() else {
            return Ok(None);
        };
        let best = best_property(ctx, fragment, |p| {
            Some(score::normalized_exact(addr, &p.address, address::normalize))
                .filter(|s| *s == 1.0)
        })?;
        match best {
            Some((p, _)) => property_hit(ctx, p, MatchMethod::NormalizedAddress, 1.0).map(Some),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// 6. State route / 7. Hyphenated road
// ---------------------------------------------------------------------------

/// Accept any candidate whose normalized address equals one of the variants.
fn match_variants<'a>(
    ctx: &MatchContext<'a>,
    fragment: &ContactFragment,
    variants: Vec<String>,
    method: MatchMethod,
) -> Result<Option<Hit<'a>>, LinkError> {
    let forms: HashSet<String> = variants
        .iter()
        .map(|v| address::normalize(v))
        .filter(|v| !v.is_empty())
        .collect();
    let best = best_property(ctx, fragment, |p| {
        forms.contains(&address::normalize(&p.address)).then_some(1.0)
    })?;
    match best {
        Some((p, _)) => property_hit(ctx, p, method, 1.0).map(Some),
        None => Ok(None),
    }
}

pub struct StateRouteStrategy;

impl Strategy for StateRouteStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StateRoute
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(addr) = fragment.address().filter(|a| address::is_state_route(a)) else {
            return Ok(None);
        };
        let variants = address::normalize_state_route(addr);
        match_variants(ctx, fragment, variants, MatchMethod::StateRoute)
    }
}

pub struct HyphenatedStrategy;

impl Strategy for HyphenatedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hyphenated
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(addr) = fragment.address().filter(|a| a.contains('-')) else {
            return Ok(None);
        };
        let variants = address::normalize_hyphenated(addr);
        match_variants(ctx, fragment, variants, MatchMethod::Hyphenated)
    }
}

// ---------------------------------------------------------------------------
// 8. Fuzzy address
// ---------------------------------------------------------------------------

pub struct FuzzyAddressStrategy;

impl Strategy for FuzzyAddressStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FuzzyAddress
    }

    fn try_match<'a>(
        &self,
        fragment: &ContactFragment,
        ctx: &MatchContext<'a>,
    ) -> Result<Option<Hit<'a>>, LinkError> {
        let Some(addr) = fragment.address() else {
            return Ok(None);
        };
        let threshold = ctx.config.address_fuzzy_threshold;
        let best = best_property(ctx, fragment, |p| {
            let (accepted, score) = address::fuzzy_match_with(addr, &p.address, threshold);
            accepted.then_some(score)
        })?;
        match best {
            Some((p, s)) => property_hit(ctx, p, MatchMethod::Fuzzy, s).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{CountyPartition, InMemoryReference};

    fn reference() -> InMemoryReference {
        let properties = vec![
            PropertyRecord {
                parcel_id: "20-001".into(),
                address: "360 NEW ATHENS RD".into(),
                city: Some("CADIZ".into()),
                postal_code: Some("43907".into()),
            },
            PropertyRecord {
                parcel_id: "20-002".into(),
                address: "12 MAIN ST".into(),
                city: Some("CADIZ".into()),
                postal_code: Some("43907".into()),
            },
            PropertyRecord {
                parcel_id: "20-003".into(),
                address: "1010 SR 314".into(),
                city: Some("SCIO".into()),
                postal_code: Some("43988".into()),
            },
        ];
        let demographics = vec![
            DemographicRecord {
                record_id: "d1".into(),
                parcel_id: Some("20-002".into()),
                email: Some("pat@example.com".into()),
                customer_name: Some("PAT SMITH".into()),
                mobile: Some("740-555-0101".into()),
            },
            DemographicRecord {
                record_id: "d2".into(),
                parcel_id: None,
                email: None,
                customer_name: Some("SMITH PAT".into()),
                mobile: Some("(740) 555-0199".into()),
            },
        ];
        let mut r = InMemoryReference::new();
        r.insert("harrison", CountyPartition::new(properties, demographics));
        r
    }

    type Outcome = (MatchMethod, Option<String>, Option<String>);

    fn run(strategy: &dyn Strategy, fragment: &ContactFragment) -> Option<Outcome> {
        let r = reference();
        let config = MatchingConfig::default();
        let ctx = MatchContext {
            accessor: &r,
            county: "harrison",
            config: &config,
        };
        strategy.try_match(fragment, &ctx).unwrap().map(|hit| {
            (
                hit.method,
                hit.property.map(|p| p.parcel_id.clone()),
                hit.demographic.map(|d| d.record_id.clone()),
            )
        })
    }

    #[test]
    fn cascade_order_matches_kinds() {
        let kinds: Vec<_> = cascade().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, StrategyKind::ALL.to_vec());
    }

    #[test]
    fn email_joins_property() {
        let fragment = ContactFragment {
            email: Some("PAT@example.com".into()),
            ..Default::default()
        };
        let (method, parcel, record) = run(&EmailStrategy, &fragment).unwrap();
        assert_eq!(method, MatchMethod::Email);
        assert_eq!(parcel.as_deref(), Some("20-002"));
        assert_eq!(record.as_deref(), Some("d1"));
    }

    #[test]
    fn name_prefers_exact_over_fuzzy() {
        let fragment = ContactFragment {
            first_name: Some("Pat".into()),
            last_name: Some("Smith".into()),
            ..Default::default()
        };
        let (method, _, record) = run(&NameStrategy, &fragment).unwrap();
        assert_eq!(method, MatchMethod::NameExact);
        assert_eq!(record.as_deref(), Some("d1"));
    }

    #[test]
    fn name_postal_filter_excludes_unparceled_rows() {
        let fragment = ContactFragment {
            first_name: Some("Pat".into()),
            last_name: Some("Smith".into()),
            postal_code: Some("43988".into()),
            ..Default::default()
        };
        assert!(run(&NameStrategy, &fragment).is_none());
    }

    #[test]
    fn phone_without_parcel_has_no_property() {
        let fragment = ContactFragment {
            phone: Some("1-740-555-0199".into()),
            ..Default::default()
        };
        let (method, parcel, record) = run(&PhoneStrategy, &fragment).unwrap();
        assert_eq!(method, MatchMethod::Phone);
        assert_eq!(parcel, None);
        assert_eq!(record.as_deref(), Some("d2"));
    }

    #[test]
    fn exact_address_is_case_sensitive() {
        let upper = ContactFragment {
            address: Some("12 MAIN ST".into()),
            ..Default::default()
        };
        let lower = ContactFragment {
            address: Some("12 Main Street".into()),
            ..Default::default()
        };
        let (method, parcel, record) = run(&ExactAddressStrategy, &upper).unwrap();
        assert_eq!(method, MatchMethod::ExactAddress);
        assert_eq!(parcel.as_deref(), Some("20-002"));
        assert_eq!(record.as_deref(), Some("d1"));
        assert!(run(&ExactAddressStrategy, &lower).is_none());
        assert!(run(&NormalizedAddressStrategy, &lower).is_some());
    }

    #[test]
    fn state_route_requires_pattern() {
        let route = ContactFragment {
            address: Some("1010 OH-314".into()),
            ..Default::default()
        };
        let plain = ContactFragment {
            address: Some("1010 SR 314".into()),
            ..Default::default()
        };
        let (method, parcel, _) = run(&StateRouteStrategy, &route).unwrap();
        assert_eq!(method, MatchMethod::StateRoute);
        assert_eq!(parcel.as_deref(), Some("20-003"));
        assert!(run(&StateRouteStrategy, &plain).is_none());
    }

    #[test]
    fn hyphenated_decomposes() {
        let fragment = ContactFragment {
            address: Some("360 Cadiz-New Athens Rd".into()),
            postal_code: Some("43907".into()),
            ..Default::default()
        };
        let (method, parcel, record) = run(&HyphenatedStrategy, &fragment).unwrap();
        assert_eq!(method, MatchMethod::Hyphenated);
        assert_eq!(parcel.as_deref(), Some("20-001"));
        assert_eq!(record, None);
    }

    #[test]
    fn fuzzy_address_scores() {
        let fragment = ContactFragment {
            address: Some("12 Mian St".into()),
            ..Default::default()
        };
        let r = reference();
        let config = MatchingConfig::default();
        let ctx = MatchContext {
            accessor: &r,
            county: "harrison",
            config: &config,
        };
        let hit = FuzzyAddressStrategy.try_match(&fragment, &ctx).unwrap().unwrap();
        assert_eq!(hit.method, MatchMethod::Fuzzy);
        assert!(hit.score >= 0.70 && hit.score < 1.0);
        assert_eq!(hit.property.unwrap().parcel_id, "20-002");
    }

    #[test]
    fn unknown_county_propagates() {
        let r = reference();
        let config = MatchingConfig::default();
        let ctx = MatchContext {
            accessor: &r,
            county: "belmont",
            config: &config,
        };
        let fragment = ContactFragment {
            address: Some("12 MAIN ST".into()),
            ..Default::default()
        };
        let err = ExactAddressStrategy.try_match(&fragment, &ctx).unwrap_err();
        assert!(matches!(err, LinkError::PartitionNotFound(_)));
    }
}
