use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Partial identity information for one person to be resolved.
///
/// Every field is optional; a fragment with nothing but blanks is rejected
/// before any strategy runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFragment {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

impl ContactFragment {
    pub fn email(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    pub fn phone(&self) -> Option<&str> {
        non_blank(&self.phone)
    }

    pub fn first_name(&self) -> Option<&str> {
        non_blank(&self.first_name)
    }

    pub fn last_name(&self) -> Option<&str> {
        non_blank(&self.last_name)
    }

    pub fn address(&self) -> Option<&str> {
        non_blank(&self.address)
    }

    pub fn postal_code(&self) -> Option<&str> {
        non_blank(&self.postal_code)
    }

    /// True when at least one field carries a non-blank value.
    pub fn has_signal(&self) -> bool {
        self.email().is_some()
            || self.phone().is_some()
            || self.first_name().is_some()
            || self.last_name().is_some()
            || self.address().is_some()
            || self.postal_code().is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One lookup request: a fragment plus the county whose partition to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub contact: ContactFragment,
    pub county: String,
}

// ---------------------------------------------------------------------------
// Reference records
// ---------------------------------------------------------------------------

/// One row of a county's property partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRecord {
    pub parcel_id: String,
    pub address: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// One row of a county's demographic partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicRecord {
    /// Partition-unique row identifier.
    pub record_id: String,
    pub parcel_id: Option<String>,
    pub email: Option<String>,
    pub customer_name: Option<String>,
    pub mobile: Option<String>,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyRef {
    pub county: String,
    pub parcel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DemographicRef {
    pub county: String,
    pub record_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<String>,
}

/// Which strategy produced a result, or why none did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Email,
    NameExact,
    NameFuzzy,
    Phone,
    ExactAddress,
    NormalizedAddress,
    StateRoute,
    Hyphenated,
    Fuzzy,
    NoMatch,
    CollectionNotFound,
    InsufficientInput,
}

impl MatchMethod {
    /// True for the outcomes that carry record references.
    pub fn is_match(&self) -> bool {
        !matches!(
            self,
            Self::NoMatch | Self::CollectionNotFound | Self::InsufficientInput
        )
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::NameExact => write!(f, "name_exact"),
            Self::NameFuzzy => write!(f, "name_fuzzy"),
            Self::Phone => write!(f, "phone"),
            Self::ExactAddress => write!(f, "exact_address"),
            Self::NormalizedAddress => write!(f, "normalized_address"),
            Self::StateRoute => write!(f, "state_route"),
            Self::Hyphenated => write!(f, "hyphenated"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::NoMatch => write!(f, "no_match"),
            Self::CollectionNotFound => write!(f, "collection_not_found"),
            Self::InsufficientInput => write!(f, "insufficient_input"),
        }
    }
}

/// Outcome of one `match_contact` call. Holds keys only, never record copies.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub property_ref: Option<PropertyRef>,
    pub demographic_ref: Option<DemographicRef>,
    pub method: MatchMethod,
    pub score: f64,
}

impl MatchResult {
    fn unmatched(method: MatchMethod) -> Self {
        Self {
            property_ref: None,
            demographic_ref: None,
            method,
            score: 0.0,
        }
    }

    pub fn no_match() -> Self {
        Self::unmatched(MatchMethod::NoMatch)
    }

    pub fn collection_not_found() -> Self {
        Self::unmatched(MatchMethod::CollectionNotFound)
    }

    pub fn insufficient_input() -> Self {
        Self::unmatched(MatchMethod::InsufficientInput)
    }

    pub fn is_match(&self) -> bool {
        self.method.is_match()
    }

    /// Method tag for reporting. Fuzzy address matches encode their score,
    /// e.g. `fuzzy_0.82`.
    pub fn tag(&self) -> String {
        match self.method {
            MatchMethod::Fuzzy => format!("fuzzy_{:.2}", self.score),
            other => other.to_string(),
        }
    }
}

/// Wire shape of a result: `{property_ref, demographic_ref, method, score}`.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub property_ref: Option<PropertyRef>,
    pub demographic_ref: Option<DemographicRef>,
    pub method: String,
    pub score: f64,
}

impl From<&MatchResult> for MatchResponse {
    fn from(result: &MatchResult) -> Self {
        Self {
            property_ref: result.property_ref.clone(),
            demographic_ref: result.demographic_ref.clone(),
            method: result.tag(),
            score: result.score,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Batch-level data-quality report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub matched: usize,
    pub no_match: usize,
    pub collection_not_found: usize,
    pub insufficient_input: usize,
    pub fuzzy: usize,
    pub method_counts: std::collections::BTreeMap<String, usize>,
    pub missing_counties: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_carry_no_signal() {
        let fragment = ContactFragment {
            email: Some("   ".into()),
            phone: Some(String::new()),
            ..Default::default()
        };
        assert!(!fragment.has_signal());
        assert_eq!(fragment.email(), None);
    }

    #[test]
    fn fields_are_trimmed() {
        let fragment = ContactFragment {
            address: Some("  12 Elm St ".into()),
            ..Default::default()
        };
        assert!(fragment.has_signal());
        assert_eq!(fragment.address(), Some("12 Elm St"));
    }

    #[test]
    fn fuzzy_tag_encodes_score() {
        let result = MatchResult {
            property_ref: Some(PropertyRef {
                county: "belmont".into(),
                parcel_id: "P1".into(),
            }),
            demographic_ref: None,
            method: MatchMethod::Fuzzy,
            score: 0.8214,
        };
        assert_eq!(result.tag(), "fuzzy_0.82");
    }

    #[test]
    fn terminal_outcomes_have_no_refs() {
        for result in [
            MatchResult::no_match(),
            MatchResult::collection_not_found(),
            MatchResult::insufficient_input(),
        ] {
            assert!(!result.is_match());
            assert!(result.property_ref.is_none());
            assert!(result.demographic_ref.is_none());
        }
        assert_eq!(MatchResult::insufficient_input().tag(), "insufficient_input");
    }

    #[test]
    fn request_deserializes_partial_contact() {
        let req: MatchRequest =
            serde_json::from_str(r#"{"contact":{"email":"j@x.com"},"county":"belmont"}"#).unwrap();
        assert_eq!(req.contact.email(), Some("j@x.com"));
        assert_eq!(req.contact.phone, None);
        assert_eq!(req.county, "belmont");
    }
}
