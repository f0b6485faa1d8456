use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::LinkError;
use crate::strategy::StrategyKind;

pub const DEFAULT_ADDRESS_FUZZY_THRESHOLD: f64 = 0.70;
pub const DEFAULT_NAME_FUZZY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_NAME_TOKEN_FLOOR: f64 = 0.90;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    #[serde(default)]
    pub matching: MatchingConfig,
    pub counties: BTreeMap<String, CountySource>,
    #[serde(default)]
    pub contacts: ContactsConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Thresholds and strategy switches. The cascade order itself is fixed.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_address_fuzzy")]
    pub address_fuzzy_threshold: f64,
    #[serde(default = "default_name_fuzzy")]
    pub name_fuzzy_threshold: f64,
    #[serde(default = "default_name_token_floor")]
    pub name_token_floor: f64,
    #[serde(default)]
    pub disabled: Vec<StrategyKind>,
}

fn default_address_fuzzy() -> f64 {
    DEFAULT_ADDRESS_FUZZY_THRESHOLD
}

fn default_name_fuzzy() -> f64 {
    DEFAULT_NAME_FUZZY_THRESHOLD
}

fn default_name_token_floor() -> f64 {
    DEFAULT_NAME_TOKEN_FLOOR
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            address_fuzzy_threshold: DEFAULT_ADDRESS_FUZZY_THRESHOLD,
            name_fuzzy_threshold: DEFAULT_NAME_FUZZY_THRESHOLD,
            name_token_floor: DEFAULT_NAME_TOKEN_FLOOR,
            disabled: Vec::new(),
        }
    }
}

impl MatchingConfig {
    pub fn is_enabled(&self, kind: StrategyKind) -> bool {
        !self.disabled.contains(&kind)
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        for (label, value) in [
            ("address_fuzzy_threshold", self.address_fuzzy_threshold),
            ("name_fuzzy_threshold", self.name_fuzzy_threshold),
            ("name_token_floor", self.name_token_floor),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LinkError::ConfigValidation(format!(
                    "{label} must be in (0, 1], got {value}"
                )));
            }
        }

        if StrategyKind::ALL.iter().all(|k| !self.is_enabled(*k)) {
            return Err(LinkError::ConfigValidation(
                "every strategy is disabled".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// County sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CountySource {
    pub property_file: String,
    pub demographic_file: String,
    #[serde(default)]
    pub property_columns: PropertyColumns,
    #[serde(default)]
    pub demographic_columns: DemographicColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PropertyColumns {
    pub parcel_id: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl Default for PropertyColumns {
    fn default() -> Self {
        Self {
            parcel_id: "parcel_id".into(),
            address: "address".into(),
            city: "city".into(),
            postal_code: "postal_code".into(),
        }
    }
}

/// Every demographic column is optional in the CSV; a missing `record_id`
/// column falls back to the 1-based row number.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemographicColumns {
    pub record_id: String,
    pub parcel_id: String,
    pub email: String,
    pub customer_name: String,
    pub mobile: String,
}

impl Default for DemographicColumns {
    fn default() -> Self {
        Self {
            record_id: "record_id".into(),
            parcel_id: "parcel_id".into(),
            email: "email".into(),
            customer_name: "customer_name".into(),
            mobile: "mobile".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactsConfig {
    #[serde(default)]
    pub columns: ContactColumns,
    /// County used for rows whose county cell is blank.
    #[serde(default)]
    pub default_county: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContactColumns {
    pub county: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub postal_code: String,
}

impl Default for ContactColumns {
    fn default() -> Self {
        Self {
            county: "county".into(),
            email: "email".into(),
            phone: "phone".into(),
            first_name: "first_name".into(),
            last_name: "last_name".into(),
            address: "address".into(),
            postal_code: "postal_code".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LinkConfig {
    pub fn from_toml(input: &str) -> Result<Self, LinkError> {
        let config: LinkConfig =
            toml::from_str(input).map_err(|e| LinkError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        self.matching.validate()?;

        if self.counties.is_empty() {
            return Err(LinkError::ConfigValidation(
                "at least one county is required".into(),
            ));
        }

        for (county, source) in &self.counties {
            if county.trim().is_empty() {
                return Err(LinkError::ConfigValidation("county key must not be blank".into()));
            }
            if source.property_file.trim().is_empty() {
                return Err(LinkError::ConfigValidation(format!(
                    "county '{county}': property_file must not be empty"
                )));
            }
            if source.demographic_file.trim().is_empty() {
                return Err(LinkError::ConfigValidation(format!(
                    "county '{county}': demographic_file must not be empty"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
