//! Read access to county reference partitions.
//!
//! The matcher only ever reads through [`ReferenceAccessor`]. How counties are
//! keyed and stored is the provider's business; [`InMemoryReference`] keys
//! them case-insensitively and indexes each partition once at load time.

use std::collections::{BTreeMap, HashMap};

use crate::address::normalize_postal;
use crate::error::LinkError;
use crate::model::{DemographicRecord, PropertyRecord};

pub type RecordIter<'a, T> = Box<dyn Iterator<Item = &'a T> + 'a>;

/// Read-only view over per-county property and demographic records.
///
/// Every method except [`partition_exists`](Self::partition_exists) returns
/// [`LinkError::PartitionNotFound`] for an unknown county. Implementations
/// must not mutate visible state while a match is running.
pub trait ReferenceAccessor: Send + Sync {
    fn partition_exists(&self, county: &str) -> bool;

    /// Case-insensitive email lookup.
    fn lookup_demographic_by_email(
        &self,
        county: &str,
        email: &str,
    ) -> Result<Option<&DemographicRecord>, LinkError>;

    fn lookup_demographic_by_parcel_id(
        &self,
        county: &str,
        parcel_id: &str,
    ) -> Result<Option<&DemographicRecord>, LinkError>;

    fn lookup_property_by_parcel_id(
        &self,
        county: &str,
        parcel_id: &str,
    ) -> Result<Option<&PropertyRecord>, LinkError>;

    /// Demographic records, restricted to those whose parcel lies in
    /// `postal_code` when one is given.
    fn scan_demographic<'a>(
        &'a self,
        county: &str,
        postal_code: Option<&str>,
    ) -> Result<RecordIter<'a, DemographicRecord>, LinkError>;

    /// Property records, restricted to `postal_code` when one is given.
    fn scan_property<'a>(
        &'a self,
        county: &str,
        postal_code: Option<&str>,
    ) -> Result<RecordIter<'a, PropertyRecord>, LinkError>;
}

// ---------------------------------------------------------------------------
// In-memory partition
// ---------------------------------------------------------------------------

/// One county's records plus lookup indexes.
#[derive(Debug, Default)]
pub struct CountyPartition {
    properties: Vec<PropertyRecord>,
    demographics: Vec<DemographicRecord>,
    property_by_parcel: HashMap<String, usize>,
    property_by_postal: HashMap<String, Vec<usize>>,
    demographic_by_email: HashMap<String, usize>,
    demographic_by_parcel: HashMap<String, usize>,
}

impl CountyPartition {
    /// Build indexes. On duplicate keys the first record in input order wins.
    pub fn new(properties: Vec<PropertyRecord>, demographics: Vec<DemographicRecord>) -> Self {
        let mut property_by_parcel = HashMap::new();
        let mut property_by_postal: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, p) in properties.iter().enumerate() {
            property_by_parcel.entry(p.parcel_id.clone()).or_insert(i);
            if let Some(postal) = p.postal_code.as_deref().and_then(normalize_postal) {
                property_by_postal.entry(postal).or_default().push(i);
            }
        }

        let mut demographic_by_email = HashMap::new();
        let mut demographic_by_parcel = HashMap::new();
        for (i, d) in demographics.iter().enumerate() {
            if let Some(email) = d.email.as_deref().map(email_key).filter(|e| !e.is_empty()) {
                demographic_by_email.entry(email).or_insert(i);
            }
            if let Some(parcel) = d.parcel_id.as_deref() {
                demographic_by_parcel.entry(parcel.to_string()).or_insert(i);
            }
        }

        Self {
            properties,
            demographics,
            property_by_parcel,
            property_by_postal,
            demographic_by_email,
            demographic_by_parcel,
        }
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn demographic_count(&self) -> usize {
        self.demographics.len()
    }

    fn parcel_postal(&self, parcel_id: &str) -> Option<String> {
        self.property_by_parcel
            .get(parcel_id)
            .and_then(|&i| self.properties[i].postal_code.as_deref())
            .and_then(normalize_postal)
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn county_key(county: &str) -> String {
    county.trim().to_lowercase()
}

/// Reference data held in memory, one [`CountyPartition`] per county.
#[derive(Debug, Default)]
pub struct InMemoryReference {
    partitions: BTreeMap<String, CountyPartition>,
}

impl InMemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, county: &str, partition: CountyPartition) {
        self.partitions.insert(county_key(county), partition);
    }

    pub fn partition(&self, county: &str) -> Option<&CountyPartition> {
        self.partitions.get(&county_key(county))
    }

    pub fn counties(&self) -> impl Iterator<Item = &str> {
        self.partitions.keys().map(String::as_str)
    }

    fn require(&self, county: &str) -> Result<&CountyPartition, LinkError> {
        self.partition(county)
            .ok_or_else(|| LinkError::PartitionNotFound(county.to_string()))
    }
}

impl ReferenceAccessor for InMemoryReference {
    fn partition_exists(&self, county: &str) -> bool {
        self.partition(county).is_some()
    }

    fn lookup_demographic_by_email(
        &self,
        county: &str,
        email: &str,
    ) -> Result<Option<&DemographicRecord>, LinkError> {
        let p = self.require(county)?;
        Ok(p
            .demographic_by_email
            .get(&email_key(email))
            .map(|&i| &p.demographics[i]))
    }

    fn lookup_demographic_by_parcel_id(
        &self,
        county: &str,
        parcel_id: &str,
    ) -> Result<Option<&DemographicRecord>, LinkError> {
        let p = self.require(county)?;
        Ok(p.demographic_by_parcel.get(parcel_id).map(|&i| &p.demographics[i]))
    }

    fn lookup_property_by_parcel_id(
        &self,
        county: &str,
        parcel_id: &str,
    ) -> Result<Option<&PropertyRecord>, LinkError> {
        let p = self.require(county)?;
        Ok(p.property_by_parcel.get(parcel_id).map(|&i| &p.properties[i]))
    }

    fn scan_demographic<'a>(
        &'a self,
        county: &str,
        postal_code: Option<&str>,
    ) -> Result<RecordIter<'a, DemographicRecord>, LinkError> {
        let p = self.require(county)?;
        match postal_code.and_then(normalize_postal) {
            None => Ok(Box::new(p.demographics.iter())),
            Some(postal) => Ok(Box::new(p.demographics.iter().filter(move |d| {
                d.parcel_id
                    .as_deref()
                    .and_then(|parcel| p.parcel_postal(parcel))
                    .is_some_and(|pc| pc == postal)
            }))),
        }
    }

    fn scan_property<'a>(
        &'a self,
        county: &str,
        postal_code: Option<&str>,
    ) -> Result<RecordIter<'a, PropertyRecord>, LinkError> {
        let p = self.require(county)?;
        match postal_code.and_then(normalize_postal) {
            None => Ok(Box::new(p.properties.iter())),
            Some(postal) => {
                let rows = p.property_by_postal.get(&postal).map(Vec::as_slice).unwrap_or(&[]);
                Ok(Box::new(rows.iter().map(move |&i| &p.properties[i])))
            }
        }
    }
}
