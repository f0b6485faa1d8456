use std::path::Path;

use tracing::info;

use crate::config::{ContactsConfig, DemographicColumns, LinkConfig, PropertyColumns};
use crate::error::LinkError;
use crate::model::{ContactFragment, DemographicRecord, MatchRequest, PropertyRecord};
use crate::partition::{CountyPartition, InMemoryReference};

/// Header lookup for one CSV source.
struct Headers<'a> {
    source_name: &'a str,
    names: Vec<String>,
}

impl<'a> Headers<'a> {
    fn read<R: std::io::Read>(
        source_name: &'a str,
        reader: &mut csv::Reader<R>,
    ) -> Result<Self, LinkError> {
        let names = reader
            .headers()
            .map_err(|e| csv_err(source_name, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self { source_name, names })
    }

    fn required(&self, column: &str) -> Result<usize, LinkError> {
        self.optional(column).ok_or_else(|| LinkError::MissingColumn {
            source_name: self.source_name.into(),
            column: column.into(),
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|h| h == column)
    }
}

fn csv_err(source_name: &str, e: csv::Error) -> LinkError {
    LinkError::Csv {
        source_name: source_name.into(),
        message: e.to_string(),
    }
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
}

/// Cell value, `None` when the column is absent or the cell is blank.
fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Load property rows. Rows without a parcel id are skipped.
pub fn load_property_rows(
    source_name: &str,
    csv_data: &str,
    columns: &PropertyColumns,
) -> Result<Vec<PropertyRecord>, LinkError> {
    let mut reader = reader(csv_data);
    let headers = Headers::read(source_name, &mut reader)?;

    let parcel_idx = headers.required(&columns.parcel_id)?;
    let address_idx = headers.required(&columns.address)?;
    let city_idx = headers.optional(&columns.city);
    let postal_idx = headers.optional(&columns.postal_code);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_err(source_name, e))?;
        let Some(parcel_id) = cell(&record, Some(parcel_idx)) else {
            continue;
        };
        rows.push(PropertyRecord {
            parcel_id,
            address: cell(&record, Some(address_idx)).unwrap_or_default(),
            city: cell(&record, city_idx),
            postal_code: cell(&record, postal_idx),
        });
    }
    Ok(rows)
}

/// Load demographic rows. Every column is optional; without a record id
/// column the 1-based data row number is used.
pub fn load_demographic_rows(
    source_name: &str,
    csv_data: &str,
    columns: &DemographicColumns,
) -> Result<Vec<DemographicRecord>, LinkError> {
    let mut reader = reader(csv_data);
    let headers = Headers::read(source_name, &mut reader)?;

    let record_idx = headers.optional(&columns.record_id);
    let parcel_idx = headers.optional(&columns.parcel_id);
    let email_idx = headers.optional(&columns.email);
    let name_idx = headers.optional(&columns.customer_name);
    let mobile_idx = headers.optional(&columns.mobile);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_err(source_name, e))?;
        rows.push(DemographicRecord {
            record_id: cell(&record, record_idx).unwrap_or_else(|| (i + 1).to_string()),
            parcel_id: cell(&record, parcel_idx),
            email: cell(&record, email_idx),
            customer_name: cell(&record, name_idx),
            mobile: cell(&record, mobile_idx),
        });
    }
    Ok(rows)
}

/// Load contacts as match requests. The county column is required unless a
/// default county is configured; identity columns are optional.
pub fn load_contacts(
    source_name: &str,
    csv_data: &str,
    contacts: &ContactsConfig,
) -> Result<Vec<MatchRequest>, LinkError> {
    let mut reader = reader(csv_data);
    let headers = Headers::read(source_name, &mut reader)?;
    let col = &contacts.columns;

    let county_idx = match contacts.default_county {
        Some(_) => headers.optional(&col.county),
        None => Some(headers.required(&col.county)?),
    };
    let email_idx = headers.optional(&col.email);
    let phone_idx = headers.optional(&col.phone);
    let first_idx = headers.optional(&col.first_name);
    let last_idx = headers.optional(&col.last_name);
    let address_idx = headers.optional(&col.address);
    let postal_idx = headers.optional(&col.postal_code);

    let mut requests = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_err(source_name, e))?;
        let county = cell(&record, county_idx)
            .or_else(|| contacts.default_county.clone())
            .unwrap_or_default();
        requests.push(MatchRequest {
            contact: ContactFragment {
                email: cell(&record, email_idx),
                phone: cell(&record, phone_idx),
                first_name: cell(&record, first_idx),
                last_name: cell(&record, last_idx),
                address: cell(&record, address_idx),
                postal_code: cell(&record, postal_idx),
            },
            county,
        });
    }
    Ok(requests)
}

/// Read every configured county from disk. Paths resolve against `base_dir`.
pub fn load_reference(config: &LinkConfig, base_dir: &Path) -> Result<InMemoryReference, LinkError> {
    let mut reference = InMemoryReference::new();
    for (county, source) in &config.counties {
        let property_path = base_dir.join(&source.property_file);
        let demographic_path = base_dir.join(&source.demographic_file);

        let property_csv = read(&property_path)?;
        let demographic_csv = read(&demographic_path)?;

        let properties = load_property_rows(
            &source.property_file,
            &property_csv,
            &source.property_columns,
        )?;
        let demographics = load_demographic_rows(
            &source.demographic_file,
            &demographic_csv,
            &source.demographic_columns,
        )?;

        let partition = CountyPartition::new(properties, demographics);
        info!(
            county = county.as_str(),
            properties = partition.property_count(),
            demographics = partition.demographic_count(),
            "loaded reference partition"
        );
        reference.insert(county, partition);
    }
    Ok(reference)
}

fn read(path: &Path) -> Result<String, LinkError> {
    std::fs::read_to_string(path)
        .map_err(|e| LinkError::Io(format!("cannot read {}: {e}", path.display())))
}
