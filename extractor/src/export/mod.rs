//! CSV export with an explicit field order.
//!
//! The header row is exactly the requested field list, and every record is
//! written in that order whatever record type it is. Quoting follows the
//! `csv` crate (RFC 4180).

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::models::{FacilityField, FacilityRecord, OutputRecord};

/// Field order of the stock report
pub const OUTPUT_FIELDS: [&str; 6] = [
    "reportingUnit",
    "facilityCode",
    "productCode",
    "dataPoint",
    "reportingPeriod",
    "value",
];

/// Field order of the facility master-data file
pub const FACILITY_FIELDS: [&str; 8] = [
    "code",
    "level",
    "name",
    "ownershipType",
    "region",
    "district",
    "type",
    "operationalStatus",
];

/// A record that can be written as one CSV row
pub trait TabularRecord {
    /// Declared field order of this record type
    const FIELDS: &'static [&'static str];

    /// Text of a field, or `None` for a name this type does not have
    fn field(&self, name: &str) -> Option<String>;
}

impl TabularRecord for OutputRecord {
    const FIELDS: &'static [&'static str] = &OUTPUT_FIELDS;

    fn field(&self, name: &str) -> Option<String> {
        let text = match name {
            "reportingUnit" => self.reporting_unit.clone(),
            "facilityCode" => self.facility_code.clone(),
            "productCode" => self.product_code.clone(),
            "dataPoint" => self.data_point.to_string(),
            "reportingPeriod" => self.reporting_period.clone(),
            "value" => self.value.to_string(),
            _ => return None,
        };
        Some(text)
    }
}

impl TabularRecord for FacilityRecord {
    const FIELDS: &'static [&'static str] = &FACILITY_FIELDS;

    fn field(&self, name: &str) -> Option<String> {
        FacilityField::from_name(name).map(|f| self.get(f).to_string())
    }
}

/// Write records as CSV with `fields` as header and column order.
///
/// Every name in `fields` must be one of `R::FIELDS`; nothing is written
/// otherwise.
pub fn write_csv<W, R>(writer: W, fields: &[&str], records: &[R]) -> ExportResult<()>
where
    W: Write,
    R: TabularRecord,
{
    if let Some(unknown) = fields.iter().find(|&&name| !R::FIELDS.contains(&name)) {
        return Err(ExportError::UnknownField(unknown.to_string()));
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(fields)?;

    for record in records {
        let row = fields
            .iter()
            .map(|&name| {
                record
                    .field(name)
                    .ok_or_else(|| ExportError::UnknownField(name.to_string()))
            })
            .collect::<ExportResult<Vec<String>>>()?;
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render records to a CSV string.
pub fn to_csv_string<R: TabularRecord>(fields: &[&str], records: &[R]) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, fields, records)?;
    // csv only writes the UTF-8 we hand it
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write records to a file, creating parent directories as needed.
pub fn write_csv_file<R: TabularRecord>(
    path: &Path,
    fields: &[&str],
    records: &[R],
) -> ExportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), fields, records)
}

/// An exported file read back: header plus rows of text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Cell of a row by column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let i = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row)?.get(i).map(String::as_str)
    }
}

/// Parse a CSV export.
pub fn read_csv<R: Read>(reader: R) -> ExportResult<CsvTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.iter().map(String::from).collect();
    let rows = csv_reader
        .records()
        .map(|r| r.map(|record| record.iter().map(String::from).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
    Ok(CsvTable { headers, rows })
}
