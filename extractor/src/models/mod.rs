//! Domain models for the OSA extraction pipeline.
//!
//! - [`FacilityRecord`] - One facility row of the master-data export
//! - [`OutputRecord`] - One stock/consumption report line
//! - [`DataPoint`] - Closed set of report line classification codes
//! - [`RecordValue`] - Value carried by a report line
//! - [`RawAnalyticsRow`] - One decoded upstream analytics row
//! - [`Period`] - Upstream period token

use regex::Regex;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fmt;

// =============================================================================
// Facilities
// =============================================================================

/// A facility as exported to the master-data file.
///
/// Fields are plain strings; data missing upstream is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityRecord {
    pub code: String,
    pub level: String,
    pub name: String,
    pub ownership_type: String,
    pub region: String,
    pub district: String,
    pub facility_type: String,
    pub operational_status: String,
}

/// Target fields of a [`FacilityRecord`], in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacilityField {
    Code,
    Level,
    Name,
    OwnershipType,
    Region,
    District,
    Type,
    OperationalStatus,
}

impl FacilityField {
    pub const ALL: [FacilityField; 8] = [
        FacilityField::Code,
        FacilityField::Level,
        FacilityField::Name,
        FacilityField::OwnershipType,
        FacilityField::Region,
        FacilityField::District,
        FacilityField::Type,
        FacilityField::OperationalStatus,
    ];

    /// Column name in the exported file.
    pub fn name(self) -> &'static str {
        match self {
            FacilityField::Code => "code",
            FacilityField::Level => "level",
            FacilityField::Name => "name",
            FacilityField::OwnershipType => "ownershipType",
            FacilityField::Region => "region",
            FacilityField::District => "district",
            FacilityField::Type => "type",
            FacilityField::OperationalStatus => "operationalStatus",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl FacilityRecord {
    pub fn get(&self, field: FacilityField) -> &str {
        match field {
            FacilityField::Code => &self.code,
            FacilityField::Level => &self.level,
            FacilityField::Name => &self.name,
            FacilityField::OwnershipType => &self.ownership_type,
            FacilityField::Region => &self.region,
            FacilityField::District => &self.district,
            FacilityField::Type => &self.facility_type,
            FacilityField::OperationalStatus => &self.operational_status,
        }
    }

    pub fn set(&mut self, field: FacilityField, value: String) {
        let slot = match field {
            FacilityField::Code => &mut self.code,
            FacilityField::Level => &mut self.level,
            FacilityField::Name => &mut self.name,
            FacilityField::OwnershipType => &mut self.ownership_type,
            FacilityField::Region => &mut self.region,
            FacilityField::District => &mut self.district,
            FacilityField::Type => &mut self.facility_type,
            FacilityField::OperationalStatus => &mut self.operational_status,
        };
        *slot = value;
    }
}

// =============================================================================
// Report lines
// =============================================================================

/// Classification code of a report line.
///
/// The three `QuantityUsed*` codes carry the rank of the reporting period
/// within a product/facility pair: the most recent period gets 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataPoint {
    /// Literal tag naming the source system.
    SourceTag,
    /// `YYYYMMDD` date of the extraction run.
    ExtractionDate,
    /// Stock on hand quantity.
    StockOnHand,
    /// Quantity used, two periods before the latest.
    QuantityUsedRank2,
    /// Quantity used, period before the latest.
    QuantityUsedRank1,
    /// Quantity used, latest period.
    QuantityUsedRank0,
}

impl DataPoint {
    pub fn code(self) -> u8 {
        match self {
            DataPoint::SourceTag => 1,
            DataPoint::ExtractionDate => 2,
            DataPoint::StockOnHand => 3,
            DataPoint::QuantityUsedRank2 => 11,
            DataPoint::QuantityUsedRank1 => 12,
            DataPoint::QuantityUsedRank0 => 13,
        }
    }

    /// Code for a 0-based period rank; ranks past the third are not reported.
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(DataPoint::QuantityUsedRank0),
            1 => Some(DataPoint::QuantityUsedRank1),
            2 => Some(DataPoint::QuantityUsedRank2),
            _ => None,
        }
    }
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Value of a report line.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Quantity(f64),
    Date(u32),
    Tag(String),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display already drops a trailing ".0"
            RecordValue::Quantity(q) => write!(f, "{}", q),
            RecordValue::Date(d) => write!(f, "{}", d),
            RecordValue::Tag(t) => f.write_str(t),
        }
    }
}

/// One line of the stock/consumption report.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub reporting_unit: String,
    pub facility_code: String,
    pub product_code: String,
    pub data_point: DataPoint,
    pub reporting_period: String,
    pub value: RecordValue,
}

// =============================================================================
// Upstream analytics rows
// =============================================================================

/// One analytics row, decoded from the positional `[dx, ou, pe, value]`
/// array returned upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String, String, String)")]
pub struct RawAnalyticsRow {
    pub product_code: String,
    pub facility_code: String,
    pub period: String,
    pub value: String,
}

impl From<(String, String, String, String)> for RawAnalyticsRow {
    fn from(
        (product_code, facility_code, period, value): (String, String, String, String),
    ) -> Self {
        Self {
            product_code,
            facility_code,
            period,
            value,
        }
    }
}

impl RawAnalyticsRow {
    pub fn new(
        product_code: impl Into<String>,
        facility_code: impl Into<String>,
        period: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            facility_code: facility_code.into(),
            period: period.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Periods
// =============================================================================

static MONTHLY_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(0[1-9]|1[0-2])$").expect("valid period regex"));

/// Period token understood by the upstream analytics API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period(String);

impl Period {
    pub const LAST_MONTH: &'static str = "LAST_MONTH";
    pub const LAST_3_MONTHS: &'static str = "LAST_3_MONTHS";

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Year and month of an absolute `YYYYMM` token.
    pub fn as_month(&self) -> Option<(i32, u32)> {
        let caps = MONTHLY_PERIOD.captures(&self.0)?;
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        Some((year, month))
    }

    /// Token covering the three periods that end with this one.
    ///
    /// `LAST_MONTH` widens to `LAST_3_MONTHS`, `YYYYMM` becomes the
    /// `;`-separated list of the three months ending at it, and any other
    /// token is returned unchanged.
    pub fn trailing_window(&self) -> Period {
        if self.0 == Self::LAST_MONTH {
            return Period::new(Self::LAST_3_MONTHS);
        }
        match self.as_month() {
            Some((year, month)) => {
                let months: Vec<String> = (0..3)
                    .rev()
                    .map(|back| {
                        let index = year * 12 + month as i32 - 1 - back;
                        format!("{:04}{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
                    })
                    .collect();
                Period(months.join(";"))
            }
            None => self.clone(),
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::new(Self::LAST_MONTH)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Period::new(s))
    }
}
