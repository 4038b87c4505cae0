//! Reshape analytics rows into flat report lines.
//!
//! ```text
//! stock on hand rows                     report lines
//! ┌─────────────────────────┐            ┌──────────────────────────────┐
//! │ P2 F2 202401 5          │     →      │ F2 SOH2 dp=3  202401 5       │
//! └─────────────────────────┘            │ F2 SOH2 dp=1  202401 DHIS2   │
//!                                        │ F2 SOH2 dp=2  202401 20240203│
//! quantity used rows                     ├──────────────────────────────┤
//! ┌─────────────────────────┐            │ F1 USE1 dp=13 202403 30      │
//! │ P1 F1 202401 10         │     →      │ F1 USE1 dp=12 202402 20      │
//! │ P1 F1 202403 30         │            │ F1 USE1 dp=11 202401 10      │
//! │ P1 F1 202402 20         │            └──────────────────────────────┘
//! └─────────────────────────┘
//! ```
//!
//! Stock lines come first, in raw row order. Quantity used lines follow,
//! grouped by product/facility in first-seen order and ranked by period,
//! most recent first. Only the three most recent periods are kept.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

use crate::error::ReshapeError;
use crate::mapping::ProductCatalog;
use crate::models::{DataPoint, OutputRecord, RawAnalyticsRow, RecordValue};

/// Report lines plus the period they report on
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    /// Period of the first stock on hand row; names the output file
    pub reporting_period: String,
    pub records: Vec<OutputRecord>,
}

/// Product/facility pair identifying one quantity used series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey<'a> {
    product_code: &'a str,
    facility_code: &'a str,
}

pub const DEFAULT_REPORTING_UNIT: &str = "UGA";
pub const DEFAULT_SOURCE_TAG: &str = "DHIS2";

/// Settings stamped onto every report line
#[derive(Debug, Clone)]
pub struct Reshaper {
    pub reporting_unit: String,
    pub source_tag: String,
}

impl Default for Reshaper {
    fn default() -> Self {
        Self {
            reporting_unit: DEFAULT_REPORTING_UNIT.to_string(),
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
        }
    }
}

/// `YYYYMMDD` as an integer
pub fn date_stamp(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

fn parse_quantity(row: &RawAnalyticsRow) -> Result<f64, ReshapeError> {
    row.value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReshapeError::NonNumericValue {
            product_code: row.product_code.clone(),
            facility_code: row.facility_code.clone(),
            period: row.period.clone(),
            value: row.value.clone(),
        })
}

impl Reshaper {
    pub fn new(reporting_unit: impl Into<String>, source_tag: impl Into<String>) -> Self {
        Self {
            reporting_unit: reporting_unit.into(),
            source_tag: source_tag.into(),
        }
    }

    fn record(
        &self,
        row: &RawAnalyticsRow,
        product_code: &str,
        data_point: DataPoint,
        value: RecordValue,
    ) -> OutputRecord {
        OutputRecord {
            reporting_unit: self.reporting_unit.clone(),
            facility_code: row.facility_code.clone(),
            product_code: product_code.to_string(),
            data_point,
            reporting_period: row.period.clone(),
            value,
        }
    }

    /// Expand each mapped stock on hand row into its value, source tag and
    /// extraction date lines.
    pub fn expand_stock(
        &self,
        catalog: &ProductCatalog,
        rows: &[RawAnalyticsRow],
        extraction_date: NaiveDate,
    ) -> Result<Vec<OutputRecord>, ReshapeError> {
        let stamp = date_stamp(extraction_date);
        let mut records = Vec::with_capacity(rows.len() * 3);

        for row in rows {
            let Some(mapping) = catalog.get(&row.product_code) else {
                continue;
            };
            let quantity = parse_quantity(row)?;
            let product = mapping.product_code.as_str();
            let lines = [
                (DataPoint::StockOnHand, RecordValue::Quantity(quantity)),
                (DataPoint::SourceTag, RecordValue::Tag(self.source_tag.clone())),
                (DataPoint::ExtractionDate, RecordValue::Date(stamp)),
            ];
            for (data_point, value) in lines {
                records.push(self.record(row, product, data_point, value));
            }
        }
        Ok(records)
    }

    /// Rank mapped quantity used rows per product/facility, most recent
    /// period first, keeping the top three.
    pub fn rank_quantity_used(
        &self,
        catalog: &ProductCatalog,
        rows: &[RawAnalyticsRow],
    ) -> Result<Vec<OutputRecord>, ReshapeError> {
        let mut group_index: HashMap<SeriesKey<'_>, usize> = HashMap::new();
        let mut groups: Vec<Vec<&RawAnalyticsRow>> = Vec::new();

        for row in rows.iter().filter(|r| catalog.get(&r.product_code).is_some()) {
            let key = SeriesKey {
                product_code: &row.product_code,
                facility_code: &row.facility_code,
            };
            let i = *group_index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[i].push(row);
        }

        let mut records = Vec::new();
        for mut group in groups {
            // stable: equal periods keep arrival order
            group.sort_by(|a, b| b.period.cmp(&a.period));

            for (rank, row) in group.into_iter().enumerate() {
                let Some(data_point) = DataPoint::for_rank(rank) else {
                    break;
                };
                let Some(mapping) = catalog.get(&row.product_code) else {
                    continue;
                };
                let quantity = parse_quantity(row)?;
                let value = RecordValue::Quantity(quantity);
                records.push(self.record(row, &mapping.product_code, data_point, value));
            }
        }
        Ok(records)
    }

    /// Build the full report: stock lines, then ranked quantity used lines.
    ///
    /// Fails with [`ReshapeError::NoStockRows`] when no stock on hand row
    /// maps to a product, since the reporting period comes from them.
    pub fn reshape(
        &self,
        catalog: &ProductCatalog,
        stock_on_hand: &[RawAnalyticsRow],
        quantity_used: &[RawAnalyticsRow],
        extraction_date: NaiveDate,
    ) -> Result<Reshaped, ReshapeError> {
        let mut records = self.expand_stock(catalog, stock_on_hand, extraction_date)?;
        let reporting_period = records
            .first()
            .map(|r| r.reporting_period.clone())
            .ok_or(ReshapeError::NoStockRows)?;

        records.extend(self.rank_quantity_used(catalog, quantity_used)?);

        Ok(Reshaped {
            reporting_period,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ProductCatalog {
        ProductCatalog::from_json_str(
            r#"{
                "P1": { "productCode": "USE1", "dataPoint": "Quantity used" },
                "P2": { "productCode": "SOH2", "dataPoint": "Stock on hand" },
                "P3": { "productCode": "USE3", "dataPoint": "Quantity used" }
            }"#,
        )
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
    }

    fn row(p: &str, f: &str, pe: &str, v: &str) -> RawAnalyticsRow {
        RawAnalyticsRow::new(p, f, pe, v)
    }

    fn codes(records: &[OutputRecord]) -> Vec<(String, u8)> {
        records
            .iter()
            .map(|r| (r.reporting_period.clone(), r.data_point.code()))
            .collect()
    }

    #[test]
    fn test_ranking_most_recent_first() {
        let used = vec![
            row("P1", "F1", "202401", "10"),
            row("P1", "F1", "202403", "30"),
            row("P1", "F1", "202402", "20"),
        ];
        let records = Reshaper::default().rank_quantity_used(&catalog(), &used).unwrap();

        assert_eq!(
            codes(&records),
            vec![
                ("202403".to_string(), 13),
                ("202402".to_string(), 12),
                ("202401".to_string(), 11),
            ]
        );
        assert_eq!(records[0].value, RecordValue::Quantity(30.0));
        assert_eq!(records[2].value, RecordValue::Quantity(10.0));
        assert!(records.iter().all(|r| r.product_code == "USE1"));
    }

    #[test]
    fn test_ranking_truncates_after_three() {
        let used = vec![
            row("P1", "F1", "202312", "1"),
            row("P1", "F1", "202401", "2"),
            row("P1", "F1", "202403", "4"),
            row("P1", "F1", "202402", "3"),
        ];
        let records = Reshaper::default().rank_quantity_used(&catalog(), &used).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.reporting_period != "202312"));
    }

    #[test]
    fn test_equal_periods_keep_arrival_order() {
        let used = vec![
            row("P1", "F1", "202402", "7"),
            row("P1", "F1", "202403", "1"),
            row("P1", "F1", "202402", "8"),
            row("P1", "F1", "202402", "9"),
        ];
        let records = Reshaper::default().rank_quantity_used(&catalog(), &used).unwrap();

        let ranked: Vec<(u8, RecordValue)> = records
            .iter()
            .map(|r| (r.data_point.code(), r.value.clone()))
            .collect();
        assert_eq!(
            ranked,
            vec![
                (13, RecordValue::Quantity(1.0)),
                (12, RecordValue::Quantity(7.0)),
                (11, RecordValue::Quantity(8.0)),
            ]
        );
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let used = vec![
            row("P3", "F9", "202402", "7"),
            row("P1", "F1", "202401", "1"),
            row("P3", "F9", "202403", "8"),
            row("P1", "F1", "202402", "2"),
        ];
        let records = Reshaper::default().rank_quantity_used(&catalog(), &used).unwrap();

        let keys: Vec<(&str, &str, u8)> = records
            .iter()
            .map(|r| (r.product_code.as_str(), r.reporting_period.as_str(), r.data_point.code()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("USE3", "202403", 13),
                ("USE3", "202402", 12),
                ("USE1", "202402", 13),
                ("USE1", "202401", 12),
            ]
        );
    }

    #[test]
    fn test_group_key_does_not_collide_on_concatenation() {
        let catalog = ProductCatalog::from_json_str(
            r#"{
                "P1": { "productCode": "A", "dataPoint": "Quantity used" },
                "P12": { "productCode": "B", "dataPoint": "Quantity used" }
            }"#,
        )
        .unwrap();
        // "P1" + "23" and "P12" + "3" are different series
        let used = vec![row("P1", "23", "202401", "1"), row("P12", "3", "202402", "2")];
        let records = Reshaper::default().rank_quantity_used(&catalog, &used).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.data_point == DataPoint::QuantityUsedRank0));
    }

    #[test]
    fn test_stock_row_expands_to_triple() {
        let stock = vec![row("P2", "F2", "202401", "5")];
        let records = Reshaper::default().expand_stock(&catalog(), &stock, date()).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.facility_code == "F2" && r.product_code == "SOH2"));
        assert_eq!(records[0].data_point, DataPoint::StockOnHand);
        assert_eq!(records[0].value, RecordValue::Quantity(5.0));
        assert_eq!(records[1].data_point, DataPoint::SourceTag);
        assert_eq!(records[1].value, RecordValue::Tag("DHIS2".into()));
        assert_eq!(records[2].data_point, DataPoint::ExtractionDate);
        assert_eq!(records[2].value, RecordValue::Date(20240203));
        assert_eq!(records[2].value.to_string().len(), 8);
    }

    #[test]
    fn test_unmapped_codes_are_dropped() {
        let stock = vec![row("P2", "F2", "202401", "5"), row("NOPE", "F2", "202401", "9")];
        let used = vec![row("NOPE", "F1", "202401", "not-even-a-number")];
        let out = Reshaper::default().reshape(&catalog(), &stock, &used, date()).unwrap();

        assert_eq!(out.records.len(), 3);
        assert!(out.records.iter().all(|r| r.product_code == "SOH2"));
    }

    #[test]
    fn test_reshape_merges_stock_before_used() {
        let stock = vec![row("P2", "F2", "202402", "5"), row("P2", "F3", "202402", "0")];
        let used = vec![row("P1", "F1", "202402", "4.5")];
        let out = Reshaper::new("KEN", "HMIS").reshape(&catalog(), &stock, &used, date()).unwrap();

        assert_eq!(out.reporting_period, "202402");
        assert_eq!(out.records.len(), 7);
        assert_eq!(out.records[3].facility_code, "F3");
        assert_eq!(out.records[6].data_point, DataPoint::QuantityUsedRank0);
        assert_eq!(out.records[6].value, RecordValue::Quantity(4.5));
        assert_eq!(out.records[1].value, RecordValue::Tag("HMIS".into()));
        assert!(out.records.iter().all(|r| r.reporting_unit == "KEN"));
    }

    #[test]
    fn test_no_stock_rows_is_named_error() {
        let used = vec![row("P1", "F1", "202402", "4")];
        let err = Reshaper::default().reshape(&catalog(), &[], &used, date()).unwrap_err();
        assert!(matches!(err, ReshapeError::NoStockRows));

        let unmapped = vec![row("NOPE", "F1", "202402", "4")];
        let err = Reshaper::default().reshape(&catalog(), &unmapped, &used, date()).unwrap_err();
        assert!(matches!(err, ReshapeError::NoStockRows));
    }

    #[test]
    fn test_non_numeric_value_is_coercion_error() {
        let stock = vec![row("P2", "F2", "202401", "five")];
        let err = Reshaper::default().reshape(&catalog(), &stock, &[], date()).unwrap_err();
        assert!(matches!(err, ReshapeError::NonNumericValue { ref value, .. } if value == "five"));

        let stock = vec![row("P2", "F2", "202401", "NaN")];
        assert!(Reshaper::default().expand_stock(&catalog(), &stock, date()).is_err());
    }

    #[test]
    fn test_dropped_rank_is_not_coerced() {
        // The fourth, oldest value is discarded before it is parsed.
        let used = vec![
            row("P1", "F1", "202312", "n/a"),
            row("P1", "F1", "202401", "2"),
            row("P1", "F1", "202402", "3"),
            row("P1", "F1", "202403", "4"),
        ];
        let records = Reshaper::default().rank_quantity_used(&catalog(), &used).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_date_stamp() {
        assert_eq!(date_stamp(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()), 20251231);
        assert_eq!(date_stamp(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()), 20240105);
    }
}
