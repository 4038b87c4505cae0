//! Facility normalization: upstream results into [`FacilityRecord`]s.
//!
//! Grid results are mapped by header **name**. Each target field is resolved
//! to a column index once, then every row is projected through the resolved
//! indices. A header that is absent resolves to `None` and the field comes
//! out empty for every row; partial facility data is still exported.
//!
//! ```text
//! headers: [name, uid, status, ...]       FacilitySchema
//!                 │                        code  ← "uid"
//!                 ▼                        name  ← "name"
//! ResolvedSchema: code→1, name→0, ...      type  ← "Health Facility"
//!                 │
//!                 ▼
//! rows ──────▶ Vec<FacilityRecord>
//! ```

use serde_json::Value;

use crate::logs::log_warning;
use crate::models::{FacilityField, FacilityRecord};
use crate::upstream::types::OrgUnit;

/// Facility type written when the grid carries none
pub const DEFAULT_FACILITY_TYPE: &str = "Health Facility";

/// Where a facility field comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Grid column with this header name
    Column(String),
    /// Literal value, same for every row
    Constant(String),
}

impl FieldSource {
    pub fn column(name: impl Into<String>) -> Self {
        FieldSource::Column(name.into())
    }

    pub fn constant(value: impl Into<String>) -> Self {
        FieldSource::Constant(value.into())
    }
}

/// Target field → source mapping
#[derive(Debug, Clone)]
pub struct FacilitySchema {
    fields: Vec<(FacilityField, FieldSource)>,
}

impl Default for FacilitySchema {
    fn default() -> Self {
        Self::new()
            .with(FacilityField::Code, FieldSource::column("uid"))
            .with(FacilityField::Level, FieldSource::column("hflevel"))
            .with(FacilityField::Name, FieldSource::column("name"))
            .with(FacilityField::OwnershipType, FieldSource::column("ownership"))
            .with(FacilityField::Region, FieldSource::column("region"))
            .with(FacilityField::District, FieldSource::column("district"))
            .with(FacilityField::Type, FieldSource::constant(DEFAULT_FACILITY_TYPE))
            .with(FacilityField::OperationalStatus, FieldSource::column("status"))
    }
}

impl FacilitySchema {
    /// Schema with no fields mapped; unmapped fields stay empty.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Set the source of a field, replacing any previous one.
    pub fn with(mut self, field: FacilityField, source: FieldSource) -> Self {
        self.fields.retain(|(f, _)| *f != field);
        self.fields.push((field, source));
        self
    }

    pub fn source(&self, field: FacilityField) -> Option<&FieldSource> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, s)| s)
    }

    /// Resolve column sources against the grid's header names.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> ResolvedSchema {
        let fields = self
            .fields
            .iter()
            .map(|(field, source)| {
                let resolved = match source {
                    FieldSource::Column(name) => {
                        let index = headers.iter().position(|h| h.as_ref() == name);
                        if index.is_none() {
                            log_warning(format!(
                                "Header '{}' not found; '{}' will be empty",
                                name,
                                field.name()
                            ));
                        }
                        Resolved::Column(index)
                    }
                    FieldSource::Constant(value) => Resolved::Constant(value.clone()),
                };
                (*field, resolved)
            })
            .collect();
        ResolvedSchema { fields }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    /// `None` when the header was not found
    Column(Option<usize>),
    Constant(String),
}

/// Schema bound to one grid's column positions
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    fields: Vec<(FacilityField, Resolved)>,
}

impl ResolvedSchema {
    /// Column index a field was resolved to, if it is a found column.
    pub fn column_index(&self, field: FacilityField) -> Option<usize> {
        self.fields.iter().find_map(|(f, r)| match r {
            Resolved::Column(index) if *f == field => *index,
            _ => None,
        })
    }

    pub fn project_row(&self, row: &[Value]) -> FacilityRecord {
        let mut record = FacilityRecord::default();
        for (field, resolved) in &self.fields {
            let value = match resolved {
                Resolved::Column(Some(i)) => row.get(*i).map(cell_text).unwrap_or_default(),
                Resolved::Column(None) => String::new(),
                Resolved::Constant(value) => value.clone(),
            };
            record.set(*field, value);
        }
        record
    }

    pub fn project(&self, rows: &[Vec<Value>]) -> Vec<FacilityRecord> {
        rows.iter().map(|row| self.project_row(row)).collect()
    }
}

/// Grid cell as text: strings as-is, null empty, anything else as JSON.
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a header/rows grid with a schema.
pub fn normalize_grid<S: AsRef<str>>(
    schema: &FacilitySchema,
    headers: &[S],
    rows: &[Vec<Value>],
) -> Vec<FacilityRecord> {
    schema.resolve(headers).project(rows)
}

/// Map an org unit from the paged listing to a facility record.
///
/// The district is the unit's grandparent; the facility type is the name of
/// its membership in `type_group`, if any.
pub fn facility_from_org_unit(unit: &OrgUnit, level: u32, type_group: &str) -> FacilityRecord {
    let district = unit
        .grandparent()
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let facility_type = unit
        .organisation_unit_groups
        .iter()
        .find(|g| g.id == type_group)
        .map(|g| g.name.clone())
        .unwrap_or_default();

    FacilityRecord {
        code: unit.id.clone(),
        level: level.to_string(),
        name: unit.name.clone(),
        district,
        facility_type,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::types::{OrgUnitGroup, ParentUnit};
    use serde_json::json;

    const HEADERS: [&str; 7] = [
        "uid",
        "hflevel",
        "name",
        "ownership",
        "region",
        "district",
        "status",
    ];

    fn reference_row() -> Vec<Value> {
        vec![
            json!("fac1"),
            json!("HC III"),
            json!("Bukoto HC III"),
            json!("Government"),
            json!("Central"),
            json!("Kampala"),
            json!("Functional"),
        ]
    }

    fn expected() -> FacilityRecord {
        FacilityRecord {
            code: "fac1".into(),
            level: "HC III".into(),
            name: "Bukoto HC III".into(),
            ownership_type: "Government".into(),
            region: "Central".into(),
            district: "Kampala".into(),
            facility_type: DEFAULT_FACILITY_TYPE.into(),
            operational_status: "Functional".into(),
        }
    }

    #[test]
    fn test_header_permutations_give_same_record() {
        let schema = FacilitySchema::default();
        let row = reference_row();

        // Rotate the column order; the record must not change.
        for shift in 0..HEADERS.len() {
            let order: Vec<usize> = (0..HEADERS.len())
                .map(|i| (i + shift) % HEADERS.len())
                .collect();
            let headers: Vec<&str> = order.iter().map(|&i| HEADERS[i]).collect();
            let permuted: Vec<Value> = order.iter().map(|&i| row[i].clone()).collect();

            let records = normalize_grid(&schema, &headers, &[permuted]);
            assert_eq!(records, vec![expected()], "shift {}", shift);
        }
    }

    #[test]
    fn test_reversed_headers() {
        let headers: Vec<&str> = HEADERS.iter().rev().copied().collect();
        let row: Vec<Value> = reference_row().into_iter().rev().collect();
        let records = normalize_grid(&FacilitySchema::default(), &headers, &[row]);
        assert_eq!(records[0], expected());
    }

    #[test]
    fn test_missing_header_leaves_field_empty() {
        let headers = ["uid", "hflevel", "name", "region", "district", "status"];
        let rows = vec![
            ["a", "HC II", "A", "North", "Gulu", "Functional"].map(Value::from).to_vec(),
            ["b", "HC IV", "B", "West", "Hoima", "Closed"].map(Value::from).to_vec(),
        ];

        let resolved = FacilitySchema::default().resolve(&headers);
        assert_eq!(resolved.column_index(FacilityField::OwnershipType), None);
        assert_eq!(resolved.column_index(FacilityField::Region), Some(3));

        let records = resolved.project(&rows);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.ownership_type.is_empty()));
        assert_eq!(records[1].district, "Hoima");
    }

    #[test]
    fn test_short_rows_and_non_string_cells() {
        let headers = ["uid", "hflevel", "name"];
        let rows = vec![vec![json!("a"), json!(4)], vec![json!(null), json!(null), json!("C")]];
        let records = normalize_grid(&FacilitySchema::default(), &headers, &rows);

        assert_eq!(records[0].level, "4");
        assert_eq!(records[0].name, "");
        assert_eq!(records[1].code, "");
        assert_eq!(records[1].name, "C");
    }

    #[test]
    fn test_schema_override() {
        let schema = FacilitySchema::default()
            .with(FacilityField::Type, FieldSource::column("facility_type"));
        assert_eq!(
            schema.source(FacilityField::Type),
            Some(&FieldSource::column("facility_type"))
        );

        let rows = [vec![json!("x"), json!("Hospital")]];
        let records = normalize_grid(&schema, &["uid", "facility_type"], &rows);
        assert_eq!(records[0].facility_type, "Hospital");
    }

    #[test]
    fn test_facility_from_org_unit() {
        let unit = OrgUnit {
            id: "fac9".into(),
            name: "Mulago NRH".into(),
            parent: Some(ParentUnit {
                parent: Some(Box::new(ParentUnit {
                    id: "dst1".into(),
                    name: "Kampala District".into(),
                    parent: None,
                })),
                ..Default::default()
            }),
            organisation_unit_groups: vec![
                OrgUnitGroup { id: "other".into(), name: "Urban".into() },
                OrgUnitGroup { id: "ou6is72lmDC".into(), name: "Hospital".into() },
            ],
        };

        let record = facility_from_org_unit(&unit, 5, "ou6is72lmDC");
        assert_eq!(record.code, "fac9");
        assert_eq!(record.level, "5");
        assert_eq!(record.district, "Kampala District");
        assert_eq!(record.facility_type, "Hospital");
        assert_eq!(record.ownership_type, "");

        let orphan = OrgUnit { id: "x".into(), ..Default::default() };
        let record = facility_from_org_unit(&orphan, 5, "ou6is72lmDC");
        assert_eq!(record.district, "");
        assert_eq!(record.facility_type, "");
    }
}
