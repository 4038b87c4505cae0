//! Wire types of the DHIS2 endpoints we read.

use serde::Deserialize;
use serde_json::Value;

use crate::models::RawAnalyticsRow;

/// `organisationUnits.json` page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitPage {
    #[serde(default)]
    pub organisation_units: Vec<OrgUnit>,
    pub pager: Pager,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    pub page_count: u32,
}

/// Organisation unit with the fields requested by [`ORG_UNIT_FIELDS`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<ParentUnit>,
    #[serde(default)]
    pub organisation_unit_groups: Vec<OrgUnitGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParentUnit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<Box<ParentUnit>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgUnitGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Field filter for paged org unit requests
pub const ORG_UNIT_FIELDS: &str =
    "id,name,code,parent[parent[id,name,code]],organisationUnitGroups[id,name]";

impl OrgUnit {
    /// The unit two levels up (the district of a facility).
    pub fn grandparent(&self) -> Option<&ParentUnit> {
        self.parent.as_ref()?.parent.as_deref()
    }
}

/// `sqlViews/{id}/data.json` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub list_grid: ListGrid,
}

/// Column-oriented result: header names plus rows of cells
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGrid {
    #[serde(default)]
    pub headers: Vec<GridHeader>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridHeader {
    pub name: String,
}

impl ListGrid {
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.name.as_str()).collect()
    }
}

/// `analytics.json` body; rows are decoded into named fields on arrival
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub rows: Vec<RawAnalyticsRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_unit_page() {
        let page: OrgUnitPage = serde_json::from_str(
            r#"{
                "pager": {"page": 1, "pageCount": 3, "total": 2500, "pageSize": 1000},
                "organisationUnits": [{
                    "id": "fac1",
                    "name": "Kawempe HC IV",
                    "parent": {"parent": {"id": "dst1", "name": "Kampala District"}},
                    "organisationUnitGroups": [{"id": "ou6is72lmDC", "name": "HC IV"}]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(page.pager.page_count, 3);
        let unit = &page.organisation_units[0];
        assert_eq!(unit.grandparent().unwrap().name, "Kampala District");
        assert_eq!(unit.organisation_unit_groups[0].name, "HC IV");
    }

    #[test]
    fn test_grid_response() {
        let grid: GridResponse = serde_json::from_str(
            r#"{
                "listGrid": {
                    "headers": [{"name": "uid", "column": "uid"}],
                    "rows": [["a"], [null]]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(grid.list_grid.header_names(), vec!["uid"]);
        assert_eq!(grid.list_grid.rows.len(), 2);
    }

    #[test]
    fn test_analytics_rows_default_empty() {
        let body: AnalyticsResponse = serde_json::from_str(r#"{"headers": []}"#).unwrap();
        assert!(body.rows.is_empty());
    }
}
