//! DHIS2 client
//!
//! Reads facility master data and analytics from a DHIS2 instance. Every
//! request carries the configured basic-auth credentials.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use osa::upstream::{AnalyticsQuery, Dhis2Client};
//!
//! let client = Dhis2Client::new(&config.upstream);
//! let units = client.fetch_facility_units(5, 1000).await?;
//! let rows = client
//!     .fetch_analytics(&AnalyticsQuery::new("dx1;dx2", 5, "LAST_MONTH"))
//!     .await?;
//! ```

pub mod pager;
pub mod types;

use serde::de::DeserializeOwned;

use crate::config::UpstreamConfig;
use crate::error::{FetchError, FetchResult};
use crate::logs::log_info_indent;
use crate::models::RawAnalyticsRow;

pub use pager::{collect_pages, Page};
pub use types::{AnalyticsResponse, GridResponse, ListGrid, OrgUnit, OrgUnitPage};

/// One dimensional analytics query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsQuery {
    /// `;`-separated data element ids
    pub data_elements: String,
    pub org_unit_level: u32,
    /// Period token, possibly `;`-separated
    pub period: String,
}

impl AnalyticsQuery {
    pub fn new(
        data_elements: impl Into<String>,
        org_unit_level: u32,
        period: impl Into<String>,
    ) -> Self {
        Self {
            data_elements: data_elements.into(),
            org_unit_level,
            period: period.into(),
        }
    }

    /// Repeated `dimension` query parameters, `dx` then `ou` then `pe`
    pub fn dimensions(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dimension", format!("dx:{}", self.data_elements)),
            ("dimension", format!("ou:LEVEL-{}", self.org_unit_level)),
            ("dimension", format!("pe:{}", self.period)),
        ]
    }
}

/// DHIS2 API client
#[derive(Clone)]
pub struct Dhis2Client {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl Dhis2Client {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// GET an endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T> {
        let response = self
            .http
            .get(self.url(endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Shape {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch one page of org units at a hierarchy level
    pub async fn fetch_org_unit_page(
        &self,
        page: u32,
        level: u32,
        page_size: u32,
    ) -> FetchResult<Page<OrgUnit>> {
        let query = [
            ("page", page.to_string()),
            ("level", level.to_string()),
            ("pageSize", page_size.to_string()),
            ("fields", types::ORG_UNIT_FIELDS.to_string()),
        ];
        let body: OrgUnitPage = self.get_json("organisationUnits.json", &query).await?;
        log_info_indent(
            format!(
                "Page {} of {}: {} units",
                page,
                body.pager.page_count,
                body.organisation_units.len()
            ),
            1,
        );
        Ok(Page {
            items: body.organisation_units,
            page_count: body.pager.page_count,
        })
    }

    /// Fetch every org unit at a hierarchy level, page by page
    pub async fn fetch_facility_units(
        &self,
        level: u32,
        page_size: u32,
    ) -> FetchResult<Vec<OrgUnit>> {
        collect_pages(|page| self.fetch_org_unit_page(page, level, page_size)).await
    }

    /// Fetch the full grid of a SQL view
    pub async fn fetch_grid(&self, sql_view_id: &str) -> FetchResult<ListGrid> {
        let endpoint = format!("sqlViews/{}/data.json", sql_view_id);
        let body: GridResponse = self
            .get_json(&endpoint, &[("paging", "false".to_string())])
            .await?;
        Ok(body.list_grid)
    }

    /// Run an analytics query and return its rows as-is.
    ///
    /// An empty data element list means there is nothing to ask for; no
    /// request is made.
    pub async fn fetch_analytics(
        &self,
        query: &AnalyticsQuery,
    ) -> FetchResult<Vec<RawAnalyticsRow>> {
        if query.data_elements.is_empty() {
            return Ok(Vec::new());
        }
        let body: AnalyticsResponse = self.get_json("analytics.json", &query.dimensions()).await?;
        Ok(body.rows)
    }
}
