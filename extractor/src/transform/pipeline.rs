//! High-level pipelines behind the `sync` and `transfer` commands.
//!
//! # Example
//!
//! ```rust,ignore
//! use osa::{run_transfer, Config, TransferOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let summary = run_transfer(&config, TransferOptions::default()).await?;
//!     println!("Wrote {} lines to {}", summary.record_count, summary.output_path.display());
//!     Ok(())
//! }
//! ```

use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

use super::normalizer::{facility_from_org_unit, normalize_grid, FacilitySchema};
use super::reshaper::Reshaper;
use crate::config::Config;
use crate::error::{FetchResult, PipelineResult, TransferError};
use crate::export::{write_csv_file, TabularRecord};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::mapping::{DimensionLists, ProductCatalog};
use crate::models::{FacilityRecord, OutputRecord, Period, RawAnalyticsRow};
use crate::transfer::TransferTool;
use crate::upstream::{AnalyticsQuery, Dhis2Client};

/// Options for the facility sync
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Use paged org units even when a facility SQL view is configured
    pub force_paged: bool,
    /// Write the file but do not upload it
    pub skip_transfer: bool,
}

/// Options for the stock report transfer
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Stock on hand period; quantity used covers the three periods ending here
    pub period: Period,
    /// Write the file but do not upload it
    pub skip_transfer: bool,
    /// Date stamped on the report; defaults to today
    pub extraction_date: Option<NaiveDate>,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub record_count: usize,
    /// Period the report covers (stock report only)
    pub reporting_period: Option<String>,
    /// Transfer tool output, if the file was uploaded
    pub transfer_output: Option<String>,
}

// =============================================================================
// sync
// =============================================================================

/// Extract facility master data, export it and upload it.
pub async fn run_sync(config: &Config, options: SyncOptions) -> PipelineResult<RunSummary> {
    let client = Dhis2Client::new(&config.upstream);

    log_info("🏥 Fetching facilities...");
    let facilities = fetch_facilities(&client, config, options.force_paged).await?;
    log_success(format!("{} facilities", facilities.len()));

    let path = config.facilities_file();
    write_csv_file(&path, FacilityRecord::FIELDS, &facilities)?;
    log_success(format!("Written to {}", path.display()));

    let transfer_output = upload(config, &path, options.skip_transfer).await?;

    Ok(RunSummary {
        output_path: path,
        record_count: facilities.len(),
        reporting_period: None,
        transfer_output,
    })
}

async fn fetch_facilities(
    client: &Dhis2Client,
    config: &Config,
    force_paged: bool,
) -> FetchResult<Vec<FacilityRecord>> {
    if force_paged || config.facility_sql_view.is_empty() {
        log_info_indent(
            format!(
                "Paging org units at level {} ({} per page)",
                config.facility_level, config.page_size
            ),
            1,
        );
        let units = client
            .fetch_facility_units(config.facility_level, config.page_size)
            .await?;
        return Ok(units
            .iter()
            .map(|unit| {
                facility_from_org_unit(unit, config.facility_level, &config.facility_type_group)
            })
            .collect());
    }

    log_info_indent(format!("Reading SQL view {}", config.facility_sql_view), 1);
    let grid = client.fetch_grid(&config.facility_sql_view).await?;
    log_info_indent(format!("Columns: {}", grid.header_names().join(", ")), 1);
    Ok(normalize_grid(
        &FacilitySchema::default(),
        &grid.header_names(),
        &grid.rows,
    ))
}

// =============================================================================
// transfer
// =============================================================================

/// Extract stock analytics, reshape them into the report, export and upload.
pub async fn run_transfer(config: &Config, options: TransferOptions) -> PipelineResult<RunSummary> {
    log_info(format!("📖 Loading product mapping from {}", config.mapping_path.display()));
    let catalog = ProductCatalog::load(&config.mapping_path)?;
    let lists = catalog.dimension_lists();
    log_success(format!(
        "{} products: {} stock on hand, {} quantity used",
        catalog.len(),
        lists.stock_on_hand.len(),
        lists.quantity_used.len()
    ));

    let client = Dhis2Client::new(&config.upstream);
    log_info(format!("📡 Querying analytics for {}...", options.period));
    let (stock, used) =
        fetch_analytics_pair(&client, &lists, config.facility_level, &options.period).await?;
    log_success(format!(
        "{} stock on hand rows, {} quantity used rows",
        stock.len(),
        used.len()
    ));

    let extraction_date = options
        .extraction_date
        .unwrap_or_else(|| Local::now().date_naive());
    let reshaper = Reshaper::new(&config.reporting_unit, &config.source_tag);
    log_info("⚙️  Reshaping...");
    let report = reshaper.reshape(&catalog, &stock, &used, extraction_date)?;
    log_success(format!(
        "{} report lines for {}",
        report.records.len(),
        report.reporting_period
    ));

    let path = config.report_file(&report.reporting_period);
    write_csv_file(&path, OutputRecord::FIELDS, &report.records)?;
    log_success(format!("Written to {}", path.display()));

    let transfer_output = upload(config, &path, options.skip_transfer).await?;

    Ok(RunSummary {
        output_path: path,
        record_count: report.records.len(),
        reporting_period: Some(report.reporting_period),
        transfer_output,
    })
}

/// Run the stock on hand and quantity used queries concurrently.
pub async fn fetch_analytics_pair(
    client: &Dhis2Client,
    lists: &DimensionLists,
    org_unit_level: u32,
    period: &Period,
) -> FetchResult<(Vec<RawAnalyticsRow>, Vec<RawAnalyticsRow>)> {
    let stock_query =
        AnalyticsQuery::new(lists.stock_on_hand_dx(), org_unit_level, period.as_str());
    let used_query = AnalyticsQuery::new(
        lists.quantity_used_dx(),
        org_unit_level,
        period.trailing_window().as_str(),
    );

    futures::try_join!(
        client.fetch_analytics(&stock_query),
        client.fetch_analytics(&used_query)
    )
}

async fn upload(config: &Config, path: &Path, skip: bool) -> Result<Option<String>, TransferError> {
    if skip {
        log_warning("Transfer skipped");
        return Ok(None);
    }

    let tool = TransferTool::new(&config.transfer_program);
    log_info(format!("☁️  Uploading with {}...", tool.program()));
    let output = tool.copy(path, &config.destination_url).await?;
    log_success("Transfer completed");
    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PipelineError};
    use std::io::Write;

    #[test]
    fn test_default_options() {
        let opts = TransferOptions::default();
        assert_eq!(opts.period.as_str(), "LAST_MONTH");
        assert!(!opts.skip_transfer);
        assert!(opts.extraction_date.is_none());
        assert!(!SyncOptions::default().force_paged);
    }

    #[tokio::test]
    async fn test_missing_mapping_is_configuration_error() {
        let config = Config {
            mapping_path: PathBuf::from("/no/such/mapping.json"),
            ..Config::default()
        };
        let err = run_transfer(&config, TransferOptions::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Mapping(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_empty_mapping_reports_no_stock_rows() {
        // Nothing to query: no request is made and the run fails by name.
        let mut mapping = tempfile::NamedTempFile::new().unwrap();
        mapping.write_all(b"{}").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            mapping_path: mapping.path().to_path_buf(),
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let err = run_transfer(&config, TransferOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamShape);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
