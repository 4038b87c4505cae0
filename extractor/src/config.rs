//! Run configuration from the environment (and `.env`, if present).
//!
//! Nothing here fails: a missing variable takes its default, and a missing
//! credential is the empty string.

use std::env;
use std::path::PathBuf;

use crate::mapping::DEFAULT_MAPPING_PATH;
use crate::transfer::DEFAULT_PROGRAM;
use crate::transform::reshaper::{DEFAULT_REPORTING_UNIT, DEFAULT_SOURCE_TAG};

/// Connection settings for the upstream DHIS2 instance
#[derive(Debug, Clone, Default)]
pub struct UpstreamConfig {
    /// API root, e.g. `https://dhis2.example.org/api`
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// Complete run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream: UpstreamConfig,
    /// Blob container SAS URL handed to the transfer tool
    pub destination_url: String,
    pub mapping_path: PathBuf,
    pub output_dir: PathBuf,
    /// Output files are named `<prefix>_<period>.csv` / `<prefix>_Facilities.csv`
    pub file_prefix: String,
    pub reporting_unit: String,
    pub source_tag: String,
    /// Org unit hierarchy level of facilities
    pub facility_level: u32,
    pub page_size: u32,
    /// SQL view returning the facility grid; empty means use paged org units
    pub facility_sql_view: String,
    /// Org unit group whose name is the facility type on the paged path
    pub facility_type_group: String,
    pub transfer_program: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            destination_url: String::new(),
            mapping_path: PathBuf::from(DEFAULT_MAPPING_PATH),
            output_dir: PathBuf::from("."),
            file_prefix: "Uganda_OSA".to_string(),
            reporting_unit: DEFAULT_REPORTING_UNIT.to_string(),
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            facility_level: 5,
            page_size: 1000,
            facility_sql_view: String::new(),
            facility_type_group: "ou6is72lmDC".to_string(),
            transfer_program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);
        let number = |key: &str, default: u32| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            upstream: UpstreamConfig {
                base_url: text("DHIS2_URL", String::new()),
                username: text("DHIS2_USERNAME", String::new()),
                password: text("DHIS2_PASSWORD", String::new()),
            },
            destination_url: text("AZURE_STORAGE_ACCOUNT_SAS_URL", String::new()),
            mapping_path: lookup("OSA_MAPPING_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.mapping_path),
            output_dir: lookup("OSA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            file_prefix: text("OSA_FILE_PREFIX", defaults.file_prefix),
            reporting_unit: text("OSA_REPORTING_UNIT", defaults.reporting_unit),
            source_tag: text("OSA_SOURCE_TAG", defaults.source_tag),
            facility_level: number("OSA_FACILITY_LEVEL", defaults.facility_level),
            page_size: number("OSA_PAGE_SIZE", defaults.page_size),
            facility_sql_view: text("OSA_FACILITY_SQL_VIEW", defaults.facility_sql_view),
            facility_type_group: text("OSA_FACILITY_TYPE_GROUP", defaults.facility_type_group),
            transfer_program: text("AZCOPY_BIN", defaults.transfer_program),
        }
    }

    /// Path of the facility master-data file
    pub fn facilities_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_Facilities.csv", self.file_prefix))
    }

    /// Path of the stock report for a reporting period
    pub fn report_file(&self, reporting_period: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.csv", self.file_prefix, reporting_period))
    }
}
