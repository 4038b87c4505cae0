//! # OSA - DHIS2 facility and stock extraction
//!
//! Extracts facility master data and commodity stock analytics from a DHIS2
//! instance, reshapes them into the OSA report layout, writes one CSV per
//! run and uploads it with `azcopy`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    DHIS2    │────▶│  Upstream   │────▶│  Transform  │────▶│  CSV file   │──▶ azcopy
//! │ (analytics) │     │ (paged/dim) │     │ (normalize, │     │ (fixed      │
//! └─────────────┘     └─────────────┘     │  reshape)   │     │  columns)   │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (FacilityRecord, OutputRecord, DataPoint, Period)
//! - [`mapping`] - Product mapping and dimension lists
//! - [`upstream`] - DHIS2 client (paged and dimensional queries)
//! - [`transform`] - Normalizer, reshaper and pipelines
//! - [`export`] - CSV export
//! - [`transfer`] - External transfer tool
//! - [`config`] - Environment configuration
//! - [`logs`] - Run log

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Static inputs
pub mod mapping;

// Upstream
pub mod upstream;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod transfer;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ErrorKind,
    ExportError,
    FetchError,
    MappingError,
    PipelineError,
    ReshapeError,
    TransferError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    DataPoint,
    FacilityField,
    FacilityRecord,
    OutputRecord,
    Period,
    RawAnalyticsRow,
    RecordValue,
};

// =============================================================================
// Re-exports - Mapping
// =============================================================================

pub use mapping::{DataPointLabel, DimensionLists, ProductCatalog, ProductMapping};

// =============================================================================
// Re-exports - Upstream
// =============================================================================

pub use upstream::{collect_pages, AnalyticsQuery, Dhis2Client, ListGrid, OrgUnit, Page};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    facility_from_org_unit,
    normalize_grid,
    FacilitySchema,
    FieldSource,
    Reshaped,
    Reshaper,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    fetch_analytics_pair,
    run_sync,
    run_transfer,
    RunSummary,
    SyncOptions,
    TransferOptions,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use config::{Config, UpstreamConfig};
pub use export::{read_csv, to_csv_string, write_csv, write_csv_file, CsvTable, TabularRecord};
pub use transfer::TransferTool;
