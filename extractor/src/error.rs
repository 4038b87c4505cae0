//! Error types for the OSA extraction pipeline.
//!
//! - [`MappingError`] - Product mapping file errors
//! - [`FetchError`] - Upstream (DHIS2) request errors
//! - [`ReshapeError`] - Analytics reshaping errors
//! - [`ExportError`] - CSV export errors
//! - [`TransferError`] - External transfer tool errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Coarse classification of a run failure, used for logging and exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or HTTP failure calling upstream.
    Transport,
    /// Upstream response missing what the run relies on.
    UpstreamShape,
    /// The transfer tool failed.
    ExternalTool,
    /// A value that must be numeric was not.
    Coercion,
    /// Static configuration (mapping file) could not be loaded.
    Configuration,
    /// Local file output failed.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::UpstreamShape => "upstream-shape",
            ErrorKind::ExternalTool => "external-tool",
            ErrorKind::Coercion => "coercion",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors while loading the product mapping table.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Failed to read the mapping file.
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping file is not valid JSON.
    #[error("Invalid mapping JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Mapping file root is not an object keyed by upstream code.
    #[error("Mapping must be a JSON object keyed by upstream product code")]
    NotAnObject,

    /// An entry could not be decoded.
    #[error("Invalid mapping entry '{code}': {message}")]
    InvalidEntry { code: String, message: String },
}

// =============================================================================
// Upstream Errors
// =============================================================================

/// Errors from the upstream data-warehouse API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Upstream answered with a body we could not decode.
    #[error("Unexpected response from {endpoint}: {message}")]
    Shape { endpoint: String, message: String },
}

// =============================================================================
// Reshape Errors
// =============================================================================

/// Errors while turning analytics rows into report records.
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// No stock-on-hand row survived product mapping.
    #[error("No stock on hand rows to report; cannot derive the reporting period")]
    NoStockRows,

    /// A row value could not be read as a number.
    #[error("Non-numeric value '{value}' for product {product_code} at {facility_code} ({period})")]
    NonNumericValue {
        product_code: String,
        facility_code: String,
        period: String,
        value: String,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the CSV output.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Field order names a field the record type does not have.
    #[error("Unknown export field: {0}")]
    UnknownField(String),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Transfer Errors
// =============================================================================

/// Errors from the external transfer tool.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The tool could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited with a failure status.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The tool succeeded but wrote to standard error.
    #[error("{program} reported: {stderr}")]
    Stderr { program: String, stderr: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_sync`]
/// and [`crate::transform::pipeline::run_transfer`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Mapping error.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Upstream error.
    #[error("Upstream error: {0}")]
    Fetch(#[from] FetchError),

    /// Reshape error.
    #[error("Reshape error: {0}")]
    Reshape(#[from] ReshapeError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Transfer error.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Mapping(_) => ErrorKind::Configuration,
            PipelineError::Fetch(FetchError::Shape { .. }) => ErrorKind::UpstreamShape,
            PipelineError::Fetch(_) => ErrorKind::Transport,
            PipelineError::Reshape(ReshapeError::NoStockRows) => ErrorKind::UpstreamShape,
            PipelineError::Reshape(ReshapeError::NonNumericValue { .. }) => ErrorKind::Coercion,
            PipelineError::Export(_) => ErrorKind::Io,
            PipelineError::Transfer(_) => ErrorKind::ExternalTool,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for upstream operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let err: PipelineError = ReshapeError::NoStockRows.into();
        assert_eq!(err.kind(), ErrorKind::UpstreamShape);
        assert!(err.to_string().contains("stock on hand"));

        let err: PipelineError = TransferError::Stderr {
            program: "azcopy".into(),
            stderr: "denied".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ExternalTool);
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_coercion_kind_and_message() {
        let err: PipelineError = ReshapeError::NonNumericValue {
            product_code: "P1".into(),
            facility_code: "F1".into(),
            period: "202401".into(),
            value: "abc".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Coercion);
        let msg = err.to_string();
        assert!(msg.contains("'abc'"));
        assert!(msg.contains("F1"));
    }

    #[test]
    fn test_fetch_kinds() {
        let status: PipelineError = FetchError::Status {
            endpoint: "analytics.json".into(),
            status: 401,
            body: "Unauthorized".into(),
        }
        .into();
        assert_eq!(status.kind(), ErrorKind::Transport);

        let shape: PipelineError = FetchError::Shape {
            endpoint: "analytics.json".into(),
            message: "missing rows".into(),
        }
        .into();
        assert_eq!(shape.kind(), ErrorKind::UpstreamShape);
        assert_eq!(shape.kind().to_string(), "upstream-shape");
    }
}
