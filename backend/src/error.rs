//! Error types for the popstat ingestion pipeline.
//!
//! - [`CsvError`] - CSV reading errors (empty input, no usable encoding/delimiter)
//! - [`FetchError`] - Remote CSV retrieval errors
//! - [`ClassificationError`] - Required columns not recognised
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading CSV bytes.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Input had zero bytes.
    #[error("The uploaded file is empty")]
    EmptyFile,

    /// No (encoding, delimiter) combination produced a multi-column table.
    #[error("Could not read CSV with any supported encoding/delimiter")]
    Unreadable,
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors while downloading a CSV from a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

// =============================================================================
// Classification Errors
// =============================================================================

/// The keyword heuristic did not find the columns a chart needs.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Could not find a {} column; check the CSV column names", missing_roles(.missing_date, .missing_values))]
    Insufficient {
        missing_date: bool,
        missing_values: bool,
    },
}

fn missing_roles(missing_date: &bool, missing_values: &bool) -> &'static str {
    match (*missing_date, *missing_values) {
        (true, true) => "date or population",
        (true, false) => "date",
        _ => "population",
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Every variant is terminal for the current input: no partial result is
/// produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Remote fetch error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Required columns missing.
    #[error("{0}")]
    Classification(#[from] ClassificationError),

    /// Requested column is not one of the value columns.
    #[error("Unknown value column: {0}")]
    UnknownColumn(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let fetch_err = FetchError::Status { status: 404, url: "http://x/a.csv".into() };
        let pipeline_err: PipelineError = fetch_err.into();
        assert!(pipeline_err.to_string().contains("404"));
    }

    #[test]
    fn test_classification_message_names_missing_role() {
        let err = ClassificationError::Insufficient { missing_date: true, missing_values: false };
        assert!(err.to_string().contains("date column"));

        let err = ClassificationError::Insufficient { missing_date: false, missing_values: true };
        assert!(err.to_string().contains("population column"));

        let err = ClassificationError::Insufficient { missing_date: true, missing_values: true };
        assert!(err.to_string().contains("date or population"));
    }
}
