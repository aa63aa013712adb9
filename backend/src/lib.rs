//! # popstat - population statistics CSV ingestion
//!
//! popstat reads CSV exports of resident population and household statistics
//! (주민등록 인구 및 세대현황), works out which columns hold the date, the
//! region and the population values, and prepares chart-ready data.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV bytes  │────▶│   Parser    │────▶│  Classifier │────▶│  View JSON  │
//! │ (file/URL)  │     │ (enc × sep) │     │  (keywords) │     │ (series+stats)
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use popstat::{dashboard_from_bytes, ViewOptions};
//!
//! let bytes = std::fs::read("population.csv")?;
//! let view = dashboard_from_bytes(&bytes, &ViewOptions::default(), None)?;
//! println!("Charting {} for {} regions", view.target_column, view.series.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration
//! - [`models`] - Table, cells and column classification
//! - [`parser`] - CSV parsing with encoding/delimiter trials
//! - [`classify`] - Keyword column classifier
//! - [`fetch`] - Remote CSV download
//! - [`cache`] - Parse result memoization
//! - [`transform`] - Date coercion, reshaping, statistics, pipeline
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Ingestion
pub mod cache;
pub mod classify;
pub mod fetch;
pub mod parser;

// Preparation
pub mod transform;

// HTTP API
pub mod api;

pub use transform::pipeline;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ClassificationError, CsvError, FetchError, PipelineError, PipelineResult, ServerError,
};

// =============================================================================
// Re-exports - Models & Config
// =============================================================================

pub use config::Config;
pub use models::{Cell, Column, ColumnClassification, Table};

// =============================================================================
// Re-exports - Ingestion
// =============================================================================

pub use cache::IngestCache;
pub use classify::{classify, validate_classification, ColumnRole};
pub use fetch::{fetch_bytes, is_url};
pub use parser::{
    format_delimiter, parse_bytes_auto, parse_delimited, ParseResult, TextEncoding, DELIMITERS,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    coerce_date_column, coerce_date_column_from, describe, filter_regions, line_series, melt,
    parse_datetime, select_regions, unique_regions, ColumnSummary, Point, Series,
};
pub use transform::pipeline::{
    build_view, dashboard_from_bytes, ingest_bytes, ingest_file, ingest_parsed, ingest_url,
    CsvInfo, DashboardView, Ingested, ViewOptions,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, DashboardResponse, FetchRequest, ViewRequest};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
