//! Data preparation after ingestion.
//!
//! - Dates: coercion of the detected date column
//! - Reshape: region filter, line series, wide/long melt
//! - Stats: `describe` summary
//! - Pipeline: ingest → classify → coerce → view

pub mod dates;
pub mod pipeline;
pub mod reshape;
pub mod stats;

pub use dates::{coerce_date_column, coerce_date_column_from, parse_datetime};
pub use pipeline::*;
pub use reshape::{filter_regions, line_series, melt, select_regions, unique_regions, Point, Series};
pub use stats::{describe, ColumnSummary};
