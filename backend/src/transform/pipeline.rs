//! High-level pipeline: bytes → table → classification → dashboard view.
//!
//! # Example
//!
//! ```rust,ignore
//! use popstat::pipeline::{ingest_file, build_view, ViewOptions};
//!
//! let ingested = ingest_file("population.csv".as_ref(), None)?;
//! let view = build_view(&ingested, &ViewOptions::default())?;
//! println!("{} series", view.series.len());
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::dates::{coerce_date_column, coerce_date_column_from};
use super::reshape::{filter_regions, line_series, melt, select_regions, unique_regions, Series};
use super::stats::{describe, ColumnSummary};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::cache::IngestCache;
use crate::classify::{classify, validate_classification};
use crate::config::{DEFAULT_REGION_COUNT, PREVIEW_ROWS};
use crate::error::{CsvError, PipelineError, PipelineResult};
use crate::fetch::fetch_bytes;
use crate::models::{ColumnClassification, Table};
use crate::parser::{format_delimiter, parse_bytes_auto, ParseResult, TextEncoding};

/// CSV file information
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: TextEncoding,
    pub delimiter: String,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// A parsed, classified table with its date column coerced.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub table: Table,
    pub classification: ColumnClassification,
    pub csv_info: CsvInfo,
    /// Cells of the date column that parsed as dates.
    pub dates_parsed: usize,
}

impl Ingested {
    /// Date column; present after successful ingestion.
    pub fn date_column(&self) -> &str {
        self.classification.date_column.as_deref().unwrap_or_default()
    }
}

/// Caller choices for the dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewOptions {
    /// Value column to chart; defaults to the first value column.
    pub target_column: Option<String>,
    /// Regions to keep; `None` or empty selects the first `default_regions`.
    pub regions: Option<Vec<String>>,
    /// Value columns to compare side by side (long form when two or more).
    pub compare_columns: Vec<String>,
    pub default_regions: usize,
    pub preview_rows: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            target_column: None,
            regions: None,
            compare_columns: Vec::new(),
            default_regions: DEFAULT_REGION_COUNT,
            preview_rows: PREVIEW_ROWS,
        }
    }
}

/// Everything a presentation layer needs to draw the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub csv_info: CsvInfo,
    pub classification: ColumnClassification,
    /// First rows of the table, after date coercion.
    pub preview: Table,
    pub target_column: String,
    pub available_regions: Vec<String>,
    pub selected_regions: Vec<String>,
    /// Rows left after region filtering.
    pub filtered_rows: usize,
    /// One line per selected region.
    pub series: Vec<Series>,
    /// Long-form table of the compared value columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Table>,
    /// `describe` of the filtered table.
    pub summary: Vec<ColumnSummary>,
}

// =============================================================================
// Ingestion
// =============================================================================

/// Parse, classify and coerce CSV bytes.
///
/// With a cache, identical bytes reuse the earlier parse.
pub fn ingest_bytes(bytes: &[u8], cache: Option<&IngestCache>) -> PipelineResult<Ingested> {
    log_info("📖 Reading CSV...");
    log_info("Trying encodings and separators...");

    let parsed: Arc<ParseResult> = match cache {
        Some(cache) => cache.get_or_parse(bytes)?,
        None => Arc::new(parse_bytes_auto(bytes)?),
    };

    ingest_parsed(&parsed)
}

/// Parse, classify and coerce a local CSV file.
pub fn ingest_file(path: &Path, cache: Option<&IngestCache>) -> PipelineResult<Ingested> {
    let bytes = std::fs::read(path).map_err(CsvError::from)?;
    ingest_bytes(&bytes, cache)
}

/// Fetch a CSV over HTTP, then ingest it.
pub async fn ingest_url(
    url: &str,
    timeout: Option<Duration>,
    cache: Option<&IngestCache>,
) -> PipelineResult<Ingested> {
    let bytes = fetch_bytes(url, timeout).await?;
    ingest_bytes(&bytes, cache)
}

/// Classify an already-parsed table and coerce its date column.
pub fn ingest_parsed(parsed: &ParseResult) -> PipelineResult<Ingested> {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!(
        "Read {} rows × {} columns",
        parsed.table.row_count(),
        parsed.table.column_count()
    ));

    let columns = parsed.headers();
    let classification = classify(columns.as_slice());
    validate_classification(&classification)?;

    log_info(format!("📅 Date column: {}", classification.date_column.as_deref().unwrap_or_default()));
    log_info(format!(
        "📍 Region column: {}",
        classification.region_column.as_deref().unwrap_or("none")
    ));
    log_info(format!("📈 Value columns: {}", classification.value_columns.join(", ")));

    let mut table = parsed.table.clone();
    let date_column = classification.date_column.clone().unwrap_or_default();
    let dates_parsed = match parsed.source_column(&date_column) {
        Some(source) => coerce_date_column_from(&mut table, &date_column, &source.values),
        None => coerce_date_column(&mut table, &date_column),
    };
    if dates_parsed == 0 {
        log_warning(format!("Column '{}' could not be read as dates; kept as is", date_column));
    }

    Ok(Ingested {
        csv_info: CsvInfo {
            encoding: parsed.encoding,
            delimiter: format_delimiter(parsed.delimiter),
            columns,
            row_count: table.row_count(),
        },
        table,
        classification,
        dates_parsed,
    })
}

// =============================================================================
// View
// =============================================================================

/// Apply the caller's choices to an ingested table.
pub fn build_view(ingested: &Ingested, options: &ViewOptions) -> PipelineResult<DashboardView> {
    let classification = &ingested.classification;
    let date_column = ingested.date_column();

    let target_column = match &options.target_column {
        Some(column) => ensure_value_column(classification, column)?.to_string(),
        None => classification
            .value_columns
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::UnknownColumn(String::new()))?,
    };
    for column in &options.compare_columns {
        ensure_value_column(classification, column)?;
    }

    let region_column = classification.region_column.as_deref();
    let (available_regions, selected_regions, filtered) = match region_column {
        Some(region) => {
            let available = unique_regions(&ingested.table, region);
            let selected = select_regions(&available, options.regions.as_deref(), options.default_regions);
            let filtered = filter_regions(&ingested.table, region, &selected);
            (available, selected, filtered)
        }
        None => (Vec::new(), Vec::new(), ingested.table.clone()),
    };

    log_info(format!("🎯 Charting '{}' over '{}'", target_column, date_column));
    if region_column.is_some() {
        log_info(format!(
            "Regions: {} of {} selected",
            selected_regions.len(),
            available_regions.len()
        ));
    }

    let series = line_series(&filtered, date_column, &target_column, region_column);

    let comparison = (options.compare_columns.len() > 1).then(|| {
        let mut ids = vec![date_column];
        ids.extend(region_column);
        let values: Vec<&str> = options.compare_columns.iter().map(String::as_str).collect();
        melt(&filtered, &ids, &values)
    });

    let summary = describe(&filtered);
    log_success(format!("{} series, {} rows", series.len(), filtered.row_count()));

    Ok(DashboardView {
        csv_info: ingested.csv_info.clone(),
        classification: classification.clone(),
        preview: ingested.table.head(options.preview_rows),
        target_column,
        available_regions,
        selected_regions,
        filtered_rows: filtered.row_count(),
        series,
        comparison,
        summary,
    })
}

fn ensure_value_column<'a>(
    classification: &ColumnClassification,
    column: &'a str,
) -> PipelineResult<&'a str> {
    if classification.value_columns.iter().any(|c| c == column) {
        Ok(column)
    } else {
        Err(PipelineError::UnknownColumn(column.to_string()))
    }
}

/// Ingest bytes and build the view in one step.
pub fn dashboard_from_bytes(
    bytes: &[u8],
    options: &ViewOptions,
    cache: Option<&IngestCache>,
) -> PipelineResult<DashboardView> {
    let ingested = ingest_bytes(bytes, cache)?;
    build_view(&ingested, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClassificationError, FetchError};
    use crate::models::Cell;
    use axum::{http::StatusCode, routing::get, Router};
    use chrono::NaiveDate;

    const POPULATION: &str = "\
기준월,시도,총인구수,세대수
2024-01,서울특별시,9386034,4470000
2024-01,부산광역시,3293362,1560000
2024-02,서울특별시,9383000,4471000
2024-02,부산광역시,3290000,1561000
2024-03,서울특별시,잘못된값,4472000
";

    #[test]
    fn test_ingest_population_csv() {
        let ingested = ingest_bytes(POPULATION.as_bytes(), None).unwrap();

        assert_eq!(ingested.classification.date_column.as_deref(), Some("기준월"));
        assert_eq!(ingested.classification.region_column.as_deref(), Some("시도"));
        assert_eq!(ingested.classification.value_columns, vec!["총인구수", "세대수"]);
        assert_eq!(ingested.csv_info.row_count, 5);
        assert_eq!(ingested.csv_info.delimiter, ",");
        assert_eq!(ingested.dates_parsed, 5);

        let first = &ingested.table.column("기준월").unwrap().values[0];
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(first, &Cell::Date(expected));
    }

    #[test]
    fn test_insufficient_columns_halt() {
        let err = ingest_bytes("id,name,score\n1,a,3".as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Classification(ClassificationError::Insufficient { .. })
        ));
    }

    #[test]
    fn test_empty_and_unreadable() {
        assert!(matches!(
            ingest_bytes(b"", None).unwrap_err(),
            PipelineError::Csv(CsvError::EmptyFile)
        ));
        assert!(matches!(
            ingest_bytes(b"single\n1", None).unwrap_err(),
            PipelineError::Csv(CsvError::Unreadable)
        ));
    }

    #[test]
    fn test_default_view() {
        let ingested = ingest_bytes(POPULATION.as_bytes(), None).unwrap();
        let view = build_view(&ingested, &ViewOptions::default()).unwrap();

        assert_eq!(view.target_column, "총인구수");
        assert_eq!(view.available_regions, vec!["서울특별시", "부산광역시"]);
        assert_eq!(view.selected_regions, view.available_regions);
        assert_eq!(view.filtered_rows, 5);
        assert_eq!(view.series.len(), 2);
        assert_eq!(view.series[0].points[2].y, None);
        assert!(view.comparison.is_none());
        assert_eq!(view.preview.row_count(), 5);

        // 총인구수 holds text, so only 세대수 is summarised.
        let summarised: Vec<&str> = view.summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(summarised, vec!["세대수"]);
    }

    #[test]
    fn test_region_selection_and_comparison() {
        let ingested = ingest_bytes(POPULATION.as_bytes(), None).unwrap();
        let options = ViewOptions {
            target_column: Some("세대수".into()),
            regions: Some(vec!["부산광역시".into()]),
            compare_columns: vec!["총인구수".into(), "세대수".into()],
            ..ViewOptions::default()
        };

        let view = build_view(&ingested, &options).unwrap();
        assert_eq!(view.selected_regions, vec!["부산광역시"]);
        assert_eq!(view.filtered_rows, 2);
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].points[0].y, Some(1_560_000.0));

        let long = view.comparison.unwrap();
        assert_eq!(long.row_count(), 4);
        assert_eq!(long.column_names(), vec!["기준월", "시도", "indicator", "value"]);
    }

    #[test]
    fn test_unknown_target_column() {
        let ingested = ingest_bytes(POPULATION.as_bytes(), None).unwrap();
        let options = ViewOptions {
            target_column: Some("시도".into()),
            ..ViewOptions::default()
        };
        assert!(matches!(
            build_view(&ingested, &options),
            Err(PipelineError::UnknownColumn(c)) if c == "시도"
        ));
    }

    #[test]
    fn test_without_region_column() {
        let csv = "기간,인구\n2023,10\n2024,12";
        let view = dashboard_from_bytes(csv.as_bytes(), &ViewOptions::default(), None).unwrap();
        assert!(view.classification.region_column.is_none());
        assert!(view.available_regions.is_empty());
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].points.len(), 2);
        assert_eq!(view.summary.len(), 1);
    }

    #[test]
    fn test_ingest_uses_cache() {
        let cache = IngestCache::new(2);
        ingest_bytes(POPULATION.as_bytes(), Some(&cache)).unwrap();
        ingest_bytes(POPULATION.as_bytes(), Some(&cache)).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ingest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pop.csv");
        std::fs::write(&path, POPULATION).unwrap();
        let ingested = ingest_file(&path, None).unwrap();
        assert_eq!(ingested.csv_info.row_count, 5);

        let missing = ingest_file(&dir.path().join("missing.csv"), None).unwrap_err();
        assert!(matches!(missing, PipelineError::Csv(CsvError::IoError(_))));
    }

    #[test]
    fn test_dotted_year_month_dates() {
        let ingested = ingest_bytes("기준월,인구수\n2024.01,1\n2024.10,2\n".as_bytes(), None).unwrap();

        let month = |m| Cell::Date(NaiveDate::from_ymd_opt(2024, m, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(ingested.dates_parsed, 2);
        assert_eq!(ingested.table.column("기준월").unwrap().values, vec![month(1), month(10)]);

        let view = build_view(&ingested, &ViewOptions::default()).unwrap();
        let summarised: Vec<&str> = view.summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(summarised, vec!["인구수"]);
    }

    async fn serve_csv() -> std::net::SocketAddr {
        let app = Router::new()
            .route("/pop.csv", get(|| async { POPULATION }))
            .route("/gone.csv", get(|| async { StatusCode::NOT_FOUND }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    #[tokio::test]
    async fn test_ingest_url() {
        let addr = serve_csv().await;
        let timeout = Some(Duration::from_secs(10));

        let ingested = ingest_url(&format!("http://{}/pop.csv", addr), timeout, None).await.unwrap();
        assert_eq!(ingested.csv_info.row_count, 5);
        assert_eq!(ingested.classification.region_column.as_deref(), Some("시도"));

        let err = ingest_url(&format!("http://{}/gone.csv", addr), timeout, None).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_view_serialization_is_camel_case() {
        let view = dashboard_from_bytes(POPULATION.as_bytes(), &ViewOptions::default(), None).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["classification"]["dateColumn"], "기준월");
        assert_eq!(json["csvInfo"]["encoding"], "utf-8-sig");
        assert!(json.get("comparison").is_none());
    }
}
