//! REST API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::{DashboardView, ViewOptions};

/// Response sent after a successful upload or fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" or "warning"
    pub status: String,

    /// Non-fatal observations about the data.
    pub warnings: Vec<String>,

    #[serde(flatten)]
    pub view: DashboardView,
}

impl From<DashboardView> for DashboardResponse {
    fn from(view: DashboardView) -> Self {
        let mut warnings = Vec::new();

        if view.classification.region_column.is_none() {
            warnings.push("No region column found; showing all rows".to_string());
        }
        let has_values = view
            .series
            .iter()
            .flat_map(|s| &s.points)
            .any(|p| p.y.is_some());
        if !has_values {
            warnings.push(format!("Column '{}' has no numeric values to chart", view.target_column));
        }

        DashboardResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if warnings.is_empty() { "ready" } else { "warning" }.to_string(),
            warnings,
            view,
        }
    }
}

/// View choices accepted by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewRequest {
    /// Value column to chart.
    pub column: Option<String>,
    /// Regions to keep.
    pub regions: Option<Vec<String>>,
    /// Value columns to compare.
    pub compare: Vec<String>,
}

impl ViewRequest {
    pub fn into_options(self, default_regions: usize) -> ViewOptions {
        ViewOptions {
            target_column: self.column.filter(|c| !c.is_empty()),
            regions: self.regions,
            compare_columns: self.compare,
            default_regions,
            ..ViewOptions::default()
        }
    }
}

/// Body of `POST /api/fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub url: String,
    #[serde(flatten)]
    pub view: ViewRequest,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pipeline::dashboard_from_bytes;

    #[test]
    fn test_fetch_request_flattens_view() {
        let req: FetchRequest = serde_json::from_value(json!({
            "url": "https://example.com/pop.csv",
            "column": "세대수",
            "regions": ["서울특별시"]
        }))
        .unwrap();

        assert_eq!(req.url, "https://example.com/pop.csv");
        let options = req.view.into_options(5);
        assert_eq!(options.target_column.as_deref(), Some("세대수"));
        assert_eq!(options.regions, Some(vec!["서울특별시".to_string()]));
        assert!(options.compare_columns.is_empty());
    }

    #[test]
    fn test_response_warns_without_region() {
        let view = dashboard_from_bytes("기간,인구\n2024,1".as_bytes(), &ViewOptions::default(), None).unwrap();
        let response = DashboardResponse::from(view);
        assert_eq!(response.status, "warning");
        assert_eq!(response.warnings.len(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["targetColumn"], "인구");
        assert!(json["jobId"].is_string());
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("boom");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "boom");
    }
}
