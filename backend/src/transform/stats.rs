//! Descriptive statistics over numeric columns.

use serde::Serialize;

use crate::models::Table;

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

/// Summarise every numeric (integer/float) column, in table order.
///
/// Columns without a single numeric value are omitted.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .filter_map(|c| {
            let values: Vec<f64> = c.values.iter().filter_map(|v| v.as_f64()).collect();
            summarize(&c.name, values)
        })
        .collect()
}

/// Summary statistics of `values`; `None` when empty.
pub fn summarize(name: &str, mut values: Vec<f64>) -> Option<ColumnSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    });

    Some(ColumnSummary {
        column: name.to_string(),
        count: n,
        mean,
        std,
        min: values[0],
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.50),
        p75: quantile(&values, 0.75),
        max: values[n - 1],
    })
}

/// Linear-interpolated quantile of sorted, non-empty `sorted`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Column};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_matches_hand_computed() {
        let s = summarize("x", vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert!(approx(s.mean, 2.5));
        assert!(approx(s.std.unwrap(), (5.0f64 / 3.0).sqrt()));
        assert!(approx(s.min, 1.0));
        assert!(approx(s.p25, 1.75));
        assert!(approx(s.p50, 2.5));
        assert!(approx(s.p75, 3.25));
        assert!(approx(s.max, 4.0));
    }

    #[test]
    fn test_single_value_has_no_std() {
        let s = summarize("x", vec![7.0]).unwrap();
        assert_eq!(s.std, None);
        assert!(approx(s.p25, 7.0));
        assert!(summarize("x", vec![]).is_none());
    }

    #[test]
    fn test_describe_skips_non_numeric_columns() {
        let table = Table::new(vec![
            Column::new("시도", vec![Cell::Text("서울".into()), Cell::Text("부산".into())]),
            Column::new("인구수", vec![Cell::Int(10), Cell::Null]),
            Column::new("비율", vec![Cell::Float(0.5), Cell::Float(1.5)]),
            Column::new("빈값", vec![Cell::Null, Cell::Null]),
        ]);

        let summary = describe(&table);
        let names: Vec<&str> = summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["인구수", "비율"]);
        assert_eq!(summary[0].count, 1);
        assert!(approx(summary[1].mean, 1.0));
    }

    #[test]
    fn test_percentile_keys_serialized() {
        let s = summarize("x", vec![1.0, 2.0]).unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["50%"], 1.5);
    }
}
