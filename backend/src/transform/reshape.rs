//! Region filtering, chart series and wide/long reshaping.

use serde::Serialize;

use crate::models::{Cell, Column, Table};

/// Indicator column name produced by [`melt`].
pub const INDICATOR_COLUMN: &str = "indicator";

/// Value column name produced by [`melt`].
pub const VALUE_COLUMN: &str = "value";

/// Distinct region labels in order of first appearance. Nulls are skipped.
pub fn unique_regions(table: &Table, region_column: &str) -> Vec<String> {
    let Some(column) = table.column(region_column) else {
        return Vec::new();
    };

    let mut regions: Vec<String> = Vec::new();
    for cell in column.values.iter().filter(|c| !c.is_null()) {
        let label = cell.to_string();
        if !regions.contains(&label) {
            regions.push(label);
        }
    }
    regions
}

/// Resolve the region selection.
///
/// With no (or an empty) request the first `default_count` regions are
/// selected. Otherwise the requested regions that exist are kept, in request
/// order.
pub fn select_regions(
    available: &[String],
    requested: Option<&[String]>,
    default_count: usize,
) -> Vec<String> {
    match requested {
        Some(requested) if !requested.is_empty() => requested
            .iter()
            .filter(|r| available.contains(r))
            .cloned()
            .collect(),
        _ => available.iter().take(default_count).cloned().collect(),
    }
}

/// Keep rows whose region label is in `selected`.
pub fn filter_regions(table: &Table, region_column: &str, selected: &[String]) -> Table {
    let Some(column) = table.column(region_column) else {
        return table.clone();
    };

    let keep: Vec<bool> = column
        .values
        .iter()
        .map(|cell| !cell.is_null() && selected.contains(&cell.to_string()))
        .collect();

    table.filter_rows(|i| keep[i])
}

/// One point of a line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: Cell,
    /// `None` is a gap in the line.
    pub y: Option<f64>,
}

/// A named line (one per region).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Region label; `None` when the table has no region column.
    pub name: Option<String>,
    pub points: Vec<Point>,
}

/// Build line series of `value_column` against `date_column`, split by region.
pub fn line_series(
    table: &Table,
    date_column: &str,
    value_column: &str,
    region_column: Option<&str>,
) -> Vec<Series> {
    let (Some(dates), Some(values)) = (table.column(date_column), table.column(value_column))
    else {
        return Vec::new();
    };

    let point = |i: usize| Point {
        x: dates.values[i].clone(),
        y: values.values[i].as_f64(),
    };

    let Some(regions) = region_column.and_then(|r| table.column(r)) else {
        return vec![Series {
            name: None,
            points: (0..table.row_count()).map(point).collect(),
        }];
    };

    let mut series: Vec<Series> = Vec::new();
    for (i, cell) in regions.values.iter().enumerate() {
        if cell.is_null() {
            continue;
        }
        let label = cell.to_string();
        match series.iter_mut().find(|s| s.name.as_deref() == Some(label.as_str())) {
            Some(existing) => existing.points.push(point(i)),
            None => series.push(Series {
                name: Some(label),
                points: vec![point(i)],
            }),
        }
    }
    series
}

/// Pivot `value_columns` into an indicator/value pair.
///
/// The output holds `id_columns`, then [`INDICATOR_COLUMN`] and
/// [`VALUE_COLUMN`]. Rows are ordered by value column, then by input row.
/// Unknown column names are ignored.
pub fn melt(table: &Table, id_columns: &[&str], value_columns: &[&str]) -> Table {
    let ids: Vec<&Column> = id_columns.iter().filter_map(|c| table.column(c)).collect();
    let values: Vec<&Column> = value_columns.iter().filter_map(|c| table.column(c)).collect();
    let rows = table.row_count();

    let mut out: Vec<Column> = ids
        .iter()
        .map(|c| Column::new(c.name.clone(), Vec::with_capacity(rows * values.len())))
        .collect();
    let mut indicator = Vec::with_capacity(rows * values.len());
    let mut value = Vec::with_capacity(rows * values.len());

    for column in &values {
        for i in 0..rows {
            for (target, source) in out.iter_mut().zip(&ids) {
                target.values.push(source.values[i].clone());
            }
            indicator.push(Cell::Text(column.name.clone()));
            value.push(column.values[i].clone());
        }
    }

    out.push(Column::new(INDICATOR_COLUMN, indicator));
    out.push(Column::new(VALUE_COLUMN, value));
    Table::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population() -> Table {
        Table::from_rows(
            vec!["기준월".into(), "시도".into(), "인구수".into(), "세대수".into()],
            vec![
                vec![Cell::Text("2024-01".into()), Cell::Text("서울".into()), Cell::Int(100), Cell::Int(40)],
                vec![Cell::Text("2024-01".into()), Cell::Text("부산".into()), Cell::Int(50), Cell::Int(20)],
                vec![Cell::Text("2024-02".into()), Cell::Text("서울".into()), Cell::Int(101), Cell::Int(41)],
                vec![Cell::Text("2024-02".into()), Cell::Null, Cell::Text("n/a".into()), Cell::Int(1)],
            ],
        )
    }

    #[test]
    fn test_unique_regions_in_order() {
        assert_eq!(unique_regions(&population(), "시도"), vec!["서울", "부산"]);
        assert!(unique_regions(&population(), "없음").is_empty());
    }

    #[test]
    fn test_select_regions_defaults_to_first_n() {
        let available: Vec<String> = ["a", "b", "c", "d", "e", "f", "g"].iter().map(|s| s.to_string()).collect();
        assert_eq!(select_regions(&available, None, 5), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(select_regions(&available, Some(&[][..]), 2), vec!["a", "b"]);

        let requested = vec!["g".to_string(), "zz".to_string(), "a".to_string()];
        assert_eq!(select_regions(&available, Some(requested.as_slice()), 5), vec!["g", "a"]);
    }

    #[test]
    fn test_filter_regions_drops_unselected_and_null() {
        let filtered = filter_regions(&population(), "시도", &["서울".to_string()]);
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.column("인구수").unwrap().values, vec![Cell::Int(100), Cell::Int(101)]);
    }

    #[test]
    fn test_line_series_per_region() {
        let series = line_series(&population(), "기준월", "인구수", Some("시도"));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name.as_deref(), Some("서울"));
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[1].y, Some(101.0));
        assert_eq!(series[1].name.as_deref(), Some("부산"));
    }

    #[test]
    fn test_line_series_without_region() {
        let series = line_series(&population(), "기준월", "인구수", None);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, None);
        assert_eq!(series[0].points.len(), 4);
        assert_eq!(series[0].points[3].y, None);
    }

    #[test]
    fn test_melt_wide_to_long() {
        let long = melt(&population(), &["기준월", "시도"], &["인구수", "세대수"]);
        assert_eq!(long.column_names(), vec!["기준월", "시도", INDICATOR_COLUMN, VALUE_COLUMN]);
        assert_eq!(long.row_count(), 8);

        let indicator = &long.column(INDICATOR_COLUMN).unwrap().values;
        assert_eq!(indicator[0], Cell::Text("인구수".into()));
        assert_eq!(indicator[4], Cell::Text("세대수".into()));
        assert_eq!(long.column(VALUE_COLUMN).unwrap().values[4], Cell::Int(40));
        assert_eq!(long.column("시도").unwrap().values[5], Cell::Text("부산".into()));
    }
}
