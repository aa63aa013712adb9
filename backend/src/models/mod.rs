//! Domain models for the popstat ingestion pipeline.
//!
//! - [`Cell`] - A single typed value (number, text, timestamp or null)
//! - [`Column`] - A named, ordered sequence of cells
//! - [`Table`] - Ordered columns with a consistent row count
//! - [`ColumnClassification`] - Date / region / value roles found by keyword

use chrono::{NaiveDateTime, Timelike};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// A single value of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value (empty field, NA token, or failed date coercion).
    Null,
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Free text.
    Text(String),
    /// Timestamp produced by date coercion.
    Date(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric value of the cell, if any.
    ///
    /// Text is accepted when it is a number written with thousands
    /// separators (`"1,234,567"`), as population exports often are.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
            }
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&NaiveDateTime> {
        match self {
            Cell::Date(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => {
                if d.num_seconds_from_midnight() == 0 {
                    write!(f, "{}", d.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

// =============================================================================
// Column & Table
// =============================================================================

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True when every non-null cell is an integer or a float.
    pub fn is_numeric(&self) -> bool {
        let mut any = false;
        for cell in &self.values {
            match cell {
                Cell::Null => {}
                Cell::Int(_) | Cell::Float(_) => any = true,
                _ => return false,
            }
        }
        any
    }
}

/// Tabular dataset: ordered named columns sharing one row count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from columns.
    ///
    /// Columns shorter than the longest one are padded with nulls so the row
    /// count stays consistent.
    pub fn new(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(rows, Cell::Null);
        }
        Self { columns }
    }

    /// Build a table from a header row and row-major cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or(Cell::Null));
            }
        }

        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.filter_rows(|i| i < n)
    }

    /// Keep the rows whose index satisfies `keep`.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let kept: Vec<usize> = (0..self.row_count()).filter(|&i| keep(i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), kept.iter().map(|&i| c.values[i].clone()).collect()))
            .collect();
        Table { columns }
    }
}

/// Serialized as `{ "columns": [...], "rows": [[...], ...] }` so column order
/// survives the trip through JSON.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<&Cell>> = (0..self.row_count())
            .filter_map(|i| self.row(i))
            .collect();
        let columns: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();

        let mut state = serializer.serialize_struct("Table", 2)?;
        state.serialize_field("columns", &columns)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}

// =============================================================================
// Column Classification
// =============================================================================

/// Semantic roles assigned to columns by keyword matching.
///
/// A column may appear both as the date/region column and among the value
/// columns; the classifier does not enforce exclusivity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnClassification {
    pub date_column: Option<String>,
    pub region_column: Option<String>,
    pub value_columns: Vec<String>,
}

impl ColumnClassification {
    /// Date and at least one value column were found.
    pub fn is_sufficient(&self) -> bool {
        self.date_column.is_some() && !self.value_columns.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
