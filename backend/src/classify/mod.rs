//! Keyword-based column classification.
//!
//! Column names are matched against fixed keyword sets (case-sensitive
//! substring match). The date and region roles take the first matching column;
//! the value role collects every matching column. Roles are not mutually
//! exclusive: `기준인구수` is both a date candidate (`기준`) and a value column
//! (`인구`, `수`).

use serde::Serialize;

use crate::error::ClassificationError;
use crate::models::ColumnClassification;

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Date,
    Region,
    Value,
}

impl ColumnRole {
    /// Keywords that put a column in this role.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => &["기간", "년월", "기준", "date", "월"],
            ColumnRole::Region => &["행정구역", "지역", "시도", "시군구", "구분"],
            ColumnRole::Value => &["인구", "세대", "인원", "수", "합계"],
        }
    }

    pub fn matches(&self, column: &str) -> bool {
        self.keywords().iter().any(|k| column.contains(k))
    }
}

/// Classify columns by name, preserving table order.
pub fn classify<S: AsRef<str>>(columns: &[S]) -> ColumnClassification {
    let first = |role: ColumnRole| {
        columns
            .iter()
            .map(AsRef::<str>::as_ref)
            .find(|c| role.matches(c))
            .map(str::to_string)
    };

    ColumnClassification {
        date_column: first(ColumnRole::Date),
        region_column: first(ColumnRole::Region),
        value_columns: columns
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|c| ColumnRole::Value.matches(c))
            .map(str::to_string)
            .collect(),
    }
}

/// Reject a classification that lacks a date column or any value column.
pub fn validate_classification(
    classification: &ColumnClassification,
) -> Result<(), ClassificationError> {
    if classification.is_sufficient() {
        return Ok(());
    }

    Err(ClassificationError::Insufficient {
        missing_date: classification.date_column.is_none(),
        missing_values: classification.value_columns.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_headers() {
        let c = classify(&["기준월", "시도", "인구수", "세대수"]);
        assert_eq!(c.date_column.as_deref(), Some("기준월"));
        assert_eq!(c.region_column.as_deref(), Some("시도"));
        assert_eq!(c.value_columns, vec!["인구수", "세대수"]);
        assert!(validate_classification(&c).is_ok());
    }

    #[test]
    fn test_no_keywords() {
        let c = classify(&["id", "name", "score"]);
        assert_eq!(c.date_column, None);
        assert_eq!(c.region_column, None);
        assert!(c.value_columns.is_empty());

        let err = validate_classification(&c).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::Insufficient { missing_date: true, missing_values: true }
        ));
    }

    #[test]
    fn test_first_match_wins_in_table_order() {
        let c = classify(&["행정구역", "기간", "통계기준월", "지역"]);
        assert_eq!(c.date_column.as_deref(), Some("기간"));
        assert_eq!(c.region_column.as_deref(), Some("행정구역"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let c = classify(&["Date", "총인구수"]);
        assert_eq!(c.date_column, None);

        let c = classify(&["base_date", "총인구수"]);
        assert_eq!(c.date_column.as_deref(), Some("base_date"));
    }

    #[test]
    fn test_roles_are_not_exclusive() {
        let c = classify(&["기준인구수", "구분"]);
        assert_eq!(c.date_column.as_deref(), Some("기준인구수"));
        assert_eq!(c.value_columns, vec!["기준인구수"]);
    }

    #[test]
    fn test_missing_values_only() {
        let c = classify(&["기준월", "행정구역"]);
        let err = validate_classification(&c).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::Insufficient { missing_date: false, missing_values: true }
        ));
    }

    #[test]
    fn test_role_keywords() {
        assert!(ColumnRole::Value.matches("합계"));
        assert!(ColumnRole::Region.matches("시군구명"));
        assert!(!ColumnRole::Region.matches("읍면동"));
    }
}
