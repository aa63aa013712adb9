//! CSV reader with encoding and delimiter trials.
//!
//! Korean statistics portals export CSV in a mix of UTF-8 (with or without a
//! byte-order mark) and CP949/EUC-KR, separated by commas, semicolons or tabs.
//! Instead of guessing, every (encoding, delimiter) pair is tried in a fixed
//! priority order and the first one that yields a multi-column table wins.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::error::{CsvError, CsvResult};
use crate::models::{Cell, Column, Table};

/// UTF-8 byte-order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimiters in trial order.
pub const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Tokens read as missing values.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// =============================================================================
// Encodings
// =============================================================================

/// Candidate text encodings, in trial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    /// UTF-8 with an optional leading byte-order mark.
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "cp949")]
    Cp949,
    #[serde(rename = "euc-kr")]
    EucKr,
}

impl TextEncoding {
    pub const ALL: [TextEncoding; 4] = [
        TextEncoding::Utf8Sig,
        TextEncoding::Utf8,
        TextEncoding::Cp949,
        TextEncoding::EucKr,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::EucKr => "euc-kr",
        }
    }

    /// Strictly decode `bytes`; `None` if any sequence is malformed.
    ///
    /// `encoding_rs` implements EUC-KR as the WHATWG superset, which is
    /// Windows code page 949, so both Korean candidates share one decoder.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(Cow::Borrowed)
            }
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            TextEncoding::Cp949 | TextEncoding::EucKr => {
                encoding_rs::EUC_KR.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Parse result
// =============================================================================

/// A table together with the trial combination that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub table: Table,
    pub encoding: TextEncoding,
    /// Accepted delimiter.
    #[serde(serialize_with = "serialize_delimiter")]
    pub delimiter: u8,
    /// Fields as read, before type inference (`Text` or `Null`).
    #[serde(skip)]
    pub source: Table,
}

impl ParseResult {
    pub fn headers(&self) -> Vec<String> {
        self.table.column_names()
    }

    /// Untyped field text of `name`.
    ///
    /// Type inference is lossy for some shapes (`2024.10` reads as the float
    /// `2024.1`), so consumers that reinterpret a column start from here.
    pub fn source_column(&self, name: &str) -> Option<&Column> {
        self.source.column(name)
    }
}

fn serialize_delimiter<S: serde::Serializer>(d: &u8, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_delimiter(*d))
}

/// Printable form of a delimiter (`\t` for tab).
pub fn format_delimiter(d: u8) -> String {
    match d {
        b'\t' => "\\t".to_string(),
        c => (c as char).to_string(),
    }
}

/// Why a single trial combination was rejected.
#[derive(Debug, Error)]
pub enum TrialFailure {
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("no header row")]
    NoHeader,

    #[error("line {line}: expected {expected} fields, saw {found}")]
    TooManyFields { line: u64, expected: usize, found: usize },
}

// =============================================================================
// Entry points
// =============================================================================

/// Parse CSV bytes with encoding/delimiter trials.
///
/// Encodings form the outer loop and delimiters the inner loop. The first
/// combination that decodes, parses, and yields more than one column is
/// accepted.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    for encoding in TextEncoding::ALL {
        let Some(text) = encoding.decode(bytes) else {
            continue;
        };

        for delimiter in DELIMITERS {
            match read_fields(&text, delimiter) {
                Ok(fields) if fields.headers.len() > 1 => {
                    return Ok(ParseResult {
                        source: fields.text_table(),
                        table: fields.into_typed_table(),
                        encoding,
                        delimiter,
                    });
                }
                _ => continue,
            }
        }
    }

    Err(CsvError::Unreadable)
}

/// Parse decoded text with one explicit delimiter.
///
/// The first non-blank record is the header. Rows shorter than the header are
/// padded with nulls; a row longer than the header fails the trial.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table, TrialFailure> {
    read_fields(text, delimiter).map(RawFields::into_typed_table)
}

/// Header and column-major field text of one trial; `None` is a missing value.
struct RawFields {
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
}

impl RawFields {
    fn text_table(&self) -> Table {
        let columns = self
            .headers
            .iter()
            .zip(&self.columns)
            .map(|(name, raw)| {
                let cells = raw.iter().map(|v| v.clone().map_or(Cell::Null, Cell::Text)).collect();
                Column::new(name.clone(), cells)
            })
            .collect();
        Table::new(columns)
    }

    fn into_typed_table(self) -> Table {
        let columns = self
            .headers
            .into_iter()
            .zip(self.columns)
            .map(|(name, raw)| Column::new(name, infer_cells(raw)))
            .collect();
        Table::new(columns)
    }
}

fn read_fields(text: &str, delimiter: u8) -> Result<RawFields, TrialFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut raw_columns: Vec<Vec<Option<String>>> = Vec::new();

    for result in reader.records() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let Some(names) = headers.as_ref() else {
            let names = normalize_headers(record.iter().map(str::to_string).collect());
            raw_columns = vec![Vec::new(); names.len()];
            headers = Some(names);
            continue;
        };

        if record.len() > names.len() {
            return Err(TrialFailure::TooManyFields {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: names.len(),
                found: record.len(),
            });
        }

        for (i, column) in raw_columns.iter_mut().enumerate() {
            let value = record.get(i).filter(|v| !NA_VALUES.contains(v));
            column.push(value.map(str::to_string));
        }
    }

    let headers = headers.ok_or(TrialFailure::NoHeader)?;
    Ok(RawFields {
        headers,
        columns: raw_columns,
    })
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() == 0 || (record.len() == 1 && record[0].trim().is_empty())
}

/// Name empty headers `Unnamed: {i}` and suffix duplicates with `.1`, `.2`, ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

/// Type a column: all integers, else all floats, else text.
fn infer_cells(raw: Vec<Option<String>>) -> Vec<Cell> {
    let present = || raw.iter().flatten().map(|s| s.trim());

    if present().all(|s| s.parse::<i64>().is_ok()) {
        return raw
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse().ok()).map_or(Cell::Null, Cell::Int))
            .collect();
    }

    if present().all(|s| s.parse::<f64>().is_ok()) {
        return raw
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse().ok()).map_or(Cell::Null, Cell::Float))
            .collect();
    }

    raw.into_iter().map(|v| v.map_or(Cell::Null, Cell::Text)).collect()
}
