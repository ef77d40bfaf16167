//! Reading holdings and candidate sheets from disk.
//!
//! A sheet is a CSV file with a header row or a JSON array of row objects,
//! optionally encrypted with gpg. Cells are kept loosely typed until
//! [`HoldingRecord::from_row`] validates the fields the computation needs.

use crate::config::ColumnSchema;
use crate::error::{LoadError, PortfolioError};
use crate::holding::{HoldingRecord, Source};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Column header to cell.
pub type Row = BTreeMap<String, Cell>;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn from_raw(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else if let Some(n) = parse_number(trimmed) {
            Cell::Number(n)
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Empty,
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::from_raw(s),
            Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            Cell::Number(n) => write!(f, "{n:.2}"),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

// Accepts spreadsheet exports such as "1,204.50" or "£310".
fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches(['£', '$', '€'])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Raw rows of one sheet with the header order of the file.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Validated records of one sheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub records: Vec<HoldingRecord>,
}

impl Sheet {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Cells of the requested columns for every record, or the first column
    /// the sheet does not carry.
    pub fn select(&self, columns: &[String]) -> Result<Vec<Vec<Cell>>, PortfolioError> {
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(PortfolioError::MissingColumn {
                column: missing.clone(),
            });
        }
        Ok(self
            .records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.cell(c).cloned().unwrap_or(Cell::Empty))
                    .collect()
            })
            .collect())
    }

    /// Columns in sheet order that none of `claimed` covers.
    pub fn other_columns(&self, claimed: &[&str]) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !claimed.contains(&c.as_str()))
            .cloned()
            .collect()
    }
}

pub fn load_sheet(path: &Path, schema: &ColumnSchema, source: Source) -> Result<Sheet, LoadError> {
    let table = read_table(path)?;
    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            HoldingRecord::from_row(row, schema, source).map_err(|e| LoadError::Row {
                path: path.to_path_buf(),
                row: i + 1,
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(path = %path.display(), %source, records = records.len(), "loaded sheet");

    Ok(Sheet {
        path: path.to_path_buf(),
        columns: table.columns,
        records,
    })
}

pub fn read_table(path: &Path) -> Result<Table, LoadError> {
    let (data, format_path) = if has_extension(path, "gpg") {
        (decrypt_file(path)?, path.with_extension(""))
    } else {
        let data = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        (data, path.to_path_buf())
    };

    if has_extension(&format_path, "csv") {
        parse_csv(path, &data)
    } else if has_extension(&format_path, "json") {
        parse_json(path, &data)
    } else {
        Err(LoadError::UnsupportedFormat(path.to_path_buf()))
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn decrypt_file(path: &Path) -> Result<String, LoadError> {
    let output = std::process::Command::new("gpg")
        .arg("-d")
        .arg(path)
        .output()
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if !output.status.success() {
        return Err(LoadError::Decrypt {
            path: path.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout).map_err(|e| LoadError::Decrypt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn parse_csv(path: &Path, data: &str) -> Result<Table, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let columns: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        // blank spreadsheet lines export as rows of empty cells
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(header, field)| (header.clone(), Cell::from_raw(field)))
            .collect();
        rows.push(row);
    }
    Ok(Table { columns, rows })
}

pub fn parse_json(path: &Path, data: &str) -> Result<Table, LoadError> {
    let value: Value = serde_json::from_str(data).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(LoadError::Shape {
            path: path.to_path_buf(),
        });
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(obj) = item else {
            return Err(LoadError::Shape {
                path: path.to_path_buf(),
            });
        };
        let mut row = Row::new();
        for (key, value) in &obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), Cell::from_json(value));
        }
        rows.push(row);
    }
    Ok(Table { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HOLDINGS_CSV: &str = "\
Ticker,Company,Category,Current Value (£),Country,Sector,Adjusted Score,Suggested Action,Current Weight %
AAPL,Apple,Core,\"1,200.50\",US,Technology,82,Hold,30
ASML,ASML Holding,Growth,800,NL,Technology,91,Buy More,20
,,,,,,,,
PLTR,Palantir,Speculative,150,US,Software,n/a,Sell Entirely,4
";

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cell_from_raw() {
        assert_eq!(Cell::from_raw("  "), Cell::Empty);
        assert_eq!(Cell::from_raw("1,204.50"), Cell::Number(1204.5));
        assert_eq!(Cell::from_raw("£310"), Cell::Number(310.0));
        assert_eq!(Cell::from_raw("Core"), Cell::Text("Core".to_string()));
        assert_eq!(Cell::from_raw("NaN"), Cell::Text("NaN".to_string()));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(12.0).to_string(), "12");
        assert_eq!(Cell::Number(12.3456).to_string(), "12.35");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_parse_csv_keeps_header_order_and_skips_blank_rows() {
        let table = parse_csv(Path::new("h.csv"), HOLDINGS_CSV).unwrap();
        assert_eq!(table.columns[0], "Ticker");
        assert_eq!(table.columns[8], "Current Weight %");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0]["Current Value (£)"], Cell::Number(1200.5));
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        let err = parse_json(Path::new("h.json"), r#"{"Ticker": "A"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Shape { .. }));
    }

    #[test]
    fn test_load_sheet_from_csv() {
        let file = write_temp(".csv", HOLDINGS_CSV);
        let sheet = load_sheet(file.path(), &ColumnSchema::default(), Source::Holding).unwrap();
        assert_eq!(sheet.records.len(), 3);
        assert_eq!(sheet.records[0].ticker, "AAPL");
        assert_eq!(sheet.records[0].current_value, 1200.5);
        assert_eq!(sheet.records[1].score, Some(91.0));
        // non-numeric score is only reported when ranking
        assert_eq!(sheet.records[2].score, None);
    }

    #[test]
    fn test_load_sheet_from_json() {
        let file = write_temp(
            ".json",
            r#"[
                {"Ticker": "NVDA", "Company": "Nvidia", "Category": "Growth",
                 "Current Value": 0, "Country": "US", "Sector": "Semiconductors",
                 "Analyst Consensus Score": 88.5, "Target Price Upside (%)": 14.2}
            ]"#,
        );
        let sheet = load_sheet(file.path(), &ColumnSchema::default(), Source::Candidate).unwrap();
        let record = &sheet.records[0];
        assert_eq!(record.score, Some(88.5));
        assert_eq!(record.source, Source::Candidate);
        assert_eq!(
            record.cell("Target Price Upside (%)"),
            Some(&Cell::Number(14.2))
        );
        assert_eq!(sheet.columns.last().unwrap(), "Target Price Upside (%)");
    }

    #[test]
    fn test_load_sheet_reports_row_of_missing_field() {
        let file = write_temp(
            ".csv",
            "Ticker,Company,Category,Current Value,Country,Sector\nAAPL,Apple,,10,US,Tech\n",
        );
        match load_sheet(file.path(), &ColumnSchema::default(), Source::Holding) {
            Err(LoadError::Row { row, source, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(
                    source,
                    PortfolioError::MissingField {
                        field: "Category".to_string(),
                        ticker: "AAPL".to_string()
                    }
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".xlsx", "");
        assert!(matches!(
            read_table(file.path()),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(Path::new("/nonexistent/holdings.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_select_guards_missing_columns() {
        let table = parse_csv(Path::new("h.csv"), HOLDINGS_CSV).unwrap();
        let sheet = Sheet {
            path: PathBuf::from("h.csv"),
            records: table
                .rows
                .iter()
                .map(|r| {
                    HoldingRecord::from_row(r, &ColumnSchema::default(), Source::Holding).unwrap()
                })
                .collect(),
            columns: table.columns,
        };

        let cols = vec!["Ticker".to_string(), "Current Weight %".to_string()];
        let cells = sheet.select(&cols).unwrap();
        assert_eq!(cells[1][1], Cell::Number(20.0));

        let cols = vec!["Ticker".to_string(), "EPS Growth Score".to_string()];
        assert_eq!(
            sheet.select(&cols).unwrap_err(),
            PortfolioError::MissingColumn {
                column: "EPS Growth Score".to_string()
            }
        );

        let other = sheet.other_columns(&["Ticker", "Company", "Suggested Action", "Current Weight %"]);
        assert_eq!(
            other,
            vec![
                "Category",
                "Current Value (£)",
                "Country",
                "Sector",
                "Adjusted Score"
            ]
        );
    }
}
