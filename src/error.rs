//! Error types for stock_dash
//!
//! Every error here is recoverable: presenters catch them per section and
//! render a warning instead of aborting the whole dashboard.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating records or computing a dashboard section.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("Total value is zero, shares cannot be computed")]
    DivisionByZero,

    #[error("Score is missing or not a number for {ticker}")]
    InvalidScore { ticker: String },

    #[error("Field '{field}' is missing for {ticker}")]
    MissingField { field: String, ticker: String },

    #[error("Field '{field}' has an invalid value '{value}' for {ticker}")]
    InvalidField {
        field: String,
        ticker: String,
        value: String,
    },

    #[error("Column '{column}' is not present in the sheet")]
    MissingColumn { column: String },
}

/// Errors raised while reading a sheet from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Could not parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path}: expected a JSON array of row objects")]
    Shape { path: PathBuf },

    #[error("Unsupported sheet format: {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("gpg could not decrypt {path}: {message}")]
    Decrypt { path: PathBuf, message: String },

    #[error("{path}, row {row}: {source}")]
    Row {
        path: PathBuf,
        row: usize,
        source: PortfolioError,
    },
}

/// Configuration values that cannot drive a computation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Allocation amount #{index} must be a non-negative number, got {value}")]
    InvalidAmount { index: usize, value: f64 },

    #[error("At least one category is required")]
    NoCategories,

    #[error("Invalid allocation amount list '{0}'")]
    AmountList(String),
}
