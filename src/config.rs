use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const APP_NAME: &str = "stock_dash";
pub const CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub owner: String,
    pub holdings_file: String,
    pub candidates_file: String,
    pub currency: String,
    pub categories: Vec<String>,
    pub allocation_amounts: Vec<f64>,
    pub exclude_action: String,
    pub columns: ColumnSchema,
    /// Country code to region name. Empty means the built-in table.
    pub regions: BTreeMap<String, String>,
    pub sections: Vec<Section>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: "My".to_string(),
            holdings_file: String::new(),
            candidates_file: String::new(),
            currency: "GBP".to_string(),
            categories: vec![
                "Core".to_string(),
                "Growth".to_string(),
                "Speculative".to_string(),
            ],
            allocation_amounts: vec![200.0, 150.0, 150.0],
            exclude_action: "Sell Entirely".to_string(),
            columns: ColumnSchema::default(),
            regions: BTreeMap::new(),
            sections: Section::defaults(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        for (index, &value) in self.allocation_amounts.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidAmount { index, value });
            }
        }
        Ok(())
    }
}

/// Header names of the fields the computation reads. Everything else in a
/// sheet is passthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub ticker: String,
    pub company: String,
    pub category: String,
    /// First header present in the sheet wins.
    pub value: Vec<String>,
    pub country: String,
    pub sector: String,
    /// First header present in the sheet wins.
    pub score: Vec<String>,
    pub action: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            ticker: "Ticker".to_string(),
            company: "Company".to_string(),
            category: "Category".to_string(),
            value: vec!["Current Value (£)".to_string(), "Current Value".to_string()],
            country: "Country".to_string(),
            sector: "Sector".to_string(),
            score: vec![
                "Adjusted Score".to_string(),
                "Analyst Consensus Score".to_string(),
            ],
            action: "Suggested Action".to_string(),
        }
    }
}

/// A named group of columns rendered as its own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub columns: Vec<String>,
}

impl Section {
    fn new(title: &str, columns: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn defaults() -> Vec<Section> {
        vec![
            Section::new(
                "Core Information",
                &[
                    "Ticker",
                    "Company",
                    "Category",
                    "Current Value (£)",
                    "Current Weight %",
                ],
            ),
            Section::new(
                "Analyst Data",
                &[
                    "Ticker",
                    "Current Stock Price",
                    "Analyst Price High",
                    "Analyst Price Low",
                    "Analyst Price Target",
                    "Target Price Upside (%)",
                    "Number of Analysts",
                    "Analyst Data Confidence",
                    "Analyst Consensus Score",
                ],
            ),
            Section::new(
                "Financial Fundamentals",
                &["Ticker", "EPS Growth Score", "Revenue Growth Score"],
            ),
        ]
    }
}

/// Parses a comma separated amount schedule such as `200,150,150`.
pub fn parse_amounts(s: &str) -> Result<Vec<f64>, ConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| ConfigError::AmountList(s.to_string()))
        })
        .collect()
}
