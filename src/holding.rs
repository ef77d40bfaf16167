use crate::config::ColumnSchema;
use crate::error::PortfolioError;
use crate::sheet::{Cell, Row};
use std::fmt;

/// Which sheet a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Holding,
    Candidate,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Holding => write!(f, "Holding"),
            Source::Candidate => write!(f, "New pick"),
        }
    }
}

/// One row of the holdings or candidates sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRecord {
    pub ticker: String,
    pub company: String,
    pub category: String,
    pub current_value: f64,
    pub country: String,
    pub sector: String,
    /// `None` when the score cell is missing, blank or not a number.
    pub score: Option<f64>,
    /// Empty when the sheet has no action for this row.
    pub suggested_action: String,
    pub source: Source,
    /// Every cell of the source row, for display only.
    pub cells: Row,
}

/// A candidate has the same shape as a holding.
pub type CandidateRecord = HoldingRecord;

impl HoldingRecord {
    pub fn from_row(row: &Row, schema: &ColumnSchema, source: Source) -> Result<Self, PortfolioError> {
        let ticker = match row.get(&schema.ticker) {
            Some(cell) if !cell.is_empty() => cell.to_string(),
            _ => {
                return Err(PortfolioError::MissingField {
                    field: schema.ticker.clone(),
                    ticker: "(unknown)".to_string(),
                })
            }
        };

        let required_text = |field: &str| -> Result<String, PortfolioError> {
            match row.get(field) {
                Some(cell) if !cell.is_empty() => Ok(cell.to_string()),
                _ => Err(PortfolioError::MissingField {
                    field: field.to_string(),
                    ticker: ticker.clone(),
                }),
            }
        };

        let company = required_text(&schema.company)?;
        let category = required_text(&schema.category)?;
        let country = required_text(&schema.country)?;
        let sector = required_text(&schema.sector)?;

        let (value_field, value_cell) = first_present(row, &schema.value)
            .filter(|(_, cell)| !cell.is_empty())
            .ok_or_else(|| PortfolioError::MissingField {
                field: schema.value.first().cloned().unwrap_or_default(),
                ticker: ticker.clone(),
            })?;
        let current_value = match value_cell.as_number() {
            Some(v) if v >= 0.0 => v,
            _ => {
                return Err(PortfolioError::InvalidField {
                    field: value_field.to_string(),
                    ticker,
                    value: value_cell.to_string(),
                })
            }
        };

        let score = first_present(row, &schema.score).and_then(|(field, cell)| {
            let score = cell.as_number();
            if score.is_none() && !cell.is_empty() {
                tracing::debug!(%ticker, field, value = %cell, "score is not numeric");
            }
            score
        });

        let suggested_action = row
            .get(&schema.action)
            .map(|cell| cell.to_string())
            .unwrap_or_default();

        Ok(HoldingRecord {
            ticker,
            company,
            category,
            current_value,
            country,
            sector,
            score,
            suggested_action,
            source,
            cells: row.clone(),
        })
    }

    pub fn cell(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    /// The ranking score, or `InvalidScore` naming this record.
    pub fn checked_score(&self) -> Result<f64, PortfolioError> {
        match self.score {
            Some(score) if score.is_finite() => Ok(score),
            _ => Err(PortfolioError::InvalidScore {
                ticker: self.ticker.clone(),
            }),
        }
    }
}

fn first_present<'a>(row: &'a Row, headers: &'a [String]) -> Option<(&'a str, &'a Cell)> {
    headers
        .iter()
        .find_map(|h| row.get(h).map(|cell| (h.as_str(), cell)))
}
