use crate::error::PortfolioError;
use crate::holding::HoldingRecord;
use crate::region::RegionTable;
use std::collections::HashMap;

/// Shares are kept to the precision of a `0.00%` display.
const SHARE_DECIMALS: i32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub amount: f64,
    /// Fraction of the allocation total in `[0, 1]`.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub slices: Vec<Slice>,
    pub total: f64,
}

impl Allocation {
    pub fn from_totals(totals: Vec<(String, f64)>) -> Result<Allocation, PortfolioError> {
        let total: f64 = totals.iter().map(|(_, amount)| amount).sum();
        if total == 0.0 {
            return Err(PortfolioError::DivisionByZero);
        }
        let slices = totals
            .into_iter()
            .map(|(label, amount)| Slice {
                label,
                amount,
                share: round_share(amount / total),
            })
            .collect();
        Ok(Allocation { slices, total })
    }

    pub fn share_of(&self, label: &str) -> Option<f64> {
        self.slices
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.share)
    }
}

fn round_share(share: f64) -> f64 {
    let scale = 10f64.powi(SHARE_DECIMALS);
    (share * scale).round() / scale
}

pub fn total_value(holdings: &[HoldingRecord]) -> f64 {
    holdings.iter().map(|h| h.current_value).sum()
}

/// Share of each requested category in the value of all holdings that fall in
/// one of the requested categories. Holdings in any other category are left
/// out of the denominator as well.
pub fn category_shares(
    holdings: &[HoldingRecord],
    categories: &[String],
) -> Result<Allocation, PortfolioError> {
    let mut totals: Vec<(String, f64)> = Vec::with_capacity(categories.len());
    for label in categories {
        if totals.iter().any(|(seen, _)| seen == label) {
            continue;
        }
        let sum = holdings
            .iter()
            .filter(|h| &h.category == label)
            .map(|h| h.current_value)
            .sum();
        totals.push((label.clone(), sum));
    }
    Allocation::from_totals(totals)
}

/// Field a breakdown groups holdings by.
#[derive(Debug, Clone, Copy)]
pub enum Grouping<'a> {
    Country,
    Sector,
    Region(&'a RegionTable),
}

impl Grouping<'_> {
    fn label(&self, record: &HoldingRecord) -> String {
        match self {
            Grouping::Country => record.country.clone(),
            Grouping::Sector => record.sector.clone(),
            Grouping::Region(table) => table.region_of(&record.country).to_string(),
        }
    }
}

/// Value per group, largest first. Equal totals keep the order in which the
/// groups first appear in `holdings`.
pub fn group_totals(holdings: &[HoldingRecord], grouping: Grouping) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for holding in holdings {
        let label = grouping.label(holding);
        if let Some(&i) = index.get(&label) {
            totals[i].1 += holding.current_value;
        } else {
            index.insert(label.clone(), totals.len());
            totals.push((label, holding.current_value));
        }
    }

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

pub fn group_shares(
    holdings: &[HoldingRecord],
    grouping: Grouping,
) -> Result<Allocation, PortfolioError> {
    Allocation::from_totals(group_totals(holdings, grouping))
}

/// Holdings ordered by current value, largest first.
pub fn snapshot(holdings: &[HoldingRecord]) -> Vec<&HoldingRecord> {
    let mut rows: Vec<&HoldingRecord> = holdings.iter().collect();
    rows.sort_by(|a, b| b.current_value.total_cmp(&a.current_value));
    rows
}
