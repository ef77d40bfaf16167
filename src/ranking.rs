use crate::error::PortfolioError;
use crate::holding::{CandidateRecord, HoldingRecord};

/// A record chosen for this month's cash, with the amount assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick<'a> {
    pub record: &'a HoldingRecord,
    pub score: f64,
    pub amount: f64,
}

impl Pick<'_> {
    pub fn ticker(&self) -> &str {
        &self.record.ticker
    }

    pub fn company(&self) -> &str {
        &self.record.company
    }
}

/// Ranks holdings followed by candidates by score and pairs the best of them
/// with `amounts`, position by position.
///
/// Records whose suggested action equals `exclude_action` never take part.
/// The sort is stable, so equal scores keep their order in the combined input.
/// Slots whose amount is zero are left out of the result.
pub fn top_allocations<'a>(
    holdings: &'a [HoldingRecord],
    candidates: &'a [CandidateRecord],
    exclude_action: &str,
    amounts: &[f64],
) -> Result<Vec<Pick<'a>>, PortfolioError> {
    let mut eligible = holdings
        .iter()
        .chain(candidates)
        .filter(|r| r.suggested_action != exclude_action)
        .map(|r| r.checked_score().map(|score| (r, score)))
        .collect::<Result<Vec<_>, _>>()?;

    eligible.sort_by(|a, b| b.1.total_cmp(&a.1));

    let picks: Vec<Pick<'a>> = eligible
        .into_iter()
        .zip(amounts.iter().copied())
        .filter(|(_, amount)| *amount > 0.0)
        .map(|((record, score), amount)| Pick {
            record,
            score,
            amount,
        })
        .collect();

    tracing::debug!(picks = picks.len(), slots = amounts.len(), "ranked allocation");
    Ok(picks)
}

pub fn planned_total(picks: &[Pick]) -> f64 {
    picks.iter().map(|p| p.amount).sum()
}
