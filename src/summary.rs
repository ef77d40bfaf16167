//! One computation pass over the holdings and candidates sheets.
//!
//! Each section is computed on its own and keeps its own `Result`, so a bad
//! candidates sheet still leaves the holdings breakdowns intact.

use crate::aggregate::{self, Allocation, Grouping};
use crate::config::Config;
use crate::error::{LoadError, PortfolioError};
use crate::holding::{CandidateRecord, HoldingRecord, Source};
use crate::ranking::{self, Pick};
use crate::region::RegionTable;
use crate::sheet::{self, Sheet};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Both sheets as read from disk, each independently fallible.
#[derive(Debug)]
pub struct Workbook {
    pub holdings: Result<Sheet, LoadError>,
    pub candidates: Option<Result<Sheet, LoadError>>,
    pub loaded_at: DateTime<Local>,
}

impl Workbook {
    pub fn load(holdings: &Path, candidates: Option<&Path>, cfg: &Config) -> Workbook {
        let holdings = sheet::load_sheet(holdings, &cfg.columns, Source::Holding);
        let candidates =
            candidates.map(|path| sheet::load_sheet(path, &cfg.columns, Source::Candidate));

        if let Err(e) = &holdings {
            tracing::warn!(error = %e, "holdings sheet could not be loaded");
        }
        if let Some(Err(e)) = &candidates {
            tracing::warn!(error = %e, "candidates sheet could not be loaded");
        }

        Workbook {
            holdings,
            candidates,
            loaded_at: Local::now(),
        }
    }

    pub fn holdings(&self) -> &[HoldingRecord] {
        match &self.holdings {
            Ok(sheet) => &sheet.records,
            Err(_) => &[],
        }
    }

    pub fn candidates(&self) -> &[CandidateRecord] {
        match &self.candidates {
            Some(Ok(sheet)) => &sheet.records,
            _ => &[],
        }
    }

    pub fn holdings_sheet(&self) -> Option<&Sheet> {
        self.holdings.as_ref().ok()
    }

    /// Load failures as display lines.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Err(e) = &self.holdings {
            warnings.push(format!("Holdings not loaded: {e}"));
        }
        if let Some(Err(e)) = &self.candidates {
            warnings.push(format!("New picks not loaded: {e}"));
        }
        warnings
    }
}

/// Sheet paths resolved from the command line and the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPaths {
    pub holdings: PathBuf,
    pub candidates: Option<PathBuf>,
}

impl SheetPaths {
    pub fn load(&self, cfg: &Config) -> Workbook {
        Workbook::load(&self.holdings, self.candidates.as_deref(), cfg)
    }
}

#[derive(Debug)]
pub struct Summary<'a> {
    pub total_value: f64,
    pub categories: Result<Allocation, PortfolioError>,
    pub regions: Result<Allocation, PortfolioError>,
    pub countries: Result<Allocation, PortfolioError>,
    pub sectors: Result<Allocation, PortfolioError>,
    pub picks: Result<Vec<Pick<'a>>, PortfolioError>,
}

impl<'a> Summary<'a> {
    pub fn compute(
        holdings: &'a [HoldingRecord],
        candidates: &'a [CandidateRecord],
        cfg: &Config,
    ) -> Summary<'a> {
        let regions = RegionTable::from_config(&cfg.regions);

        let summary = Summary {
            total_value: aggregate::total_value(holdings),
            categories: aggregate::category_shares(holdings, &cfg.categories),
            regions: aggregate::group_shares(holdings, Grouping::Region(&regions)),
            countries: aggregate::group_shares(holdings, Grouping::Country),
            sectors: aggregate::group_shares(holdings, Grouping::Sector),
            picks: ranking::top_allocations(
                holdings,
                candidates,
                &cfg.exclude_action,
                &cfg.allocation_amounts,
            ),
        };

        for (section, result) in [
            ("categories", summary.categories.as_ref().err()),
            ("regions", summary.regions.as_ref().err()),
            ("sectors", summary.sectors.as_ref().err()),
            ("allocation", summary.picks.as_ref().err()),
        ] {
            if let Some(e) = result {
                tracing::debug!(section, error = %e, "dashboard section unavailable");
            }
        }
        summary
    }

    pub fn from_workbook(workbook: &'a Workbook, cfg: &Config) -> Summary<'a> {
        Summary::compute(workbook.holdings(), workbook.candidates(), cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holding::tests::record;
    use std::io::Write;

    #[test]
    fn test_compute_sections() {
        let mut a = record("A", "Core", 600.0, Some(50.0));
        a.country = "GB".to_string();
        let b = record("B", "Growth", 400.0, Some(70.0));
        let holdings = vec![a, b];
        let candidates = vec![record("C", "Growth", 0.0, Some(60.0))];

        let summary = Summary::compute(&holdings, &candidates, &Config::default());
        assert_eq!(summary.total_value, 1000.0);
        let categories = summary.categories.unwrap();
        assert_eq!(categories.share_of("Core"), Some(0.6));
        assert_eq!(categories.share_of("Speculative"), Some(0.0));
        assert_eq!(
            summary.regions.unwrap().share_of("United Kingdom"),
            Some(0.6)
        );
        let picks = summary.picks.unwrap();
        let tickers: Vec<&str> = picks.iter().map(|p| p.ticker()).collect();
        assert_eq!(tickers, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_bad_candidate_does_not_hide_breakdowns() {
        let holdings = vec![record("A", "Core", 100.0, Some(1.0))];
        let candidates = vec![record("X", "Growth", 0.0, None)];
        let summary = Summary::compute(&holdings, &candidates, &Config::default());
        assert!(summary.categories.is_ok());
        assert!(summary.sectors.is_ok());
        assert!(matches!(
            summary.picks,
            Err(PortfolioError::InvalidScore { .. })
        ));
    }

    #[test]
    fn test_empty_holdings_report_division_by_zero() {
        let summary = Summary::compute(&[], &[], &Config::default());
        assert_eq!(summary.categories, Err(PortfolioError::DivisionByZero));
        assert_eq!(summary.regions, Err(PortfolioError::DivisionByZero));
        assert_eq!(summary.picks, Ok(Vec::new()));
    }

    #[test]
    fn test_workbook_keeps_holdings_when_candidates_fail() {
        let mut holdings = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            holdings,
            "Ticker,Company,Category,Current Value,Country,Sector,Adjusted Score\nA,Alpha,Core,10,US,Tech,5"
        )
        .unwrap();
        let paths = SheetPaths {
            holdings: holdings.path().to_path_buf(),
            candidates: Some(PathBuf::from("/nonexistent/picks.csv")),
        };

        let workbook = paths.load(&Config::default());
        assert_eq!(workbook.holdings().len(), 1);
        assert!(workbook.candidates().is_empty());
        assert_eq!(workbook.warnings().len(), 1);
        assert!(workbook.warnings()[0].starts_with("New picks not loaded"));

        let summary = Summary::from_workbook(&workbook, &Config::default());
        assert_eq!(summary.picks.unwrap().len(), 1);
    }
}
