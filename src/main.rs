use crate::config::{parse_amounts, Config, APP_NAME, CONFIG_NAME};
use crate::summary::SheetPaths;
use crate::tui::Tab;

use clap::{arg, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod aggregate;
mod config;
mod error;
mod holding;
mod ranking;
mod region;
mod report;
mod sheet;
mod summary;
mod tui;

fn sheet_args(cmd: Command) -> Command {
    cmd.arg(
        arg!([FILE] "Holdings sheet (.csv or .json, optionally .gpg)")
            .required(false)
            .default_value(""),
    )
    .arg(arg!(--picks <FILE> "Sheet with new picks to consider for allocation").required(false))
}

fn cli() -> Command {
    Command::new(APP_NAME)
        .about("Holdings breakdowns and a monthly buy plan from a stock spreadsheet")
        .arg_required_else_help(true)
        .subcommand(Command::new("config").about("Print the path to the config file"))
        .subcommand(sheet_args(
            Command::new("overview").about("Show category, region and sector allocation"),
        ))
        .subcommand(sheet_args(
            Command::new("holdings").about("Show the holdings snapshot and column sections"),
        ))
        .subcommand(
            sheet_args(Command::new("allocate").about("Suggest how to split this month's cash"))
                .arg(arg!(--amounts <LIST> "Comma separated amounts, e.g. 200,150,150").required(false)),
        )
        .subcommand(
            sheet_args(Command::new("tui").about("Open the interactive dashboard"))
                .arg(arg!(--amounts <LIST> "Comma separated amounts, e.g. 200,150,150").required(false))
                .arg(
                    arg!(--tab <TAB> "Tab to open: overview, holdings, allocation or actions")
                        .required(false),
                ),
        )
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Command line arguments win over the config file.
fn resolve_paths(matches: &ArgMatches, cfg: &Config) -> Option<SheetPaths> {
    let mut holdings = matches
        .get_one::<String>("FILE")
        .cloned()
        .unwrap_or_default();
    if holdings.is_empty() {
        holdings.clone_from(&cfg.holdings_file);
    }
    if holdings.is_empty() {
        return None;
    }

    let candidates = matches
        .get_one::<String>("picks")
        .cloned()
        .or_else(|| Some(cfg.candidates_file.clone()))
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    Some(SheetPaths {
        holdings: PathBuf::from(holdings),
        candidates,
    })
}

fn apply_overrides(matches: &ArgMatches, cfg: &mut Config) -> eyre::Result<()> {
    if let Ok(Some(list)) = matches.try_get_one::<String>("amounts") {
        cfg.allocation_amounts = parse_amounts(list)?;
    }
    cfg.validate()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    let matches = cli().get_matches();
    let is_tui = matches.subcommand_name() == Some("tui");
    init_logging(if is_tui { "off" } else { "warn" });

    let mut cfg: Config = confy::load(APP_NAME, CONFIG_NAME)?;

    if matches.subcommand_matches("config").is_some() {
        let path = confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?;
        println!("Your config file is located here: \n{}", path.display());
        return Ok(());
    }

    let Some((subcommand, sub_matches)) = matches.subcommand() else {
        return Ok(());
    };

    apply_overrides(sub_matches, &mut cfg)?;
    let Some(paths) = resolve_paths(sub_matches, &cfg) else {
        eprintln!("No holdings sheet given and none configured.");
        cli().print_help()?;
        return Ok(());
    };
    tracing::debug!(?paths, subcommand, "resolved sheets");

    match subcommand {
        "overview" => report::print_overview(&paths.load(&cfg), &cfg),
        "holdings" => report::print_holdings(&paths.load(&cfg), &cfg),
        "allocate" => report::print_allocation(&paths.load(&cfg), &cfg),
        "tui" => {
            let tab = sub_matches
                .get_one::<String>("tab")
                .and_then(|t| Tab::from_str(t));
            tui::run_tui(cfg, paths, tab)?;
        }
        _ => (),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli() {
        let matches = cli().get_matches_from(vec!["stock_dash", "overview", "holdings.csv"]);
        assert_eq!(matches.subcommand_name(), Some("overview"));
    }

    #[test]
    fn test_resolve_paths_prefers_arguments() {
        let cfg = Config {
            holdings_file: "configured.csv".to_string(),
            candidates_file: "picks.csv".to_string(),
            ..Config::default()
        };
        let matches = cli().get_matches_from(vec![
            "stock_dash",
            "allocate",
            "mine.json",
            "--picks",
            "new.csv",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(
            resolve_paths(sub, &cfg),
            Some(SheetPaths {
                holdings: PathBuf::from("mine.json"),
                candidates: Some(PathBuf::from("new.csv")),
            })
        );
    }

    #[test]
    fn test_resolve_paths_falls_back_to_config() {
        let cfg = Config {
            holdings_file: "configured.csv".to_string(),
            ..Config::default()
        };
        let matches = cli().get_matches_from(vec!["stock_dash", "overview"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(
            resolve_paths(sub, &cfg),
            Some(SheetPaths {
                holdings: PathBuf::from("configured.csv"),
                candidates: None,
            })
        );

        let matches = cli().get_matches_from(vec!["stock_dash", "holdings"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(resolve_paths(sub, &Config::default()), None);
    }

    #[test]
    fn test_example_sheets() {
        let cfg = Config::default();
        let paths = SheetPaths {
            holdings: PathBuf::from("example_holdings.csv"),
            candidates: Some(PathBuf::from("example_picks.json")),
        };
        let workbook = paths.load(&cfg);
        assert!(workbook.warnings().is_empty());

        let summary = summary::Summary::from_workbook(&workbook, &cfg);
        assert_eq!(summary.total_value, 10000.0);
        let categories = summary.categories.unwrap();
        assert_eq!(categories.share_of("Core"), Some(0.375));
        assert_eq!(categories.share_of("Growth"), Some(0.4));
        assert_eq!(categories.share_of("Speculative"), Some(0.225));
        assert_eq!(
            summary.regions.unwrap().share_of(region::REST_OF_WORLD),
            Some(0.08)
        );

        let picks: Vec<(String, f64)> = summary
            .picks
            .unwrap()
            .iter()
            .map(|p| (p.ticker().to_string(), p.amount))
            .collect();
        assert_eq!(
            picks,
            vec![
                ("NVDA".to_string(), 200.0),
                ("TSM".to_string(), 150.0),
                ("MSFT".to_string(), 150.0)
            ]
        );
    }

    #[test]
    fn test_amount_override() {
        let matches =
            cli().get_matches_from(vec!["stock_dash", "allocate", "--amounts", "300,0,50"]);
        let (_, sub) = matches.subcommand().unwrap();
        let mut cfg = Config::default();
        apply_overrides(sub, &mut cfg).unwrap();
        assert_eq!(cfg.allocation_amounts, vec![300.0, 0.0, 50.0]);

        let matches = cli().get_matches_from(vec!["stock_dash", "tui", "--amounts", "10,-5"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(apply_overrides(sub, &mut Config::default()).is_err());
    }
}
