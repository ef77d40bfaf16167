//! Plain terminal output for the `overview`, `holdings` and `allocate` commands.

use crate::aggregate::{self, Allocation};
use crate::config::Config;
use crate::error::PortfolioError;
use crate::ranking::{self, Pick};
use crate::sheet::Sheet;
use crate::summary::{Summary, Workbook};
use colored::Colorize;
use comfy_table::{
    presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor, ContentArrangement, Table,
};
use piechart::{Chart, Color};

pub fn format_currency(value: f64, currency: &str) -> String {
    let number = format_with_commas(value);
    match currency {
        "USD" | "CAD" | "AUD" | "HKD" | "SGD" => format!("${number}"),
        "GBP" => format!("£{number}"),
        "EUR" => format!("{number} €"),
        _ => format!("{number} {currency}"),
    }
}

pub fn format_with_commas(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{decimal_part}")
}

/// `0.6` becomes `60.00%`.
pub fn format_share(share: f64) -> String {
    format!("{:.2}%", share * 100.0)
}

pub fn category_caption(category: &str) -> Option<&'static str> {
    match category {
        "Core" => Some("Stable, long-term holdings"),
        "Growth" => Some("Medium-risk, high upside"),
        "Speculative" => Some("High-risk, high-reward bets"),
        _ => None,
    }
}

fn warn(message: impl std::fmt::Display) {
    println!("{} {message}", "warning:".yellow().bold());
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

/// Category metrics; every requested category appears, "N/A" when the total is zero.
pub fn category_table(
    categories: &Result<Allocation, PortfolioError>,
    labels: &[String],
) -> Table {
    let mut table = new_table(&["Category", "Share", ""]);
    for label in labels {
        let share = match categories {
            Ok(allocation) => allocation
                .share_of(label)
                .map(format_share)
                .unwrap_or_else(|| "N/A".to_string()),
            Err(_) => "N/A".to_string(),
        };
        table.add_row(vec![
            Cell::new(format!("{label} %")).add_attribute(Attribute::Bold),
            right(share),
            Cell::new(category_caption(label).unwrap_or("")).fg(TColor::DarkGrey),
        ]);
    }
    table
}

pub fn breakdown_table(title: &str, allocation: &Allocation, currency: &str) -> Table {
    let mut table = new_table(&[title, "Value", "Share"]);
    for slice in &allocation.slices {
        table.add_row(vec![
            Cell::new(&slice.label),
            right(format_currency(slice.amount, currency)),
            right(format_share(slice.share)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        right(format_currency(allocation.total, currency)).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    table
}

pub fn snapshot_table(sheet: &Sheet, currency: &str) -> Table {
    let mut table = new_table(&["Ticker", "Company", "Current Value", "Category", "Sector", "Country"]);
    for record in aggregate::snapshot(&sheet.records) {
        table.add_row(vec![
            Cell::new(&record.ticker).add_attribute(Attribute::Bold),
            Cell::new(&record.company),
            right(format_currency(record.current_value, currency)),
            Cell::new(&record.category),
            Cell::new(&record.sector),
            Cell::new(&record.country),
        ]);
    }
    table
}

/// Table of the given columns, or the first column the sheet lacks.
pub fn column_table(sheet: &Sheet, columns: &[String]) -> Result<Table, PortfolioError> {
    let rows = sheet.select(columns)?;
    let header: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut table = new_table(&header);
    for row in rows {
        table.add_row(row.iter().map(|cell| match cell {
            crate::sheet::Cell::Number(_) => right(cell),
            _ => Cell::new(cell.to_string()),
        }));
    }
    Ok(table)
}

pub fn actions_table(sheet: &Sheet) -> Table {
    let mut table = new_table(&["Ticker", "Suggested Action"]);
    for record in &sheet.records {
        let color = match record.suggested_action.as_str() {
            "Sell Entirely" => TColor::Red,
            "Buy More" | "Buy" => TColor::Green,
            _ => TColor::Reset,
        };
        table.add_row(vec![
            Cell::new(&record.ticker),
            Cell::new(&record.suggested_action).fg(color),
        ]);
    }
    table
}

pub fn allocation_table(picks: &[Pick], currency: &str) -> Table {
    let mut table = new_table(&["#", "Ticker", "Company", "Source", "Score", "Amount"]);
    for (i, pick) in picks.iter().enumerate() {
        table.add_row(vec![
            right(i + 1),
            Cell::new(pick.ticker()).add_attribute(Attribute::Bold),
            Cell::new(pick.company()),
            Cell::new(pick.record.source.to_string()),
            right(format!("{:.2}", pick.score)),
            right(format_currency(pick.amount, currency)).fg(TColor::Green),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        right(format_currency(ranking::planned_total(picks), currency))
            .add_attribute(Attribute::Bold),
    ]);
    table
}

fn print_load_warnings(workbook: &Workbook) {
    for warning in workbook.warnings() {
        warn(warning);
    }
}

pub fn draw_pie_chart(allocation: &Allocation) {
    let colors = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Cyan,
        Color::White,
        Color::Purple,
    ];

    let data: Vec<piechart::Data> = allocation
        .slices
        .iter()
        .enumerate()
        .map(|(i, slice)| piechart::Data {
            label: slice.label.clone(),
            value: slice.amount as f32,
            color: Some(colors[i % colors.len()].into()),
            fill: '•',
        })
        .collect();

    Chart::new()
        .legend(true)
        .radius(9)
        .aspect_ratio(3)
        .draw(&data);
}

pub fn print_overview(workbook: &Workbook, cfg: &Config) {
    print_load_warnings(workbook);
    let summary = Summary::from_workbook(workbook, cfg);

    println!("{}'s Investment Dashboard", cfg.owner);
    println!(
        "Total value: {}",
        format_currency(summary.total_value, &cfg.currency)
    );
    if let Err(e) = &summary.categories {
        warn(e);
    }
    println!("{}", category_table(&summary.categories, &cfg.categories));

    match &summary.regions {
        Ok(regions) => {
            draw_pie_chart(regions);
            println!("{}", breakdown_table("Region", regions, &cfg.currency));
        }
        Err(e) => warn(format!("Region allocation unavailable: {e}")),
    }
    match &summary.countries {
        Ok(countries) => println!("{}", breakdown_table("Country", countries, &cfg.currency)),
        Err(e) => warn(format!("Country allocation unavailable: {e}")),
    }
    match &summary.sectors {
        Ok(sectors) => println!("{}", breakdown_table("Sector", sectors, &cfg.currency)),
        Err(e) => warn(format!("Sector allocation unavailable: {e}")),
    }
}

pub fn print_holdings(workbook: &Workbook, cfg: &Config) {
    print_load_warnings(workbook);
    let Some(sheet) = workbook.holdings_sheet() else {
        return;
    };

    println!("Latest Holdings Snapshot ({})", sheet.path.display());
    println!("{}", snapshot_table(sheet, &cfg.currency));

    for section in &cfg.sections {
        println!("{}", section.title);
        match column_table(sheet, &section.columns) {
            Ok(table) => println!("{table}"),
            Err(e) => warn(e),
        }
    }

    let mut claimed: Vec<&str> = cfg
        .sections
        .iter()
        .flat_map(|s| s.columns.iter().map(String::as_str))
        .collect();
    claimed.push(&cfg.columns.ticker);
    claimed.push(&cfg.columns.action);
    let other = sheet.other_columns(&claimed);
    if !other.is_empty() {
        let mut columns = vec![cfg.columns.ticker.clone()];
        columns.extend(other);
        println!("Other Information");
        match column_table(sheet, &columns) {
            Ok(table) => println!("{table}"),
            Err(e) => warn(e),
        }
    }

    println!("Suggested Actions");
    if sheet.has_column(&cfg.columns.action) {
        println!("{}", actions_table(sheet));
    } else {
        warn(PortfolioError::MissingColumn {
            column: cfg.columns.action.clone(),
        });
    }
}

pub fn print_allocation(workbook: &Workbook, cfg: &Config) {
    print_load_warnings(workbook);
    let summary = Summary::from_workbook(workbook, cfg);

    println!("Monthly Allocation");
    match &summary.picks {
        Ok(picks) if picks.is_empty() => warn("No eligible stocks to allocate to"),
        Ok(picks) => println!("{}", allocation_table(picks, &cfg.currency)),
        Err(e) => warn(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holding::tests::record;
    use crate::holding::Source;
    use crate::sheet::{Cell as SheetCell, Row};
    use std::path::PathBuf;

    fn sheet() -> Sheet {
        let mut a = record("AAPL", "Core", 1500.0, Some(80.0));
        a.cells = Row::from([
            ("Ticker".to_string(), SheetCell::Text("AAPL".to_string())),
            ("EPS Growth Score".to_string(), SheetCell::Number(7.0)),
        ]);
        a.suggested_action = "Sell Entirely".to_string();
        let b = record("TSLA", "Speculative", 2500.0, Some(40.0));
        Sheet {
            path: PathBuf::from("holdings.csv"),
            columns: vec!["Ticker".to_string(), "EPS Growth Score".to_string()],
            records: vec![a, b],
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234567.891, "GBP"), "£1,234,567.89");
        assert_eq!(format_currency(12.5, "USD"), "$12.50");
        assert_eq!(format_currency(999.0, "EUR"), "999.00 €");
        assert_eq!(format_currency(-1000.0, "CHF"), "-1,000.00 CHF");
    }

    #[test]
    fn test_format_share() {
        assert_eq!(format_share(0.6), "60.00%");
        assert_eq!(format_share(0.3333), "33.33%");
    }

    #[test]
    fn test_category_table_falls_back_to_na() {
        let labels = vec!["Core".to_string(), "Growth".to_string()];
        let rendered = category_table(&Err(PortfolioError::DivisionByZero), &labels).to_string();
        assert!(rendered.contains("Core %"));
        assert!(rendered.contains("N/A"));
        assert!(rendered.contains("Stable, long-term holdings"));
    }

    #[test]
    fn test_snapshot_table_orders_by_value() {
        let rendered = snapshot_table(&sheet(), "GBP").to_string();
        let tsla = rendered.find("TSLA").unwrap();
        let aapl = rendered.find("AAPL").unwrap();
        assert!(tsla < aapl);
        assert!(rendered.contains("£2,500.00"));
    }

    #[test]
    fn test_column_table_guards_missing_column() {
        let s = sheet();
        assert!(column_table(&s, &["Ticker".to_string(), "EPS Growth Score".to_string()]).is_ok());
        let err = column_table(&s, &["Analyst Price Target".to_string()]).unwrap_err();
        assert_eq!(
            err,
            PortfolioError::MissingColumn {
                column: "Analyst Price Target".to_string()
            }
        );
    }

    #[test]
    fn test_allocation_table_total() {
        let mut candidate = record("NEW", "Growth", 0.0, Some(90.0));
        candidate.source = Source::Candidate;
        let picks = vec![
            Pick {
                record: &candidate,
                score: 90.0,
                amount: 200.0,
            },
            Pick {
                record: &candidate,
                score: 90.0,
                amount: 150.0,
            },
        ];
        let rendered = allocation_table(&picks, "GBP").to_string();
        assert!(rendered.contains("New pick"));
        assert!(rendered.contains("£350.00"));
    }

    #[test]
    fn test_actions_table() {
        let rendered = actions_table(&sheet()).to_string();
        assert!(rendered.contains("Sell Entirely"));
    }
}
