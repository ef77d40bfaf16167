use crate::aggregate::{self, Allocation};
use crate::config::Config;
use crate::error::PortfolioError;
use crate::report::{category_caption, format_currency, format_share, format_with_commas};
use crate::summary::{SheetPaths, Summary, Workbook};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tui_big_text::{BigText, PixelSize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Overview,
    Holdings,
    Allocation,
    Actions,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Portfolio Overview",
            Tab::Holdings => "Holdings",
            Tab::Allocation => "Monthly Allocation",
            Tab::Actions => "Suggested Actions",
        }
    }

    fn all() -> &'static [Tab] {
        &[Tab::Overview, Tab::Holdings, Tab::Allocation, Tab::Actions]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "overview" => Some(Tab::Overview),
            "holdings" => Some(Tab::Holdings),
            "allocation" => Some(Tab::Allocation),
            "actions" => Some(Tab::Actions),
            _ => None,
        }
    }
}

pub struct App {
    pub cfg: Config,
    pub paths: SheetPaths,
    pub workbook: Workbook,
    pub current_tab: Tab,
    pub selected_row: usize,
    pub error_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(cfg: Config, paths: SheetPaths, workbook: Workbook) -> App {
        let error_message = load_error_message(&workbook);
        App {
            cfg,
            paths,
            workbook,
            current_tab: Tab::Overview,
            selected_row: 0,
            error_message,
            should_quit: false,
        }
    }

    pub fn reload(&mut self) {
        self.workbook = self.paths.load(&self.cfg);
        self.error_message = load_error_message(&self.workbook);
        let rows = self.workbook.holdings().len();
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
    }

    pub fn next_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + 1) % tabs.len()];
    }

    pub fn previous_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + tabs.len() - 1) % tabs.len()];
    }

    pub fn select_next(&mut self) {
        if self.selected_row + 1 < self.workbook.holdings().len() {
            self.selected_row += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    fn handle_key(&mut self, code: KeyCode) {
        // any key dismisses the error popup
        if self.error_message.take().is_some() {
            return;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => self.previous_tab(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.next_tab(),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('1') => self.current_tab = Tab::Overview,
            KeyCode::Char('2') => self.current_tab = Tab::Holdings,
            KeyCode::Char('3') => self.current_tab = Tab::Allocation,
            KeyCode::Char('4') => self.current_tab = Tab::Actions,
            _ => {}
        }
    }
}

fn load_error_message(workbook: &Workbook) -> Option<String> {
    let warnings = workbook.warnings();
    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("\n"))
    }
}

pub fn run_tui(cfg: Config, paths: SheetPaths, tab: Option<Tab>) -> eyre::Result<()> {
    let workbook = paths.load(&cfg);
    let mut app = App::new(cfg, paths, workbook);
    if let Some(tab) = tab {
        app.current_tab = tab;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> eyre::Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let tab_titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if *t == app.current_tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(format!("{} {}", i + 1, t.title()), style))
        })
        .collect();

    let title = format!(
        "{}'s Investment Dashboard (loaded {})",
        app.cfg.owner,
        app.workbook.loaded_at.format("%Y-%m-%d %H:%M")
    );
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(
            Tab::all()
                .iter()
                .position(|&t| t == app.current_tab)
                .unwrap_or(0),
        );
    f.render_widget(tabs, chunks[0]);

    let summary = Summary::from_workbook(&app.workbook, &app.cfg);
    match app.current_tab {
        Tab::Overview => render_overview(f, chunks[1], app, &summary),
        Tab::Holdings => render_holdings(f, chunks[1], app),
        Tab::Allocation => render_allocation(f, chunks[1], app, &summary),
        Tab::Actions => render_actions(f, chunks[1], app),
    }

    let help = Paragraph::new(
        "h/l (tabs) | 1-4 (direct) | j/k (select holding) | r (reload sheets) | q (quit)",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"))
    .style(Style::default().fg(Color::Gray))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);

    if let Some(error) = &app.error_message {
        render_error_popup(f, error);
    }
}

fn render_overview(f: &mut Frame, area: Rect, app: &App, summary: &Summary) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    render_total_value(f, chunks[0], summary.total_value, &app.cfg.currency);
    render_category_metrics(f, chunks[1], &summary.categories, &app.cfg.categories);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);
    render_region_chart(f, bottom[0], &summary.regions);
    render_breakdown_list(f, bottom[1], "Sectors", &summary.sectors);
}

fn render_total_value(f: &mut Frame, area: Rect, total_value: f64, currency: &str) {
    let value = format!("{} {currency}", format_with_commas(total_value));
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Total Portfolio Value ({currency})"))
        .title_alignment(Alignment::Center);
    f.render_widget(block, area);

    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });
    let text_width = value.len() as u16 * 4;
    let centered = if text_width < inner.width {
        let margin = (inner.width - text_width) / 2;
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(margin),
                Constraint::Min(0),
                Constraint::Length(margin),
            ])
            .split(inner)[1]
    } else {
        inner
    };

    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .lines(vec![value.into()])
        .build();
    f.render_widget(big_text, centered);
}

fn render_category_metrics(
    f: &mut Frame,
    area: Rect,
    categories: &Result<Allocation, PortfolioError>,
    labels: &[String],
) {
    if labels.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, labels.len() as u32); labels.len()];
    let boxes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (label, rect) in labels.iter().zip(boxes.iter()) {
        let (value, color) = match categories {
            Ok(allocation) => match allocation.share_of(label) {
                Some(share) => (format_share(share), Color::Cyan),
                None => ("N/A".to_string(), Color::Yellow),
            },
            Err(_) => ("N/A".to_string(), Color::Yellow),
        };
        let text = vec![
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                category_caption(label).unwrap_or(""),
                Style::default().fg(Color::Gray),
            )),
        ];
        let metric = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{label} %")),
            )
            .alignment(Alignment::Center);
        f.render_widget(metric, *rect);
    }
}

fn render_region_chart(f: &mut Frame, area: Rect, regions: &Result<Allocation, PortfolioError>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Allocation by Region (%)");
    let allocation = match regions {
        Ok(allocation) => allocation,
        Err(e) => {
            render_unavailable(f, area, block, e);
            return;
        }
    };

    let data: Vec<(&str, u64)> = allocation
        .slices
        .iter()
        .map(|s| (s.label.as_str(), (s.share * 100.0).round() as u64))
        .collect();

    let barchart = BarChart::default()
        .block(block)
        .data(data.as_slice())
        .bar_width(13)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow));
    f.render_widget(barchart, area);
}

fn render_breakdown_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    breakdown: &Result<Allocation, PortfolioError>,
) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let allocation = match breakdown {
        Ok(allocation) => allocation,
        Err(e) => {
            render_unavailable(f, area, block, e);
            return;
        }
    };

    let items: Vec<ListItem> = allocation
        .slices
        .iter()
        .map(|s| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<22}", s.label), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:>8}", format_share(s.share)),
                    Style::default().fg(Color::White),
                ),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn render_unavailable(f: &mut Frame, area: Rect, block: Block, error: &PortfolioError) {
    let paragraph = Paragraph::new(format!("N/A: {error}"))
        .block(block)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn header_row(names: &[&str]) -> Row<'static> {
    let cells: Vec<Cell> = names
        .iter()
        .map(|h| {
            Cell::from(h.to_string()).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    Row::new(cells).height(1).bottom_margin(1)
}

fn render_holdings(f: &mut Frame, area: Rect, app: &App) {
    let currency = &app.cfg.currency;
    let rows: Vec<Row> = aggregate::snapshot(app.workbook.holdings())
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let style = if i == app.selected_row {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(record.ticker.clone()),
                Cell::from(record.company.clone()),
                Cell::from(format_currency(record.current_value, currency)),
                Cell::from(record.category.clone()),
                Cell::from(record.sector.clone()),
                Cell::from(record.country.clone()),
                Cell::from(
                    record
                        .score
                        .map(|s| format!("{s:.2}"))
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(10),
        Constraint::Percentage(24),
        Constraint::Percentage(16),
        Constraint::Percentage(12),
        Constraint::Percentage(18),
        Constraint::Percentage(10),
        Constraint::Percentage(10),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(&[
            "Ticker", "Company", "Value", "Category", "Sector", "Country", "Score",
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Latest Holdings Snapshot"),
        );
    f.render_widget(table, area);
}

fn render_allocation(f: &mut Frame, area: Rect, app: &App, summary: &Summary) {
    let block = Block::default().borders(Borders::ALL).title(format!(
        "Monthly Allocation (skipping \"{}\")",
        app.cfg.exclude_action
    ));
    let picks = match &summary.picks {
        Ok(picks) => picks,
        Err(e) => {
            render_unavailable(f, area, block, e);
            return;
        }
    };

    let currency = &app.cfg.currency;
    let rows: Vec<Row> = picks
        .iter()
        .enumerate()
        .map(|(i, pick)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(pick.ticker().to_string()),
                Cell::from(pick.company().to_string()),
                Cell::from(pick.record.source.to_string()),
                Cell::from(format!("{:.2}", pick.score)),
                Cell::from(format_currency(pick.amount, currency))
                    .style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(12),
        Constraint::Percentage(34),
        Constraint::Percentage(16),
        Constraint::Percentage(12),
        Constraint::Percentage(20),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(&["#", "Ticker", "Company", "Source", "Score", "Amount"]))
        .block(block);
    f.render_widget(table, area);
}

fn render_actions(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .workbook
        .holdings()
        .iter()
        .map(|record| {
            let color = if record.suggested_action == app.cfg.exclude_action {
                Color::Red
            } else {
                Color::White
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", record.ticker),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(record.suggested_action.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Suggested Actions"),
    );
    f.render_widget(list, area);
}

fn render_error_popup(f: &mut Frame, error: &str) {
    let popup_area = centered_rect(60, 25, f.area());
    f.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(error.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error (any key to close)")
                .style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
