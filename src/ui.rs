use crate::chart::{PieChart, Rgb};
use crate::db::open_database;
use crate::error::{Field, ReportError, SaveError, ValidationError};
use crate::form::ExpenseForm;
use crate::report::{generate_report, Report, ReportOutcome};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    AddExpense,
    ViewReport,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Dashboard, Page::AddExpense, Page::ViewReport];

    /// Stable view name
    pub fn name(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::AddExpense => "add_expense",
            Page::ViewReport => "view_report",
        }
    }

    pub fn from_name(name: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::AddExpense => "Add Expense",
            Page::ViewReport => "View Report",
        }
    }

    /// Focusable controls, top to bottom
    pub fn controls(&self) -> &'static [Control] {
        match self {
            Page::Dashboard => &[
                Control::GoTo(Page::AddExpense),
                Control::GoTo(Page::ViewReport),
                Control::Quit,
            ],
            Page::AddExpense => &[
                Control::Input(Field::Name),
                Control::Input(Field::Amount),
                Control::Input(Field::Category),
                Control::SaveExpense,
                Control::GoTo(Page::Dashboard),
            ],
            Page::ViewReport => &[Control::GenerateReport, Control::GoTo(Page::Dashboard)],
        }
    }

    fn index(&self) -> usize {
        match self {
            Page::Dashboard => 0,
            Page::AddExpense => 1,
            Page::ViewReport => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    GoTo(Page),
    Input(Field),
    SaveExpense,
    GenerateReport,
    Quit,
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Control::GoTo(Page::Dashboard) => "Back to Dashboard",
            Control::GoTo(Page::AddExpense) => "Add Expense",
            Control::GoTo(Page::ViewReport) => "View Report",
            Control::Input(field) => field.label(),
            Control::SaveExpense => "Save Expense",
            Control::GenerateReport => "Generate Report",
            Control::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Modal message box; swallows input until dismissed
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }

    fn color(&self) -> Color {
        match self.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Info => Color::Yellow,
            NoticeKind::Error => Color::Red,
        }
    }
}

pub struct App {
    db_path: PathBuf,
    pub current_page: Page,
    focus: [usize; 3],
    pub form: ExpenseForm,
    pub report: Option<Report>,
    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            current_page: Page::Dashboard,
            focus: [0; 3],
            form: ExpenseForm::default(),
            report: None,
            notice: None,
            should_quit: false,
        }
    }

    /// Make `page` the current view. Nothing else changes.
    pub fn switch_to(&mut self, page: Page) {
        log::debug!("Switching view {} -> {}", self.current_page.name(), page.name());
        self.current_page = page;
    }

    pub fn focused(&self) -> Control {
        let controls = self.current_page.controls();
        controls[self.focus[self.current_page.index()] % controls.len()]
    }

    pub fn focus_next(&mut self) {
        let len = self.current_page.controls().len();
        let slot = &mut self.focus[self.current_page.index()];
        *slot = (*slot + 1) % len;
    }

    pub fn focus_previous(&mut self) {
        let len = self.current_page.controls().len();
        let slot = &mut self.focus[self.current_page.index()];
        *slot = if *slot == 0 { len - 1 } else { *slot - 1 };
    }

    fn focus_first(&mut self) {
        self.focus[self.current_page.index()] = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::Enter => self.activate(self.focused()),
            KeyCode::Esc => {
                if self.current_page == Page::Dashboard {
                    self.should_quit = true;
                } else {
                    self.switch_to(Page::Dashboard);
                }
            }
            KeyCode::Backspace => {
                if let Control::Input(field) = self.focused() {
                    self.form.field_mut(field).pop();
                }
            }
            KeyCode::Char(c) => match self.focused() {
                Control::Input(field) => {
                    if ExpenseForm::accepts(field, c) {
                        self.form.field_mut(field).push(c);
                    }
                }
                _ => {
                    if c == 'q' && self.current_page == Page::Dashboard {
                        self.should_quit = true;
                    }
                }
            },
            _ => {}
        }
    }

    pub fn activate(&mut self, control: Control) {
        match control {
            Control::GoTo(page) => self.switch_to(page),
            Control::Input(_) => self.focus_next(),
            Control::SaveExpense => self.save_expense(),
            Control::GenerateReport => self.generate_report(),
            Control::Quit => self.should_quit = true,
        }
    }

    /// Save handler: one database open, at most one insert, one notice
    pub fn save_expense(&mut self) {
        let result = match open_database(&self.db_path) {
            Ok(conn) => self.form.save(&conn),
            Err(e) => Err(SaveError::Storage(e)),
        };

        self.notice = Some(match result {
            Ok(_) => {
                self.focus_first();
                Notice::new(NoticeKind::Success, "Success", "Expense saved!")
            }
            Err(SaveError::Validation(ValidationError::MissingField(_))) => {
                Notice::new(NoticeKind::Error, "Error", "Please fill out all fields")
            }
            Err(SaveError::Validation(ValidationError::InvalidAmount(_))) => {
                Notice::new(NoticeKind::Error, "Error", "Please enter a valid amount")
            }
            Err(e) => {
                log::error!("Failed to save expense: {}", e);
                Notice::new(
                    NoticeKind::Error,
                    "Error",
                    format!("Failed to save expense: {}", e),
                )
            }
        });
    }

    /// Report handler: re-reads every record on each call
    pub fn generate_report(&mut self) {
        let outcome = match open_database(&self.db_path) {
            Ok(conn) => generate_report(&conn),
            Err(e) => Err(ReportError::Storage(e)),
        };

        match outcome {
            Ok(ReportOutcome::Ready(report)) => {
                self.report = Some(report);
            }
            Ok(ReportOutcome::NoData) => {
                self.report = None;
                self.notice = Some(Notice::new(
                    NoticeKind::Info,
                    "No Data",
                    "No expenses to generate a report.",
                ));
            }
            Err(e) => {
                log::error!("Failed to generate report: {}", e);
                self.report = None;
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    "Error",
                    format!("Failed to generate report: {}", e),
                ));
            }
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("UI loop failed: {:?}", err);
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            app.handle_key(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Current view
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::AddExpense => render_add_expense(f, chunks[1], app),
        Page::ViewReport => render_report(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(notice) = &app.notice {
        render_notice(f, notice);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " Finance Tracker ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    for page in Page::ALL {
        spans.push(Span::raw(" │ "));

        let style = if page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title(), style));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    if focused {
        Line::from(Span::styled(
            format!("→ [ {} ]", label),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            format!("  [ {} ]", label),
            Style::default().fg(Color::White),
        ))
    }
}

fn render_buttons(f: &mut Frame, area: Rect, app: &App, controls: &[Control]) {
    let focused = app.focused();
    let lines: Vec<Line> = controls
        .iter()
        .map(|c| button_line(c.label(), *c == focused))
        .collect();

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let title = Paragraph::new(Line::from(Span::styled(
        "Finance Tracker Dashboard",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    render_buttons(f, chunks[2], app, Page::Dashboard.controls());
}

fn render_add_expense(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Add Expense ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let focused = app.focused();
    for (i, field) in [Field::Name, Field::Amount, Field::Category].into_iter().enumerate() {
        render_input(f, chunks[i], app.form.field(field), field, focused == Control::Input(field));
    }

    render_buttons(
        f,
        chunks[4],
        app,
        &[Control::SaveExpense, Control::GoTo(Page::Dashboard)],
    );
}

fn render_input(f: &mut Frame, area: Rect, value: &str, field: Field, focused: bool) {
    let border = if focused { Color::Yellow } else { Color::DarkGray };

    let line = if value.is_empty() && !focused {
        Line::from(Span::styled(
            field.label(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
    } else if focused {
        Line::from(vec![
            Span::raw(value.to_string()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ])
    } else {
        Line::from(value.to_string())
    };

    let input = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", field.label())),
    );

    f.render_widget(input, area);
}

fn render_report(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    match &app.report {
        Some(report) => {
            let content = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[0]);

            render_pie(f, content[0], &report.chart);
            render_legend(f, content[1], report);
        }
        None => {
            let placeholder = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No chart yet. Select Generate Report to build one.",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::White))
                    .title(" Report "),
            );
            f.render_widget(placeholder, chunks[0]);
        }
    }

    render_buttons(f, chunks[1], app, Page::ViewReport.controls());
}

fn slice_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Sample the unit disc on a `steps` x `steps` grid, grouping points by slice
pub fn pie_points(chart: &PieChart, steps: usize) -> Vec<Vec<(f64, f64)>> {
    let mut points = vec![Vec::new(); chart.slices.len()];
    if steps < 2 {
        return points;
    }

    let step = 2.0 / (steps - 1) as f64;
    for row in 0..steps {
        let y = -1.0 + row as f64 * step;
        for col in 0..steps {
            let x = -1.0 + col as f64 * step;
            if let Some(i) = chart.slice_at(x, y) {
                points[i].push((x, y));
            }
        }
    }

    points
}

fn render_pie(f: &mut Frame, area: Rect, chart: &PieChart) {
    // Braille cells are 2x4 dots; sample at roughly that resolution
    let steps = (area.width as usize * 2).max(area.height as usize * 4).clamp(2, 240);
    let points = pie_points(chart, steps);

    // Terminal cells are about twice as tall as wide; widen the x range to keep the pie round
    let ratio = if area.height == 0 {
        1.0
    } else {
        area.width as f64 / (area.height as f64 * 2.0)
    };
    let (x_span, y_span) = if ratio >= 1.0 {
        (1.1 * ratio, 1.1)
    } else {
        (1.1, 1.1 / ratio)
    };

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", chart.title)),
        )
        .marker(Marker::Braille)
        .x_bounds([-x_span, x_span])
        .y_bounds([-y_span, y_span])
        .paint(|ctx| {
            for (slice, coords) in chart.slices.iter().zip(points.iter()) {
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color: slice_color(slice.color),
                });
            }
        });

    f.render_widget(canvas, area);
}

fn render_legend(f: &mut Frame, area: Rect, report: &Report) {
    let mut lines = vec![Line::from("")];

    for slice in &report.chart.slices {
        lines.push(Line::from(vec![
            Span::styled(" ■ ", Style::default().fg(slice_color(slice.color))),
            Span::styled(
                format!("{:<16}", truncate(&slice.label, 16)),
                Style::default().fg(Color::White),
            ),
            Span::raw(format!("{:>10.2}", slice.value)),
            Span::styled(
                format!("{:>8}", slice.percent_label()),
                Style::default().fg(Color::Cyan),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(
            "   Total: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{:.2}", report.grand_total())),
    ]));
    lines.push(Line::from(Span::styled(
        format!(
            "   Generated {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let legend = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" By Category "),
    );

    f.render_widget(legend, area);
}

fn render_notice(f: &mut Frame, notice: &Notice) {
    let area = centered_rect(60, 40, f.size());

    let content = vec![
        Line::from(""),
        Line::from(notice.message.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    let popup = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(notice.color()))
                .title(format!(" {} ", notice.title)),
        );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab/↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Move | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Select | "));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
    if app.current_page == Page::Dashboard {
        status_spans.push(Span::raw(" Quit | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    } else {
        status_spans.push(Span::raw(" Dashboard"));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
