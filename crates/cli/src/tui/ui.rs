use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, BorderType, Borders, Cell, Chart, Clear, Dataset,
        GraphType, Paragraph, Row, Table, TableState, Tabs, Wrap,
    },
    Frame,
};

use compare_core::dashboard::{DetailView, Notice, NoticeLevel};
use compare_core::fmt::{self, Sign};
use compare_core::history::{HistoricalSeries, HistoryOutcome};
use compare_core::normalize::{label_for, FieldEntry};
use compare_core::output::cell_text;

use super::state::{App, TAB_COMPARE, TAB_DETAIL, TAB_PROTOCOLS};

// ─── Color palette ──────────────────────────────────────────────────

const ACCENT: Color = Color::Cyan;
const GREEN: Color = Color::Green;
const RED: Color = Color::Red;
const DIM: Color = Color::DarkGray;
const YELLOW: Color = Color::Yellow;
const WHITE: Color = Color::White;
const BG_HEADER: Color = Color::Rgb(20, 20, 40);
const BG_SELECTED: Color = Color::Rgb(40, 40, 70);

// ─── Main render ────────────────────────────────────────────────────

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Root layout: header(3) + tabs(3) + body(flex) + status(1)
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(8),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, app, root[0]);
    render_tabs(frame, app, root[1]);

    match app.tab {
        TAB_PROTOCOLS => render_picker(frame, app, root[2]),
        TAB_COMPARE => render_compare(frame, app, root[2]),
        TAB_DETAIL => render_detail(frame, app, root[2]),
        _ => {}
    }

    render_status_bar(frame, app, root[3]);

    // Help overlay on top
    if app.show_help {
        render_help(frame, area);
    }
}

// ─── Header ─────────────────────────────────────────────────────────

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(DIM))
        .style(Style::default().bg(BG_HEADER));

    let conn_indicator = if app.last_error.is_none() {
        Span::styled(" ● ", Style::default().fg(GREEN).bold())
    } else {
        Span::styled(" ● ", Style::default().fg(RED).bold())
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " DEFI COMPARE ",
            Style::default().fg(Color::Black).bg(ACCENT).bold(),
        ),
        Span::raw("  "),
        conn_indicator,
        Span::styled(&app.api_url, Style::default().fg(DIM)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} protocols", app.overview.protocols.len()),
            Style::default().fg(WHITE),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} selected", app.picked.len()),
            Style::default().fg(YELLOW).bold(),
        ),
    ]))
    .block(block);

    frame.render_widget(header, area);
}

// ─── Tab bar ────────────────────────────────────────────────────────

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tab_titles: Vec<Line> = app
        .tabs
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" {} {} ", i + 1, t)))
        .collect();

    let tabs = Tabs::new(tab_titles)
        .select(app.tab)
        .style(Style::default().fg(DIM))
        .highlight_style(Style::default().fg(ACCENT).bold().underlined())
        .divider("│")
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(DIM)),
        );

    frame.render_widget(tabs, area);
}

// ─── Tab 1: Protocol picker ─────────────────────────────────────────

fn render_picker(frame: &mut Frame, app: &App, area: Rect) {
    let (notice_area, body) = split_notices(area, app.overview.notices.len());
    if let Some(na) = notice_area {
        render_notices(frame, &app.overview.notices.iter().collect::<Vec<_>>(), na);
    }

    let header = Row::new(vec![
        Cell::from(" # "),
        Cell::from("Name"),
        Cell::from("Chain"),
        Cell::from("TVL"),
        Cell::from("24h"),
    ])
    .style(Style::default().fg(ACCENT).bold());

    let rows: Vec<Row> = app
        .overview
        .protocols
        .iter()
        .map(|p| {
            let name = p.name().unwrap_or(fmt::DASH);
            let mark = match app.picked.iter().position(|n| n == name) {
                Some(pos) => Span::styled(format!("{:>2} ", pos + 1), Style::default().fg(YELLOW).bold()),
                None => Span::styled("  · ", Style::default().fg(DIM)),
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(name.to_string()),
                Cell::from(p.chain().unwrap_or(fmt::DASH).to_string()),
                Cell::from(fmt::format_opt_usd(p.tvl())),
                Cell::from(Span::styled(
                    fmt::format_opt_pct(p.change_1d()),
                    Style::default().fg(sign_color(p.change_1d())),
                )),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(18),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(BG_SELECTED).add_modifier(Modifier::BOLD))
    .block(panel(" Protocols — space: pick/unpick · x: clear "));

    let mut state = TableState::default().with_selected(Some(app.cursor));
    frame.render_stateful_widget(table, body, &mut state);
}

// ─── Tab 2: Comparison ──────────────────────────────────────────────

fn render_compare(frame: &mut Frame, app: &App, area: Rect) {
    let (notice_area, body) = split_notices(area, app.overview.notices.len());
    if let Some(na) = notice_area {
        render_notices(frame, &app.overview.notices.iter().collect::<Vec<_>>(), na);
    }

    let Some(table) = &app.overview.table else {
        let hint = Paragraph::new(Line::from(Span::styled(
            "  Pick protocols on the Protocols tab to compare them.",
            Style::default().fg(DIM),
        )))
        .block(panel(" Comparison "));
        frame.render_widget(hint, body);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(table.rows.len() as u16 + 3),
            Constraint::Min(8),
        ])
        .split(body);

    // ── Table ───────────────────────────────────────────────────
    let header = Row::new(
        table
            .columns
            .iter()
            .map(|c| Cell::from(label_for(c)))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(ACCENT).bold());

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<Cell> = table
                .columns
                .iter()
                .zip(&row.cells)
                .map(|(col, value)| {
                    let text = cell_text(col, value.as_ref());
                    if col.starts_with("change_") {
                        let color = sign_color(value.as_ref().and_then(|v| v.as_f64()));
                        Cell::from(Span::styled(text, Style::default().fg(color)))
                    } else {
                        Cell::from(text)
                    }
                })
                .collect();
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = table
        .columns
        .iter()
        .map(|c| if c == "name" { Constraint::Min(16) } else { Constraint::Length(16) })
        .collect();

    let widget = Table::new(rows, widths).header(header).block(panel(" Comparison "));
    frame.render_widget(widget, chunks[0]);

    // ── TVL bars ────────────────────────────────────────────────
    let tvl_bars = app.overview.tvl_bars();
    if tvl_bars.is_empty() {
        return;
    }
    let bars: Vec<Bar> = tvl_bars
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.tvl.max(0.0) as u64)
                .label(Line::from(fmt::truncate_str(&b.name, 14).to_string()))
                .text_value(fmt::format_usd_compact(b.tvl))
                .style(Style::default().fg(ACCENT))
                .value_style(Style::default().fg(Color::Black).bg(ACCENT).bold())
        })
        .collect();

    let slots = u16::try_from(bars.len()).unwrap_or(u16::MAX).max(1);
    let bar_width = (chunks[1].width.saturating_sub(2) / slots)
        .saturating_sub(2)
        .clamp(3, 16);

    let chart = BarChart::default()
        .block(panel(" TVL Comparison "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(2);
    frame.render_widget(chart, chunks[1]);
}

// ─── Tab 3: Detail ──────────────────────────────────────────────────

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let notices = app.notices();
    let (notice_area, body) = split_notices(area, notices.len());
    if let Some(na) = notice_area {
        render_notices(frame, &notices, na);
    }

    let Some(detail) = &app.detail else {
        let hint = Paragraph::new(Line::from(Span::styled(
            "  No protocol selected.",
            Style::default().fg(DIM),
        )))
        .block(panel(" Detail "));
        frame.render_widget(hint, body);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(body);

    render_headline(frame, app, detail, rows[0]);

    if app.show_history {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[1]);
        render_fields(frame, app, detail, cols[0]);
        render_history(frame, detail, cols[1]);
    } else {
        render_fields(frame, app, detail, rows[1]);
    }
}

fn render_headline(frame: &mut Frame, app: &App, detail: &DetailView, area: Rect) {
    let h = &detail.headline;
    let position = format!(
        " {} ({}/{}) ",
        detail.name,
        app.detail_index + 1,
        app.overview.selected.len()
    );

    let text = vec![
        Line::from(vec![
            Span::styled(" TVL          ", Style::default().fg(DIM)),
            Span::styled(&h.tvl, Style::default().fg(WHITE).bold()),
        ]),
        Line::from(vec![
            Span::styled(" 24h Change   ", Style::default().fg(DIM)),
            Span::styled(&h.change_1d, Style::default().fg(sign_color(h.change_1d_raw)).bold()),
        ]),
        Line::from(vec![
            Span::styled(" 7d Change    ", Style::default().fg(DIM)),
            Span::styled(&h.change_7d, Style::default().fg(sign_color(h.change_7d_raw)).bold()),
        ]),
    ];

    frame.render_widget(Paragraph::new(text).block(panel(&position)), area);
}

fn render_fields(frame: &mut Frame, app: &App, detail: &DetailView, area: Rect) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" Chain: ", Style::default().fg(DIM)),
            Span::raw(detail.chain.as_deref().unwrap_or(fmt::DASH)),
        ]),
        Line::from(vec![
            Span::styled(" Description: ", Style::default().fg(DIM)),
            Span::raw(detail.description.as_deref().unwrap_or(fmt::DASH)),
        ]),
        Line::from(""),
    ];

    for entry in &detail.fields {
        match entry {
            FieldEntry::Line { label, value } => lines.push(Line::from(vec![
                Span::styled(format!(" {label}: "), Style::default().fg(ACCENT)),
                Span::raw(value.as_str()),
            ])),
            FieldEntry::Group { label, lines: sub } => {
                lines.push(Line::from(Span::styled(
                    format!(" {label}:"),
                    Style::default().fg(ACCENT),
                )));
                for (k, v) in sub {
                    lines.push(Line::from(vec![
                        Span::styled(format!("   - {k}: "), Style::default().fg(DIM)),
                        Span::raw(v.as_str()),
                    ]));
                }
            }
        }
    }

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0))
        .block(panel(" Detailed Information "));
    frame.render_widget(widget, area);
}

fn render_history(frame: &mut Frame, detail: &DetailView, area: Rect) {
    let message = match &detail.history {
        Some(HistoryOutcome::Available(series)) if !series.is_empty() => {
            render_history_chart(frame, series, area);
            return;
        }
        Some(HistoryOutcome::Available(_)) => "No historical points.",
        Some(HistoryOutcome::Unavailable) => "Historical TVL not available for this protocol.",
        None => "Historical TVL could not be loaded.",
    };
    let widget = Paragraph::new(Line::from(Span::styled(
        format!("  {message}"),
        Style::default().fg(DIM),
    )))
    .block(panel(" Historical TVL "));
    frame.render_widget(widget, area);
}

fn render_history_chart(frame: &mut Frame, series: &HistoricalSeries, area: Rect) {
    let data: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|p| (p.date.timestamp() as f64, p.tvl))
        .collect();

    let (Some(first), Some(last)) = (series.points.first(), series.latest()) else {
        return;
    };
    let (lo, hi) = series.tvl_bounds().unwrap_or((0.0, 1.0));
    let x0 = first.date.timestamp() as f64;
    let x1 = (last.date.timestamp() as f64).max(x0 + 1.0);
    let hi = hi.max(lo + 1.0);

    let datasets = vec![Dataset::default()
        .name("TVL")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(ACCENT))
        .data(&data)];

    let title = history_title(series);
    let chart = Chart::new(datasets)
        .block(panel(&title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(DIM))
                .bounds([x0, x1])
                .labels([fmt::format_date(&first.date), fmt::format_date(&last.date)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(DIM))
                .bounds([lo, hi])
                .labels([fmt::format_usd_compact(lo), fmt::format_usd_compact(hi)]),
        );

    frame.render_widget(chart, area);
}

/// Panel title carrying the most recent point.
fn history_title(series: &HistoricalSeries) -> String {
    match series.latest() {
        Some(p) => format!(
            " Historical TVL · last {} {} ",
            fmt::format_date(&p.date),
            fmt::format_usd_compact(p.tvl)
        ),
        None => String::from(" Historical TVL "),
    }
}

// ─── Notices ────────────────────────────────────────────────────────

/// Carve a notice strip off the top of `area` when there is something to say.
fn split_notices(area: Rect, count: usize) -> (Option<Rect>, Rect) {
    if count == 0 {
        return (None, area);
    }
    let height = u16::try_from(count.min(4)).unwrap_or(4) + 2;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(height), Constraint::Min(4)])
        .split(area);
    (Some(parts[0]), parts[1])
}

fn render_notices(frame: &mut Frame, notices: &[&Notice], area: Rect) {
    let lines: Vec<Line> = notices
        .iter()
        .map(|n| {
            let (marker, color) = notice_style(n.level);
            Line::from(vec![
                Span::styled(format!(" {marker} "), Style::default().fg(color).bold()),
                Span::styled(n.message.as_str(), Style::default().fg(color)),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(panel(" Notices ")),
        area,
    );
}

fn notice_style(level: NoticeLevel) -> (&'static str, Color) {
    match level {
        NoticeLevel::Info => ("ℹ", ACCENT),
        NoticeLevel::Warning => ("⚠", YELLOW),
        NoticeLevel::Error => ("✗", RED),
    }
}

// ─── Status bar ─────────────────────────────────────────────────────

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let error_span = match &app.last_error {
        Some(e) => Span::styled(
            format!(" ✗ {} ", fmt::truncate_str(e, 60)),
            Style::default().fg(RED),
        ),
        None => Span::styled(" ✓ ", Style::default().fg(GREEN)),
    };

    let history = if app.tab == TAB_DETAIL {
        Span::styled(
            if app.show_history { "  history: on " } else { "  history: off " },
            Style::default().fg(DIM),
        )
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        error_span,
        Span::styled(format!("  │  Refreshed: {}", app.last_refresh), Style::default().fg(DIM)),
        history,
        Span::raw("  "),
        Span::styled(
            "?",
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Help ", Style::default().fg(DIM)),
        Span::styled(
            "q",
            Style::default()
                .fg(Color::Black)
                .bg(RED)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Quit", Style::default().fg(DIM)),
    ]);

    let bar = Paragraph::new(line).style(Style::default().bg(BG_HEADER));
    frame.render_widget(bar, area);
}

// ─── Help overlay ───────────────────────────────────────────────────

fn render_help(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(55, 70, area);

    frame.render_widget(Clear, popup);

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  Navigation", Style::default().fg(ACCENT).bold())),
        Line::from(""),
        Line::from("  1-3           Switch tab"),
        Line::from("  Tab / →       Next tab"),
        Line::from("  S-Tab / ←     Previous tab"),
        Line::from("  j / ↓         Move down / scroll"),
        Line::from("  k / ↑         Move up / scroll"),
        Line::from(""),
        Line::from(Span::styled("  Protocols", Style::default().fg(ACCENT).bold())),
        Line::from(""),
        Line::from("  space / ⏎     Pick or unpick protocol"),
        Line::from("  x             Clear selection"),
        Line::from(""),
        Line::from(Span::styled("  Detail", Style::default().fg(ACCENT).bold())),
        Line::from(""),
        Line::from("  n / p         Next / previous selected protocol"),
        Line::from("  h             Toggle historical TVL chart"),
        Line::from(""),
        Line::from("  r             Refresh from the API"),
        Line::from("  ?             Toggle help"),
        Line::from("  q / Ctrl+C    Quit"),
        Line::from(""),
        Line::from(Span::styled("  Press ? or Esc to close", Style::default().fg(DIM))),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().fg(ACCENT).bold())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT)),
        )
        .style(Style::default().bg(Color::Rgb(15, 15, 30)));

    frame.render_widget(help, popup);
}

// ─── Helpers ────────────────────────────────────────────────────────

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).bold())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(DIM))
}

/// Color of a percent change by its sign.
fn sign_color(v: Option<f64>) -> Color {
    match fmt::sign_of(v) {
        Sign::Negative => RED,
        Sign::Zero => DIM,
        Sign::Positive => GREEN,
    }
}

/// Create a centered rectangle for overlay popups.
fn centered_rect(pct_x: u16, pct_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
