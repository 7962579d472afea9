// Structured output types for JSON/table rendering.
//
// Every data-producing command returns one of these types.
// They all derive `Serialize` for JSON output, and implement
// `TableDisplay` for human-readable table rendering.

use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::dashboard::{DetailView, HistoryBatch, LiveTvl, Notice, NoticeLevel, Overview, TvlBar};
use crate::fmt::{self, DASH};
use crate::history::{HistoricalSeries, HistoryOutcome};
use crate::normalize::{label_for, FieldEntry};
use crate::table::{ProtocolTable, SelectionOrder};

// ─── Protocols ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolsOutput {
    /// Protocols in the fetched list before `--chain`/`--limit`.
    pub total: usize,
    pub table: Option<ProtocolTable>,
    pub notices: Vec<Notice>,
}

// ─── Comparison ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutput {
    pub order: SelectionOrder,
    #[serde(flatten)]
    pub overview: Overview,
    pub bars: Vec<TvlBar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveTvl>,
}

impl ComparisonOutput {
    pub fn new(overview: Overview, order: SelectionOrder, live: Option<LiveTvl>) -> Self {
        Self {
            order,
            bars: overview.tvl_bars(),
            overview,
            live,
        }
    }
}

// ─── Detail ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DetailOutput {
    #[serde(flatten)]
    pub view: DetailView,
    /// Points shown in table mode; JSON carries the whole series.
    #[serde(skip)]
    pub tail: usize,
}

// ─── History ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutput {
    #[serde(flatten)]
    pub batch: HistoryBatch,
    #[serde(skip)]
    pub tail: usize,
}

// ─── Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ConfigOutput {
    pub path: String,
    pub config: AppConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

// Unified output rendering: JSON or human-readable table.
//
// Usage:
// ```ignore
// use compare_core::output::{OutputFormat, render};
//
// let data = ComparisonOutput::new(overview, order, None);
// render(format, &data)?;
// ```

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default).
    Table,
    /// Compact JSON (for piping to jq, scripts).
    Json,
    /// Pretty-printed JSON (for reading).
    JsonPretty,
}

/// Trait for types that can render as a human-readable table.
pub trait TableDisplay {
    fn print_table(&self);
}

/// Consistent envelope for JSON responses.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

/// `{"ok":true,"data":...}` as a string.
pub fn envelope<T: Serialize>(data: &T, pretty: bool) -> serde_json::Result<String> {
    let response = ApiResponse {
        ok: true,
        data: Some(data),
        error: None,
    };
    if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
}

/// Render structured output: JSON or table depending on format.
pub fn render<T: Serialize + TableDisplay>(format: OutputFormat, data: &T) -> anyhow::Result<()> {
    if !render_json_or(format, data)? {
        data.print_table();
    }
    Ok(())
}

/// Render just the JSON formats (for types that handle their own table display).
/// Returns true if JSON was rendered, false if table mode was requested.
pub fn render_json_or<T: Serialize>(format: OutputFormat, data: &T) -> anyhow::Result<bool> {
    match format {
        OutputFormat::Table => Ok(false),
        OutputFormat::Json => {
            println!("{}", envelope(data, false)?);
            Ok(true)
        }
        OutputFormat::JsonPretty => {
            println!("{}", envelope(data, true)?);
            Ok(true)
        }
    }
}

// ─── Table helpers ──────────────────────────────────────────────────

const BAR_WIDTH: usize = 30;

/// Display text of one table cell, formatted by column.
pub fn cell_text(column: &str, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return DASH.to_string();
    };
    match (column, value) {
        (_, Value::Null) => DASH.to_string(),
        ("tvl", Value::Number(n)) => n.as_f64().map_or_else(|| n.to_string(), fmt::format_usd_whole),
        (c, Value::Number(n)) if c.starts_with("change_") => {
            n.as_f64().map_or_else(|| n.to_string(), fmt::format_change_pct)
        }
        (_, Value::Number(n)) => fmt::format_json_number(n),
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}

/// Bar length proportional to `value / max`, at least one cell for any
/// positive value.
pub fn bar_len(value: f64, max: f64, width: usize) -> usize {
    if !value.is_finite() || !max.is_finite() || value <= 0.0 || max <= 0.0 {
        return 0;
    }
    let len = (value / max * width as f64).round() as usize;
    len.clamp(1, width)
}

fn print_notices(notices: &[Notice]) {
    for n in notices {
        let marker = match n.level {
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Error => "✗",
        };
        println!("{marker} {}", n.message);
    }
}

/// Box-drawn table sized to its content. `numeric[i]` right-aligns column i.
fn print_grid(headers: &[String], rows: &[Vec<String>], numeric: &[bool]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = |l: &str, m: &str, r: &str| {
        let segs: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        println!("{l}{}{r}", segs.join(m));
    };
    let line = |cells: &[String]| {
        let segs: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (c, &w))| {
                if numeric.get(i).copied().unwrap_or(false) {
                    format!(" {c:>w$} ")
                } else {
                    format!(" {c:<w$} ")
                }
            })
            .collect();
        println!("│{}│", segs.join("│"));
    };

    rule("┌", "┬", "┐");
    line(headers);
    rule("├", "┼", "┤");
    for row in rows {
        line(row);
    }
    rule("└", "┴", "┘");
}

fn print_protocol_table(table: &ProtocolTable) {
    let headers: Vec<String> = table.columns.iter().map(String::as_str).map(label_for).collect();
    let numeric: Vec<bool> = table
        .columns
        .iter()
        .map(|c| c == "tvl" || c.starts_with("change_"))
        .collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .zip(&row.cells)
                .map(|(col, cell)| cell_text(col, cell.as_ref()))
                .collect()
        })
        .collect();
    print_grid(&headers, &rows, &numeric);
}

fn print_bars(bars: &[TvlBar]) {
    if bars.is_empty() {
        return;
    }
    let max = bars.iter().map(|b| b.tvl).fold(0.0_f64, f64::max);
    let name_w = bars.iter().map(|b| b.name.chars().count()).max().unwrap_or(0);
    let bar_w = BAR_WIDTH;

    println!();
    println!("TVL Comparison");
    for b in bars {
        println!(
            "  {:<name_w$} │{:<bar_w$}│ {}",
            b.name,
            "█".repeat(bar_len(b.tvl, max, BAR_WIDTH)),
            fmt::format_usd_compact(b.tvl),
        );
    }
}

fn print_series(series: &HistoricalSeries, tail: usize) {
    if series.is_empty() {
        println!("No historical points.");
        return;
    }
    let headers: Vec<String> = ["Date", "TVL", "1d %", "7d %"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = series
        .tail(tail)
        .iter()
        .map(|p| {
            vec![
                fmt::format_date(&p.date),
                fmt::format_usd_whole(p.tvl),
                fmt::format_opt_pct(p.change_1d_pct),
                fmt::format_opt_pct(p.change_7d_pct),
            ]
        })
        .collect();
    print_grid(&headers, &rows, &[false, true, true, true]);
    if series.len() > tail {
        println!("  (last {tail} of {} points)", series.len());
    }
}

// ─── TableDisplay implementations for output types ──────────────────

impl TableDisplay for ProtocolsOutput {
    fn print_table(&self) {
        print_notices(&self.notices);
        let Some(table) = &self.table else {
            return;
        };
        if table.is_empty() {
            println!("No protocols match.");
            return;
        }
        print_protocol_table(table);
        println!("  {} of {} protocols", table.rows.len(), self.total);
    }
}

impl TableDisplay for ComparisonOutput {
    fn print_table(&self) {
        print_notices(&self.overview.notices);
        if let Some(table) = &self.overview.table {
            print_protocol_table(table);
            print_bars(&self.bars);
        }

        if let Some(live) = &self.live {
            println!();
            println!("Current TVL");
            print_notices(&live.notices);
            if !live.rows.is_empty() {
                let headers: Vec<String> = ["Protocol", "Slug", "TVL"].map(String::from).to_vec();
                let rows: Vec<Vec<String>> = live
                    .rows
                    .iter()
                    .map(|r| vec![r.protocol.clone(), r.slug.clone(), fmt::format_usd_whole(r.tvl)])
                    .collect();
                print_grid(&headers, &rows, &[false, false, true]);
            }
        }
    }
}

impl TableDisplay for DetailOutput {
    fn print_table(&self) {
        let v = &self.view;
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║  {:<56}║", fmt::truncate_str(&v.name, 56));
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║  TVL         : {:<42}║", v.headline.tvl);
        println!("║  24h Change  : {:<42}║", v.headline.change_1d);
        println!("║  7d Change   : {:<42}║", v.headline.change_7d);
        println!("╚══════════════════════════════════════════════════════════╝");

        println!("Chain: {}", v.chain.as_deref().unwrap_or(DASH));
        println!("Description: {}", v.description.as_deref().unwrap_or(DASH));

        if !v.fields.is_empty() {
            println!();
            println!("Detailed Information");
            for entry in &v.fields {
                match entry {
                    FieldEntry::Line { label, value } => println!("  {label}: {value}"),
                    FieldEntry::Group { label, lines } => {
                        println!("  {label}:");
                        for (k, val) in lines {
                            println!("    - {k}: {val}");
                        }
                    }
                }
            }
        }

        if let Some(HistoryOutcome::Available(series)) = &v.history {
            println!();
            println!("Historical TVL");
            print_series(series, self.tail);
        }
        print_notices(&v.notices);
    }
}

impl TableDisplay for HistoryOutput {
    fn print_table(&self) {
        for entry in &self.batch.entries {
            if let HistoryOutcome::Available(series) = &entry.outcome {
                println!("{}", entry.name);
                print_series(series, self.tail);
                println!();
            }
        }
        print_notices(&self.batch.notices);
    }
}

impl TableDisplay for ConfigOutput {
    fn print_table(&self) {
        if let Some(updated) = &self.updated {
            println!("✓ {updated}");
            return;
        }
        let s = &self.config.system;
        let d = &self.config.dashboard;
        println!("Config: {}", self.path);
        println!("  api_url           : {}", s.api_url);
        println!("  timeout_secs      : {}", s.timeout_secs);
        println!("  verbose           : {}", s.verbose);
        println!("  selection_order   : {}", d.selection_order);
        println!("  default_selection : {}", d.default_selection);
        println!("  columns           : {}", d.columns.join(", "));
        println!("  highlight_keys    : {}", d.highlight_keys.join(", "));
        println!("  history_tail      : {}", d.history_tail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text_by_column() {
        assert_eq!(cell_text("tvl", Some(&json!(1234567.8))), "$1,234,568");
        assert_eq!(cell_text("change_1d", Some(&json!(1.234))), "1.23%");
        assert_eq!(cell_text("change_1m", Some(&json!(-4.5))), "-4.50%");
        assert_eq!(cell_text("mcap", Some(&json!(1000000))), "1,000,000");
        assert_eq!(cell_text("chain", Some(&json!("Ethereum"))), "Ethereum");
        assert_eq!(cell_text("chain", Some(&Value::Null)), DASH);
        assert_eq!(cell_text("chain", None), DASH);
    }

    #[test]
    fn test_bar_len_is_proportional() {
        assert_eq!(bar_len(100.0, 100.0, 30), 30);
        assert_eq!(bar_len(50.0, 100.0, 30), 15);
        assert_eq!(bar_len(0.001, 100.0, 30), 1);
        assert_eq!(bar_len(0.0, 100.0, 30), 0);
        assert_eq!(bar_len(10.0, 0.0, 30), 0);
        assert_eq!(bar_len(f64::NAN, 100.0, 30), 0);
    }

    #[test]
    fn test_envelope() {
        let out = ProtocolsOutput {
            total: 0,
            table: None,
            notices: vec![Notice {
                level: NoticeLevel::Warning,
                message: "No data available. Please try again later.".into(),
            }],
        };
        let v: Value = serde_json::from_str(&envelope(&out, false).unwrap()).unwrap();
        assert_eq!(v["ok"], json!(true));
        assert!(v.get("error").is_none());
        assert_eq!(v["data"]["notices"][0]["level"], json!("warning"));
    }

    #[test]
    fn test_comparison_json_shape() {
        let overview = Overview {
            selection: vec!["Aave".into()],
            ..Overview::default()
        };
        let out = ComparisonOutput::new(overview, SelectionOrder::Source, None);
        let v: Value = serde_json::from_str(&envelope(&out, true).unwrap()).unwrap();
        assert_eq!(v["data"]["order"], json!("source"));
        assert_eq!(v["data"]["selection"], json!(["Aave"]));
        assert!(v["data"].get("live").is_none());
    }
}
