//! Dashboard assembly: one render pass over a `ProtocolSource`.
//!
//! Each view is built from a fresh fetch. A failing fetch or an unexpected
//! payload never aborts the pass: the affected section is left out and a
//! `Notice` explains why, while the rest of the view is still built.

use serde::Serialize;
use tracing::{info, warn};

use compare_common::traits::ProtocolSource;
use compare_common::types::ProtocolSummary;

use crate::config::DashboardConfig;
use crate::fmt;
use crate::history::{build_history, HistoryOutcome};
use crate::normalize::{normalize_fields, FieldEntry};
use crate::table::{default_selection, resolve_selection, select_protocols, ProtocolTable};

// ─── Notices ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing message standing in for a missing or degraded section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        let message = message.into();
        info!("{message}");
        Self { level: NoticeLevel::Info, message }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("{message}");
        Self { level: NoticeLevel::Warning, message }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("{message}");
        Self { level: NoticeLevel::Error, message }
    }
}

// ─── Overview ───────────────────────────────────────────────────────

/// Bar of the TVL comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TvlBar {
    pub name: String,
    pub tvl: f64,
}

/// Protocol list, current selection and the comparison table built from it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overview {
    /// Everything the source returned, in source order.
    #[serde(skip)]
    pub protocols: Vec<ProtocolSummary>,
    /// Resolved selection, in selection order.
    pub selection: Vec<String>,
    /// Selected rows, ordered by the configured policy.
    #[serde(skip)]
    pub selected: Vec<ProtocolSummary>,
    /// `None` when there is nothing to compare.
    pub table: Option<ProtocolTable>,
    pub notices: Vec<Notice>,
}

impl Overview {
    /// Build from an already fetched list. An empty `requested` leaves the
    /// comparison empty.
    pub fn build(
        protocols: Vec<ProtocolSummary>,
        config: &DashboardConfig,
        requested: &[String],
    ) -> Self {
        let mut notices = Vec::new();

        if protocols.is_empty() {
            notices.push(Notice::warning("No data available. Please try again later."));
            return Self {
                notices,
                ..Self::default()
            };
        }

        let resolved = resolve_selection(&protocols, requested);
        for name in &resolved.unknown {
            notices.push(Notice::warning(format!("Unknown protocol: {name}")));
        }

        if resolved.known.is_empty() {
            notices.push(Notice::info("Select protocols to compare."));
            return Self {
                protocols,
                notices,
                ..Self::default()
            };
        }

        let selected = select_protocols(&protocols, &resolved.known, config.selection_order);
        let table = ProtocolTable::build(&selected, &config.columns);

        Self {
            protocols,
            selection: resolved.known,
            selected,
            table: Some(table),
            notices,
        }
    }

    /// TVL per selected row, in table order. Rows without a numeric TVL are
    /// left out of the chart.
    pub fn tvl_bars(&self) -> Vec<TvlBar> {
        self.selected
            .iter()
            .filter_map(|p| {
                Some(TvlBar {
                    name: p.name()?.to_string(),
                    tvl: p.tvl()?,
                })
            })
            .collect()
    }
}

/// Fetch the full protocol list; a failure becomes an error notice.
pub async fn load_protocol_list(source: &dyn ProtocolSource) -> Result<Vec<ProtocolSummary>, Notice> {
    source.protocols().await.map_err(|e| {
        Notice::error(format!("Failed to fetch data from {}: {e}", source.name()))
    })
}

/// Fetch the protocol list and build the overview for `requested`. An empty
/// `requested` falls back to the first `config.default_selection` protocols.
pub async fn load_overview(
    source: &dyn ProtocolSource,
    config: &DashboardConfig,
    requested: &[String],
) -> Overview {
    let protocols = match load_protocol_list(source).await {
        Ok(protocols) => protocols,
        Err(notice) => {
            return Overview {
                notices: vec![notice],
                ..Overview::default()
            }
        }
    };

    if requested.is_empty() {
        let defaults = default_selection(&protocols, config.default_selection);
        Overview::build(protocols, config, &defaults)
    } else {
        Overview::build(protocols, config, requested)
    }
}

// ─── Detail ─────────────────────────────────────────────────────────

/// Headline metrics of the detail view, already formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub tvl: String,
    pub change_1d: String,
    pub change_7d: String,
    #[serde(skip)]
    pub change_1d_raw: Option<f64>,
    #[serde(skip)]
    pub change_7d_raw: Option<f64>,
}

impl Headline {
    pub fn of(p: &ProtocolSummary) -> Self {
        Self {
            tvl: fmt::format_opt_usd(p.tvl()),
            change_1d: fmt::format_opt_pct(p.change_1d()),
            change_7d: fmt::format_opt_pct(p.change_7d()),
            change_1d_raw: p.change_1d(),
            change_7d_raw: p.change_7d(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub name: String,
    pub slug: Option<String>,
    pub headline: Headline,
    pub chain: Option<String>,
    pub description: Option<String>,
    /// Remaining fields, highlighted keys excluded.
    pub fields: Vec<FieldEntry>,
    /// `None` when history was not requested or could not be fetched.
    pub history: Option<HistoryOutcome>,
    pub notices: Vec<Notice>,
}

/// Keys rendered on their own line above the field list.
const DETAIL_LINE_KEYS: &[&str] = &["chain", "description"];

/// Detail view of one protocol; fetches the detail payload only when
/// `show_history` is set.
pub async fn load_detail(
    source: &dyn ProtocolSource,
    config: &DashboardConfig,
    protocol: &ProtocolSummary,
    show_history: bool,
) -> DetailView {
    let mut view = detail_without_history(config, protocol);
    if !show_history {
        return view;
    }

    let Some(slug) = view.slug.clone() else {
        view.notices.push(Notice::warning(format!(
            "{} has no slug; historical TVL unavailable",
            view.name
        )));
        return view;
    };

    match source.protocol_detail(&slug).await {
        Ok(detail) => {
            let outcome = build_history(&detail);
            if outcome == HistoryOutcome::Unavailable {
                view.notices.push(Notice::warning(
                    "Historical TVL data not available or in unexpected format for this protocol",
                ));
            }
            view.history = Some(outcome);
        }
        Err(e) => view
            .notices
            .push(Notice::error(format!("Failed to fetch historical data: {e}"))),
    }
    view
}

/// Detail view built from the summary record alone.
pub fn detail_without_history(config: &DashboardConfig, protocol: &ProtocolSummary) -> DetailView {
    let skip: Vec<&str> = config
        .highlight_keys
        .iter()
        .map(String::as_str)
        .chain(DETAIL_LINE_KEYS.iter().copied())
        .collect();

    DetailView {
        name: protocol.name().unwrap_or(fmt::DASH).to_string(),
        slug: protocol.slug().map(str::to_string),
        headline: Headline::of(protocol),
        chain: protocol.chain().map(str::to_string),
        description: protocol.description().map(str::to_string),
        fields: normalize_fields(protocol.fields(), &skip),
        history: None,
        notices: Vec::new(),
    }
}

// ─── Live TVL & per-protocol history ────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveTvlRow {
    pub protocol: String,
    pub slug: String,
    pub tvl: f64,
}

/// Current TVL of each selected protocol, fetched one by one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveTvl {
    pub rows: Vec<LiveTvlRow>,
    pub notices: Vec<Notice>,
}

pub async fn load_live_tvl(source: &dyn ProtocolSource, selected: &[ProtocolSummary]) -> LiveTvl {
    let mut live = LiveTvl::default();

    for p in selected {
        let name = p.name().unwrap_or(fmt::DASH);
        let Some(slug) = p.slug() else {
            live.notices.push(Notice::warning(format!("{name} has no slug; skipped")));
            continue;
        };
        match source.current_tvl(slug).await {
            Ok(tvl) => live.rows.push(LiveTvlRow {
                protocol: name.to_string(),
                slug: slug.to_string(),
                tvl: tvl.total_liquidity_usd,
            }),
            Err(e) => live
                .notices
                .push(Notice::error(format!("Failed to load TVL for {slug}: {e}"))),
        }
    }
    live
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolHistory {
    pub name: String,
    pub outcome: HistoryOutcome,
}

/// Historical series of each selected protocol that could be fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryBatch {
    pub entries: Vec<ProtocolHistory>,
    pub notices: Vec<Notice>,
}

pub async fn load_histories(source: &dyn ProtocolSource, selected: &[ProtocolSummary]) -> HistoryBatch {
    let mut batch = HistoryBatch::default();

    for p in selected {
        let name = p.name().unwrap_or(fmt::DASH).to_string();
        let Some(slug) = p.slug() else {
            batch.notices.push(Notice::warning(format!("{name} has no slug; skipped")));
            continue;
        };
        match source.protocol_detail(slug).await {
            Ok(detail) => {
                let outcome = build_history(&detail);
                if outcome == HistoryOutcome::Unavailable {
                    batch.notices.push(Notice::warning(format!(
                        "Historical TVL data not available for {name}"
                    )));
                }
                batch.entries.push(ProtocolHistory { name, outcome });
            }
            Err(e) => batch.notices.push(Notice::error(format!(
                "Failed to load historical TVL for {slug}: {e}"
            ))),
        }
    }
    batch
}
