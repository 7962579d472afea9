//! `defi-compare compare`: side-by-side comparison of selected protocols.

use anyhow::Result;

use compare_core::config::AppConfig;
use compare_core::dashboard::{load_live_tvl, load_overview};
use compare_core::output::{render, ComparisonOutput, OutputFormat};
use compare_core::table::SelectionOrder;

use crate::factory;

/// Compare `names` (the top protocols when empty). `live` adds the current
/// TVL of each selected protocol, fetched one by one.
pub async fn run(
    config: &AppConfig,
    names: &[String],
    order: Option<SelectionOrder>,
    live: bool,
    fmt: OutputFormat,
) -> Result<()> {
    let source = factory::from_config(config)?;
    let mut dashboard = config.dashboard.clone();
    if let Some(order) = order {
        dashboard.selection_order = order;
    }

    let overview = load_overview(source.as_ref(), &dashboard, names).await;
    let live = if live && !overview.selected.is_empty() {
        Some(load_live_tvl(source.as_ref(), &overview.selected).await)
    } else {
        None
    };

    render(
        fmt,
        &ComparisonOutput::new(overview, dashboard.selection_order, live),
    )
}
