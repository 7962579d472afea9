//! `defi-compare history`: historical TVL with 1d/7d changes.

use anyhow::Result;

use compare_core::config::AppConfig;
use compare_core::dashboard::{load_histories, load_overview};
use compare_core::output::{render, HistoryOutput, OutputFormat};

use crate::factory;

pub async fn run(
    config: &AppConfig,
    names: &[String],
    tail: Option<usize>,
    fmt: OutputFormat,
) -> Result<()> {
    let source = factory::from_config(config)?;

    let overview = load_overview(source.as_ref(), &config.dashboard, names).await;
    let mut batch = load_histories(source.as_ref(), &overview.selected).await;

    let mut notices = overview.notices;
    notices.append(&mut batch.notices);
    batch.notices = notices;

    render(
        fmt,
        &HistoryOutput {
            batch,
            tail: tail.unwrap_or(config.dashboard.history_tail),
        },
    )
}
