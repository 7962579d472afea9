//! `defi-compare detail`: one protocol in depth.

use anyhow::Result;

use compare_common::error::CompareError;
use compare_core::config::AppConfig;
use compare_core::dashboard::load_detail;
use compare_core::output::{render, DetailOutput, OutputFormat};
use compare_core::table::find_protocol;

use crate::factory;

/// Show the detail view of `name` (a protocol name or slug).
pub async fn run(
    config: &AppConfig,
    name: &str,
    history: bool,
    tail: Option<usize>,
    fmt: OutputFormat,
) -> Result<()> {
    let source = factory::from_config(config)?;
    let protocols = source.protocols().await?;

    let protocol = find_protocol(&protocols, name)
        .ok_or_else(|| CompareError::UnknownProtocol(name.to_string()))?;

    let view = load_detail(source.as_ref(), &config.dashboard, protocol, history).await;
    render(
        fmt,
        &DetailOutput {
            view,
            tail: tail.unwrap_or(config.dashboard.history_tail),
        },
    )
}
