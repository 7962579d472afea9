//! `defi-compare configure`: read and edit `~/.defi-compare/config.json`.

use anyhow::{bail, Result};

use compare_core::config::AppConfig;
use compare_core::output::{render, ConfigOutput, OutputFormat};
use compare_core::table::SelectionOrder;
use compare_core::workspace::{config_path, load_config, save_config};

/// `defi-compare configure show`: display current config.
pub fn show(fmt: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let output = ConfigOutput {
        path: config_path()?.display().to_string(),
        config,
        updated: None,
    };
    render(fmt, &output)?;

    if fmt == OutputFormat::Table {
        println!();
        println!("Tip: Edit settings with `defi-compare configure <key> <value>`.");
    }
    Ok(())
}

pub fn set_api_url(url: &str, fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.system.api_url = url.trim_end_matches('/').to_string();
        Ok(format!("api_url = {}", c.system.api_url))
    })
}

pub fn set_timeout(secs: u64, fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.system.timeout_secs = secs;
        Ok(format!("timeout_secs = {secs}"))
    })
}

pub fn set_verbose(enabled: bool, fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.system.verbose = enabled;
        Ok(format!("verbose = {enabled}"))
    })
}

pub fn set_order(order: SelectionOrder, fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.dashboard.selection_order = order;
        Ok(format!("selection_order = {order}"))
    })
}

pub fn set_default_count(n: usize, fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        if n == 0 {
            bail!("default count must be at least 1");
        }
        c.dashboard.default_selection = n;
        Ok(format!("default_selection = {n}"))
    })
}

pub fn set_columns(columns: &[String], fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.dashboard.columns = columns.to_vec();
        Ok(format!("columns = {}", columns.join(", ")))
    })
}

pub fn set_highlight(keys: &[String], fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.dashboard.highlight_keys = keys.to_vec();
        Ok(format!("highlight_keys = {}", keys.join(", ")))
    })
}

pub fn set_history_tail(n: usize, fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        c.dashboard.history_tail = n;
        Ok(format!("history_tail = {n}"))
    })
}

/// `defi-compare configure reset`: restore every default.
pub fn reset(fmt: OutputFormat) -> Result<()> {
    update(fmt, |c| {
        *c = AppConfig::default();
        Ok("config reset to defaults".to_string())
    })
}

/// Load, edit, validate and save the config, then report the change.
fn update(fmt: OutputFormat, edit: impl FnOnce(&mut AppConfig) -> Result<String>) -> Result<()> {
    let mut config = load_config()?;
    let updated = apply(&mut config, edit)?;
    save_config(&config)?;

    render(
        fmt,
        &ConfigOutput {
            path: config_path()?.display().to_string(),
            config,
            updated: Some(updated),
        },
    )
}

/// Apply `edit` to a copy and keep it only when the result validates.
fn apply(
    config: &mut AppConfig,
    edit: impl FnOnce(&mut AppConfig) -> Result<String>,
) -> Result<String> {
    let mut next = config.clone();
    let message = edit(&mut next)?;
    next.validate()?;
    *config = next;
    Ok(message)
}
