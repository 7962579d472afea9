//! `defi-compare protocols`: the full protocol list as a table.

use anyhow::Result;

use compare_common::types::ProtocolSummary;
use compare_core::config::AppConfig;
use compare_core::dashboard::{load_protocol_list, Notice};
use compare_core::output::{render, OutputFormat, ProtocolsOutput};
use compare_core::table::ProtocolTable;

use crate::factory;

pub async fn run(
    config: &AppConfig,
    limit: Option<usize>,
    chain: Option<&str>,
    fmt: OutputFormat,
) -> Result<()> {
    let source = factory::from_config(config)?;

    let output = match load_protocol_list(source.as_ref()).await {
        Ok(protocols) => {
            let total = protocols.len();
            let notices = if total == 0 {
                vec![Notice::warning("No data available. Please try again later.")]
            } else {
                Vec::new()
            };
            let shown = filter_protocols(protocols, chain, limit);
            ProtocolsOutput {
                total,
                table: Some(ProtocolTable::build(&shown, &config.dashboard.columns)),
                notices,
            }
        }
        Err(notice) => ProtocolsOutput {
            total: 0,
            table: None,
            notices: vec![notice],
        },
    };

    render(fmt, &output)
}

/// Keep rows on `chain` (case-insensitive), then the first `limit` of them.
fn filter_protocols(
    protocols: Vec<ProtocolSummary>,
    chain: Option<&str>,
    limit: Option<usize>,
) -> Vec<ProtocolSummary> {
    protocols
        .into_iter()
        .filter(|p| match chain {
            Some(c) => p.chain().is_some_and(|pc| pc.eq_ignore_ascii_case(c)),
            None => true,
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<ProtocolSummary> {
        [("A", "Ethereum"), ("B", "Solana"), ("C", "ethereum"), ("D", "Ethereum")]
            .iter()
            .map(|(n, c)| serde_json::from_value(json!({"name": n, "chain": c})).unwrap())
            .collect()
    }

    fn names(v: &[ProtocolSummary]) -> Vec<&str> {
        v.iter().filter_map(ProtocolSummary::name).collect()
    }

    #[test]
    fn test_filter_by_chain_and_limit() {
        let out = filter_protocols(rows(), Some("Ethereum"), Some(2));
        assert_eq!(names(&out), vec!["A", "C"]);
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        assert_eq!(filter_protocols(rows(), None, None).len(), 4);
        assert_eq!(names(&filter_protocols(rows(), None, Some(1))), vec!["A"]);
    }
}
