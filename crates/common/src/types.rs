//! Data model shared by the source module, the core and the CLI.
//!
//! The upstream schema is not contractually stable, so protocol records keep
//! the raw JSON object and expose typed accessors over it instead of a fixed
//! struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry from the list-all-protocols response.
///
/// `name` is the selection key but is not unique upstream; nothing here
/// deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolSummary {
    raw: Map<String, Value>,
}

impl ProtocolSummary {
    pub fn from_map(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    pub fn slug(&self) -> Option<&str> {
        self.raw.get("slug").and_then(Value::as_str)
    }

    pub fn tvl(&self) -> Option<f64> {
        self.number("tvl")
    }

    pub fn chain(&self) -> Option<&str> {
        self.raw.get("chain").and_then(Value::as_str)
    }

    pub fn change_1d(&self) -> Option<f64> {
        self.number("change_1d")
    }

    pub fn change_7d(&self) -> Option<f64> {
        self.number("change_7d")
    }

    pub fn change_1m(&self) -> Option<f64> {
        self.number("change_1m")
    }

    pub fn description(&self) -> Option<&str> {
        self.raw.get("description").and_then(Value::as_str)
    }

    /// Numeric field, `None` when absent, null or not a number.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.raw.get(key).and_then(Value::as_f64)
    }

    /// True when the key appears in the record, whatever its value.
    pub fn has_key(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// All raw fields, in payload order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// Current TVL of one protocol (`/tvl/{slug}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTvl {
    pub slug: String,
    #[serde(rename = "totalLiquidityUSD")]
    pub total_liquidity_usd: f64,
}

/// Full detail payload of one protocol (`/protocol/{slug}`).
///
/// Historical TVL is embedded under `tvl`; its shape is validated by the
/// series builder, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolDetail {
    raw: Map<String, Value>,
}

impl ProtocolDetail {
    pub fn from_map(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// One `{timestamp, value}` sample of historical TVL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Epoch seconds.
    pub timestamp: i64,
    pub tvl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(v: Value) -> ProtocolSummary {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_summary_accessors() {
        let p = summary(json!({
            "name": "Aave",
            "slug": "aave",
            "tvl": 12_000_000_000.5,
            "chain": "Multi-Chain",
            "change_1d": -1.25,
            "change_7d": null,
        }));
        assert_eq!(p.name(), Some("Aave"));
        assert_eq!(p.slug(), Some("aave"));
        assert_eq!(p.tvl(), Some(12_000_000_000.5));
        assert_eq!(p.chain(), Some("Multi-Chain"));
        assert_eq!(p.change_1d(), Some(-1.25));
        assert_eq!(p.change_7d(), None);
        assert!(p.has_key("change_7d"));
        assert!(!p.has_key("change_1m"));
    }

    #[test]
    fn test_summary_keeps_payload_order() {
        let p = summary(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = p.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_current_tvl_field_name() {
        let tvl: CurrentTvl =
            serde_json::from_value(json!({"slug": "aave", "totalLiquidityUSD": 42.0})).unwrap();
        assert_eq!(tvl.total_liquidity_usd, 42.0);
    }
}
