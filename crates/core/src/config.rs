use serde::{Deserialize, Serialize};

use compare_common::constants::{
    DEFAULT_SELECTION_COUNT, DEFAULT_TIMEOUT_SECS, DEFILLAMA_API_BASE, HIGHLIGHT_KEYS,
    PREFERRED_COLUMNS,
};
use compare_common::error::{CompareError, CompareResult};

use crate::table::SelectionOrder;

// ═══════════════════════════════════════════════════════════════════════
//  APP CONFIG: stored at ~/.defi-compare/config.json
// ═══════════════════════════════════════════════════════════════════════

/// Top-level configuration stored in `$HOME/.defi-compare/config.json`.
///
/// ```json
/// {
///   "system": {
///     "api_url": "https://api.llama.fi",
///     "timeout_secs": 30,
///     "verbose": false
///   },
///   "dashboard": {
///     "selection_order": "selection",
///     "default_selection": 5,
///     "columns": ["name", "tvl", "chain", "change_1d", "change_7d", "change_1m"],
///     "highlight_keys": ["tvl", "change_1d", "change_7d"],
///     "history_tail": 30
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

// ═══════════════════════════════════════════════════════════════════════
//  SYSTEM CONFIG
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// API root the data source talks to.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout passed to the HTTP client.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable debug tracing output.
    #[serde(default)]
    pub verbose: bool,
}

// ═══════════════════════════════════════════════════════════════════════
//  DASHBOARD CONFIG
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Row order of the comparison table after filtering by selection.
    #[serde(default)]
    pub selection_order: SelectionOrder,

    /// Protocols pre-selected (from the top of the list) when none are picked.
    #[serde(default = "default_selection")]
    pub default_selection: usize,

    /// Preferred comparison columns, in display order.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Keys shown as headline metrics; the field list skips them.
    #[serde(default = "default_highlight_keys")]
    pub highlight_keys: Vec<String>,

    /// Points shown by the CLI history table.
    #[serde(default = "default_history_tail")]
    pub history_tail: usize,
}

fn default_api_url() -> String {
    DEFILLAMA_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_selection() -> usize {
    DEFAULT_SELECTION_COUNT
}

fn default_columns() -> Vec<String> {
    PREFERRED_COLUMNS.iter().map(|s| s.to_string()).collect()
}

fn default_highlight_keys() -> Vec<String> {
    HIGHLIGHT_KEYS.iter().map(|s| s.to_string()).collect()
}

fn default_history_tail() -> usize {
    30
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            verbose: false,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            selection_order: SelectionOrder::default(),
            default_selection: default_selection(),
            columns: default_columns(),
            highlight_keys: default_highlight_keys(),
            history_tail: default_history_tail(),
        }
    }
}

impl AppConfig {
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Reject values no command can work with.
    pub fn validate(&self) -> CompareResult<()> {
        let url = url::Url::parse(&self.system.api_url)
            .map_err(|e| CompareError::Config(format!("api_url '{}': {e}", self.system.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CompareError::Config(format!(
                "api_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.system.timeout_secs == 0 {
            return Err(CompareError::Config("timeout_secs must be at least 1".into()));
        }
        if self.dashboard.columns.is_empty() {
            return Err(CompareError::Config("dashboard.columns must not be empty".into()));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  TESTS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.system.api_url, "https://api.llama.fi");
        assert_eq!(config.system.timeout_secs, 30);
        assert!(!config.system.verbose);
        assert_eq!(config.dashboard.selection_order, SelectionOrder::Selection);
        assert_eq!(config.dashboard.default_selection, 5);
        assert_eq!(config.dashboard.columns.len(), 6);
        assert_eq!(config.dashboard.highlight_keys, vec!["tvl", "change_1d", "change_7d"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip_json() {
        let mut config = AppConfig::default();
        config.dashboard.selection_order = SelectionOrder::Source;
        config.system.api_url = "http://localhost:9000".into();
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"selection_order\": \"source\""));
        let parsed = AppConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let parsed = AppConfig::from_json_str(r#"{"system": {"verbose": true}}"#).unwrap();
        assert!(parsed.system.verbose);
        assert_eq!(parsed.system.api_url, "https://api.llama.fi");
        assert_eq!(parsed.dashboard, DashboardConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.system.api_url = "ftp://example.com".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.system.api_url = "::nope".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.system.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.dashboard.columns.clear();
        assert!(config.validate().is_err());
    }
}
