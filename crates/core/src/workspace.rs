use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Dotfolder name under `$HOME`.
const DOTFOLDER: &str = ".defi-compare";

/// Config file name inside the dotfolder.
const CONFIG_FILE: &str = "config.json";

/// Resolve the root path: `$HOME/.defi-compare/`.
pub fn root_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DOTFOLDER))
}

/// Path of the config file: `$HOME/.defi-compare/config.json`.
pub fn config_path() -> Result<PathBuf> {
    Ok(root_dir()?.join(CONFIG_FILE))
}

/// Ensure the dotfolder and a default config exist. Idempotent: safe to
/// call on every launch.
///
/// ```text
/// $HOME/.defi-compare/
/// └── config.json
/// ```
pub fn init_workspace() -> Result<()> {
    init_workspace_at(&root_dir()?)
}

pub fn init_workspace_at(root: &Path) -> Result<()> {
    if !root.exists() {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create directory: {}", root.display()))?;
        info!("created directory: {}", root.display());
    }

    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        save_config_at(root, &AppConfig::default())?;
        info!("created default config: {}", config_path.display());
    }
    Ok(())
}

/// Load the config from disk. An unreadable config is replaced by defaults,
/// keeping `api_url` when it can still be recovered.
pub fn load_config() -> Result<AppConfig> {
    load_config_at(&root_dir()?)
}

pub fn load_config_at(root: &Path) -> Result<AppConfig> {
    let config_path = root.join(CONFIG_FILE);
    let raw = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    match AppConfig::from_json_str(&raw) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!(error = %e, "config.json unreadable, resetting to defaults");
            let mut config = AppConfig::default();

            if let Ok(old) = serde_json::from_str::<serde_json::Value>(&raw) {
                if let Some(url) = old.pointer("/system/api_url").and_then(|v| v.as_str()) {
                    config.system.api_url = url.to_string();
                }
            }

            save_config_at(root, &config)?;
            Ok(config)
        }
    }
}

/// Write the config back to disk.
pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_at(&root_dir()?, config)
}

pub fn save_config_at(root: &Path, config: &AppConfig) -> Result<()> {
    let config_path = root.join(CONFIG_FILE);
    let json = config
        .to_json_string()
        .context("Failed to serialize config")?;
    fs::write(&config_path, json)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SelectionOrder;

    /// Fresh directory under the system temp dir.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "defi-compare-test-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_root_dir_under_home() {
        let root = root_dir().unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(root, home.join(".defi-compare"));
    }

    #[test]
    fn test_init_workspace_idempotent() {
        let root = scratch("init");
        init_workspace_at(&root).unwrap();
        init_workspace_at(&root).unwrap();
        assert!(root.join(CONFIG_FILE).is_file());
        assert_eq!(load_config_at(&root).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_and_save_config() {
        let root = scratch("roundtrip");
        init_workspace_at(&root).unwrap();
        let mut config = load_config_at(&root).unwrap();
        config.dashboard.selection_order = SelectionOrder::Source;
        config.dashboard.default_selection = 3;
        save_config_at(&root, &config).unwrap();
        assert_eq!(load_config_at(&root).unwrap(), config);
    }

    #[test]
    fn test_unreadable_config_is_reset_keeping_api_url() {
        let root = scratch("reset");
        init_workspace_at(&root).unwrap();
        fs::write(
            root.join(CONFIG_FILE),
            r#"{"system": {"api_url": "http://localhost:1234", "timeout_secs": "soon"}}"#,
        )
        .unwrap();

        let config = load_config_at(&root).unwrap();
        assert_eq!(config.system.api_url, "http://localhost:1234");
        assert_eq!(config.system.timeout_secs, 30);
        // The reset is persisted.
        assert_eq!(load_config_at(&root).unwrap(), config);
    }
}
