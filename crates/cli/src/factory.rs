//! Source factory: builds the protocol data source from config.
//!
//! Lives in `cli` because `core` must NOT depend on source modules; the
//! dashboard only sees `&dyn ProtocolSource`.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use compare_common::traits::ProtocolSource;
use compare_core::config::AppConfig;
use compare_mod_defillama::DefiLlamaModule;

/// Build the DefiLlama source described by `config`.
pub fn from_config(config: &AppConfig) -> Result<Box<dyn ProtocolSource>> {
    config.validate()?;
    let module = DefiLlamaModule::new(
        &config.system.api_url,
        Duration::from_secs(config.system.timeout_secs),
    )?;
    info!(api_url = %module.base_url(), "DefiLlama source loaded");
    Ok(Box::new(module))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let source = from_config(&AppConfig::default()).unwrap();
        assert_eq!(source.name(), "defillama");
    }

    #[test]
    fn test_rejects_invalid_api_url() {
        let mut config = AppConfig::default();
        config.system.api_url = "not a url".into();
        assert!(from_config(&config).is_err());
    }
}
