//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::Result;

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP_, `__` as separator)
/// 2. Configuration file (TOML format)
/// 3. Default values
///
/// The result is validated before it is returned.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from a TOML string (no environment overlay)
pub fn load_from_str(toml: &str) -> Result<AppConfig> {
    let config: AppConfig = Config::builder()
        .add_source(File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::StrategyTag;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        [server]
        bind_addr = "127.0.0.1:9000"

        [strategy]
        entry_block_minutes = 30

        [[bots]]
        name = "alpha"
        symbols = ["BTCUSDT", "ETHUSDT"]
        max_fills = 4
        leverage = 5
        base_usd = "100"
        add_usd = "50"

        [[bots]]
        name = "dom"
        strategy = "domination"
        base_usd = "20"
        add_usd = "10"
    "#;

    #[test]
    fn test_load_from_str() {
        let config = load_from_str(SAMPLE).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.strategy.entry_block_minutes, 30);
        assert_eq!(config.bots.len(), 2);

        let alpha = &config.bots[0];
        assert_eq!(alpha.name, "alpha");
        assert!(alpha.matches_symbol("ETHUSDT"));
        assert_eq!(alpha.max_fills, 4);
        assert_eq!(alpha.base_usd().unwrap(), dec!(100));

        assert_eq!(config.bots[1].strategy, StrategyTag::Domination);
        assert!(config.notifier.is_none());
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.settings.log_level, "info");
        assert_eq!(config.strategy.entry_block_minutes, 60);
    }
}
