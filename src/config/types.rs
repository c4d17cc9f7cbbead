//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::common::errors::{Result, TradingError};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Webhook server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
    /// Partial-close strategy settings
    #[serde(default)]
    pub strategy: StrategySettings,
    /// Paper exchange settings
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Outbound notifications (optional, logs only when absent)
    #[serde(default)]
    pub notifier: Option<NotifierConfig>,
    /// Registered bots, in dispatch order
    #[serde(default)]
    pub bots: Vec<BotConfig>,
}

impl AppConfig {
    /// Reject configurations the router cannot run with
    pub fn validate(&self) -> Result<()> {
        self.strategy.validate()?;

        let mut seen = HashMap::new();
        for (index, bot) in self.bots.iter().enumerate() {
            if bot.name.trim().is_empty() {
                return Err(TradingError::Configuration(format!(
                    "bot #{} has an empty name",
                    index
                )));
            }
            if let Some(previous) = seen.insert(bot.name.as_str(), index) {
                return Err(TradingError::Configuration(format!(
                    "bot name '{}' used by entries #{} and #{}",
                    bot.name, previous, index
                )));
            }
            if bot.max_fills == 0 {
                return Err(TradingError::Configuration(format!(
                    "bot '{}': max_fills must be at least 1",
                    bot.name
                )));
            }
        }

        if let Some(notifier) = &self.notifier {
            url::Url::parse(&notifier.webhook_url).map_err(|e| {
                TradingError::Configuration(format!("notifier.webhook_url: {}", e))
            })?;
        }

        Ok(())
    }
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the webhook listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Partial-close strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySettings {
    /// How long a 1h synchronization signal blocks new entries
    #[serde(default = "default_entry_block_minutes")]
    pub entry_block_minutes: i64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            entry_block_minutes: default_entry_block_minutes(),
        }
    }
}

/// Longest accepted entry block (one week)
pub const MAX_ENTRY_BLOCK_MINUTES: i64 = 7 * 24 * 60;

impl StrategySettings {
    pub fn entry_block_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.entry_block_minutes)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_ENTRY_BLOCK_MINUTES).contains(&self.entry_block_minutes) {
            return Err(TradingError::Configuration(format!(
                "strategy.entry_block_minutes must be between 1 and {}, got {}",
                MAX_ENTRY_BLOCK_MINUTES, self.entry_block_minutes
            )));
        }
        Ok(())
    }
}

fn default_entry_block_minutes() -> i64 {
    60
}

/// Paper exchange configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Tradable symbols (empty = every symbol)
    #[serde(default)]
    pub allowed_symbols: Vec<String>,
}

/// Webhook notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// URL receiving `{"text": ...}` POSTs
    pub webhook_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    10
}

/// Which strategy family a bot runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    /// SmartVol partial-close strategy
    #[default]
    PartialClose,
    /// Buyer/seller domination strategy
    Domination,
}

impl std::fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyTag::PartialClose => write!(f, "partial_close"),
            StrategyTag::Domination => write!(f, "domination"),
        }
    }
}

/// Per-bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Unique bot name, also the first half of every state key
    pub name: String,
    /// Symbol allow-list (empty = match all)
    #[serde(default)]
    pub symbols: HashSet<String>,
    /// Strategy family tag
    #[serde(default)]
    pub strategy: StrategyTag,
    /// Maximum buy fills per position
    #[serde(default = "default_max_fills")]
    pub max_fills: u32,
    /// Leverage applied on open
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    /// USD allocated to the opening fill, resolved at trade time
    pub base_usd: String,
    /// USD allocated to each additional fill, resolved at trade time
    pub add_usd: String,
}

fn default_max_fills() -> u32 {
    3
}

fn default_leverage() -> u32 {
    1
}

impl BotConfig {
    pub fn new(name: impl Into<String>, base_usd: impl Into<String>, add_usd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashSet::new(),
            strategy: StrategyTag::default(),
            max_fills: default_max_fills(),
            leverage: default_leverage(),
            base_usd: base_usd.into(),
            add_usd: add_usd.into(),
        }
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyTag) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_fills(mut self, max_fills: u32) -> Self {
        self.max_fills = max_fills;
        self
    }

    pub fn with_leverage(mut self, leverage: u32) -> Self {
        self.leverage = leverage;
        self
    }

    /// Empty filter matches every symbol
    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.symbols.is_empty() || self.symbols.contains(symbol)
    }

    /// USD for the opening fill
    pub fn base_usd(&self) -> Result<Decimal> {
        resolve_usd("base_usd", &self.name, &self.base_usd)
    }

    /// USD for each additional fill
    pub fn add_usd(&self) -> Result<Decimal> {
        resolve_usd("add_usd", &self.name, &self.add_usd)
    }
}

fn resolve_usd(field: &str, bot: &str, raw: &str) -> Result<Decimal> {
    match Decimal::from_str(raw.trim()) {
        Ok(usd) if usd > Decimal::ZERO => Ok(usd),
        _ => Err(TradingError::Configuration(format!(
            "bot '{}': {} = {:?} is not a positive USD amount",
            bot, field, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_usd_resolution() {
        let bot = BotConfig::new("alpha", " 100.5 ", "abc");
        assert_eq!(bot.base_usd().unwrap(), dec!(100.5));
        assert!(matches!(bot.add_usd(), Err(TradingError::Configuration(_))));

        let zero = BotConfig::new("beta", "0", "-5");
        assert!(zero.base_usd().is_err());
        assert!(zero.add_usd().is_err());
    }

    #[test]
    fn test_symbol_filter() {
        let open = BotConfig::new("alpha", "10", "5");
        assert!(open.matches_symbol("ANYTHING"));

        let filtered = BotConfig::new("beta", "10", "5").with_symbols(["BTCUSDT"]);
        assert!(filtered.matches_symbol("BTCUSDT"));
        assert!(!filtered.matches_symbol("ETHUSDT"));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config = AppConfig {
            bots: vec![
                BotConfig::new("alpha", "10", "5"),
                BotConfig::new("alpha", "10", "5"),
            ],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_fills() {
        let config = AppConfig {
            bots: vec![BotConfig::new("alpha", "10", "5").with_max_fills(0)],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_entry_block_bounds() {
        for minutes in [0, -5, MAX_ENTRY_BLOCK_MINUTES + 1, 600_000_000_000] {
            let config = AppConfig {
                strategy: StrategySettings {
                    entry_block_minutes: minutes,
                },
                ..AppConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(TradingError::Configuration(_))),
                "entry_block_minutes = {} accepted",
                minutes
            );
        }

        for minutes in [1, 60, MAX_ENTRY_BLOCK_MINUTES] {
            let config = AppConfig {
                strategy: StrategySettings {
                    entry_block_minutes: minutes,
                },
                ..AppConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_bad_notifier_url() {
        let config = AppConfig {
            notifier: Some(NotifierConfig {
                webhook_url: "not a url".to_string(),
                request_timeout_seconds: 5,
            }),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_tag_serde() {
        let bot: BotConfig = serde_json::from_str(
            r#"{"name":"d","strategy":"domination","base_usd":"10","add_usd":"5"}"#,
        )
        .unwrap();
        assert_eq!(bot.strategy, StrategyTag::Domination);
        assert_eq!(bot.max_fills, 3);
        assert_eq!(bot.leverage, 1);
    }
}
