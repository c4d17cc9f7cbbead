//! Registered bots and the capabilities a strategy may use

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::alerts::Alert;
use crate::common::errors::Result;
use crate::common::traits::{ExchangeClient, Notifier};
use crate::config::types::BotConfig;
use crate::strategy::SharedStrategy;

/// A configured trading bot
///
/// Exposes exactly what strategies need: its name and config, its exchange
/// port, a notification sink, and the strategy entry point.
pub struct Bot {
    config: BotConfig,
    exchange: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
    strategy: Option<SharedStrategy>,
}

impl Bot {
    pub fn new(
        config: BotConfig,
        exchange: Arc<dyn ExchangeClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            exchange,
            notifier,
            strategy: None,
        }
    }

    /// Attach the strategy run by [`Bot::process`]
    pub fn with_strategy(mut self, strategy: SharedStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn base_usd(&self) -> Result<Decimal> {
        self.config.base_usd()
    }

    pub fn add_usd(&self) -> Result<Decimal> {
        self.config.add_usd()
    }

    pub fn exchange(&self) -> &dyn ExchangeClient {
        self.exchange.as_ref()
    }

    /// Send a notification; delivery failures are logged, never returned
    pub async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.notify(text).await {
            warn!(bot = %self.name(), error = %e, "Notification delivery failed");
        }
    }

    /// Run the bot's strategy on an alert
    pub async fn process(&self, alert: &Alert) -> Result<()> {
        match &self.strategy {
            Some(strategy) => strategy.on_alert(self, alert).await,
            None => {
                debug!(bot = %self.name(), signal = %alert.signal, "No strategy attached, ignoring alert");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("name", &self.config.name)
            .field("strategy_tag", &self.config.strategy)
            .field("strategy", &self.strategy.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

/// Bots in registration order
#[derive(Debug, Default)]
pub struct BotRegistry {
    bots: Vec<Arc<Bot>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, bot: Bot) -> Arc<Bot> {
        let bot = Arc::new(bot);
        self.bots.push(bot.clone());
        bot
    }

    /// Every bot, in insertion order
    pub fn all(&self) -> &[Arc<Bot>] {
        &self.bots
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Bot>> {
        self.bots.iter().find(|b| b.name() == name)
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}

impl FromIterator<Bot> for BotRegistry {
    fn from_iter<I: IntoIterator<Item = Bot>>(iter: I) -> Self {
        Self {
            bots: iter.into_iter().map(Arc::new).collect(),
        }
    }
}
