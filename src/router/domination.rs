use async_trait::async_trait;
use tracing::info;

use super::registry::Bot;
use crate::alerts::Alert;
use crate::common::errors::Result;

/// Entry points of the domination strategy
///
/// The router picks exactly one per alert by matching on the domination
/// variant; what each handler trades is up to the implementation.
#[async_trait]
pub trait DominationHandler: Send + Sync {
    async fn on_buyer_domination(&self, bot: &Bot, alert: &Alert) -> Result<()>;

    async fn on_seller_domination(&self, bot: &Bot, alert: &Alert) -> Result<()>;

    async fn on_buyer_continuation(&self, bot: &Bot, alert: &Alert) -> Result<()>;

    async fn on_seller_continuation(&self, bot: &Bot, alert: &Alert) -> Result<()>;
}

/// Reports domination signals without trading
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDominationHandler;

impl LoggingDominationHandler {
    async fn report(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        info!(bot = %bot.name(), symbol = %alert.symbol, signal = %alert.signal, "Domination signal");
        bot.notify(&format!(
            "[{}] {} {} at {}",
            bot.name(),
            alert.symbol,
            alert.signal,
            alert.price
        ))
        .await;
        Ok(())
    }
}

#[async_trait]
impl DominationHandler for LoggingDominationHandler {
    async fn on_buyer_domination(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        self.report(bot, alert).await
    }

    async fn on_seller_domination(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        self.report(bot, alert).await
    }

    async fn on_buyer_continuation(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        self.report(bot, alert).await
    }

    async fn on_seller_continuation(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        self.report(bot, alert).await
    }
}
