use async_trait::async_trait;
use std::sync::Arc;

use crate::alerts::Alert;
use crate::common::errors::Result;
use crate::router::Bot;

/// Core strategy trait
///
/// Strategies receive classified alerts on behalf of a bot and act through
/// the bot's exchange port and notifier. State is owned by the strategy and
/// keyed however it needs; one instance may serve many bots.
///
/// # Implementation Notes
///
/// - Guard rejections (wrong timeframe, blocked entry, max fills) are not
///   errors: notify or log and return `Ok(())`
/// - Exchange and store failures are returned so the router can isolate
///   and log them
#[async_trait]
pub trait AlertStrategy: Send + Sync {
    /// Unique identifier for this strategy
    fn name(&self) -> &str;

    /// Called for every alert routed to `bot`
    async fn on_alert(&self, bot: &Bot, alert: &Alert) -> Result<()>;
}

/// Shared strategy for dynamic dispatch
pub type SharedStrategy = Arc<dyn AlertStrategy>;
