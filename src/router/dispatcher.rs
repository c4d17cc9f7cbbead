//! Alert fan-out with per-bot failure isolation

use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::domination::DominationHandler;
use super::registry::{Bot, BotRegistry};
use crate::alerts::{Alert, AlertKind, DominationType, Signal};
use crate::common::errors::Result;
use crate::config::types::StrategyTag;

/// A bot whose handling of the alert failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotFailure {
    pub bot: String,
    pub reason: String,
}

/// Per-bot outcome of one dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Bots that handled the alert without error
    pub delivered: Vec<String>,
    /// Bots filtered out by symbol or strategy tag
    pub skipped: Vec<String>,
    pub failed: Vec<BotFailure>,
}

impl DispatchReport {
    fn record(&mut self, bot: &Bot, outcome: std::thread::Result<Result<()>>) {
        match outcome {
            Ok(Ok(())) => self.delivered.push(bot.name().to_string()),
            Ok(Err(e)) => {
                error!(bot = %bot.name(), error = %e, "Bot failed to process alert");
                self.failed.push(BotFailure {
                    bot: bot.name().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(bot = %bot.name(), %reason, "Bot panicked while processing alert");
                self.failed.push(BotFailure {
                    bot: bot.name().to_string(),
                    reason: format!("panic: {}", reason),
                });
            }
        }
    }
}

/// Routes classified alerts to registered bots
///
/// Bots run one after another in registry order. A bot that returns an
/// error or panics is logged and recorded; the remaining bots still run.
pub struct AlertRouter {
    registry: Arc<BotRegistry>,
    domination: Arc<dyn DominationHandler>,
}

impl AlertRouter {
    pub fn new(registry: Arc<BotRegistry>, domination: Arc<dyn DominationHandler>) -> Self {
        Self {
            registry,
            domination,
        }
    }

    pub fn registry(&self) -> &BotRegistry {
        &self.registry
    }

    #[instrument(skip(self, alert), fields(signal = %alert.signal, symbol = %alert.symbol))]
    pub async fn dispatch(&self, alert: &Alert) -> DispatchReport {
        let report = match alert.kind() {
            AlertKind::Domination => self.dispatch_domination(alert).await,
            AlertKind::SmartVol => self.fan_out(alert).await,
        };
        info!(
            delivered = report.delivered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Alert dispatched"
        );
        report
    }

    async fn fan_out(&self, alert: &Alert) -> DispatchReport {
        let mut report = DispatchReport::default();

        for bot in self.registry.all() {
            if !bot.config().matches_symbol(&alert.symbol) {
                debug!(bot = %bot.name(), "Symbol not in bot filter, skipping");
                report.skipped.push(bot.name().to_string());
                continue;
            }

            let outcome = AssertUnwindSafe(bot.process(alert)).catch_unwind().await;
            report.record(bot, outcome);
        }

        report
    }

    async fn dispatch_domination(&self, alert: &Alert) -> DispatchReport {
        let mut report = DispatchReport::default();

        let bots: Vec<&Arc<Bot>> = self
            .registry
            .all()
            .iter()
            .filter(|bot| bot.config().strategy == StrategyTag::Domination)
            .collect();
        if bots.is_empty() {
            info!("No domination bots registered, alert dropped");
            return report;
        }

        for bot in bots {
            let config = bot.config();
            if config.strategy != StrategyTag::Domination || !config.matches_symbol(&alert.symbol) {
                debug!(bot = %bot.name(), "Bot filter excludes domination alert, skipping");
                report.skipped.push(bot.name().to_string());
                continue;
            }

            let outcome = AssertUnwindSafe(self.invoke_domination(bot, alert))
                .catch_unwind()
                .await;
            report.record(bot, outcome);
        }

        report
    }

    async fn invoke_domination(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        match alert.signal {
            Signal::Domination(DominationType::BuyerDomination) => {
                self.domination.on_buyer_domination(bot, alert).await
            }
            Signal::Domination(DominationType::SellerDomination) => {
                self.domination.on_seller_domination(bot, alert).await
            }
            Signal::Domination(DominationType::BuyerContinuation) => {
                self.domination.on_buyer_continuation(bot, alert).await
            }
            Signal::Domination(DominationType::SellerContinuation) => {
                self.domination.on_seller_continuation(bot, alert).await
            }
            Signal::SmartVol(other) => {
                warn!(bot = %bot.name(), signal = other.as_str(), "Unknown domination alert type");
                Ok(())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
