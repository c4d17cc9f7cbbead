//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use signal_router::adapters::{InMemoryPositionsStore, MemoryNotifier, PaperExchange};
use signal_router::{
    Alert, AlertStrategy, Bot, BotConfig, Clock, DominationHandler, DominationType,
    PartialCloseStrategy, Result, Signal, SmartVolType, TradingError,
};

pub const SYMBOL: &str = "BTCUSDT";

/// Fixed start time for deterministic clocks
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// SmartVol alert for [`SYMBOL`] at `price`
pub fn smartvol(signal: SmartVolType, timeframe: &str, price: Decimal) -> Alert {
    Alert::new(Signal::SmartVol(signal), SYMBOL, price).with_timeframe(timeframe)
}

pub fn domination(kind: DominationType, symbol: &str) -> Alert {
    Alert::new(Signal::Domination(kind), symbol, dec!(150))
}

/// One bot wired to the partial-close strategy with in-memory adapters
pub struct Harness {
    pub strategy: Arc<PartialCloseStrategy>,
    pub store: Arc<InMemoryPositionsStore>,
    pub exchange: Arc<PaperExchange>,
    pub notifier: Arc<MemoryNotifier>,
    pub clock: Arc<ManualClock>,
    pub bot: Bot,
}

impl Harness {
    pub fn new(config: BotConfig) -> Self {
        Self::with_exchange(config, PaperExchange::new())
    }

    pub fn with_exchange(config: BotConfig, exchange: PaperExchange) -> Self {
        let store = Arc::new(InMemoryPositionsStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let strategy = Arc::new(PartialCloseStrategy::new(store.clone()).with_clock(clock.clone()));
        let exchange = Arc::new(exchange);
        let notifier = Arc::new(MemoryNotifier::new());
        let bot = Bot::new(config, exchange.clone(), notifier.clone()).with_strategy(strategy.clone());

        Self {
            strategy,
            store,
            exchange,
            notifier,
            clock,
            bot,
        }
    }

    pub fn default_bot() -> BotConfig {
        BotConfig::new("alpha", "100", "50").with_max_fills(3).with_leverage(5)
    }

    pub async fn send(&self, alert: &Alert) {
        self.bot
            .process(alert)
            .await
            .expect("strategy returned an error");
    }

    pub async fn order_count(&self) -> usize {
        self.exchange.orders().await.len()
    }
}

/// Strategy that records which bots saw which alerts
#[derive(Default)]
pub struct RecordingStrategy {
    pub seen: Mutex<Vec<(String, Alert)>>,
}

#[async_trait]
impl AlertStrategy for RecordingStrategy {
    fn name(&self) -> &str {
        "recording"
    }

    async fn on_alert(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        self.seen
            .lock()
            .await
            .push((bot.name().to_string(), alert.clone()));
        Ok(())
    }
}

impl RecordingStrategy {
    pub async fn bots_seen(&self) -> Vec<String> {
        self.seen.lock().await.iter().map(|(b, _)| b.clone()).collect()
    }
}

/// Strategy that always fails
pub struct FailingStrategy;

#[async_trait]
impl AlertStrategy for FailingStrategy {
    fn name(&self) -> &str {
        "failing"
    }

    async fn on_alert(&self, _bot: &Bot, _alert: &Alert) -> Result<()> {
        Err(TradingError::Exchange("exchange unavailable".to_string()))
    }
}

/// Strategy that panics mid-processing
pub struct PanickingStrategy;

#[async_trait]
impl AlertStrategy for PanickingStrategy {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn on_alert(&self, _bot: &Bot, _alert: &Alert) -> Result<()> {
        panic!("strategy bug");
    }
}

/// Domination handler counting calls per entry point
#[derive(Default)]
pub struct CountingDomination {
    pub buyer: AtomicUsize,
    pub seller: AtomicUsize,
    pub buyer_continuation: AtomicUsize,
    pub seller_continuation: AtomicUsize,
    /// Bot names whose calls should fail
    pub fail_for: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl CountingDomination {
    pub fn failing_for(bots: &[&str]) -> Self {
        Self {
            fail_for: bots.iter().map(|b| b.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.buyer.load(Ordering::SeqCst)
            + self.seller.load(Ordering::SeqCst)
            + self.buyer_continuation.load(Ordering::SeqCst)
            + self.seller_continuation.load(Ordering::SeqCst)
    }

    async fn hit(&self, counter: &AtomicUsize, bot: &Bot) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().await.push(bot.name().to_string());
        if self.fail_for.iter().any(|b| b == bot.name()) {
            return Err(TradingError::Internal("domination handler failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DominationHandler for CountingDomination {
    async fn on_buyer_domination(&self, bot: &Bot, _alert: &Alert) -> Result<()> {
        self.hit(&self.buyer, bot).await
    }

    async fn on_seller_domination(&self, bot: &Bot, _alert: &Alert) -> Result<()> {
        self.hit(&self.seller, bot).await
    }

    async fn on_buyer_continuation(&self, bot: &Bot, _alert: &Alert) -> Result<()> {
        self.hit(&self.buyer_continuation, bot).await
    }

    async fn on_seller_continuation(&self, bot: &Bot, _alert: &Alert) -> Result<()> {
        self.hit(&self.seller_continuation, bot).await
    }
}

/// Sample webhook payloads
pub mod payloads {
    pub const SMART_OPEN: &str = r#"{
        "type": "SmartOpen",
        "symbol": "BTCUSDT",
        "price": "42000",
        "timeframe": "1h"
    }"#;

    pub const BUYER_DOMINATION: &str = r#"{
        "type": "Buyer domination",
        "symbol": "BTCUSDT",
        "price": "42000"
    }"#;

    pub const MISSING_TYPE: &str = r#"{
        "symbol": "BTCUSDT",
        "price": "42000"
    }"#;

    pub const VOLUME_UP_NO_VOLUME: &str = r#"{
        "type": "VolumeUp",
        "symbol": "BTCUSDT",
        "price": "42000",
        "timeframe": "1h"
    }"#;
}
