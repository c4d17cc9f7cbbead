//! SmartVol partial-close strategy
//!
//! Manages a leveraged long per (bot, symbol) from the signal sequence alone:
//!
//! ```text
//! NoPosition --SmartOpen(1h, unblocked)--> Open(fills=1, closes=0)
//! Open --SmartOpen|SmartVolAdd (fills < max)--> Open(fills+1)
//! Open(closes=0) --SmartClose(1h)--> Open(closes=1)      record only
//! Open(closes=1) --SmartClose(1h)--> Open(closes=2)      sell 50%
//! Open(closes>=2) --SmartClose(1h)--> NoPosition
//! Open --SmartClose(4h) | SmartBigClose--> NoPosition
//! ```
//!
//! A `fixed-short`/`live-short` signal on 1h blocks new entries for the
//! configured window. Every alert for a key runs under that key's lock, and
//! the exchange order is always placed before the store is touched.

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::keyed_state::{CloseCounters, EntryBlocks, KeyedLocks};
use super::traits::AlertStrategy;
use crate::alerts::{Alert, Signal, SmartVolType, TIMEFRAME_1H, TIMEFRAME_4H};
use crate::common::errors::{Result, TradingError};
use crate::common::traits::{Clock, PositionsStore, SystemClock};
use crate::common::types::{
    generate_client_order_id, BotSymbolKey, PnlSnapshot, Position, Side,
};
use crate::router::Bot;

/// Fraction of notional sold on the confirmed 1h close
const PARTIAL_CLOSE_FRACTION: Decimal = dec!(0.5);

pub struct PartialCloseStrategy {
    store: Arc<dyn PositionsStore>,
    clock: Arc<dyn Clock>,
    entry_block_window: Duration,
    locks: KeyedLocks,
    blocks: EntryBlocks,
    closes: CloseCounters,
}

impl PartialCloseStrategy {
    pub fn new(store: Arc<dyn PositionsStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            entry_block_window: Duration::hours(1),
            locks: KeyedLocks::new(),
            blocks: EntryBlocks::new(),
            closes: CloseCounters::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_entry_block_window(mut self, window: Duration) -> Self {
        self.entry_block_window = window;
        self
    }

    /// Whether new entries are blocked right now
    pub fn is_entry_blocked(&self, bot: &str, symbol: &str) -> bool {
        self.blocks
            .is_blocked(&BotSymbolKey::new(bot, symbol), self.clock.now())
    }

    /// Confirmed 1h close signals seen for the open position
    pub fn close_count(&self, bot: &str, symbol: &str) -> u32 {
        self.closes.count(&BotSymbolKey::new(bot, symbol))
    }

    pub fn has_close_state(&self, bot: &str, symbol: &str) -> bool {
        self.closes.get(&BotSymbolKey::new(bot, symbol)).is_some()
    }

    pub fn entry_blocks(&self) -> &EntryBlocks {
        &self.blocks
    }

    pub fn key_locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Drop expired entry blocks and idle key locks
    pub fn purge_idle_state(&self) {
        let blocks = self.blocks.purge_expired(self.clock.now());
        let locks = self.locks.prune_idle();
        debug!(blocks, locks, "Purged idle strategy state");
    }

    async fn handle_open(&self, bot: &Bot, alert: &Alert, key: &BotSymbolKey) -> Result<()> {
        if let Some(position) = self.store.find_open(bot.name(), &alert.symbol).await? {
            return self.add_fill(bot, alert, position).await;
        }

        if !alert.timeframe_is(TIMEFRAME_1H) {
            debug!(timeframe = ?alert.timeframe, "SmartOpen outside 1h ignored");
            return Ok(());
        }

        let now = self.clock.now();
        if let Some(until) = self.blocks.blocked_until(key, now) {
            info!(%until, "Entry blocked, SmartOpen rejected");
            bot.notify(&format!(
                "[{}] {} open rejected at {}: entries blocked until {}",
                bot.name(),
                alert.symbol,
                alert.price,
                until.format("%Y-%m-%d %H:%M:%S UTC")
            ))
            .await;
            return Ok(());
        }

        if !bot.exchange().is_allowed(&alert.symbol).await? {
            info!("Symbol not tradable on exchange");
            bot.notify(&format!(
                "[{}] {} open rejected at {}: symbol not allowed on exchange",
                bot.name(),
                alert.symbol,
                alert.price
            ))
            .await;
            return Ok(());
        }

        let sizing = match bot.base_usd() {
            Ok(usd) => self.resolve_size(bot, alert, usd, true).await.map(|size| (usd, size)),
            Err(e) => Err(e),
        };
        let (usd, size) = match sizing {
            Ok(sizing) => sizing,
            Err(e) => return self.reject_sizing(bot, alert, "open", e).await,
        };

        let client_order_id = generate_client_order_id(bot.name());
        let ack = bot
            .exchange()
            .place_market(&alert.symbol, Side::Buy, size, &client_order_id)
            .await?;
        let position = self
            .store
            .open(bot.name(), &alert.symbol, alert.price, usd)
            .await?;
        self.closes.set(key.clone(), 0, now);

        info!(
            order_id = %ack.order_id,
            %size,
            %usd,
            position_id = %position.id,
            "Position opened"
        );
        bot.notify(&format!(
            "[{}] {} opened at {}\nsize: {}\nusd: {}\nfills: 1/{}",
            bot.name(),
            alert.symbol,
            alert.price,
            size,
            usd,
            bot.config().max_fills
        ))
        .await;
        Ok(())
    }

    async fn handle_add(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        match self.store.find_open(bot.name(), &alert.symbol).await? {
            Some(position) => self.add_fill(bot, alert, position).await,
            None => {
                debug!("SmartVolAdd without open position, nothing to add to");
                Ok(())
            }
        }
    }

    async fn add_fill(&self, bot: &Bot, alert: &Alert, position: Position) -> Result<()> {
        let max_fills = bot.config().max_fills;
        if position.fills_count >= max_fills {
            info!(fills = position.fills_count, max_fills, "Max fills reached");
            bot.notify(&format!(
                "[{}] {} add skipped at {}: max fills reached ({}/{})",
                bot.name(),
                alert.symbol,
                alert.price,
                position.fills_count,
                max_fills
            ))
            .await;
            return Ok(());
        }

        let sizing = match bot.add_usd() {
            Ok(usd) => self.resolve_size(bot, alert, usd, false).await.map(|size| (usd, size)),
            Err(e) => Err(e),
        };
        let (usd, size) = match sizing {
            Ok(sizing) => sizing,
            Err(e) => return self.reject_sizing(bot, alert, "add", e).await,
        };

        let client_order_id = generate_client_order_id(bot.name());
        let ack = bot
            .exchange()
            .place_market(&alert.symbol, Side::Buy, size, &client_order_id)
            .await?;
        let updated = self.store.add(&position, alert.price, usd).await?;

        info!(
            order_id = %ack.order_id,
            %size,
            %usd,
            fills = updated.fills_count,
            "Position increased"
        );
        bot.notify(&format!(
            "[{}] {} add at {}\nsize: {}\nusd: {}\navg entry: {}\nfills: {}/{}",
            bot.name(),
            alert.symbol,
            alert.price,
            size,
            usd,
            updated.avg_entry_price.round_dp(8),
            updated.fills_count,
            max_fills
        ))
        .await;
        Ok(())
    }

    async fn handle_close(&self, bot: &Bot, alert: &Alert, key: &BotSymbolKey) -> Result<()> {
        let Some(position) = self.store.find_open(bot.name(), &alert.symbol).await? else {
            debug!("SmartClose without open position");
            return Ok(());
        };

        match alert.timeframe.as_deref() {
            Some(TIMEFRAME_4H) => self.close_all(bot, alert, key, position, "4h close").await,
            Some(TIMEFRAME_1H) => match self.closes.count(key) {
                0 => {
                    self.closes.set(key.clone(), 1, self.clock.now());
                    info!("First 1h close signal recorded, awaiting confirmation");
                    bot.notify(&format!(
                        "[{}] {} close signal at {} recorded (1/2), no action",
                        bot.name(),
                        alert.symbol,
                        alert.price
                    ))
                    .await;
                    Ok(())
                }
                1 => self.close_half(bot, alert, key, position).await,
                _ => self.close_all(bot, alert, key, position, "final 1h close").await,
            },
            other => {
                debug!(timeframe = ?other, "SmartClose timeframe ignored");
                Ok(())
            }
        }
    }

    async fn handle_big_close(&self, bot: &Bot, alert: &Alert, key: &BotSymbolKey) -> Result<()> {
        match self.store.find_open(bot.name(), &alert.symbol).await? {
            Some(position) => self.close_all(bot, alert, key, position, "big close").await,
            None => {
                debug!("SmartBigClose without open position");
                Ok(())
            }
        }
    }

    async fn handle_big_add(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        match self.store.find_open(bot.name(), &alert.symbol).await? {
            Some(position) => {
                info!(fills = position.fills_count, "SmartBigAdd received, no trading action");
                bot.notify(&format!(
                    "[{}] {} big add signal at {} (fills {}/{}), no action taken",
                    bot.name(),
                    alert.symbol,
                    alert.price,
                    position.fills_count,
                    bot.config().max_fills
                ))
                .await;
            }
            None => debug!("SmartBigAdd without open position"),
        }
        Ok(())
    }

    async fn handle_synchronization(&self, bot: &Bot, alert: &Alert, key: &BotSymbolKey) -> Result<()> {
        if !alert.timeframe_is(TIMEFRAME_1H) {
            debug!(timeframe = ?alert.timeframe, "Synchronization signal outside 1h ignored");
            return Ok(());
        }

        let now = self.clock.now();
        let until = now.checked_add_signed(self.entry_block_window).ok_or_else(|| {
            TradingError::Configuration(format!(
                "entry block window {} from {} is out of range",
                self.entry_block_window, now
            ))
        })?;
        self.blocks.block(key.clone(), until);
        info!(%until, "Entries blocked");
        bot.notify(&format!(
            "[{}] {} {} at {}: new entries blocked until {}",
            bot.name(),
            alert.symbol,
            alert.signal,
            alert.price,
            until.format("%Y-%m-%d %H:%M:%S UTC")
        ))
        .await;
        Ok(())
    }

    /// Sell half the notional; the position stays open
    async fn close_half(
        &self,
        bot: &Bot,
        alert: &Alert,
        key: &BotSymbolKey,
        position: Position,
    ) -> Result<()> {
        if position.avg_entry_price <= Decimal::ZERO {
            warn!(position_id = %position.id, "Position has no average entry, cannot size partial close");
            bot.notify(&format!(
                "[{}] {} partial close skipped at {}: position has no average entry price",
                bot.name(),
                alert.symbol,
                alert.price
            ))
            .await;
            return Ok(());
        }

        let close_usd = position.amount_usd * PARTIAL_CLOSE_FRACTION;
        let Some(amount) = close_usd.checked_div(position.avg_entry_price) else {
            return Err(TradingError::Store(format!(
                "partial close of {} USD at avg entry {} is out of range",
                close_usd, position.avg_entry_price
            )));
        };
        let pnl = self.store.calculate_pnl(&position, alert.price);
        let realized = PnlSnapshot {
            pnl_usd: pnl.pnl_usd * PARTIAL_CLOSE_FRACTION,
            pnl_percent: pnl.pnl_percent,
        };

        let client_order_id = generate_client_order_id(bot.name());
        let ack = bot
            .exchange()
            .place_market(&alert.symbol, Side::Sell, amount, &client_order_id)
            .await?;
        let remaining = self.store.reduce(&position, alert.price, close_usd).await?;
        self.closes.set(key.clone(), 2, self.clock.now());

        info!(
            order_id = %ack.order_id,
            %amount,
            remaining_usd = %remaining.amount_usd,
            "Closed 50% of position"
        );
        bot.notify(&close_message(
            bot.name(),
            &alert.symbol,
            "partial close 50%",
            amount,
            position.avg_entry_price,
            alert.price,
            realized,
        ))
        .await;
        Ok(())
    }

    async fn close_all(
        &self,
        bot: &Bot,
        alert: &Alert,
        key: &BotSymbolKey,
        position: Position,
        reason: &str,
    ) -> Result<()> {
        let info = self.store.position_info(&position, alert.price);

        let ack = bot.exchange().flash_close(&alert.symbol, Side::Buy).await?;
        self.store.close(&position, alert.price).await?;
        self.closes.clear(key);

        info!(
            order_id = %ack.order_id,
            size = %info.size,
            pnl = %info.pnl.pnl_usd,
            reason,
            "Position closed"
        );
        bot.notify(&close_message(
            bot.name(),
            &alert.symbol,
            reason,
            info.size,
            position.avg_entry_price,
            alert.price,
            info.pnl,
        ))
        .await;
        Ok(())
    }

    /// Leverage (on open) and order size for `usd` at the alert price
    async fn resolve_size(&self, bot: &Bot, alert: &Alert, usd: Decimal, opening: bool) -> Result<Decimal> {
        if opening {
            bot.exchange()
                .ensure_leverage(&alert.symbol, bot.config().leverage)
                .await?;
        }
        let size = bot
            .exchange()
            .calc_size_from_usd(&alert.symbol, alert.price, usd)
            .await?;
        if size <= Decimal::ZERO {
            return Err(TradingError::Configuration(format!(
                "size {} computed for {} USD at {}",
                size, usd, alert.price
            )));
        }
        Ok(size)
    }

    async fn reject_sizing(&self, bot: &Bot, alert: &Alert, action: &str, err: TradingError) -> Result<()> {
        warn!(error = %err, action, "Sizing failed, transition aborted");
        bot.notify(&format!(
            "[{}] {} {} aborted at {}: {}",
            bot.name(),
            alert.symbol,
            action,
            alert.price,
            err
        ))
        .await;
        Ok(())
    }
}

#[async_trait]
impl AlertStrategy for PartialCloseStrategy {
    fn name(&self) -> &str {
        "partial_close"
    }

    #[instrument(
        skip(self, bot, alert),
        fields(bot = %bot.name(), symbol = %alert.symbol, signal = %alert.signal)
    )]
    async fn on_alert(&self, bot: &Bot, alert: &Alert) -> Result<()> {
        let Signal::SmartVol(signal) = alert.signal else {
            debug!("Not a SmartVol signal, ignoring");
            return Ok(());
        };

        let key = BotSymbolKey::new(bot.name(), &alert.symbol);
        let _guard = self.locks.acquire(&key).await;

        match signal {
            SmartVolType::SmartOpen => self.handle_open(bot, alert, &key).await,
            SmartVolType::SmartVolAdd => self.handle_add(bot, alert).await,
            SmartVolType::SmartClose => self.handle_close(bot, alert, &key).await,
            SmartVolType::SmartBigClose => self.handle_big_close(bot, alert, &key).await,
            SmartVolType::SmartBigAdd => self.handle_big_add(bot, alert).await,
            SmartVolType::SmartVolumeOpen
            | SmartVolType::BullishVolume
            | SmartVolType::VolumeUp => {
                debug!("Volume signal, no action for this strategy");
                Ok(())
            }
            SmartVolType::FixedShort | SmartVolType::LiveShort => {
                self.handle_synchronization(bot, alert, &key).await
            }
        }
    }
}

fn close_message(
    bot: &str,
    symbol: &str,
    reason: &str,
    size: Decimal,
    avg_entry: Decimal,
    price: Decimal,
    pnl: PnlSnapshot,
) -> String {
    format!(
        "[{}] {} {}\nsize: {}\navg entry: {}\nprice: {}\nPnL: {} USD ({}%)",
        bot,
        symbol,
        reason,
        size.round_dp(8).normalize(),
        avg_entry.round_dp(8).normalize(),
        price,
        pnl.pnl_usd.round_dp(2),
        pnl.pnl_percent.round_dp(2)
    )
}
