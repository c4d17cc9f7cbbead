//! Port definitions consumed by the strategy and router
//!
//! The concrete exchange client, position database and notification
//! channel live outside the core; these traits are the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::errors::Result;
use super::types::{OrderAck, PnlSnapshot, Position, PositionInfo, Side};

/// Trading operations a bot performs against its exchange
///
/// `is_allowed` and `ensure_leverage` are optional for an exchange; the
/// defaults treat them as a permissive no-op.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Whether the symbol may be traded on this exchange
    async fn is_allowed(&self, _symbol: &str) -> Result<bool> {
        Ok(true)
    }

    /// Make sure the symbol trades at the given leverage
    async fn ensure_leverage(&self, _symbol: &str, _leverage: u32) -> Result<()> {
        Ok(())
    }

    /// Convert a USD allocation into an order size at `price`
    async fn calc_size_from_usd(&self, symbol: &str, price: Decimal, usd: Decimal)
        -> Result<Decimal>;

    /// Submit a market order
    async fn place_market(
        &self,
        symbol: &str,
        side: Side,
        size: Decimal,
        client_order_id: &str,
    ) -> Result<OrderAck>;

    /// Close the whole position held on `side` immediately
    async fn flash_close(&self, symbol: &str, side: Side) -> Result<OrderAck>;
}

/// Persistent position bookkeeping
#[async_trait]
pub trait PositionsStore: Send + Sync {
    async fn find_open(&self, bot: &str, symbol: &str) -> Result<Option<Position>>;

    async fn open(&self, bot: &str, symbol: &str, price: Decimal, usd: Decimal)
        -> Result<Position>;

    /// Record an additional fill
    async fn add(&self, position: &Position, price: Decimal, usd: Decimal) -> Result<Position>;

    /// Record a partial exit of `usd` notional; the position stays open
    async fn reduce(&self, position: &Position, price: Decimal, usd: Decimal)
        -> Result<Position>;

    async fn close(&self, position: &Position, price: Decimal) -> Result<Position>;

    /// Unrealized PnL of a long position at `price`
    ///
    /// Zero when there is no average entry or the result is not representable.
    fn calculate_pnl(&self, position: &Position, price: Decimal) -> PnlSnapshot {
        let avg = position.avg_entry_price;
        if avg.is_zero() {
            return PnlSnapshot::zero();
        }
        let snapshot = price
            .checked_sub(avg)
            .and_then(|diff| diff.checked_div(avg))
            .and_then(|change| {
                Some(PnlSnapshot {
                    pnl_usd: position.amount_usd.checked_mul(change)?,
                    pnl_percent: change.checked_mul(Decimal::ONE_HUNDRED)?,
                })
            });
        snapshot.unwrap_or_else(PnlSnapshot::zero)
    }

    fn position_info(&self, position: &Position, price: Decimal) -> PositionInfo {
        PositionInfo {
            pnl: self.calculate_pnl(position, price),
            size: position.token_amount().unwrap_or_default(),
        }
    }
}

/// Outbound text notifications (chat, webhook, log)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}

/// Time source, swappable for deterministic tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
