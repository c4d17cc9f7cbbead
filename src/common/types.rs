//! Unified types shared by the strategy, router and adapters

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Composite key identifying per-(bot, symbol) strategy state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BotSymbolKey {
    pub bot: String,
    pub symbol: String,
}

impl BotSymbolKey {
    pub fn new(bot: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            bot: bot.into(),
            symbol: symbol.into(),
        }
    }
}

impl std::fmt::Display for BotSymbolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bot, self.symbol)
    }
}

/// Exchange acknowledgement for a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Exchange-assigned order ID
    pub order_id: String,
    /// Client order ID we sent (empty for flash closes)
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    /// Token amount filled
    pub size: Decimal,
}

/// Leveraged long position as tracked by the positions store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub bot: String,
    pub symbol: String,
    /// Number of buy executions accumulated into this position
    pub fills_count: u32,
    /// Volume-weighted average entry price
    pub avg_entry_price: Decimal,
    /// Notional currently held, in USD at entry prices
    pub amount_usd: Decimal,
    pub is_open: bool,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Token amount implied by notional and average entry
    ///
    /// `None` when there is no average entry or the quotient overflows.
    pub fn token_amount(&self) -> Option<Decimal> {
        if self.avg_entry_price.is_zero() {
            return None;
        }
        self.amount_usd.checked_div(self.avg_entry_price)
    }
}

/// Unrealized PnL of a position at a given price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlSnapshot {
    pub pnl_usd: Decimal,
    pub pnl_percent: Decimal,
}

impl PnlSnapshot {
    pub fn zero() -> Self {
        Self {
            pnl_usd: Decimal::ZERO,
            pnl_percent: Decimal::ZERO,
        }
    }
}

/// Position summary used in close notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub pnl: PnlSnapshot,
    /// Token amount held
    pub size: Decimal,
}

/// Generate a unique client order ID with a prefix.
///
/// Format: `{prefix}_{uuid}`; the prefix keeps ASCII alphanumerics only and
/// at most 12 of them.
pub fn generate_client_order_id(prefix: &str) -> String {
    let prefix: String = prefix
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(12)
        .collect();
    format!("{}_{}", prefix, uuid::Uuid::new_v4().as_simple())
}
