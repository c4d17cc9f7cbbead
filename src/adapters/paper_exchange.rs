//! Simulated exchange used for dry runs and tests

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::common::errors::{Result, TradingError};
use crate::common::traits::ExchangeClient;
use crate::common::types::{OrderAck, Side};

/// Fills every market order instantly at the requested size
///
/// Tracks a net long holding per symbol so `flash_close` knows what to sell.
#[derive(Debug, Default)]
pub struct PaperExchange {
    allowed: HashSet<String>,
    holdings: RwLock<HashMap<String, Decimal>>,
    leverage: RwLock<HashMap<String, u32>>,
    orders: RwLock<Vec<OrderAck>>,
    next_order_id: AtomicU64,
}

impl PaperExchange {
    /// Exchange that trades every symbol
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchange limited to `symbols` (empty = every symbol)
    pub fn with_allowed_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: symbols.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every order acknowledged so far, oldest first
    pub async fn orders(&self) -> Vec<OrderAck> {
        self.orders.read().await.clone()
    }

    /// Net long token amount held for `symbol`
    pub async fn holding(&self, symbol: &str) -> Decimal {
        self.holdings
            .read()
            .await
            .get(symbol)
            .copied()
            .unwrap_or_default()
    }

    pub async fn leverage_for(&self, symbol: &str) -> Option<u32> {
        self.leverage.read().await.get(symbol).copied()
    }

    async fn record(&self, symbol: &str, side: Side, size: Decimal, client_order_id: &str) -> OrderAck {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst) + 1;
        let ack = OrderAck {
            order_id: format!("paper-{}", id),
            client_order_id: client_order_id.to_string(),
            symbol: symbol.to_string(),
            side,
            size,
        };
        self.orders.write().await.push(ack.clone());
        ack
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn is_allowed(&self, symbol: &str) -> Result<bool> {
        Ok(self.allowed.is_empty() || self.allowed.contains(symbol))
    }

    async fn ensure_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        if leverage == 0 {
            return Err(TradingError::Exchange(format!(
                "leverage must be positive for {}",
                symbol
            )));
        }
        self.leverage
            .write()
            .await
            .insert(symbol.to_string(), leverage);
        Ok(())
    }

    async fn calc_size_from_usd(&self, symbol: &str, price: Decimal, usd: Decimal) -> Result<Decimal> {
        if price <= Decimal::ZERO {
            return Err(TradingError::Exchange(format!(
                "cannot size {} at non-positive price {}",
                symbol, price
            )));
        }
        usd.checked_div(price)
            .map(|size| size.round_dp(8))
            .ok_or_else(|| {
                TradingError::Exchange(format!(
                    "size for {} USD of {} at {} is out of range",
                    usd, symbol, price
                ))
            })
    }

    #[instrument(skip(self))]
    async fn place_market(
        &self,
        symbol: &str,
        side: Side,
        size: Decimal,
        client_order_id: &str,
    ) -> Result<OrderAck> {
        if size <= Decimal::ZERO {
            return Err(TradingError::Exchange(format!(
                "order size must be positive, got {}",
                size
            )));
        }

        {
            let mut holdings = self.holdings.write().await;
            let held = holdings.entry(symbol.to_string()).or_default();
            *held = match side {
                Side::Buy => held.checked_add(size).ok_or_else(|| {
                    TradingError::Exchange(format!("holding of {} would overflow", symbol))
                })?,
                Side::Sell => (*held - size).max(Decimal::ZERO),
            };
        }

        let ack = self.record(symbol, side, size, client_order_id).await;
        debug!(order_id = %ack.order_id, "Paper order filled");
        Ok(ack)
    }

    #[instrument(skip(self))]
    async fn flash_close(&self, symbol: &str, side: Side) -> Result<OrderAck> {
        let held = self
            .holdings
            .write()
            .await
            .remove(symbol)
            .unwrap_or_default();
        let closing_side = match side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };
        let ack = self.record(symbol, closing_side, held, "").await;
        debug!(order_id = %ack.order_id, size = %held, "Paper position flash-closed");
        Ok(ack)
    }
}
