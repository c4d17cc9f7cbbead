//! In-memory positions store

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::common::errors::{Result, TradingError};
use crate::common::traits::PositionsStore;
use crate::common::types::Position;

/// Keeps every position (open and closed) in a map keyed by position id
#[derive(Debug, Default)]
pub struct InMemoryPositionsStore {
    positions: RwLock<HashMap<String, Position>>,
}

impl InMemoryPositionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed positions for `bot`, any symbol
    pub async fn closed_positions(&self, bot: &str) -> Vec<Position> {
        self.positions
            .read()
            .await
            .values()
            .filter(|p| p.bot == bot && !p.is_open)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.positions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.positions.read().await.is_empty()
    }

    async fn update<F>(&self, position: &Position, apply: F) -> Result<Position>
    where
        F: FnOnce(&mut Position) -> Result<()> + Send,
    {
        let mut positions = self.positions.write().await;
        let stored = positions
            .get_mut(&position.id)
            .filter(|p| p.is_open)
            .ok_or_else(|| TradingError::Store(format!("no open position with id {}", position.id)))?;
        apply(stored)?;
        Ok(stored.clone())
    }
}

#[async_trait]
impl PositionsStore for InMemoryPositionsStore {
    async fn find_open(&self, bot: &str, symbol: &str) -> Result<Option<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .values()
            .find(|p| p.is_open && p.bot == bot && p.symbol == symbol)
            .cloned())
    }

    async fn open(&self, bot: &str, symbol: &str, price: Decimal, usd: Decimal) -> Result<Position> {
        if price <= Decimal::ZERO {
            return Err(TradingError::Store(format!("invalid entry price {}", price)));
        }

        let mut positions = self.positions.write().await;
        if positions
            .values()
            .any(|p| p.is_open && p.bot == bot && p.symbol == symbol)
        {
            return Err(TradingError::Store(format!(
                "{} already has an open {} position",
                bot, symbol
            )));
        }

        let position = Position {
            id: Uuid::new_v4().to_string(),
            bot: bot.to_string(),
            symbol: symbol.to_string(),
            fills_count: 1,
            avg_entry_price: price,
            amount_usd: usd,
            is_open: true,
            opened_at: Utc::now(),
        };
        positions.insert(position.id.clone(), position.clone());
        debug!(position_id = %position.id, bot, symbol, "Position stored");
        Ok(position)
    }

    async fn add(&self, position: &Position, price: Decimal, usd: Decimal) -> Result<Position> {
        self.update(position, |p| {
            if price <= Decimal::ZERO {
                return Err(TradingError::Store(format!("invalid fill price {}", price)));
            }
            let out_of_range =
                || TradingError::Store(format!("fill of {} USD at {} is out of range", usd, price));
            let tokens = p
                .token_amount()
                .zip(usd.checked_div(price))
                .and_then(|(held, added)| held.checked_add(added))
                .ok_or_else(out_of_range)?;
            let amount_usd = p.amount_usd.checked_add(usd).ok_or_else(out_of_range)?;
            p.avg_entry_price = amount_usd.checked_div(tokens).ok_or_else(out_of_range)?;
            p.amount_usd = amount_usd;
            p.fills_count += 1;
            Ok(())
        })
        .await
    }

    async fn reduce(&self, position: &Position, _price: Decimal, usd: Decimal) -> Result<Position> {
        self.update(position, |p| {
            p.amount_usd = (p.amount_usd - usd).max(Decimal::ZERO);
            Ok(())
        })
        .await
    }

    async fn close(&self, position: &Position, _price: Decimal) -> Result<Position> {
        self.update(position, |p| {
            p.is_open = false;
            Ok(())
        })
        .await
    }
}
