//! Signal Router Library
//!
//! Receives technical-analysis alerts over a webhook, classifies them, and
//! fans them out to independently configured trading bots running the
//! SmartVol partial-close strategy or the domination strategy.

pub mod adapters;
pub mod alerts;
pub mod common;
pub mod config;
pub mod router;
pub mod server;
pub mod strategy;

// Re-export commonly used types
pub use alerts::{classify, classify_str, Alert, AlertKind, DominationType, Signal, SmartVolType};
pub use common::errors::{AlertError, Result, TradingError};
pub use common::traits::{Clock, ExchangeClient, Notifier, PositionsStore, SystemClock};
pub use common::types::{BotSymbolKey, OrderAck, PnlSnapshot, Position, PositionInfo, Side};
pub use self::config::types::{AppConfig, BotConfig, StrategyTag};
pub use router::{AlertRouter, Bot, BotRegistry, DispatchReport, DominationHandler};
pub use server::WebhookServer;
pub use strategy::{AlertStrategy, PartialCloseStrategy, SharedStrategy};
