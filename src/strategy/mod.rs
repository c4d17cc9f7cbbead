//! Strategy module for alert-driven position management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Router                                                     │
//! │    bot.process(alert)                                       │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  AlertStrategy::on_alert(bot, alert)                        │
//! │    - acquires the (bot, symbol) lock                        │
//! │    - checks guards (timeframe, entry block, max fills)      │
//! │    - exchange order first, then store mutation              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`AlertStrategy`]: Trait for strategies driven by classified alerts
//! - [`PartialCloseStrategy`]: SmartVol open/add/partial-close/close automaton
//! - [`KeyedLocks`], [`EntryBlocks`], [`CloseCounters`]: per-key state

mod keyed_state;
mod partial_close;
mod traits;

pub use keyed_state::{CloseCounters, EntryBlocks, KeyedLocks, PartialCloseState};
pub use partial_close::PartialCloseStrategy;
pub use traits::{AlertStrategy, SharedStrategy};
