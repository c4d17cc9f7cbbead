//! Reference adapters behind the exchange, store and notification ports

pub mod memory_store;
pub mod notifier;
pub mod paper_exchange;

pub use memory_store::InMemoryPositionsStore;
pub use notifier::{LogNotifier, MemoryNotifier, WebhookNotifier};
pub use paper_exchange::PaperExchange;
