//! Alert model and classification
//!
//! Inbound webhook bodies are untyped JSON records. [`classify`] validates
//! them into an [`Alert`] whose [`Signal`] is a closed enumeration, so the
//! router and strategy never see free-form type strings.

mod classifier;
mod types;

pub use classifier::{classify, classify_str, TYPE_FIELD, TYPE_FIELD_ALIAS};
pub use types::{
    Alert, AlertKind, DominationType, Signal, SmartVolType, TIMEFRAME_1H, TIMEFRAME_4H,
};
