//! Common types, errors and ports shared across modules

pub mod errors;
pub mod traits;
pub mod types;
