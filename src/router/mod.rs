//! Alert routing: bot registry, fan-out and the domination pathway

mod dispatcher;
mod domination;
mod registry;

pub use dispatcher::{AlertRouter, BotFailure, DispatchReport};
pub use domination::{DominationHandler, LoggingDominationHandler};
pub use registry::{Bot, BotRegistry};
