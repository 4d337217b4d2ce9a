//! Domain layer: the engine's entities, value objects and the port traits
//! its services speak through.

pub mod ledger;
pub mod money;
pub mod performance;
pub mod ports;
pub mod task;
pub mod wallet;
