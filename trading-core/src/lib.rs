//! # Trading Core Library
//!
//! Shared runtime pieces for broker gateways.
//!
//! ## Modules
//! - `contract_directory`: process-wide contract metadata cache.
//! - `subscription`: the set of subscribed contracts plus the all-market switch.
//! - `scheduler`: trading-hours windows and the round-robin query scheduler.
//! - `event_bus`: broadcast fan-out of gateway events to the host.
//! - `args` / `settings`: command-line arguments and layered configuration.
//! - `stores`: in-memory and JSON-file collaborator stores.

pub mod args;
pub mod contract_directory;
pub mod event_bus;
pub mod scheduler;
pub mod settings;
pub mod stores;
pub mod subscription;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use contract_directory::ContractDirectory;
pub use event_bus::EventBus;
pub use scheduler::{QueryScheduler, TradingWindows};
pub use settings::GatewaySettings;
pub use subscription::SubscriptionRegistry;
