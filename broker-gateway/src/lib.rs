//! # Broker Gateway
//!
//! Connects a trading host to an XTP-style broker: one market-data session,
//! one trading session, each run as a single-writer actor that turns vendor
//! callbacks into domain events.
//!
//! ## Modules
//! - `api`: the vendor SDK boundary (`QuoteApi`, `TraderApi`) and callback delivery.
//! - `codes` / `wire`: vendor code tables and raw callback payloads.
//! - `market_data`: session state machine, reconnect policy and tick normalization.
//! - `trader`: trading session state machine, order reconciliation and position aggregation.
//! - `gateway`: the [`XtpGateway`] facade implementing [`trading::Gateway`].
//! - `paper`: an in-process venue implementing both vendor traits.

pub mod api;
pub mod codes;
pub mod context;
pub mod error;
pub mod gateway;
mod mailbox;
pub mod market_data;
pub mod paper;
pub mod trader;
pub mod wire;

pub use context::GatewayContext;
pub use error::{GatewayError, Result};
pub use gateway::XtpGateway;
pub use paper::PaperVenue;
