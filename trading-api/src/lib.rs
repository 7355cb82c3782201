//! Venue-neutral domain model and host-facing traits for broker gateways.
//!
//! ## Modules
//! - `model`: contracts, ticks, orders, trades, positions, accounts and the events carrying them.
//! - `traits`: the host event sink, the collaborator stores and the async `Gateway` surface.
//! - `error`: validation errors raised while building model values.

pub mod error;
pub mod model;
pub mod traits;

pub use error::ModelError;
pub use model::account::{AccountRecord, AssetType};
pub use model::contract::{
    ContractKey, ContractMeta, Exchange, InstrumentClass, OptionDetail, OptionType, Product,
};
pub use model::event::{GatewayEvent, LogLevel, LogRecord};
pub use model::market_data::{DepthLevel, TickRecord};
pub use model::order::{
    CancelRequest, Direction, Offset, OrderRecord, OrderRequest, OrderStatus, OrderType,
};
pub use model::position::PositionRecord;
pub use model::trade::TradeRecord;
pub use traits::event_sink::EventSink;
pub use traits::gateway::Gateway;
pub use traits::stores::{ConfigStore, ContractStore};

pub mod prelude {
    pub use crate::model::contract::{ContractKey, ContractMeta, Exchange};
    pub use crate::model::event::GatewayEvent;
    pub use crate::model::order::{OrderRecord, OrderRequest, OrderStatus};
    pub use crate::traits::event_sink::EventSink;
}
