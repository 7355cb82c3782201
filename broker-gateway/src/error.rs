use crate::api::ApiError;
use thiserror::Error;
use trading::{Direction, Exchange, InstrumentClass, ModelError, Offset, OrderType};

/// Errors surfaced to callers of the gateway.
///
/// Connection problems are never returned from here: they are retried or
/// reported through the event sink. What remains are request validation
/// failures, broker refusals and a stopped session.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("session is already connected")]
    AlreadyConnected,

    #[error("session is not connected")]
    NotConnected,

    #[error("exchange {0} is not supported by this venue")]
    UnsupportedExchange(Exchange),

    #[error("margin account orders need an explicit offset")]
    MissingOffset,

    #[error("order type {order_type:?} is not supported for {class:?} instruments")]
    UnsupportedOrderType {
        class: InstrumentClass,
        order_type: OrderType,
    },

    #[error("direction {direction:?} with offset {offset:?} has no venue side")]
    UnsupportedDirection { direction: Direction, offset: Offset },

    #[error("order volume must be at least one unit, got {0}")]
    InvalidVolume(f64),

    #[error("invalid order id `{0}`")]
    InvalidOrderId(String),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("unknown venue code {code} for {field}")]
    UnknownCode { field: &'static str, code: i32 },

    #[error("malformed venue timestamp {0}")]
    MalformedTimestamp(i64),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("broker refused the request: {0}")]
    Api(#[from] ApiError),

    #[error("session task has stopped")]
    SessionClosed,
}

impl GatewayError {
    /// Whether the request was refused before reaching the venue.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GatewayError::UnsupportedExchange(_)
                | GatewayError::MissingOffset
                | GatewayError::UnsupportedOrderType { .. }
                | GatewayError::UnsupportedDirection { .. }
                | GatewayError::InvalidVolume(_)
                | GatewayError::InvalidOrderId(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
