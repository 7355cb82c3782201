//! Events a gateway emits towards its host.

use crate::model::account::AccountRecord;
use crate::model::contract::ContractMeta;
use crate::model::market_data::TickRecord;
use crate::model::order::OrderRecord;
use crate::model::position::PositionRecord;
use crate::model::trade::TradeRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A host-visible log line. Broker errors keep their numeric code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub error_id: Option<i32>,
}

impl LogRecord {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            message: message.into(),
            error_id: None,
        }
    }

    pub fn error(message: impl Into<String>, error_id: i32) -> Self {
        Self {
            level: LogLevel::Error,
            message: message.into(),
            error_id: Some(error_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GatewayEvent {
    Tick(TickRecord),
    Order(OrderRecord),
    Trade(TradeRecord),
    Position(PositionRecord),
    Account(AccountRecord),
    Contract(ContractMeta),
    Log(LogRecord),
}
