use crate::model::contract::ContractKey;
use crate::model::order::{Direction, Offset};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single execution reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub order_id: String,
    pub key: ContractKey,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    pub datetime: DateTime<FixedOffset>,
}
