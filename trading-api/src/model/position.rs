use crate::model::contract::ContractKey;
use crate::model::order::Direction;
use serde::{Deserialize, Serialize};

/// Holding of one contract in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub key: ContractKey,
    pub direction: Direction,
    pub volume: f64,
    pub frozen: f64,
    pub price: f64,
    pub pnl: f64,
    /// Volume carried over from the prior trading day.
    pub yd_volume: f64,
}

impl PositionRecord {
    pub fn new(key: ContractKey, direction: Direction) -> Self {
        Self {
            key,
            direction,
            volume: 0.0,
            frozen: 0.0,
            price: 0.0,
            pnl: 0.0,
            yd_volume: 0.0,
        }
    }

    pub fn available(&self) -> f64 {
        self.volume - self.frozen
    }
}
