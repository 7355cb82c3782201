use crate::model::contract::ContractKey;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
    Net,
}

/// Position effect of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Offset {
    None,
    Open,
    Close,
    CloseToday,
    CloseYesterday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    /// Fill-or-kill.
    Fok,
}

/// Lifecycle status of an order.
///
/// Statuses are ranked `Submitting < NotTraded < PartTraded < terminal`.
/// An order never moves to a lower rank and never leaves a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitting,
    NotTraded,
    PartTraded,
    AllTraded,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::AllTraded | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::Submitting => 0,
            OrderStatus::NotTraded => 1,
            OrderStatus::PartTraded => 2,
            OrderStatus::AllTraded | OrderStatus::Cancelled | OrderStatus::Rejected => 3,
        }
    }

    /// Whether an order currently in `self` may take `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

/// An order request coming from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub key: ContractKey,
    pub direction: Direction,
    pub order_type: OrderType,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    /// Margin accounts only: `Some(true)` buys on financing and keeps the
    /// offset in the encoded side; anything else trades as collateral.
    pub margin_financed: Option<bool>,
}

impl OrderRequest {
    pub fn new(
        key: ContractKey,
        direction: Direction,
        order_type: OrderType,
        price: f64,
        volume: f64,
    ) -> Self {
        Self {
            key,
            direction,
            order_type,
            offset: Offset::None,
            price,
            volume,
            margin_financed: None,
        }
    }

    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_margin_financed(mut self, financed: bool) -> Self {
        self.margin_financed = Some(financed);
        self
    }

    /// Builds the locally tracked order for a request the broker accepted.
    pub fn create_order(&self, order_id: impl Into<String>) -> OrderRecord {
        OrderRecord {
            order_id: order_id.into(),
            key: self.key.clone(),
            direction: self.direction,
            offset: self.offset,
            order_type: self.order_type,
            price: self.price,
            volume: self.volume,
            traded: 0.0,
            status: OrderStatus::Submitting,
            datetime: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub order_id: String,
    pub key: ContractKey,
}

impl CancelRequest {
    pub fn new(order_id: impl Into<String>, key: ContractKey) -> Self {
        Self {
            order_id: order_id.into(),
            key,
        }
    }
}

/// The gateway's view of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub key: ContractKey,
    pub direction: Direction,
    pub offset: Offset,
    pub order_type: OrderType,
    pub price: f64,
    pub volume: f64,
    pub traded: f64,
    pub status: OrderStatus,
    /// Broker insertion time, captured from the first update that carries it.
    pub datetime: Option<DateTime<FixedOffset>>,
}

impl OrderRecord {
    pub fn remaining(&self) -> f64 {
        (self.volume - self.traded).max(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
