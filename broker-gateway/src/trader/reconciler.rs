//! Live order cache.
//!
//! Order-status updates and trade fills arrive independently and may be
//! repeated or reordered. Both are merged so that, for every order:
//! - `traded` never decreases and never exceeds `volume`;
//! - the status never moves to a lower rank and never leaves a terminal status;
//! - a trade id is applied at most once per order.

use chrono::{DateTime, FixedOffset};
use log::debug;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use trading::{
    ContractKey, Direction, Offset, OrderRecord, OrderStatus, OrderType, TradeRecord,
};

/// A decoded order-status event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub order_id: String,
    pub key: ContractKey,
    pub direction: Direction,
    pub offset: Offset,
    pub order_type: OrderType,
    pub price: f64,
    pub volume: f64,
    pub traded: f64,
    pub status: OrderStatus,
    pub insert_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("trade {trade_id} references unknown order {order_id}")]
    UnknownOrder { trade_id: String, order_id: String },

    #[error("trade {0} was already applied")]
    DuplicateTrade(String),
}

/// Result of merging one fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    pub order: OrderRecord,
    pub trade: TradeRecord,
    /// The fill changed holdings: account and credit figures are stale.
    pub refresh_account: bool,
}

#[derive(Debug, Default)]
pub struct OrderReconciler {
    orders: HashMap<String, OrderRecord>,
    /// Sum of distinct fills per order.
    filled: HashMap<String, f64>,
    /// `(order_id, trade_id)` of applied fills. Exchanges number their
    /// executions independently, so a trade id alone is not unique.
    seen_trades: HashSet<(String, String)>,
}

impl OrderReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_id: &str) -> Option<&OrderRecord> {
        self.orders.get(order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn active_orders(&self) -> impl Iterator<Item = &OrderRecord> {
        self.orders.values().filter(|order| order.is_active())
    }

    /// Starts tracking an order the host just submitted.
    ///
    /// An order the broker already reported keeps its broker state.
    pub fn track_submitted(&mut self, order: OrderRecord) {
        self.orders.entry(order.order_id.clone()).or_insert(order);
    }

    /// Merges an order-status update and returns the resulting order.
    ///
    /// Unknown orders are created from the update. Known orders only take the
    /// traded volume (if higher) and the status (if it is a legal move); the
    /// insertion time is set once.
    pub fn apply_update(&mut self, update: OrderUpdate) -> OrderRecord {
        let Some(order) = self.orders.get_mut(&update.order_id) else {
            let order = OrderRecord {
                order_id: update.order_id.clone(),
                key: update.key,
                direction: update.direction,
                offset: update.offset,
                order_type: update.order_type,
                price: update.price,
                volume: update.volume,
                traded: update.traded.clamp(0.0, update.volume.max(0.0)),
                status: update.status,
                datetime: update.insert_time,
            };
            self.orders.insert(update.order_id, order.clone());
            return order;
        };

        let traded = update.traded.min(order.volume);
        if traded > order.traded {
            order.traded = traded;
        }
        if order.status.can_transition_to(update.status) {
            order.status = update.status;
        } else if order.status != update.status {
            debug!(
                "order {}: ignoring status {:?} after {:?}",
                order.order_id, update.status, order.status
            );
        }
        if order.datetime.is_none() {
            order.datetime = update.insert_time;
        }
        order.clone()
    }

    /// Merges a fill into its order.
    ///
    /// # Errors
    ///
    /// * [`ReconcileError::UnknownOrder`] if the order was never seen; nothing changes.
    /// * [`ReconcileError::DuplicateTrade`] if the trade id was already applied
    ///   to the same order.
    pub fn apply_fill(&mut self, trade: TradeRecord) -> Result<FillOutcome, ReconcileError> {
        let Some(order) = self.orders.get_mut(&trade.order_id) else {
            return Err(ReconcileError::UnknownOrder {
                trade_id: trade.trade_id,
                order_id: trade.order_id,
            });
        };
        if !self
            .seen_trades
            .insert((trade.order_id.clone(), trade.trade_id.clone()))
        {
            return Err(ReconcileError::DuplicateTrade(trade.trade_id));
        }

        let filled = self.filled.entry(trade.order_id.clone()).or_insert(0.0);
        *filled += trade.volume;

        order.traded = order.traded.max(*filled).min(order.volume);
        let recomputed = if order.traded < order.volume {
            OrderStatus::PartTraded
        } else {
            OrderStatus::AllTraded
        };
        // a terminal order keeps its status but the fill still moved funds
        if order.status.is_active() {
            order.status = recomputed;
        }

        let refresh_account = matches!(
            recomputed,
            OrderStatus::PartTraded | OrderStatus::AllTraded
        );
        Ok(FillOutcome {
            order: order.clone(),
            trade,
            refresh_account,
        })
    }
}
