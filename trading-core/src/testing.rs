//! Test helpers shared across the workspace (feature `test-utils`).

use std::sync::{Mutex, PoisonError};
use trading::{
    AccountRecord, ContractMeta, EventSink, GatewayEvent, LogLevel, LogRecord, OrderRecord,
    PositionRecord, TickRecord, TradeRecord,
};

/// An [`EventSink`] that keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GatewayEvent>>,
}

macro_rules! select {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> Vec<$ty> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    GatewayEvent::$variant(inner) => Some(inner),
                    _ => None,
                })
                .collect()
        }
    };
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    select!(ticks, Tick, TickRecord);
    select!(orders, Order, OrderRecord);
    select!(trades, Trade, TradeRecord);
    select!(positions, Position, PositionRecord);
    select!(accounts, Account, AccountRecord);
    select!(contracts, Contract, ContractMeta);
    select!(logs, Log, LogRecord);

    pub fn errors(&self) -> Vec<LogRecord> {
        self.logs()
            .into_iter()
            .filter(|log| log.level == LogLevel::Error)
            .collect()
    }

    /// Whether any log line contains `needle`.
    pub fn logged(&self, needle: &str) -> bool {
        self.logs().iter().any(|log| log.message.contains(needle))
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: GatewayEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
