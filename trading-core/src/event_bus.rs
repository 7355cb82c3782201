//! # Event Bus
//!
//! Fan-out of gateway events to the host. Sessions publish through the
//! [`EventSink`] trait; any number of host components subscribe.

use log::{error, info, warn};
use tokio::sync::broadcast;
use trading::{EventSink, GatewayEvent, LogLevel};

/// Default number of events a slow subscriber may fall behind before lagging.
pub const DEFAULT_CAPACITY: usize = 4096;

/// A wrapper around a tokio broadcast channel.
///
/// Log events are also written to the `log` facade so they show up in the
/// process log even when no subscriber is attached.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// See [`tokio::sync::broadcast::channel`] for the capacity semantics.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: GatewayEvent) {
        if let GatewayEvent::Log(record) = &event {
            match record.level {
                LogLevel::Info => info!("{}", record.message),
                LogLevel::Warn => warn!("{}", record.message),
                LogLevel::Error => error!("{}", record.message),
            }
        }
        // no subscribers is fine, e.g. during startup
        let _ = self.sender.send(event);
    }
}
