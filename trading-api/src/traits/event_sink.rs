use crate::model::account::AccountRecord;
use crate::model::contract::ContractMeta;
use crate::model::event::{GatewayEvent, LogRecord};
use crate::model::market_data::TickRecord;
use crate::model::order::OrderRecord;
use crate::model::position::PositionRecord;
use crate::model::trade::TradeRecord;
use std::sync::Arc;

/// Receives everything a gateway reports to its host.
///
/// Implementors only need [`EventSink::publish`]; the typed helpers wrap
/// their payload into a [`GatewayEvent`].
pub trait EventSink: Send + Sync {
    fn publish(&self, event: GatewayEvent);

    fn on_tick(&self, tick: TickRecord) {
        self.publish(GatewayEvent::Tick(tick));
    }

    fn on_order(&self, order: OrderRecord) {
        self.publish(GatewayEvent::Order(order));
    }

    fn on_trade(&self, trade: TradeRecord) {
        self.publish(GatewayEvent::Trade(trade));
    }

    fn on_position(&self, position: PositionRecord) {
        self.publish(GatewayEvent::Position(position));
    }

    fn on_account(&self, account: AccountRecord) {
        self.publish(GatewayEvent::Account(account));
    }

    fn on_contract(&self, contract: ContractMeta) {
        self.publish(GatewayEvent::Contract(contract));
    }

    fn write_log(&self, msg: &str) {
        self.publish(GatewayEvent::Log(LogRecord::info(msg)));
    }

    /// Reports a broker-side error with its code and text.
    fn write_error(&self, msg: &str, error_id: i32, error_msg: &str) {
        self.publish(GatewayEvent::Log(LogRecord::error(
            format!("{msg}, code: {error_id}, message: {error_msg}"),
            error_id,
        )));
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn publish(&self, event: GatewayEvent) {
        (**self).publish(event)
    }
}
