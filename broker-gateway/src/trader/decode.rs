//! Inbound order and trade payloads to domain values.
//!
//! The instrument class is derived once per payload and selects the side
//! and price-type tables.

use super::reconciler::OrderUpdate;
use crate::codes;
use crate::error::{GatewayError, Result};
use crate::wire::{parse_date, parse_timestamp, RawOptionInfo, RawOrder, RawTrade};
use trading::{
    ContractKey, ContractMeta, Direction, InstrumentClass, Offset, OptionDetail, Product,
    TradeRecord,
};

fn market_key(ticker: &str, market: i32) -> Result<ContractKey> {
    let exchange = codes::exchange_from_market(market).ok_or(GatewayError::UnknownCode {
        field: "market",
        code: market,
    })?;
    Ok(ContractKey::new(ticker, exchange))
}

fn decode_side(class: InstrumentClass, side: i32, position_effect: i32) -> Result<(Direction, Offset)> {
    let unknown = GatewayError::UnknownCode { field: "side", code: side };
    match class {
        InstrumentClass::Option => {
            let direction = codes::option_side_from_vendor(side).ok_or(unknown)?;
            Ok((direction, codes::offset_from_vendor(position_effect)))
        }
        InstrumentClass::Star | InstrumentClass::Equity => {
            codes::stock_side_from_vendor(side).ok_or(unknown)
        }
    }
}

pub fn decode_order(raw: &RawOrder) -> Result<OrderUpdate> {
    let key = market_key(&raw.ticker, raw.market)?;
    let class = key.class();
    let (direction, offset) = decode_side(class, raw.side, raw.position_effect)?;
    let status = codes::status_from_vendor(raw.order_status).ok_or(GatewayError::UnknownCode {
        field: "order_status",
        code: raw.order_status,
    })?;

    Ok(OrderUpdate {
        order_id: raw.order_xtp_id.to_string(),
        key,
        direction,
        offset,
        order_type: codes::order_type_from_vendor(class, raw.price_type),
        price: raw.price,
        volume: raw.quantity as f64,
        traded: raw.qty_traded as f64,
        status,
        insert_time: parse_timestamp(raw.insert_time),
    })
}

pub fn decode_trade(raw: &RawTrade) -> Result<TradeRecord> {
    let key = market_key(&raw.ticker, raw.market)?;
    let (direction, offset) = decode_side(key.class(), raw.side, raw.position_effect)?;
    let datetime =
        parse_timestamp(raw.trade_time).ok_or(GatewayError::MalformedTimestamp(raw.trade_time))?;

    Ok(TradeRecord {
        trade_id: raw.exec_id.clone(),
        order_id: raw.order_xtp_id.to_string(),
        key,
        direction,
        offset,
        price: raw.price,
        volume: raw.quantity as f64,
        datetime,
    })
}

/// Builds option contract metadata from an option auction info page.
pub fn decode_option_contract(raw: &RawOptionInfo) -> Result<ContractMeta> {
    let key = market_key(&raw.ticker, raw.security_id_source)?;
    let expiry = parse_date(raw.last_trade_date)
        .ok_or(GatewayError::MalformedTimestamp(raw.last_trade_date))?;

    let detail = OptionDetail {
        underlying: raw.underlying_security_id.clone(),
        portfolio: format!("{}_O", raw.underlying_security_id),
        underlying_month: format!("{}-{}", raw.underlying_security_id, raw.delivery_month),
        option_type: codes::option_type_from_vendor(raw.call_or_put),
        strike: raw.exercise_price,
        expiry,
        index: OptionDetail::option_index(raw.exercise_price, &raw.contract_id),
    };
    let meta = ContractMeta::new(key, raw.symbol.clone(), Product::Option, raw.price_tick)?
        .with_size(raw.contract_unit as f64)
        .with_min_volume(raw.qty_unit as f64)
        .with_option(detail);
    Ok(meta)
}
