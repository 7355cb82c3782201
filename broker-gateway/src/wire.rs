//! Raw venue payloads and the callback events that carry them.
//!
//! Field names follow the venue's own vocabulary; conversion into the domain
//! model happens in the sessions.

use crate::api::ApiError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use trading::model::market_data::china_tz;

/// Parses a venue timestamp `YYYYMMDDHHMMSS` followed by up to six
/// fractional-second digits (usually milliseconds) in exchange-local time.
pub fn parse_timestamp(raw: i64) -> Option<DateTime<FixedOffset>> {
    let text = raw.to_string();
    if text.len() < 14 || text.len() > 20 {
        return None;
    }
    let (whole, fraction) = text.split_at(14);
    let naive = NaiveDateTime::parse_from_str(whole, "%Y%m%d%H%M%S").ok()?;
    let nanos = if fraction.is_empty() {
        0
    } else {
        let value: u32 = fraction.parse().ok()?;
        value * 10u32.pow(9 - fraction.len() as u32)
    };
    naive
        .with_nanosecond(nanos)?
        .and_local_timezone(china_tz())
        .single()
}

/// Parses a `YYYYMMDD` date.
pub fn parse_date(raw: i64) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&raw.to_string(), "%Y%m%d").ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDepth {
    pub exchange_id: i32,
    pub ticker: String,
    pub data_time: i64,
    pub last_price: f64,
    pub pre_close_price: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub upper_limit_price: f64,
    pub lower_limit_price: f64,
    pub qty: i64,
    pub turnover: f64,
    pub bid: Vec<f64>,
    pub ask: Vec<f64>,
    pub bid_qty: Vec<i64>,
    pub ask_qty: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTickerInfo {
    pub exchange_id: i32,
    pub ticker: String,
    pub ticker_name: String,
    pub ticker_type: i32,
    pub price_tick: f64,
    pub buy_qty_unit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPriceInfo {
    pub exchange_id: i32,
    pub ticker: String,
    pub last_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOrderInsert {
    pub ticker: String,
    pub market: i32,
    pub price: f64,
    pub quantity: i64,
    pub side: i32,
    pub position_effect: i32,
    pub price_type: i32,
    pub business_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    pub order_xtp_id: u64,
    pub ticker: String,
    pub market: i32,
    pub price: f64,
    pub quantity: i64,
    pub qty_traded: i64,
    pub side: i32,
    pub position_effect: i32,
    pub price_type: i32,
    pub order_status: i32,
    pub insert_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    pub order_xtp_id: u64,
    pub exec_id: String,
    pub ticker: String,
    pub market: i32,
    pub side: i32,
    pub position_effect: i32,
    pub price: f64,
    pub quantity: i64,
    pub trade_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub ticker: String,
    pub market: i32,
    pub position_direction: i32,
    pub total_qty: i64,
    pub sellable_qty: i64,
    pub avg_price: f64,
    pub unrealized_pnl: f64,
    pub yesterday_position: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAsset {
    pub account_type: i32,
    pub total_asset: f64,
    pub withholding_amount: f64,
    pub buying_power: f64,
    pub fund_buy_amount: f64,
    pub security_asset: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCreditFund {
    pub all_asset: f64,
    pub all_debt: f64,
    pub guaranty: f64,
    pub maintenance_ratio: f64,
    pub line_of_credit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDebt {
    pub ticker: String,
    pub market: i32,
    pub debt_type: i32,
    pub remain_qty: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOptionInfo {
    pub ticker: String,
    pub security_id_source: i32,
    /// Display name.
    pub symbol: String,
    pub contract_id: String,
    pub underlying_security_id: String,
    pub delivery_month: i32,
    pub call_or_put: i32,
    pub exercise_price: f64,
    pub last_trade_date: i64,
    pub contract_unit: i64,
    pub qty_unit: i64,
    pub price_tick: f64,
}

/// Callbacks of the market-data feed.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteEvent {
    Disconnected {
        reason: i32,
    },
    Error(ApiError),
    SubscribeAck {
        ticker: String,
        exchange_id: i32,
        error: Option<ApiError>,
    },
    UnsubscribeAck {
        ticker: String,
        exchange_id: i32,
        error: Option<ApiError>,
    },
    SubscribeAllAck {
        error: Option<ApiError>,
    },
    Depth(RawDepth),
    TickerInfo {
        exchange_id: i32,
        info: Option<RawTickerInfo>,
        error: Option<ApiError>,
        is_last: bool,
    },
    PriceInfo {
        info: Option<RawPriceInfo>,
        error: Option<ApiError>,
        is_last: bool,
    },
}

/// Callbacks of the trading feed.
#[derive(Debug, Clone, PartialEq)]
pub enum TraderEvent {
    Disconnected {
        reason: i32,
    },
    Error(ApiError),
    Order {
        order: RawOrder,
        error: Option<ApiError>,
    },
    Trade(RawTrade),
    CancelError {
        order_xtp_id: u64,
        error: ApiError,
    },
    Position {
        position: Option<RawPosition>,
        error: Option<ApiError>,
        is_last: bool,
    },
    Asset {
        asset: RawAsset,
        error: Option<ApiError>,
    },
    CreditFund {
        fund: RawCreditFund,
        error: Option<ApiError>,
    },
    CreditDebt {
        debt: Option<RawDebt>,
        error: Option<ApiError>,
        is_last: bool,
    },
    OptionInfo {
        info: Option<RawOptionInfo>,
        error: Option<ApiError>,
        is_last: bool,
    },
}
