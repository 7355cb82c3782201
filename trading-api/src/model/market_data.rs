use crate::model::contract::ContractKey;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Number of price levels carried on each side of a tick.
pub const DEPTH_LEVELS: usize = 5;

/// UTC offset of the exchanges' local time, in seconds.
pub const CHINA_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Fixed UTC+8 offset used for every venue timestamp.
pub fn china_tz() -> FixedOffset {
    FixedOffset::east_opt(CHINA_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Rounds `value` to the nearest multiple of `tick`.
///
/// Non-positive or non-finite ticks leave the value untouched.
pub fn round_to(value: f64, tick: f64) -> f64 {
    if !(tick.is_finite() && tick > 0.0) {
        return value;
    }
    let steps = (value / tick).round();
    // strip binary noise such as 10.230000000000002
    ((steps * tick) * 1e8).round() / 1e8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub volume: f64,
}

/// A normalized level-1 / level-5 snapshot for one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub key: ContractKey,
    pub name: String,
    pub datetime: DateTime<FixedOffset>,

    pub volume: f64,
    pub turnover: f64,
    pub last_price: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub pre_close: f64,
    pub limit_up: f64,
    pub limit_down: f64,

    pub bids: [DepthLevel; DEPTH_LEVELS],
    pub asks: [DepthLevel; DEPTH_LEVELS],
}

impl TickRecord {
    pub fn new(key: ContractKey, datetime: DateTime<FixedOffset>) -> Self {
        Self {
            key,
            name: String::new(),
            datetime,
            volume: 0.0,
            turnover: 0.0,
            last_price: 0.0,
            open_price: 0.0,
            high_price: 0.0,
            low_price: 0.0,
            pre_close: 0.0,
            limit_up: 0.0,
            limit_down: 0.0,
            bids: [DepthLevel::default(); DEPTH_LEVELS],
            asks: [DepthLevel::default(); DEPTH_LEVELS],
        }
    }

    /// Rounds every price field, ladders included, to `tick`.
    pub fn round_prices(&mut self, tick: f64) {
        for price in [
            &mut self.last_price,
            &mut self.open_price,
            &mut self.high_price,
            &mut self.low_price,
            &mut self.pre_close,
            &mut self.limit_up,
            &mut self.limit_down,
        ] {
            *price = round_to(*price, tick);
        }
        for level in self.bids.iter_mut().chain(self.asks.iter_mut()) {
            level.price = round_to(level.price, tick);
        }
    }

    pub fn best_bid(&self) -> DepthLevel {
        self.bids[0]
    }

    pub fn best_ask(&self) -> DepthLevel {
        self.asks[0]
    }
}
