//! Raw depth snapshots to domain ticks.
//!
//! Every step is a hard filter, applied in order:
//! 1. the timestamp must be later than the last accepted one for the contract;
//! 2. the contract must be subscribed, unless whole-market mode is on;
//! 3. prices are rounded to the contract's tick when its metadata is known.
//!
//! A rejected snapshot leaves the last-seen state untouched.

use crate::codes;
use crate::wire::{parse_timestamp, RawDepth};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use thiserror::Error;
use trading::model::market_data::DEPTH_LEVELS;
use trading::{ContractKey, DepthLevel, TickRecord};
use trading_core::{ContractDirectory, SubscriptionRegistry};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TickRejected {
    #[error("malformed timestamp {0}")]
    BadTimestamp(i64),

    #[error("unknown exchange id {0}")]
    UnknownExchange(i32),

    #[error("stale tick for {key}: {at} is not after {last}")]
    Stale {
        key: ContractKey,
        at: DateTime<FixedOffset>,
        last: DateTime<FixedOffset>,
    },

    #[error("tick for {0} is not subscribed")]
    NotSubscribed(ContractKey),
}

#[derive(Debug)]
pub struct TickNormalizer {
    registry: SubscriptionRegistry,
    directory: ContractDirectory,
    last_seen: HashMap<ContractKey, DateTime<FixedOffset>>,
}

impl TickNormalizer {
    pub fn new(registry: SubscriptionRegistry, directory: ContractDirectory) -> Self {
        Self {
            registry,
            directory,
            last_seen: HashMap::new(),
        }
    }

    /// Converts one snapshot, recording its timestamp on success.
    pub fn normalize(&mut self, raw: &RawDepth) -> Result<TickRecord, TickRejected> {
        let exchange = codes::exchange_from_quote(raw.exchange_id)
            .ok_or(TickRejected::UnknownExchange(raw.exchange_id))?;
        let key = ContractKey::new(raw.ticker.clone(), exchange);
        let at = parse_timestamp(raw.data_time).ok_or(TickRejected::BadTimestamp(raw.data_time))?;

        if let Some(last) = self.last_seen.get(&key) {
            if at <= *last {
                return Err(TickRejected::Stale {
                    key,
                    at,
                    last: *last,
                });
            }
        }
        if !self.registry.accepts(&key) {
            return Err(TickRejected::NotSubscribed(key));
        }

        let mut tick = TickRecord::new(key.clone(), at);
        tick.volume = raw.qty as f64;
        tick.turnover = raw.turnover;
        tick.last_price = raw.last_price;
        tick.open_price = raw.open_price;
        tick.high_price = raw.high_price;
        tick.low_price = raw.low_price;
        tick.pre_close = raw.pre_close_price;
        tick.limit_up = raw.upper_limit_price;
        tick.limit_down = raw.lower_limit_price;
        for level in 0..DEPTH_LEVELS {
            tick.bids[level] = depth_level(&raw.bid, &raw.bid_qty, level);
            tick.asks[level] = depth_level(&raw.ask, &raw.ask_qty, level);
        }

        if let Some((price_tick, name)) = self.directory.rounding_info(&key) {
            tick.round_prices(price_tick);
            tick.name = name;
        }

        self.last_seen.insert(key, at);
        Ok(tick)
    }

    /// Timestamp of the newest accepted tick for `key`.
    pub fn last_seen(&self, key: &ContractKey) -> Option<DateTime<FixedOffset>> {
        self.last_seen.get(key).copied()
    }
}

fn depth_level(prices: &[f64], volumes: &[i64], level: usize) -> DepthLevel {
    DepthLevel {
        price: prices.get(level).copied().unwrap_or_default(),
        volume: volumes.get(level).copied().unwrap_or_default() as f64,
    }
}
