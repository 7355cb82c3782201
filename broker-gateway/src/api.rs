//! The vendor SDK boundary.
//!
//! A venue adapter implements [`QuoteApi`] and [`TraderApi`]. Requests are
//! plain method calls; everything the venue reports back is delivered as a
//! [`QuoteEvent`] or [`TraderEvent`] through the [`Spi`] registered by the
//! owning session, from whatever thread the venue uses.

use crate::wire::{QuoteEvent, RawOrderInsert, TraderEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error reported by the venue, with its numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{error_id}] {error_msg}")]
pub struct ApiError {
    pub error_id: i32,
    pub error_msg: String,
}

impl ApiError {
    pub fn new(error_id: i32, error_msg: impl Into<String>) -> Self {
        Self {
            error_id,
            error_msg: error_msg.into(),
        }
    }

    /// Venues attach a zeroed error to successful responses.
    pub fn is_error(&self) -> bool {
        self.error_id != 0
    }
}

/// Filters out the zeroed errors attached to successful responses.
pub fn real_error(error: &Option<ApiError>) -> Option<&ApiError> {
    error.as_ref().filter(|e| e.is_error())
}

/// Callback handle a session hands to its venue adapter.
pub struct Spi<E> {
    deliver: Arc<dyn Fn(E) + Send + Sync>,
}

impl<E> Spi<E> {
    pub fn new(deliver: impl Fn(E) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// A handle that drops every event.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn send(&self, event: E) {
        (self.deliver)(event)
    }
}

impl<E> Clone for Spi<E> {
    fn clone(&self) -> Self {
        Self {
            deliver: Arc::clone(&self.deliver),
        }
    }
}

impl<E> fmt::Debug for Spi<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spi").finish_non_exhaustive()
    }
}

pub type QuoteSpi = Spi<QuoteEvent>;
pub type TraderSpi = Spi<TraderEvent>;

/// Market-data login parameters, kept by the session for reconnects.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteLogin {
    pub host: String,
    pub port: u16,
    pub account_id: String,
    pub password: String,
    /// Vendor transport code, see [`crate::codes::PROTOCOL_TCP`].
    pub protocol: i32,
    pub heartbeat_secs: u32,
    pub client_id: u8,
    pub local_ip: String,
    pub log_level: i32,
}

/// Trading login parameters, kept by the session for reconnects.
#[derive(Debug, Clone, PartialEq)]
pub struct TraderLogin {
    pub host: String,
    pub port: u16,
    pub account_id: String,
    pub password: String,
    pub client_id: u8,
    pub software_key: String,
    pub local_ip: String,
    pub log_level: i32,
}

pub trait QuoteApi: Send {
    fn register_spi(&mut self, spi: QuoteSpi);

    fn set_udp_buffer_size(&mut self, size_mb: u32);

    /// Blocks until the venue accepts or refuses the login.
    fn login(&mut self, params: &QuoteLogin) -> Result<(), ApiError>;

    fn logout(&mut self) -> Result<(), ApiError>;

    fn subscribe_market_data(&mut self, tickers: &[String], exchange_id: i32)
        -> Result<(), ApiError>;

    fn unsubscribe_market_data(
        &mut self,
        tickers: &[String],
        exchange_id: i32,
    ) -> Result<(), ApiError>;

    fn subscribe_all_market_data(&mut self) -> Result<(), ApiError>;

    /// Requests the static ticker list of one exchange, delivered page by page.
    fn query_all_tickers(&mut self, exchange_id: i32) -> Result<(), ApiError>;

    fn query_tickers_price_info(
        &mut self,
        tickers: &[String],
        exchange_id: i32,
    ) -> Result<(), ApiError>;
}

pub trait TraderApi: Send {
    fn register_spi(&mut self, spi: TraderSpi);

    /// Blocks until the venue accepts or refuses the login.
    ///
    /// # Returns
    ///
    /// * `Ok(session_id)` - Identifies the session in every later request.
    fn login(&mut self, params: &TraderLogin) -> Result<u64, ApiError>;

    fn logout(&mut self, session_id: u64) -> Result<(), ApiError>;

    /// # Returns
    ///
    /// * `Ok(order_xtp_id)` - The broker-assigned order id.
    fn insert_order(&mut self, order: &RawOrderInsert, session_id: u64) -> Result<u64, ApiError>;

    fn cancel_order(&mut self, order_xtp_id: u64, session_id: u64) -> Result<(), ApiError>;

    fn query_asset(&mut self, session_id: u64, request_id: i32) -> Result<(), ApiError>;

    /// An empty `ticker` queries every position.
    fn query_position(
        &mut self,
        ticker: &str,
        session_id: u64,
        request_id: i32,
    ) -> Result<(), ApiError>;

    fn query_credit_fund_info(&mut self, session_id: u64, request_id: i32)
        -> Result<(), ApiError>;

    fn query_credit_debt_info(&mut self, session_id: u64, request_id: i32)
        -> Result<(), ApiError>;

    fn query_option_auction_info(
        &mut self,
        session_id: u64,
        request_id: i32,
    ) -> Result<(), ApiError>;
}
