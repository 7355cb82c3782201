//! In-process venue.
//!
//! [`PaperVenue`] implements both vendor traits against a shared book: it
//! answers queries from configured contracts, fills orders immediately at the
//! limit price when auto-fill is on, keeps a cash balance and positions, and
//! records every call it receives. Faults (refused logins, dropped
//! connections, arbitrary callbacks) can be injected from the outside.

use crate::api::{ApiError, QuoteApi, QuoteLogin, QuoteSpi, TraderApi, TraderLogin, TraderSpi};
use crate::codes;
use crate::wire::{
    QuoteEvent, RawAsset, RawCreditFund, RawDebt, RawDepth, RawOptionInfo, RawOrder,
    RawOrderInsert, RawPosition, RawPriceInfo, RawTickerInfo, RawTrade, TraderEvent,
};
use chrono::Utc;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trading::model::market_data::china_tz;
use trading::OrderStatus;
use uuid::Uuid;

/// Error code the venue uses for refused requests.
pub const PAPER_ERROR_ID: i32 = 10_200_001;

/// One request received by the venue, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum VenueCall {
    QuoteLogin,
    QuoteLogout,
    SetUdpBuffer(u32),
    Subscribe {
        exchange_id: i32,
        tickers: Vec<String>,
    },
    Unsubscribe {
        exchange_id: i32,
        tickers: Vec<String>,
    },
    SubscribeAll,
    QueryTickers(i32),
    QueryPrice {
        exchange_id: i32,
        tickers: Vec<String>,
    },
    TraderLogin,
    TraderLogout,
    InsertOrder(RawOrderInsert),
    CancelOrder(u64),
    QueryAsset,
    QueryPosition,
    QueryCreditFund,
    QueryCreditDebt,
    QueryOptionInfo,
}

#[derive(Debug, Clone, Default)]
struct Holding {
    quantity: i64,
    cost: f64,
}

#[derive(Default)]
struct VenueState {
    calls: Vec<VenueCall>,
    quote_spi: Option<QuoteSpi>,
    trader_spi: Option<TraderSpi>,
    quote_login_failure: Option<ApiError>,
    trader_login_failure: Option<ApiError>,
    quote_online: bool,
    trader_online: bool,
    subscribed: BTreeSet<(i32, String)>,
    tickers: Vec<RawTickerInfo>,
    options: Vec<RawOptionInfo>,
    /// Last price by (exchange id, ticker).
    prices: HashMap<(i32, String), f64>,
    account_type: i32,
    cash: f64,
    /// Holdings by (market, ticker).
    holdings: BTreeMap<(i32, String), Holding>,
    debts: Vec<RawDebt>,
    auto_fill: bool,
    open_orders: HashMap<u64, RawOrder>,
    next_order_id: u64,
    next_session_id: u64,
}

/// Outbound callbacks collected under the lock and delivered after it is released.
#[derive(Default)]
struct Outbox {
    quote: Vec<QuoteEvent>,
    trader: Vec<TraderEvent>,
}

/// Shared handle on the paper book. Clones see the same state.
#[derive(Clone, Default)]
pub struct PaperVenue {
    state: Arc<Mutex<VenueState>>,
}

impl PaperVenue {
    pub fn new(initial_cash: f64) -> Self {
        let venue = Self::default();
        {
            let mut state = venue.lock();
            state.cash = initial_cash;
            state.auto_fill = true;
            state.next_order_id = 1;
            state.next_session_id = 1;
        }
        venue
    }

    fn lock(&self) -> MutexGuard<'_, VenueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, outbox: Outbox) {
        let (quote_spi, trader_spi) = {
            let state = self.lock();
            (state.quote_spi.clone(), state.trader_spi.clone())
        };
        if let Some(spi) = quote_spi {
            outbox.quote.into_iter().for_each(|event| spi.send(event));
        }
        if let Some(spi) = trader_spi {
            outbox.trader.into_iter().for_each(|event| spi.send(event));
        }
    }

    pub fn quote_api(&self) -> PaperQuoteApi {
        PaperQuoteApi {
            venue: self.clone(),
        }
    }

    pub fn trader_api(&self) -> PaperTraderApi {
        PaperTraderApi {
            venue: self.clone(),
        }
    }

    pub fn calls(&self) -> Vec<VenueCall> {
        self.lock().calls.clone()
    }

    pub fn add_ticker(&self, info: RawTickerInfo) {
        self.lock().tickers.push(info);
    }

    pub fn add_option(&self, info: RawOptionInfo) {
        self.lock().options.push(info);
    }

    pub fn set_last_price(&self, exchange_id: i32, ticker: impl Into<String>, price: f64) {
        self.lock()
            .prices
            .insert((exchange_id, ticker.into()), price);
    }

    pub fn set_account_type(&self, account_type: i32) {
        self.lock().account_type = account_type;
    }

    pub fn add_debt(&self, debt: RawDebt) {
        self.lock().debts.push(debt);
    }

    /// With auto-fill off, inserted orders rest until cancelled.
    pub fn set_auto_fill(&self, enabled: bool) {
        self.lock().auto_fill = enabled;
    }

    pub fn cash(&self) -> f64 {
        self.lock().cash
    }

    pub fn holding(&self, market: i32, ticker: &str) -> i64 {
        self.lock()
            .holdings
            .get(&(market, ticker.to_string()))
            .map_or(0, |holding| holding.quantity)
    }

    /// Publishes one depth snapshot for every subscribed ticker with a known price.
    ///
    /// Returns how many snapshots were sent.
    pub fn publish_quotes(&self) -> usize {
        let data_time = venue_timestamp();
        let quote: Vec<QuoteEvent> = {
            let state = self.lock();
            if !state.quote_online {
                return 0;
            }
            state
                .subscribed
                .iter()
                .filter_map(|(exchange_id, ticker)| {
                    let price = *state.prices.get(&(*exchange_id, ticker.clone()))?;
                    Some(QuoteEvent::Depth(depth_around(
                        *exchange_id,
                        ticker,
                        price,
                        data_time,
                    )))
                })
                .collect()
        };
        let sent = quote.len();
        self.deliver(Outbox {
            quote,
            ..Default::default()
        });
        sent
    }
}

/// Fault injection and call-log control for tests.
#[cfg(any(test, feature = "fault-injection"))]
impl PaperVenue {
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// The next market-data login is refused with `error`.
    pub fn fail_next_quote_login(&self, error: ApiError) {
        self.lock().quote_login_failure = Some(error);
    }

    /// The next trading login is refused with `error`.
    pub fn fail_next_trader_login(&self, error: ApiError) {
        self.lock().trader_login_failure = Some(error);
    }

    pub fn drop_quote_connection(&self, reason: i32) {
        self.lock().quote_online = false;
        self.push_quote_event(QuoteEvent::Disconnected { reason });
    }

    pub fn drop_trader_connection(&self, reason: i32) {
        self.lock().trader_online = false;
        self.push_trader_event(TraderEvent::Disconnected { reason });
    }

    pub fn push_depth(&self, depth: RawDepth) {
        self.push_quote_event(QuoteEvent::Depth(depth));
    }

    pub fn push_quote_event(&self, event: QuoteEvent) {
        self.deliver(Outbox {
            quote: vec![event],
            ..Default::default()
        });
    }

    pub fn push_trader_event(&self, event: TraderEvent) {
        self.deliver(Outbox {
            trader: vec![event],
            ..Default::default()
        });
    }
}

fn refused(msg: &str) -> ApiError {
    ApiError::new(PAPER_ERROR_ID, msg)
}

/// Current exchange-local time as `YYYYMMDDHHMMSSmmm`.
fn venue_timestamp() -> i64 {
    Utc::now()
        .with_timezone(&china_tz())
        .format("%Y%m%d%H%M%S%3f")
        .to_string()
        .parse()
        .unwrap_or_default()
}

fn depth_around(exchange_id: i32, ticker: &str, price: f64, data_time: i64) -> RawDepth {
    let step = 0.01;
    RawDepth {
        exchange_id,
        ticker: ticker.to_string(),
        data_time,
        last_price: price,
        pre_close_price: price,
        open_price: price,
        high_price: price,
        low_price: price,
        upper_limit_price: price * 1.1,
        lower_limit_price: price * 0.9,
        qty: 0,
        turnover: 0.0,
        bid: (1..=5).map(|i| price - step * i as f64).collect(),
        ask: (1..=5).map(|i| price + step * i as f64).collect(),
        bid_qty: vec![100; 5],
        ask_qty: vec![100; 5],
    }
}

/// Market-data side of a [`PaperVenue`].
pub struct PaperQuoteApi {
    venue: PaperVenue,
}

impl QuoteApi for PaperQuoteApi {
    fn register_spi(&mut self, spi: QuoteSpi) {
        self.venue.lock().quote_spi = Some(spi);
    }

    fn set_udp_buffer_size(&mut self, size_mb: u32) {
        self.venue
            .lock()
            .calls
            .push(VenueCall::SetUdpBuffer(size_mb));
    }

    fn login(&mut self, params: &QuoteLogin) -> Result<(), ApiError> {
        let mut state = self.venue.lock();
        state.calls.push(VenueCall::QuoteLogin);
        if let Some(err) = state.quote_login_failure.take() {
            return Err(err);
        }
        info!("paper market data login for {}", params.account_id);
        state.quote_online = true;
        Ok(())
    }

    fn logout(&mut self) -> Result<(), ApiError> {
        let mut state = self.venue.lock();
        state.calls.push(VenueCall::QuoteLogout);
        state.quote_online = false;
        Ok(())
    }

    fn subscribe_market_data(
        &mut self,
        tickers: &[String],
        exchange_id: i32,
    ) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::Subscribe {
                exchange_id,
                tickers: tickers.to_vec(),
            });
            if !state.quote_online {
                return Err(refused("market data session is offline"));
            }
            let quote = tickers
                .iter()
                .map(|ticker| {
                    state.subscribed.insert((exchange_id, ticker.clone()));
                    QuoteEvent::SubscribeAck {
                        ticker: ticker.clone(),
                        exchange_id,
                        error: None,
                    }
                })
                .collect();
            Outbox {
                quote,
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }

    fn unsubscribe_market_data(
        &mut self,
        tickers: &[String],
        exchange_id: i32,
    ) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::Unsubscribe {
                exchange_id,
                tickers: tickers.to_vec(),
            });
            let quote = tickers
                .iter()
                .map(|ticker| {
                    state.subscribed.remove(&(exchange_id, ticker.clone()));
                    QuoteEvent::UnsubscribeAck {
                        ticker: ticker.clone(),
                        exchange_id,
                        error: None,
                    }
                })
                .collect();
            Outbox {
                quote,
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }

    fn subscribe_all_market_data(&mut self) -> Result<(), ApiError> {
        let mut state = self.venue.lock();
        state.calls.push(VenueCall::SubscribeAll);
        let all: Vec<(i32, String)> = state
            .tickers
            .iter()
            .map(|info| (info.exchange_id, info.ticker.clone()))
            .collect();
        state.subscribed.extend(all);
        drop(state);
        self.venue.deliver(Outbox {
            quote: vec![QuoteEvent::SubscribeAllAck { error: None }],
            ..Default::default()
        });
        Ok(())
    }

    fn query_all_tickers(&mut self, exchange_id: i32) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryTickers(exchange_id));
            let pages: Vec<RawTickerInfo> = state
                .tickers
                .iter()
                .filter(|info| info.exchange_id == exchange_id)
                .cloned()
                .collect();
            Outbox {
                quote: paged(pages, |info, is_last| QuoteEvent::TickerInfo {
                    exchange_id,
                    info,
                    error: None,
                    is_last,
                }),
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }

    fn query_tickers_price_info(
        &mut self,
        tickers: &[String],
        exchange_id: i32,
    ) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryPrice {
                exchange_id,
                tickers: tickers.to_vec(),
            });
            let pages: Vec<RawPriceInfo> = tickers
                .iter()
                .filter_map(|ticker| {
                    let last_price = *state.prices.get(&(exchange_id, ticker.clone()))?;
                    Some(RawPriceInfo {
                        exchange_id,
                        ticker: ticker.clone(),
                        last_price,
                    })
                })
                .collect();
            Outbox {
                quote: paged(pages, |info, is_last| QuoteEvent::PriceInfo {
                    info,
                    error: None,
                    is_last,
                }),
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }
}

/// Turns query results into pages, the last one flagged. An empty result is
/// a single empty last page.
fn paged<T, E>(items: Vec<T>, page: impl Fn(Option<T>, bool) -> E) -> Vec<E> {
    if items.is_empty() {
        return vec![page(None, true)];
    }
    let count = items.len();
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| page(Some(item), i + 1 == count))
        .collect()
}

/// Trading side of a [`PaperVenue`].
pub struct PaperTraderApi {
    venue: PaperVenue,
}

impl PaperTraderApi {
    fn fill(state: &mut VenueState, order: &mut RawOrder) -> RawTrade {
        let price = if order.price > 0.0 {
            order.price
        } else {
            codes::exchange_from_market(order.market)
                .and_then(codes::exchange_to_quote)
                .and_then(|exchange_id| {
                    state
                        .prices
                        .get(&(exchange_id, order.ticker.clone()))
                        .copied()
                })
                .unwrap_or_default()
        };
        let quantity = order.quantity - order.qty_traded;
        let cost = quantity as f64 * price;

        let holding = state
            .holdings
            .entry((order.market, order.ticker.clone()))
            .or_default();
        if codes::is_buy_side(order.side) {
            state.cash -= cost;
            holding.quantity += quantity;
            holding.cost += cost;
        } else {
            state.cash += cost;
            let average = if holding.quantity > 0 {
                holding.cost / holding.quantity as f64
            } else {
                price
            };
            holding.quantity -= quantity;
            holding.cost -= average * quantity as f64;
        }

        order.qty_traded = order.quantity;
        order.order_status = codes::status_to_vendor(OrderStatus::AllTraded);

        RawTrade {
            order_xtp_id: order.order_xtp_id,
            exec_id: Uuid::new_v4().to_string(),
            ticker: order.ticker.clone(),
            market: order.market,
            side: order.side,
            position_effect: order.position_effect,
            price,
            quantity,
            trade_time: venue_timestamp(),
        }
    }

    fn asset(state: &VenueState) -> RawAsset {
        let security_asset: f64 = state.holdings.values().map(|holding| holding.cost).sum();
        RawAsset {
            account_type: state.account_type,
            total_asset: state.cash + security_asset,
            withholding_amount: 0.0,
            buying_power: state.cash,
            fund_buy_amount: 0.0,
            security_asset,
        }
    }
}

impl TraderApi for PaperTraderApi {
    fn register_spi(&mut self, spi: TraderSpi) {
        self.venue.lock().trader_spi = Some(spi);
    }

    fn login(&mut self, params: &TraderLogin) -> Result<u64, ApiError> {
        let mut state = self.venue.lock();
        state.calls.push(VenueCall::TraderLogin);
        if let Some(err) = state.trader_login_failure.take() {
            return Err(err);
        }
        info!("paper trading login for {}", params.account_id);
        state.trader_online = true;
        let session_id = state.next_session_id;
        state.next_session_id += 1;
        Ok(session_id)
    }

    fn logout(&mut self, _session_id: u64) -> Result<(), ApiError> {
        let mut state = self.venue.lock();
        state.calls.push(VenueCall::TraderLogout);
        state.trader_online = false;
        Ok(())
    }

    fn insert_order(&mut self, order: &RawOrderInsert, _session_id: u64) -> Result<u64, ApiError> {
        let (order_xtp_id, outbox) = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::InsertOrder(order.clone()));
            if !state.trader_online {
                return Err(refused("trading session is offline"));
            }
            let order_xtp_id = state.next_order_id;
            state.next_order_id += 1;

            let mut raw = RawOrder {
                order_xtp_id,
                ticker: order.ticker.clone(),
                market: order.market,
                price: order.price,
                quantity: order.quantity,
                qty_traded: 0,
                side: order.side,
                position_effect: order.position_effect,
                price_type: order.price_type,
                order_status: codes::status_to_vendor(OrderStatus::NotTraded),
                insert_time: venue_timestamp(),
            };
            let mut trader = vec![TraderEvent::Order {
                order: raw.clone(),
                error: None,
            }];

            if state.auto_fill {
                let trade = Self::fill(&mut state, &mut raw);
                debug!(
                    "paper fill {} x {} @ {}",
                    raw.ticker, trade.quantity, trade.price
                );
                trader.push(TraderEvent::Trade(trade));
                trader.push(TraderEvent::Order {
                    order: raw,
                    error: None,
                });
            } else {
                state.open_orders.insert(order_xtp_id, raw);
            }
            (
                order_xtp_id,
                Outbox {
                    trader,
                    ..Default::default()
                },
            )
        };
        self.venue.deliver(outbox);
        Ok(order_xtp_id)
    }

    fn cancel_order(&mut self, order_xtp_id: u64, _session_id: u64) -> Result<(), ApiError> {
        let event = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::CancelOrder(order_xtp_id));
            match state.open_orders.remove(&order_xtp_id) {
                Some(mut order) => {
                    order.order_status = codes::status_to_vendor(OrderStatus::Cancelled);
                    TraderEvent::Order { order, error: None }
                }
                None => TraderEvent::CancelError {
                    order_xtp_id,
                    error: refused("order is not open"),
                },
            }
        };
        self.venue.deliver(Outbox {
            trader: vec![event],
            ..Default::default()
        });
        Ok(())
    }

    fn query_asset(&mut self, _session_id: u64, _request_id: i32) -> Result<(), ApiError> {
        let asset = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryAsset);
            Self::asset(&state)
        };
        self.venue.deliver(Outbox {
            trader: vec![TraderEvent::Asset { asset, error: None }],
            ..Default::default()
        });
        Ok(())
    }

    fn query_position(
        &mut self,
        _ticker: &str,
        _session_id: u64,
        _request_id: i32,
    ) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryPosition);
            let pages: Vec<RawPosition> = state
                .holdings
                .iter()
                .filter(|(_, holding)| holding.quantity != 0)
                .map(|((market, ticker), holding)| RawPosition {
                    ticker: ticker.clone(),
                    market: *market,
                    position_direction: 0,
                    total_qty: holding.quantity,
                    sellable_qty: holding.quantity,
                    avg_price: holding.cost / holding.quantity as f64,
                    unrealized_pnl: 0.0,
                    yesterday_position: 0,
                })
                .collect();
            Outbox {
                trader: paged(pages, |position, is_last| TraderEvent::Position {
                    position,
                    error: None,
                    is_last,
                }),
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }

    fn query_credit_fund_info(
        &mut self,
        _session_id: u64,
        _request_id: i32,
    ) -> Result<(), ApiError> {
        let event = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryCreditFund);
            if state.account_type == codes::ACCOUNT_TYPE_MARGIN {
                let asset = Self::asset(&state);
                let all_debt: f64 = state.debts.iter().map(|debt| debt.remain_qty as f64).sum();
                TraderEvent::CreditFund {
                    fund: RawCreditFund {
                        all_asset: asset.total_asset,
                        all_debt,
                        guaranty: asset.total_asset,
                        maintenance_ratio: 0.0,
                        line_of_credit: asset.total_asset,
                    },
                    error: None,
                }
            } else {
                TraderEvent::CreditFund {
                    fund: RawCreditFund::default(),
                    error: Some(refused("not a margin account")),
                }
            }
        };
        self.venue.deliver(Outbox {
            trader: vec![event],
            ..Default::default()
        });
        Ok(())
    }

    fn query_credit_debt_info(
        &mut self,
        _session_id: u64,
        _request_id: i32,
    ) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryCreditDebt);
            Outbox {
                trader: paged(state.debts.clone(), |debt, is_last| {
                    TraderEvent::CreditDebt {
                        debt,
                        error: None,
                        is_last,
                    }
                }),
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }

    fn query_option_auction_info(
        &mut self,
        _session_id: u64,
        _request_id: i32,
    ) -> Result<(), ApiError> {
        let outbox = {
            let mut state = self.venue.lock();
            state.calls.push(VenueCall::QueryOptionInfo);
            Outbox {
                trader: paged(state.options.clone(), |info, is_last| {
                    TraderEvent::OptionInfo {
                        info,
                        error: None,
                        is_last,
                    }
                }),
                ..Default::default()
            }
        };
        self.venue.deliver(outbox);
        Ok(())
    }
}
