use super::normalizer::{TickNormalizer, TickRejected};
use crate::api::{real_error, ApiError, QuoteApi, QuoteLogin, QuoteSpi};
use crate::codes;
use crate::context::GatewayContext;
use crate::error::{GatewayError, Result};
use crate::wire::{QuoteEvent, RawDepth, RawTickerInfo};
use chrono::{DateTime, FixedOffset};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use trading::{ConfigStore, ContractKey, ContractMeta, EventSink, Exchange, Product};
use trading_core::settings::{GatewaySettings, ResubscribePolicy};
use trading_core::{ContractDirectory, SubscriptionRegistry};

/// Exchanges whose contract lists are requested after each login.
const CONTRACT_EXCHANGES: [Exchange; 2] = [Exchange::Sse, Exchange::Szse];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdState {
    Disconnected,
    Connecting,
    LoggedIn,
    /// Contract lists requested; responses arrive as events.
    ContractsLoaded,
    Subscribed,
}

impl MdState {
    pub fn is_logged_in(&self) -> bool {
        matches!(
            self,
            MdState::LoggedIn | MdState::ContractsLoaded | MdState::Subscribed
        )
    }
}

/// Reconnect and resubscription rules of a market-data session.
#[derive(Debug, Clone, PartialEq)]
pub struct MdPolicy {
    pub reconnect_delay: Duration,
    pub resubscribe: ResubscribePolicy,
    /// Config-store key that can veto automatic reconnects.
    pub policy_key: String,
    pub udp_buffer_mb: u32,
}

impl MdPolicy {
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self {
            reconnect_delay: settings.reconnect_delay(),
            resubscribe: settings.reconnect.resubscribe,
            policy_key: settings.reconnect.policy_key.clone(),
            udp_buffer_mb: settings.quote.udp_buffer_mb,
        }
    }
}

/// The market-data session state machine.
///
/// Synchronous and single-threaded: the actor in `super::actor` feeds it
/// host commands and vendor callbacks one at a time, and owns the timers
/// the session asks for.
pub struct MdSession {
    api: Box<dyn QuoteApi>,
    state: MdState,
    login: Option<QuoteLogin>,
    registry: SubscriptionRegistry,
    directory: ContractDirectory,
    normalizer: TickNormalizer,
    sink: Arc<dyn EventSink>,
    config_store: Arc<dyn ConfigStore>,
    policy: MdPolicy,
    reconnect_count: u32,
}

impl MdSession {
    pub fn new(
        mut api: Box<dyn QuoteApi>,
        spi: QuoteSpi,
        context: &GatewayContext,
        policy: MdPolicy,
    ) -> Self {
        api.register_spi(spi);
        Self {
            api,
            state: MdState::Disconnected,
            login: None,
            registry: context.registry.clone(),
            directory: context.directory.clone(),
            normalizer: TickNormalizer::new(context.registry.clone(), context.directory.clone()),
            sink: Arc::clone(&context.sink),
            config_store: Arc::clone(&context.config_store),
            policy,
            reconnect_count: 0,
        }
    }

    pub fn state(&self) -> MdState {
        self.state
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count
    }

    /// Logs in with `login` and remembers it for later reconnects.
    ///
    /// A refused login is reported through the sink, not returned.
    ///
    /// # Errors
    ///
    /// * [`GatewayError::AlreadyConnected`] unless the session is `Disconnected`.
    pub fn connect(&mut self, login: QuoteLogin) -> Result<()> {
        if self.state != MdState::Disconnected {
            self.sink.write_log("market data session is already connected");
            return Err(GatewayError::AlreadyConnected);
        }
        if login.protocol == codes::PROTOCOL_UDP {
            self.api.set_udp_buffer_size(self.policy.udp_buffer_mb);
        }
        self.login = Some(login);
        self.login_server();
        Ok(())
    }

    /// Fired by the reconnect timer.
    pub fn reconnect(&mut self) {
        if self.state != MdState::Disconnected || self.login.is_none() {
            debug!("reconnect timer fired but session is {:?}", self.state);
            return;
        }
        self.reconnect_count += 1;
        info!("market data reconnect attempt {}", self.reconnect_count);
        self.login_server();
    }

    fn login_server(&mut self) {
        let Some(login) = self.login.clone() else {
            return;
        };
        self.state = MdState::Connecting;

        if let Err(err) = self.api.login(&login) {
            self.state = MdState::Disconnected;
            error!(
                "market data login to {}:{} failed: {err}",
                login.host, login.port
            );
            self.sink
                .write_error("market data login failed", err.error_id, &err.error_msg);
            return;
        }

        self.state = MdState::LoggedIn;
        self.sink.write_log("market data server login succeeded");

        self.query_contracts();
        self.state = MdState::ContractsLoaded;

        self.resubscribe();
        self.state = MdState::Subscribed;
    }

    fn query_contracts(&mut self) {
        for exchange in CONTRACT_EXCHANGES {
            let Some(code) = codes::exchange_to_quote(exchange) else {
                continue;
            };
            if let Err(err) = self.api.query_all_tickers(code) {
                self.report("contract query failed", &err);
            }
        }
    }

    /// Replays the registry: every entry is unsubscribed first, then every
    /// entry is subscribed again.
    fn resubscribe(&mut self) {
        if !self.state.is_logged_in() {
            return;
        }
        if self.registry.is_all_market() {
            info!("re-enabling whole-market subscription");
            if let Err(err) = self.api.subscribe_all_market_data() {
                self.report("whole-market subscription failed", &err);
            }
        }

        let batches: Vec<(i32, Vec<String>)> = self
            .registry
            .symbols_by_exchange()
            .into_iter()
            .filter_map(|(exchange, symbols)| {
                codes::exchange_to_quote(exchange).map(|code| (code, symbols))
            })
            .collect();
        if batches.is_empty() {
            return;
        }

        let udp = self
            .login
            .as_ref()
            .is_some_and(|login| login.protocol == codes::PROTOCOL_UDP);
        let drain = match self.policy.resubscribe {
            ResubscribePolicy::Always => true,
            ResubscribePolicy::TcpOnly => !udp,
        };

        if drain {
            for (code, symbols) in &batches {
                if let Err(err) = self.api.unsubscribe_market_data(symbols, *code) {
                    self.report("unsubscribe before resubscription failed", &err);
                }
            }
        }
        for (code, symbols) in &batches {
            info!("resubscribing {} contracts on exchange {code}", symbols.len());
            if let Err(err) = self.api.subscribe_market_data(symbols, *code) {
                self.report("resubscription failed", &err);
            }
        }
    }

    /// Records `key` and subscribes it if the session is logged in.
    ///
    /// While logged out the entry waits in the registry for the next login.
    pub fn subscribe(&mut self, key: ContractKey) -> Result<()> {
        let code = codes::exchange_to_quote(key.exchange)
            .ok_or(GatewayError::UnsupportedExchange(key.exchange))?;
        self.registry.add(key.clone());

        if !self.state.is_logged_in() {
            info!("subscription to {key} deferred until login");
            return Ok(());
        }
        info!("subscribing {key}");
        if let Err(err) = self
            .api
            .subscribe_market_data(std::slice::from_ref(&key.symbol), code)
        {
            self.report("market data subscription failed", &err);
        }
        Ok(())
    }

    pub fn subscribe_all(&mut self) {
        self.registry.enable_all_market();
        if !self.state.is_logged_in() {
            info!("whole-market subscription deferred until login");
            return;
        }
        if let Err(err) = self.api.subscribe_all_market_data() {
            self.report("whole-market subscription failed", &err);
        }
    }

    pub fn query_last_price(&mut self, key: &ContractKey) -> Result<()> {
        let code = codes::exchange_to_quote(key.exchange)
            .ok_or(GatewayError::UnsupportedExchange(key.exchange))?;
        if !self.state.is_logged_in() {
            return Err(GatewayError::NotConnected);
        }
        self.api
            .query_tickers_price_info(std::slice::from_ref(&key.symbol), code)?;
        Ok(())
    }

    pub fn latest_tick_time(&self, key: &ContractKey) -> Option<DateTime<FixedOffset>> {
        self.normalizer.last_seen(key)
    }

    /// Logs out and forgets the login so no reconnect follows.
    pub fn close(&mut self) {
        self.login = None;
        if self.state.is_logged_in() {
            if let Err(err) = self.api.logout() {
                warn!("market data logout failed: {err}");
            }
        }
        self.state = MdState::Disconnected;
    }

    /// Applies one vendor callback.
    ///
    /// # Returns
    ///
    /// * `Some(delay)` - The caller should call [`MdSession::reconnect`] after `delay`.
    /// * `None` - Nothing to schedule.
    pub fn handle_event(&mut self, event: QuoteEvent) -> Option<Duration> {
        match event {
            QuoteEvent::Disconnected { reason } => return self.on_disconnected(reason),
            QuoteEvent::Error(err) => self.report("market data api error", &err),
            QuoteEvent::SubscribeAck {
                ticker,
                exchange_id,
                error,
            } => {
                if let Some(err) = real_error(&error) {
                    error!("subscription of {ticker} on exchange {exchange_id} failed: {err}");
                    self.report("market data subscription failed", err);
                }
            }
            QuoteEvent::UnsubscribeAck {
                ticker,
                exchange_id,
                error,
            } => {
                if let Some(err) = real_error(&error) {
                    warn!("unsubscription of {ticker} on exchange {exchange_id} failed: {err}");
                    self.report("market data unsubscription failed", err);
                }
            }
            QuoteEvent::SubscribeAllAck { error } => {
                if let Some(err) = real_error(&error) {
                    self.report("whole-market subscription failed", err);
                }
            }
            QuoteEvent::Depth(raw) => self.on_depth(&raw),
            QuoteEvent::TickerInfo {
                exchange_id,
                info,
                error,
                is_last,
            } => self.on_ticker_info(exchange_id, info, error, is_last),
            QuoteEvent::PriceInfo {
                info,
                error,
                is_last,
            } => {
                if let Some(err) = real_error(&error) {
                    self.report("last price query failed", err);
                } else if let Some(info) = info {
                    info!(
                        "last price {} on exchange {}: {} (last page: {is_last})",
                        info.ticker, info.exchange_id, info.last_price
                    );
                }
            }
        }
        None
    }

    fn on_disconnected(&mut self, reason: i32) -> Option<Duration> {
        self.state = MdState::Disconnected;
        self.sink.write_log(&format!(
            "market data server disconnected, reason {reason}, reconnects so far {}",
            self.reconnect_count
        ));
        if self.login.is_none() {
            return None;
        }

        if !self.registry.is_empty() {
            let key = &self.policy.policy_key;
            if let Some(value) = self.config_store.get_config_value(key) {
                if !value.eq_ignore_ascii_case("y") {
                    info!(
                        "{key} is {value}, not reconnecting; {} subscriptions kept",
                        self.registry.len()
                    );
                    self.sink
                        .write_log(&format!("automatic reconnect disabled by {key}={value}"));
                    return None;
                }
            }
        }

        info!(
            "market data reconnect scheduled in {:?}",
            self.policy.reconnect_delay
        );
        Some(self.policy.reconnect_delay)
    }

    fn on_depth(&mut self, raw: &RawDepth) {
        match self.normalizer.normalize(raw) {
            Ok(tick) => self.sink.on_tick(tick),
            Err(rejected @ TickRejected::Stale { .. }) => debug!("ignoring tick: {rejected}"),
            Err(rejected) => warn!("dropping tick: {rejected}"),
        }
    }

    fn on_ticker_info(
        &mut self,
        exchange_id: i32,
        info: Option<RawTickerInfo>,
        error: Option<ApiError>,
        is_last: bool,
    ) {
        if let Some(err) = real_error(&error) {
            self.report("contract query failed", err);
        }
        if let Some(info) = info {
            match contract_from_ticker(&info) {
                Ok(meta) => {
                    if !meta.is_option() {
                        self.sink.on_contract(meta.clone());
                    }
                    self.directory.upsert(meta);
                }
                Err(err) => warn!("skipping contract {}: {err}", info.ticker),
            }
        }
        if is_last {
            if let Some(exchange) = codes::exchange_from_quote(exchange_id) {
                self.directory.mark_loaded(exchange);
                self.sink
                    .write_log(&format!("{exchange} contract information loaded"));
            }
        }
    }

    fn report(&self, msg: &str, err: &ApiError) {
        self.sink.write_error(msg, err.error_id, &err.error_msg);
    }
}

fn contract_from_ticker(info: &RawTickerInfo) -> Result<ContractMeta> {
    let exchange =
        codes::exchange_from_quote(info.exchange_id).ok_or(GatewayError::UnknownCode {
            field: "exchange_id",
            code: info.exchange_id,
        })?;
    let product = codes::product_from_vendor(info.ticker_type).unwrap_or(Product::Equity);
    let meta = ContractMeta::new(
        ContractKey::new(info.ticker.clone(), exchange),
        info.ticker_name.clone(),
        product,
        info.price_tick,
    )?
    .with_min_volume(info.buy_qty_unit as f64);
    Ok(meta)
}
