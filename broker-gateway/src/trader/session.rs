use super::aggregator::{
    account_from_asset, account_from_credit_fund, position_from_raw, AccountKind,
    ShortPositionAccumulator,
};
use super::decode::{decode_option_contract, decode_order, decode_trade};
use super::reconciler::{OrderReconciler, ReconcileError};
use super::request::{encode_order, AccountFlags};
use crate::api::{real_error, ApiError, TraderApi, TraderLogin, TraderSpi};
use crate::context::GatewayContext;
use crate::error::{GatewayError, Result};
use crate::wire::{RawOrder, RawTrade, TraderEvent};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use trading::{CancelRequest, ContractStore, EventSink, OrderRequest};
use trading_core::ContractDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdState {
    Disconnected,
    Connecting,
    LoggedIn,
    /// Contracts bootstrapped and initial queries sent.
    Initialized,
}

impl TdState {
    pub fn is_ready(&self) -> bool {
        matches!(self, TdState::LoggedIn | TdState::Initialized)
    }
}

/// The trading session state machine and the single writer of its order cache.
pub struct TdSession {
    api: Box<dyn TraderApi>,
    state: TdState,
    login: Option<TraderLogin>,
    session_id: u64,
    request_id: i32,
    flags: AccountFlags,
    reconciler: OrderReconciler,
    shorts: ShortPositionAccumulator,
    directory: ContractDirectory,
    sink: Arc<dyn EventSink>,
    contract_store: Arc<dyn ContractStore>,
    reconnect_delay: Duration,
    reconnect_count: u32,
}

impl TdSession {
    pub fn new(
        mut api: Box<dyn TraderApi>,
        spi: TraderSpi,
        context: &GatewayContext,
        reconnect_delay: Duration,
    ) -> Self {
        api.register_spi(spi);
        Self {
            api,
            state: TdState::Disconnected,
            login: None,
            session_id: 0,
            request_id: 0,
            flags: AccountFlags::default(),
            reconciler: OrderReconciler::new(),
            shorts: ShortPositionAccumulator::new(),
            directory: context.directory.clone(),
            sink: Arc::clone(&context.sink),
            contract_store: Arc::clone(&context.contract_store),
            reconnect_delay,
            reconnect_count: 0,
        }
    }

    pub fn state(&self) -> TdState {
        self.state
    }

    pub fn flags(&self) -> AccountFlags {
        self.flags
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count
    }

    pub fn reconciler(&self) -> &OrderReconciler {
        &self.reconciler
    }

    /// # Errors
    ///
    /// * [`GatewayError::AlreadyConnected`] unless the session is `Disconnected`.
    pub fn connect(&mut self, login: TraderLogin) -> Result<()> {
        if self.state != TdState::Disconnected {
            self.sink.write_log("trading session is already connected");
            return Err(GatewayError::AlreadyConnected);
        }
        self.login = Some(login);
        self.login_server();
        Ok(())
    }

    pub fn reconnect(&mut self) {
        if self.state != TdState::Disconnected || self.login.is_none() {
            return;
        }
        self.reconnect_count += 1;
        info!("trading reconnect attempt {}", self.reconnect_count);
        self.login_server();
    }

    fn login_server(&mut self) {
        let Some(login) = self.login.clone() else {
            return;
        };
        self.state = TdState::Connecting;

        match self.api.login(&login) {
            Ok(session_id) => {
                self.session_id = session_id;
                self.state = TdState::LoggedIn;
                self.sink.write_log("trading server login succeeded");
                self.init();
            }
            Err(err) => {
                self.state = TdState::Disconnected;
                error!("trading login to {}:{} failed: {err}", login.host, login.port);
                self.sink
                    .write_error("trading login failed", err.error_id, &err.error_msg);
            }
        }
    }

    fn init(&mut self) {
        match self.contract_store.get_all_contracts() {
            Ok(contracts) => {
                let loaded = self.directory.extend(contracts);
                info!("loaded {loaded} contracts from the contract store");
            }
            Err(err) => {
                warn!("contract store unavailable: {err:#}");
                self.sink
                    .write_log(&format!("failed to load stored contracts: {err}"));
            }
        }

        let request_id = self.next_request_id();
        if let Err(err) = self.api.query_option_auction_info(self.session_id, request_id) {
            self.report("option contract query failed", &err);
        }
        self.refresh_funds();
        self.state = TdState::Initialized;
    }

    fn next_request_id(&mut self) -> i32 {
        self.request_id += 1;
        self.request_id
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(GatewayError::NotConnected)
        }
    }

    /// Validates, encodes and submits an order.
    ///
    /// # Returns
    ///
    /// * `Ok(order_id)` - The order is tracked as `Submitting` and was published.
    /// * `Err` - Validation failed or the venue refused it; nothing is tracked.
    pub fn send_order(&mut self, req: OrderRequest) -> Result<String> {
        let insert = match encode_order(&req, self.flags) {
            Ok(insert) => insert,
            Err(err) => {
                warn!("order for {} rejected: {err}", req.key);
                self.sink.write_log(&format!("order rejected: {err}"));
                return Err(err);
            }
        };
        self.ensure_ready()?;

        let order_xtp_id = match self.api.insert_order(&insert, self.session_id) {
            Ok(id) => id,
            Err(err) => {
                self.report("order insert failed", &err);
                return Err(err.into());
            }
        };

        let order = req.create_order(order_xtp_id.to_string());
        self.reconciler.track_submitted(order.clone());
        self.sink.on_order(order);
        Ok(order_xtp_id.to_string())
    }

    /// Requests a cancel. The order itself only changes when the venue says so.
    pub fn cancel_order(&mut self, req: &CancelRequest) -> Result<()> {
        let order_xtp_id: u64 = req
            .order_id
            .parse()
            .map_err(|_| GatewayError::InvalidOrderId(req.order_id.clone()))?;
        self.ensure_ready()?;
        if let Err(err) = self.api.cancel_order(order_xtp_id, self.session_id) {
            self.report("cancel request failed", &err);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn query_account(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let request_id = self.next_request_id();
        self.api.query_asset(self.session_id, request_id)?;
        Ok(())
    }

    /// Queries positions, plus borrowed securities on a margin account.
    pub fn query_position(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let request_id = self.next_request_id();
        self.api.query_position("", self.session_id, request_id)?;
        if self.flags.margin_trading {
            self.query_credit_debt()?;
        }
        Ok(())
    }

    pub fn query_credit_asset(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let request_id = self.next_request_id();
        self.api.query_credit_fund_info(self.session_id, request_id)?;
        Ok(())
    }

    /// Starts a new debt cycle; totals left by an unfinished one are dropped.
    pub fn query_credit_debt(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.shorts.reset();
        let request_id = self.next_request_id();
        self.api.query_credit_debt_info(self.session_id, request_id)?;
        Ok(())
    }

    /// Account and credit queries, sent after login and after every fill.
    fn refresh_funds(&mut self) {
        if let Err(err) = self.query_account() {
            warn!("account query failed: {err}");
        }
        if let Err(err) = self.query_credit_asset() {
            warn!("credit asset query failed: {err}");
        }
    }

    pub fn close(&mut self) {
        self.login = None;
        if self.state.is_ready() {
            if let Err(err) = self.api.logout(self.session_id) {
                warn!("trading logout failed: {err}");
            }
        }
        self.state = TdState::Disconnected;
    }

    /// Applies one vendor callback.
    ///
    /// # Returns
    ///
    /// * `Some(delay)` - The caller should call [`TdSession::reconnect`] after `delay`.
    /// * `None` - Nothing to schedule.
    pub fn handle_event(&mut self, event: TraderEvent) -> Option<Duration> {
        match event {
            TraderEvent::Disconnected { reason } => {
                self.state = TdState::Disconnected;
                self.shorts.reset();
                self.sink.write_log(&format!(
                    "trading server disconnected, reason {reason}, reconnects so far {}",
                    self.reconnect_count
                ));
                if self.login.is_some() {
                    return Some(self.reconnect_delay);
                }
            }
            TraderEvent::Error(err) => self.report("trading api error", &err),
            TraderEvent::Order { order, error } => self.on_order_event(&order, error),
            TraderEvent::Trade(trade) => self.on_trade_event(&trade),
            TraderEvent::CancelError {
                order_xtp_id,
                error,
            } => {
                if error.is_error() {
                    warn!("cancel of order {order_xtp_id} failed: {error}");
                    self.report("cancel failed", &error);
                }
            }
            TraderEvent::Position {
                position,
                error,
                is_last,
            } => {
                if let Some(err) = real_error(&error) {
                    self.report("position query failed", err);
                } else if let Some(raw) = position {
                    match position_from_raw(&raw) {
                        Ok(Some(position)) => self.sink.on_position(position),
                        Ok(None) => {}
                        Err(err) => warn!("skipping position {}: {err}", raw.ticker),
                    }
                }
                if is_last {
                    debug!("position query complete");
                }
            }
            TraderEvent::Asset { asset, error } => {
                if let Some(err) = real_error(&error) {
                    self.report("account query failed", err);
                    return None;
                }
                let account_id = self.account_id();
                let (account, kind) = account_from_asset(&asset, &account_id);
                match kind {
                    AccountKind::Margin => self.flags.margin_trading = true,
                    AccountKind::Option => self.flags.option_trading = true,
                    AccountKind::Cash => {}
                }
                self.sink.on_account(account);
            }
            TraderEvent::CreditFund { fund, error } => {
                if let Some(err) = real_error(&error) {
                    error!("credit asset query failed: {err}");
                    return None;
                }
                let account_id = self.account_id();
                self.sink
                    .on_account(account_from_credit_fund(&fund, &account_id));
            }
            TraderEvent::CreditDebt {
                debt,
                error,
                is_last,
            } => {
                if let Some(err) = real_error(&error) {
                    self.report("credit debt query failed", err);
                    self.shorts.discard();
                } else if let Some(debt) = debt {
                    if let Err(err) = self.shorts.add(&debt) {
                        warn!("skipping debt record {}: {err}", debt.ticker);
                    }
                }
                if is_last {
                    for position in self.shorts.flush() {
                        self.sink.on_position(position);
                    }
                }
            }
            TraderEvent::OptionInfo {
                info,
                error,
                is_last,
            } => {
                if let Some(err) = real_error(&error) {
                    self.report("option contract query failed", err);
                } else if let Some(info) = info.filter(|info| !info.ticker.is_empty()) {
                    match decode_option_contract(&info) {
                        Ok(meta) => {
                            self.sink.on_contract(meta.clone());
                            self.directory.upsert(meta);
                        }
                        Err(err) => warn!("skipping option contract {}: {err}", info.ticker),
                    }
                }
                if is_last {
                    self.sink.write_log("option contract information loaded");
                }
            }
        }
        None
    }

    fn on_order_event(&mut self, raw: &RawOrder, error: Option<ApiError>) {
        if let Some(err) = real_error(&error) {
            warn!("order {} reported error: {err}", raw.order_xtp_id);
            self.report("order error", err);
        }
        match decode_order(raw) {
            Ok(update) => {
                let order = self.reconciler.apply_update(update);
                self.sink.on_order(order);
            }
            Err(err) => {
                warn!("dropping order event {}: {err}", raw.order_xtp_id);
                self.sink
                    .write_log(&format!("undecodable order event {}: {err}", raw.order_xtp_id));
            }
        }
    }

    fn on_trade_event(&mut self, raw: &RawTrade) {
        let trade = match decode_trade(raw) {
            Ok(trade) => trade,
            Err(err) => {
                warn!("dropping trade event {}: {err}", raw.exec_id);
                self.sink
                    .write_log(&format!("undecodable trade event {}: {err}", raw.exec_id));
                return;
            }
        };

        match self.reconciler.apply_fill(trade) {
            Ok(outcome) => {
                self.sink.on_order(outcome.order);
                self.sink.on_trade(outcome.trade);
                if outcome.refresh_account {
                    self.refresh_funds();
                }
            }
            Err(err @ ReconcileError::UnknownOrder { .. }) => {
                warn!("{err}");
                self.sink.write_log(&err.to_string());
            }
            Err(err @ ReconcileError::DuplicateTrade(_)) => debug!("{err}"),
        }
    }

    fn account_id(&self) -> String {
        self.login
            .as_ref()
            .map(|login| login.account_id.clone())
            .unwrap_or_default()
    }

    fn report(&self, msg: &str, err: &ApiError) {
        self.sink.write_error(msg, err.error_id, &err.error_msg);
    }
}
