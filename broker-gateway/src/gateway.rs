//! The host-facing facade.
//!
//! [`XtpGateway`] owns one market-data actor, one trading actor and the
//! periodic query timer, and routes every [`Gateway`] call to the session
//! that serves it.

use crate::api::{QuoteApi, QuoteLogin, TraderApi, TraderLogin};
use crate::codes;
use crate::context::GatewayContext;
use crate::error::{GatewayError, Result};
use crate::market_data::{MdHandle, MdPolicy, MdStatus};
use crate::trader::{TdHandle, TdQuery, TdStatus};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use log::{debug, info, warn};
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use trading::{CancelRequest, ContractKey, Gateway, OrderRecord, OrderRequest};
use trading_core::settings::{GatewaySettings, TransportProtocol};
use trading_core::{QueryScheduler, TradingWindows};

pub struct XtpGateway {
    settings: GatewaySettings,
    context: GatewayContext,
    md: MdHandle,
    td: TdHandle,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl XtpGateway {
    /// Spawns both session actors. Nothing connects until [`Gateway::connect`].
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        settings: GatewaySettings,
        context: GatewayContext,
        quote_api: Box<dyn QuoteApi>,
        trader_api: Box<dyn TraderApi>,
    ) -> Self {
        let md = MdHandle::spawn(quote_api, &context, MdPolicy::from_settings(&settings));
        let td = TdHandle::spawn(trader_api, &context, settings.reconnect_delay());
        Self {
            settings,
            context,
            md,
            td,
            timer: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &GatewayContext {
        &self.context
    }

    pub async fn market_data_status(&self) -> Result<MdStatus> {
        self.md.status().await
    }

    pub async fn trading_status(&self) -> Result<TdStatus> {
        self.td.status().await
    }

    /// The cached state of one order.
    pub async fn order(&self, order_id: &str) -> Result<Option<OrderRecord>> {
        self.td.order(order_id).await
    }

    fn vendor_log_level(&self) -> Result<i32> {
        codes::log_level_code(&self.settings.vendor_log_level).ok_or_else(|| {
            GatewayError::InvalidSetting {
                field: "vendor_log_level",
                reason: format!("unknown level `{}`", self.settings.vendor_log_level),
            }
        })
    }

    fn quote_login(&self) -> Result<QuoteLogin> {
        let settings = &self.settings;
        let protocol = match settings.quote.protocol {
            TransportProtocol::Tcp => codes::PROTOCOL_TCP,
            TransportProtocol::Udp => codes::PROTOCOL_UDP,
        };
        Ok(QuoteLogin {
            host: settings.quote.host.clone(),
            port: settings.quote.port,
            account_id: settings.account_id.clone(),
            password: settings.password.clone(),
            protocol,
            heartbeat_secs: settings.quote.heartbeat_secs,
            client_id: settings.client_id,
            local_ip: settings.local_ip.clone(),
            log_level: self.vendor_log_level()?,
        })
    }

    fn trader_login(&self) -> Result<TraderLogin> {
        let settings = &self.settings;
        Ok(TraderLogin {
            host: settings.trader.host.clone(),
            port: settings.trader.port,
            account_id: settings.account_id.clone(),
            password: settings.password.clone(),
            client_id: settings.client_id,
            software_key: settings.software_key.clone(),
            local_ip: settings.local_ip.clone(),
            log_level: self.vendor_log_level()?,
        })
    }

    fn start_timer(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.is_some() {
            return;
        }

        let td = self.td.clone();
        let period = self.settings.timer_interval();
        let mut scheduler = QueryScheduler::new(
            vec![TdQuery::Position],
            self.settings.scheduler.threshold,
            self.settings.scheduler.windows.clone(),
        );

        *timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(query) = scheduler.on_timer(TradingWindows::local_now()) else {
                    continue;
                };
                match td.query(query).await {
                    Ok(()) => debug!("periodic {query:?} query sent"),
                    Err(GatewayError::NotConnected) => {
                        debug!("periodic {query:?} query skipped while disconnected")
                    }
                    Err(GatewayError::SessionClosed) => break,
                    Err(err) => warn!("periodic {query:?} query failed: {err}"),
                }
            }
        }));
        info!("periodic query timer started every {period:?}");
    }

    fn stop_timer(&self) {
        if let Some(timer) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}

impl Drop for XtpGateway {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

#[async_trait]
impl Gateway for XtpGateway {
    type Error = GatewayError;

    async fn connect(&self) -> Result<()> {
        let quote_login = self.quote_login()?;
        let trader_login = self.trader_login()?;

        self.md.connect(quote_login).await?;
        self.td.connect(trader_login).await?;
        self.start_timer();
        Ok(())
    }

    async fn subscribe(&self, key: ContractKey) -> Result<()> {
        self.md.subscribe(key).await
    }

    async fn subscribe_all(&self) -> Result<()> {
        self.md.subscribe_all()
    }

    async fn send_order(&self, req: OrderRequest) -> Result<String> {
        self.td.send_order(req).await
    }

    async fn cancel_order(&self, req: CancelRequest) -> Result<()> {
        self.td.cancel_order(req).await
    }

    async fn query_account(&self) -> Result<()> {
        self.td.query(TdQuery::Account).await
    }

    async fn query_position(&self) -> Result<()> {
        self.td.query(TdQuery::Position).await
    }

    async fn query_credit_asset(&self) -> Result<()> {
        self.td.query(TdQuery::CreditAsset).await
    }

    async fn query_credit_debt(&self) -> Result<()> {
        self.td.query(TdQuery::CreditDebt).await
    }

    async fn query_last_price(&self, key: ContractKey) -> Result<()> {
        self.md.query_last_price(key).await
    }

    async fn query_local_latest_tick_time(
        &self,
        key: ContractKey,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        self.md.latest_tick_time(key).await
    }

    /// Stops the timer and both sessions. Pending reconnects are cancelled.
    async fn close(&self) -> Result<()> {
        self.stop_timer();
        let md = self.md.close().await;
        let td = self.td.close().await;
        info!("gateway closed");
        md.and(td)
    }
}
