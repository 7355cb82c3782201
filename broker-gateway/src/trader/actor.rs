use super::session::{TdSession, TdState};
use crate::api::{TraderApi, TraderLogin, TraderSpi};
use crate::context::GatewayContext;
use crate::error::Result;
use crate::mailbox::{Mailbox, ReconnectTimer};
use crate::wire::TraderEvent;
use log::info;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use trading::{CancelRequest, OrderRecord, OrderRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdStatus {
    pub state: TdState,
    pub reconnect_count: u32,
    pub reconnect_pending: bool,
    pub margin_trading: bool,
    pub option_trading: bool,
}

/// Queries the host can issue against the trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdQuery {
    Account,
    Position,
    CreditAsset,
    CreditDebt,
}

pub(crate) enum TdMessage {
    Vendor(TraderEvent),
    ReconnectDue,
    Connect {
        login: TraderLogin,
        reply: oneshot::Sender<Result<()>>,
    },
    SendOrder {
        req: OrderRequest,
        reply: oneshot::Sender<Result<String>>,
    },
    CancelOrder {
        req: CancelRequest,
        reply: oneshot::Sender<Result<()>>,
    },
    Query {
        query: TdQuery,
        reply: oneshot::Sender<Result<()>>,
    },
    Order {
        order_id: String,
        reply: oneshot::Sender<Option<OrderRecord>>,
    },
    Status {
        reply: oneshot::Sender<TdStatus>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle on a running trading session.
#[derive(Debug, Clone)]
pub struct TdHandle {
    mailbox: Mailbox<TdMessage>,
}

impl TdHandle {
    /// Starts the session task. Must be called inside a tokio runtime.
    pub fn spawn(api: Box<dyn TraderApi>, context: &GatewayContext, reconnect_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let spi_tx = tx.downgrade();
        let spi = TraderSpi::new(move |event| {
            if let Some(tx) = spi_tx.upgrade() {
                let _ = tx.send(TdMessage::Vendor(event));
            }
        });

        let session = TdSession::new(api, spi, context, reconnect_delay);
        tokio::spawn(run(session, rx, tx.downgrade()));
        Self {
            mailbox: Mailbox::new(tx),
        }
    }

    pub async fn connect(&self, login: TraderLogin) -> Result<()> {
        self.mailbox
            .request(|reply| TdMessage::Connect { login, reply })
            .await?
    }

    pub async fn send_order(&self, req: OrderRequest) -> Result<String> {
        self.mailbox
            .request(|reply| TdMessage::SendOrder { req, reply })
            .await?
    }

    pub async fn cancel_order(&self, req: CancelRequest) -> Result<()> {
        self.mailbox
            .request(|reply| TdMessage::CancelOrder { req, reply })
            .await?
    }

    pub async fn query(&self, query: TdQuery) -> Result<()> {
        self.mailbox
            .request(|reply| TdMessage::Query { query, reply })
            .await?
    }

    /// The cached view of one order.
    pub async fn order(&self, order_id: impl Into<String>) -> Result<Option<OrderRecord>> {
        let order_id = order_id.into();
        self.mailbox
            .request(|reply| TdMessage::Order { order_id, reply })
            .await
    }

    pub async fn status(&self) -> Result<TdStatus> {
        self.mailbox.request(|reply| TdMessage::Status { reply }).await
    }

    pub async fn close(&self) -> Result<()> {
        self.mailbox.request(|reply| TdMessage::Close { reply }).await
    }
}

async fn run(
    mut session: TdSession,
    mut rx: mpsc::UnboundedReceiver<TdMessage>,
    timer_tx: mpsc::WeakUnboundedSender<TdMessage>,
) {
    let mut reconnect = ReconnectTimer::new(timer_tx, "trading");

    while let Some(message) = rx.recv().await {
        match message {
            TdMessage::Vendor(event) => {
                if let Some(delay) = session.handle_event(event) {
                    reconnect.schedule(delay, TdMessage::ReconnectDue);
                }
            }
            TdMessage::ReconnectDue => {
                reconnect.fired();
                session.reconnect();
            }
            TdMessage::Connect { login, reply } => {
                let _ = reply.send(session.connect(login));
            }
            TdMessage::SendOrder { req, reply } => {
                let _ = reply.send(session.send_order(req));
            }
            TdMessage::CancelOrder { req, reply } => {
                let _ = reply.send(session.cancel_order(&req));
            }
            TdMessage::Query { query, reply } => {
                let result = match query {
                    TdQuery::Account => session.query_account(),
                    TdQuery::Position => session.query_position(),
                    TdQuery::CreditAsset => session.query_credit_asset(),
                    TdQuery::CreditDebt => session.query_credit_debt(),
                };
                let _ = reply.send(result);
            }
            TdMessage::Order { order_id, reply } => {
                let _ = reply.send(session.reconciler().get(&order_id).cloned());
            }
            TdMessage::Status { reply } => {
                let flags = session.flags();
                let _ = reply.send(TdStatus {
                    state: session.state(),
                    reconnect_count: session.reconnect_count(),
                    reconnect_pending: reconnect.is_pending(),
                    margin_trading: flags.margin_trading,
                    option_trading: flags.option_trading,
                });
            }
            TdMessage::Close { reply } => {
                reconnect.cancel();
                session.close();
                let _ = reply.send(());
                break;
            }
        }
    }

    reconnect.cancel();
    info!("trading session stopped");
}
