use super::session::{MdPolicy, MdSession, MdState};
use crate::api::{QuoteApi, QuoteLogin, QuoteSpi};
use crate::context::GatewayContext;
use crate::error::Result;
use crate::mailbox::{Mailbox, ReconnectTimer};
use crate::wire::QuoteEvent;
use chrono::{DateTime, FixedOffset};
use log::info;
use tokio::sync::{mpsc, oneshot};
use trading::ContractKey;

/// Snapshot of a market-data session, mostly for monitoring and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdStatus {
    pub state: MdState,
    pub reconnect_count: u32,
    pub reconnect_pending: bool,
}

pub(crate) enum MdMessage {
    Vendor(QuoteEvent),
    ReconnectDue,
    Connect {
        login: QuoteLogin,
        reply: oneshot::Sender<Result<()>>,
    },
    Subscribe {
        key: ContractKey,
        reply: oneshot::Sender<Result<()>>,
    },
    SubscribeAll,
    QueryLastPrice {
        key: ContractKey,
        reply: oneshot::Sender<Result<()>>,
    },
    LatestTickTime {
        key: ContractKey,
        reply: oneshot::Sender<Option<DateTime<FixedOffset>>>,
    },
    Status {
        reply: oneshot::Sender<MdStatus>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle on a running market-data session.
///
/// The session task stops on [`MdHandle::close`] or once every handle is dropped.
#[derive(Debug, Clone)]
pub struct MdHandle {
    mailbox: Mailbox<MdMessage>,
}

impl MdHandle {
    /// Starts the session task. Must be called inside a tokio runtime.
    pub fn spawn(api: Box<dyn QuoteApi>, context: &GatewayContext, policy: MdPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // weak so that the venue holding the spi does not keep the task alive
        let spi_tx = tx.downgrade();
        let spi = QuoteSpi::new(move |event| {
            if let Some(tx) = spi_tx.upgrade() {
                let _ = tx.send(MdMessage::Vendor(event));
            }
        });

        let session = MdSession::new(api, spi, context, policy);
        tokio::spawn(run(session, rx, tx.downgrade()));
        Self {
            mailbox: Mailbox::new(tx),
        }
    }

    pub async fn connect(&self, login: QuoteLogin) -> Result<()> {
        self.mailbox
            .request(|reply| MdMessage::Connect { login, reply })
            .await?
    }

    pub async fn subscribe(&self, key: ContractKey) -> Result<()> {
        self.mailbox
            .request(|reply| MdMessage::Subscribe { key, reply })
            .await?
    }

    pub fn subscribe_all(&self) -> Result<()> {
        self.mailbox.send(MdMessage::SubscribeAll)
    }

    pub async fn query_last_price(&self, key: ContractKey) -> Result<()> {
        self.mailbox
            .request(|reply| MdMessage::QueryLastPrice { key, reply })
            .await?
    }

    pub async fn latest_tick_time(&self, key: ContractKey) -> Result<Option<DateTime<FixedOffset>>> {
        self.mailbox
            .request(|reply| MdMessage::LatestTickTime { key, reply })
            .await
    }

    pub async fn status(&self) -> Result<MdStatus> {
        self.mailbox.request(|reply| MdMessage::Status { reply }).await
    }

    pub async fn close(&self) -> Result<()> {
        self.mailbox.request(|reply| MdMessage::Close { reply }).await
    }
}

async fn run(
    mut session: MdSession,
    mut rx: mpsc::UnboundedReceiver<MdMessage>,
    timer_tx: mpsc::WeakUnboundedSender<MdMessage>,
) {
    let mut reconnect = ReconnectTimer::new(timer_tx, "market data");

    while let Some(message) = rx.recv().await {
        match message {
            MdMessage::Vendor(event) => {
                if let Some(delay) = session.handle_event(event) {
                    reconnect.schedule(delay, MdMessage::ReconnectDue);
                }
            }
            MdMessage::ReconnectDue => {
                reconnect.fired();
                session.reconnect();
            }
            MdMessage::Connect { login, reply } => {
                let _ = reply.send(session.connect(login));
            }
            MdMessage::Subscribe { key, reply } => {
                let _ = reply.send(session.subscribe(key));
            }
            MdMessage::SubscribeAll => session.subscribe_all(),
            MdMessage::QueryLastPrice { key, reply } => {
                let _ = reply.send(session.query_last_price(&key));
            }
            MdMessage::LatestTickTime { key, reply } => {
                let _ = reply.send(session.latest_tick_time(&key));
            }
            MdMessage::Status { reply } => {
                let _ = reply.send(MdStatus {
                    state: session.state(),
                    reconnect_count: session.reconnect_count(),
                    reconnect_pending: reconnect.is_pending(),
                });
            }
            MdMessage::Close { reply } => {
                reconnect.cancel();
                session.close();
                let _ = reply.send(());
                break;
            }
        }
    }

    reconnect.cancel();
    info!("market data session stopped");
}
