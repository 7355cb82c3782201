//! Plumbing shared by the session actors: the request/reply mailbox handles
//! hold, and the abortable reconnect timer the session tasks own.

use crate::error::{GatewayError, Result};
use log::debug;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Sending side of a session task's queue.
pub(crate) struct Mailbox<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Mailbox<M> {
    pub fn new(tx: mpsc::UnboundedSender<M>) -> Self {
        Self { tx }
    }

    /// Fire-and-forget send.
    pub fn send(&self, message: M) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| GatewayError::SessionClosed)
    }

    /// Sends a message carrying a reply channel and waits for the answer.
    pub async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> M) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply))?;
        response.await.map_err(|_| GatewayError::SessionClosed)
    }
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// At most one pending reconnect, delivered back into the session queue.
///
/// Holds a weak sender so a pending timer never keeps the task alive.
pub(crate) struct ReconnectTimer<M> {
    tx: mpsc::WeakUnboundedSender<M>,
    pending: Option<JoinHandle<()>>,
    label: &'static str,
}

impl<M: Send + 'static> ReconnectTimer<M> {
    pub fn new(tx: mpsc::WeakUnboundedSender<M>, label: &'static str) -> Self {
        Self {
            tx,
            pending: None,
            label,
        }
    }

    /// Replaces any pending reconnect with one delivering `due` after `delay`.
    pub fn schedule(&mut self, delay: Duration, due: M) {
        if self.pending.is_some() {
            debug!("replacing pending {} reconnect", self.label);
        }
        self.cancel();
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(due);
            }
        }));
    }

    /// Marks the pending reconnect as delivered.
    pub fn fired(&mut self) {
        self.pending = None;
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<M> Drop for ReconnectTimer<M> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}
