use crate::model::contract::ContractKey;
use crate::model::order::{CancelRequest, OrderRequest};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

/// The host-facing surface of a broker gateway.
///
/// Queries are fire-and-forget: their results arrive later through the
/// gateway's event sink.
#[async_trait]
pub trait Gateway: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Starts both sessions with the configured credentials.
    async fn connect(&self) -> Result<(), Self::Error>;

    async fn subscribe(&self, key: ContractKey) -> Result<(), Self::Error>;

    /// Switches the market-data session to whole-market mode. Irreversible.
    async fn subscribe_all(&self) -> Result<(), Self::Error>;

    /// Sends an order.
    ///
    /// # Returns
    ///
    /// * `Ok(order_id)` - The broker-assigned order id.
    /// * `Err` - The request failed validation or the broker refused it.
    async fn send_order(&self, req: OrderRequest) -> Result<String, Self::Error>;

    async fn cancel_order(&self, req: CancelRequest) -> Result<(), Self::Error>;

    async fn query_account(&self) -> Result<(), Self::Error>;

    async fn query_position(&self) -> Result<(), Self::Error>;

    async fn query_credit_asset(&self) -> Result<(), Self::Error>;

    async fn query_credit_debt(&self) -> Result<(), Self::Error>;

    async fn query_last_price(&self, key: ContractKey) -> Result<(), Self::Error>;

    /// Timestamp of the newest tick accepted for `key`, if any.
    async fn query_local_latest_tick_time(
        &self,
        key: ContractKey,
    ) -> Result<Option<DateTime<FixedOffset>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;
}
