//! Order system port.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::error::Result;

/// Order details derived from a credit transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Order reference found in the transfer description.
    pub order_reference: String,
    /// Bank transaction reference.
    pub transaction_reference: String,
    pub customer_name: String,
    pub amount: Decimal,
    /// Posting time, when the portal showed a readable one.
    pub paid_at: Option<NaiveDateTime>,
}

/// Creates and confirms orders for incoming payments.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create an order, returning its identifier.
    async fn create_order(&self, request: &OrderRequest) -> Result<String>;

    /// Mark an order as paid. `Ok(false)` means the system answered but did
    /// not confirm.
    async fn confirm_order(&self, order_id: &str) -> Result<bool>;

    /// Push the payment to an external webhook, when one is configured.
    async fn notify_payment(&self, _request: &OrderRequest) -> Result<()> {
        Ok(())
    }
}
