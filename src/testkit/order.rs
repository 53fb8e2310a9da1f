//! In-memory order system.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::port::{OrderGateway, OrderRequest};

#[derive(Default)]
struct Orders {
    created: Vec<OrderRequest>,
    confirmed: Vec<String>,
    payments: Vec<OrderRequest>,
    fail_create: HashSet<String>,
    reject_confirm: bool,
}

/// Records created and confirmed orders.
///
/// Order ids are `"1001"`, `"1002"`, ... in creation order.
#[derive(Default)]
pub struct RecordingOrders {
    inner: Mutex<Orders>,
}

impl RecordingOrders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail order creation for a transaction reference.
    pub fn fail_create_for(&self, transaction_reference: &str) {
        self.inner
            .lock()
            .fail_create
            .insert(transaction_reference.to_string());
    }

    /// Answer every confirmation with "not confirmed".
    pub fn reject_confirmations(&self) {
        self.inner.lock().reject_confirm = true;
    }

    pub fn created(&self) -> Vec<OrderRequest> {
        self.inner.lock().created.clone()
    }

    pub fn confirmed(&self) -> Vec<String> {
        self.inner.lock().confirmed.clone()
    }

    pub fn payments(&self) -> Vec<OrderRequest> {
        self.inner.lock().payments.clone()
    }
}

#[async_trait]
impl OrderGateway for RecordingOrders {
    async fn create_order(&self, request: &OrderRequest) -> Result<String> {
        let mut inner = self.inner.lock();
        if inner.fail_create.contains(&request.transaction_reference) {
            return Err(Error::Order("order system unavailable".into()));
        }
        inner.created.push(request.clone());
        Ok((1000 + inner.created.len()).to_string())
    }

    async fn confirm_order(&self, order_id: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.reject_confirm {
            return Ok(false);
        }
        inner.confirmed.push(order_id.to_string());
        Ok(true)
    }

    async fn notify_payment(&self, request: &OrderRequest) -> Result<()> {
        self.inner.lock().payments.push(request.clone());
        Ok(())
    }
}
