//! WooCommerce REST gateway.
//!
//! Orders are created as bank-transfer orders carrying the credited amount
//! as a fee line, then confirmed by moving them to `completed`. An optional
//! payment webhook receives the detected order reference.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::port::{OrderGateway, OrderRequest};

const ORDERS_PATH: &str = "/wp-json/wc/v3/orders";

/// Connection details for a WooCommerce store.
#[derive(Debug, Clone)]
pub struct WooSettings {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Payment webhook; disabled when `None` or without a token.
    pub webhook_url: Option<String>,
    pub secure_token: Option<String>,
    /// Account identifier reported to the webhook.
    pub sub_account: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct CreateOrder<'a> {
    payment_method: &'static str,
    payment_method_title: &'static str,
    set_paid: bool,
    billing: Billing<'a>,
    fee_lines: Vec<FeeLine>,
}

#[derive(Serialize)]
struct Billing<'a> {
    first_name: &'a str,
}

#[derive(Serialize)]
struct FeeLine {
    name: &'static str,
    total: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: u64,
}

#[derive(Serialize)]
struct PaymentWebhook<'a> {
    error: u8,
    data: Vec<PaymentEntry<'a>>,
}

#[derive(Serialize)]
struct PaymentEntry<'a> {
    description: &'a str,
    amount: f64,
    when: Option<String>,
    #[serde(rename = "subAccId")]
    sub_account: &'a str,
}

/// [`OrderGateway`] backed by the WooCommerce REST API.
pub struct WooCommerceGateway {
    client: Client,
    settings: WooSettings,
}

impl WooCommerceGateway {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(mut settings: WooSettings) -> Result<Self> {
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().timeout(settings.timeout).build()?,
            settings,
        })
    }

    fn orders_url(&self) -> String {
        format!("{}{ORDERS_PATH}", self.settings.base_url)
    }
}

#[async_trait]
impl OrderGateway for WooCommerceGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<String> {
        let customer = match request.customer_name.trim() {
            "" => "Unknown",
            name => name,
        };
        let payload = CreateOrder {
            payment_method: "bacs",
            payment_method_title: "Bank Transfer",
            set_paid: false,
            billing: Billing {
                first_name: customer,
            },
            fee_lines: vec![FeeLine {
                name: "Bank Transaction",
                total: format!("{:.2}", request.amount.round_dp(2)),
            }],
        };

        let created: OrderResponse = self
            .client
            .post(self.orders_url())
            .basic_auth(&self.settings.consumer_key, Some(&self.settings.consumer_secret))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Order(format!("create order: {e}")))?
            .json()
            .await?;

        info!(
            order_id = created.id,
            order_reference = %request.order_reference,
            "Order created"
        );
        Ok(created.id.to_string())
    }

    async fn confirm_order(&self, order_id: &str) -> Result<bool> {
        let confirmed: OrderResponse = self
            .client
            .post(format!("{}/{order_id}", self.orders_url()))
            .basic_auth(&self.settings.consumer_key, Some(&self.settings.consumer_secret))
            .json(&serde_json::json!({ "status": "completed" }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Order(format!("confirm order {order_id}: {e}")))?
            .json()
            .await?;

        Ok(confirmed.id.to_string() == order_id)
    }

    async fn notify_payment(&self, request: &OrderRequest) -> Result<()> {
        let (Some(url), Some(token)) = (&self.settings.webhook_url, &self.settings.secure_token)
        else {
            return Ok(());
        };

        let payload = PaymentWebhook {
            error: 0,
            data: vec![PaymentEntry {
                description: &request.order_reference,
                amount: request.amount.to_f64().unwrap_or_default(),
                when: request
                    .paid_at
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
                sub_account: &self.settings.sub_account,
            }],
        };

        self.client
            .post(url)
            .header("Secure-Token", token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Order(format!("payment webhook: {e}")))?;
        debug!(order_reference = %request.order_reference, "Payment webhook delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::local;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> WooSettings {
        WooSettings {
            base_url: format!("{}/", server.uri()),
            consumer_key: "ck_test".into(),
            consumer_secret: "cs_test".into(),
            webhook_url: None,
            secure_token: None,
            sub_account: "839689988".into(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> OrderRequest {
        OrderRequest {
            order_reference: "GH123456".into(),
            transaction_reference: "FT25156ABCDE".into(),
            customer_name: "NGUYEN VAN A".into(),
            amount: dec!(1250000),
            paid_at: Some(local("2025-06-05 09:01:00")),
        }
    }

    #[tokio::test]
    async fn creates_bank_transfer_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ORDERS_PATH))
            .and(header_exists("authorization"))
            .and(body_json(json!({
                "payment_method": "bacs",
                "payment_method_title": "Bank Transfer",
                "set_paid": false,
                "billing": { "first_name": "NGUYEN VAN A" },
                "fee_lines": [{ "name": "Bank Transaction", "total": "1250000.00" }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 4821 })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = WooCommerceGateway::new(settings(&server)).unwrap();
        assert_eq!(gateway.create_order(&request()).await.unwrap(), "4821");
    }

    #[tokio::test]
    async fn confirmation_requires_matching_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{ORDERS_PATH}/4821")))
            .and(body_json(json!({ "status": "completed" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 4821, "status": "completed" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{ORDERS_PATH}/4822")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
            .mount(&server)
            .await;

        let gateway = WooCommerceGateway::new(settings(&server)).unwrap();
        assert!(gateway.confirm_order("4821").await.unwrap());
        assert!(!gateway.confirm_order("4822").await.unwrap());
    }

    #[tokio::test]
    async fn server_error_on_create_is_an_order_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ORDERS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gateway = WooCommerceGateway::new(settings(&server)).unwrap();
        assert!(matches!(
            gateway.create_order(&request()).await,
            Err(Error::Order(_))
        ));
    }

    #[tokio::test]
    async fn webhook_carries_secure_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/payment"))
            .and(header("Secure-Token", "tok"))
            .and(body_json(json!({
                "error": 0,
                "data": [{
                    "description": "GH123456",
                    "amount": 1250000.0,
                    "when": "2025-06-05 09:01:00",
                    "subAccId": "839689988"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = WooCommerceGateway::new(WooSettings {
            webhook_url: Some(format!("{}/hooks/payment", server.uri())),
            secure_token: Some("tok".into()),
            ..settings(&server)
        })
        .unwrap();
        gateway.notify_payment(&request()).await.unwrap();
    }

    #[tokio::test]
    async fn webhook_is_skipped_without_token() {
        let server = MockServer::start().await;
        let gateway = WooCommerceGateway::new(WooSettings {
            webhook_url: Some(format!("{}/hooks/payment", server.uri())),
            ..settings(&server)
        })
        .unwrap();

        gateway.notify_payment(&request()).await.unwrap();
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
