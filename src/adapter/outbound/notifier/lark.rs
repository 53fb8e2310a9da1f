//! Lark (Feishu) chat notifier.
//!
//! Authenticates with an internal app's id and secret, caches the tenant
//! access token until shortly before it expires, and posts text messages
//! to one chat.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::port::Notifier;

/// Public Lark endpoint.
pub const DEFAULT_BASE_URL: &str = "https://open.larksuite.com";

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const MESSAGE_PATH: &str = "/open-apis/im/v1/messages";

/// Refresh the token this long before Lark says it expires.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    #[serde(default)]
    expire: u64,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    receive_id: &'a str,
    msg_type: &'static str,
    /// JSON-encoded `{"text": ...}`.
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Sends messages to a Lark group chat.
pub struct LarkNotifier {
    client: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    chat_id: String,
    token: Mutex<Option<CachedToken>>,
}

impl LarkNotifier {
    /// Create a notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            chat_id: chat_id.into(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let cached = self
            .token
            .lock()
            .as_ref()
            .filter(|token| Instant::now() < token.expires_at)
            .map(|token| token.value.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        let response: TokenResponse = self
            .client
            .post(format!("{}{TOKEN_PATH}", self.base_url))
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let value = match response.tenant_access_token {
            Some(token) if response.code == 0 => token,
            _ => {
                return Err(Error::Notify(format!(
                    "tenant token rejected (code {}): {}",
                    response.code, response.msg
                )))
            }
        };

        let lifetime = Duration::from_secs(response.expire).saturating_sub(TOKEN_MARGIN);
        debug!(expires_in_secs = lifetime.as_secs(), "Lark tenant token refreshed");
        *self.token.lock() = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }
}

#[async_trait]
impl Notifier for LarkNotifier {
    fn name(&self) -> &'static str {
        "lark"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let token = self.access_token().await?;
        let content = serde_json::json!({ "text": message }).to_string();

        let response: ApiResponse = self
            .client
            .post(format!("{}{MESSAGE_PATH}", self.base_url))
            .query(&[("receive_id_type", "chat_id")])
            .bearer_auth(token)
            .json(&MessageRequest {
                receive_id: &self.chat_id,
                msg_type: "text",
                content,
            })
            .send()
            .await?
            .json()
            .await?;

        if response.code != 0 {
            // A stale token is the usual cause; fetch a new one next time.
            self.token.lock().take();
            return Err(Error::Notify(format!(
                "message rejected (code {}): {}",
                response.code, response.msg
            )));
        }
        Ok(())
    }
}
