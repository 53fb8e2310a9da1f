//! Client for the browser-automation sidecar.
//!
//! The sidecar owns the real browser. Each browser session is addressed by
//! the id returned from `POST /session`:
//!
//! | Method | Path                           | Purpose                      |
//! |--------|--------------------------------|------------------------------|
//! | POST   | `/session`                     | open a browser session       |
//! | GET    | `/session/{id}/challenge`      | captcha image bytes          |
//! | POST   | `/session/{id}/login`          | submit credentials + answer  |
//! | GET    | `/session/{id}/location`       | current page URL             |
//! | POST   | `/session/{id}/logout`         | sign out                     |
//! | DELETE | `/session/{id}`                | close the browser            |
//! | POST   | `/session/{id}/transactions`   | scrape transactions          |

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::time::{parse_portal_timestamp, PORTAL_WINDOW_FORMAT};
use crate::domain::transaction::parse_amount;
use crate::domain::{AccountSnapshot, Direction, Transaction};
use crate::error::{Error, Result};
use crate::port::{
    Challenge, Credentials, FetchResult, LoginResponse, PortalDriver, SessionId,
    TransactionFetcher,
};

#[derive(Deserialize)]
struct OpenResponse {
    session_id: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    corp_id: &'a str,
    challenge_answer: &'a str,
}

#[derive(Deserialize)]
struct LoginReply {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct LocationReply {
    url: String,
}

#[derive(Serialize)]
struct FetchRequest {
    from: String,
    max_pages: u32,
}

#[derive(Deserialize)]
struct FetchReply {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    account: Option<AccountRow>,
    #[serde(default)]
    transactions: Vec<TransactionRow>,
}

#[derive(Deserialize)]
struct AccountRow {
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    balance: Option<String>,
}

/// One table row as scraped, with the portal's own text formats.
#[derive(Deserialize)]
struct TransactionRow {
    reference: String,
    #[serde(default)]
    credit: String,
    #[serde(default)]
    debit: String,
    #[serde(default)]
    posted_at: String,
    #[serde(default)]
    counterparty: String,
    #[serde(default)]
    description: String,
}

impl TransactionRow {
    /// Rows are never dropped here. A field the portal rendered in a shape
    /// we cannot read is logged and left empty.
    fn into_transaction(self) -> Transaction {
        let posted_at = match parse_portal_timestamp(&self.posted_at) {
            Ok(at) => Some(at),
            Err(e) => {
                warn!(reference = %self.reference, raw = %self.posted_at, error = %e, "Unreadable posting time");
                None
            }
        };
        let credit = self.amount("credit", &self.credit);
        let debit = self.amount("debit", &self.debit);
        let (direction, amount) = if credit.is_zero() && !debit.is_zero() {
            (Direction::Debit, debit)
        } else {
            (Direction::Credit, credit)
        };
        Transaction {
            reference: self.reference,
            direction,
            amount,
            posted_at,
            counterparty: self.counterparty,
            description: self.description,
        }
    }

    fn amount(&self, column: &'static str, raw: &str) -> Decimal {
        parse_amount(raw).unwrap_or_else(|| {
            warn!(reference = %self.reference, column, raw, "Unreadable amount, treating as empty");
            Decimal::ZERO
        })
    }
}

impl AccountRow {
    fn into_snapshot(self) -> AccountSnapshot {
        AccountSnapshot {
            last_updated: self
                .last_updated
                .as_deref()
                .and_then(|raw| parse_portal_timestamp(raw).ok()),
            balance: self.balance.as_deref().and_then(parse_amount),
        }
    }
}

/// [`PortalDriver`] and [`TransactionFetcher`] over the sidecar's HTTP API.
pub struct HttpPortal {
    client: Client,
    base_url: String,
}

impl HttpPortal {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, session: &SessionId, action: &str) -> String {
        format!("{}/session/{}/{action}", self.base_url, session.as_str())
    }

    async fn fetch_reply(
        &self,
        session: &SessionId,
        from: NaiveDateTime,
        max_pages: u32,
    ) -> Result<FetchReply> {
        let request = FetchRequest {
            from: from.format(PORTAL_WINDOW_FORMAT).to_string(),
            max_pages,
        };
        Ok(self
            .client
            .post(self.url(session, "transactions"))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?
            .json()
            .await?)
    }
}

#[async_trait]
impl PortalDriver for HttpPortal {
    async fn open(&self) -> Result<SessionId> {
        let opened: OpenResponse = self
            .client
            .post(format!("{}/session", self.base_url))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?
            .json()
            .await?;
        Ok(SessionId::new(opened.session_id))
    }

    async fn challenge(&self, session: &SessionId) -> Result<Challenge> {
        let image = self
            .client
            .get(self.url(session, "challenge"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?
            .bytes()
            .await?;
        Ok(Challenge {
            image: image.to_vec(),
        })
    }

    async fn submit_login(
        &self,
        session: &SessionId,
        credentials: &Credentials,
        answer: &str,
    ) -> Result<LoginResponse> {
        let reply: LoginReply = self
            .client
            .post(self.url(session, "login"))
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
                corp_id: &credentials.corp_id,
                challenge_answer: answer,
            })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?
            .json()
            .await?;

        match reply.status.as_str() {
            "ok" => Ok(LoginResponse::Accepted),
            "rejected" => Ok(LoginResponse::Rejected {
                code: reply.code,
                message: reply.message,
            }),
            other => Err(Error::Portal(format!("unexpected login status '{other}'"))),
        }
    }

    async fn location(&self, session: &SessionId) -> Result<String> {
        let reply: LocationReply = self
            .client
            .get(self.url(session, "location"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?
            .json()
            .await?;
        Ok(reply.url)
    }

    async fn logout(&self, session: &SessionId) -> Result<()> {
        self.client
            .post(self.url(session, "logout"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?;
        Ok(())
    }

    async fn close(&self, session: &SessionId) -> Result<()> {
        self.client
            .delete(format!("{}/session/{}", self.base_url, session.as_str()))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TransactionFetcher for HttpPortal {
    async fn fetch(&self, session: &SessionId, from: NaiveDateTime, max_pages: u32) -> FetchResult {
        let reply = match self.fetch_reply(session, from, max_pages).await {
            Ok(reply) => reply,
            Err(e) => return FetchResult::error(e.to_string()),
        };

        match reply.status.as_str() {
            "success" => {}
            "session_expired" => return FetchResult::session_expired(reply.message),
            _ => return FetchResult::error(reply.message),
        }

        let total = reply.transactions.len();
        let transactions: Vec<Transaction> = reply
            .transactions
            .into_iter()
            .map(TransactionRow::into_transaction)
            .collect();
        let undated = transactions.iter().filter(|tx| tx.posted_at.is_none()).count();
        debug!(rows = total, undated, "Transactions fetched");

        let account = reply
            .account
            .map(AccountRow::into_snapshot)
            .unwrap_or_default();
        FetchResult::success(transactions, account)
    }
}
