//! OCR service client for login challenges.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::port::{Challenge, ChallengeSolver};

#[derive(Deserialize)]
struct SolveReply {
    text: String,
}

/// Posts the challenge image to an OCR endpoint and returns its text.
pub struct HttpChallengeSolver {
    client: Client,
    url: String,
}

impl HttpChallengeSolver {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ChallengeSolver for HttpChallengeSolver {
    async fn solve(&self, challenge: &Challenge) -> Result<String> {
        let reply: SolveReply = self
            .client
            .post(&self.url)
            .header("content-type", "application/octet-stream")
            .body(challenge.image.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Portal(format!("challenge solver: {e}")))?
            .json()
            .await?;

        let text = reply.text.trim().to_string();
        if text.is_empty() {
            return Err(Error::Portal("challenge solver returned no text".into()));
        }
        Ok(text)
    }
}
