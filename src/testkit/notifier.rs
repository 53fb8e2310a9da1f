//! Recording notifier.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::port::Notifier;

#[derive(Default)]
struct Recorded {
    sent: Vec<String>,
    attempts: usize,
    fail_calls: HashSet<usize>,
    fail_containing: Vec<String>,
    fail_all: bool,
}

/// Collects delivered messages; can be told to fail specific sends.
#[derive(Default)]
pub struct RecordingNotifier {
    inner: Mutex<Recorded>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the n-th send (1-based).
    pub fn fail_call(&self, n: usize) {
        self.inner.lock().fail_calls.insert(n);
    }

    /// Fail every send whose text contains `needle`.
    pub fn fail_containing(&self, needle: &str) {
        self.inner.lock().fail_containing.push(needle.to_string());
    }

    pub fn fail_all(&self) {
        self.inner.lock().fail_all = true;
    }

    /// Successfully delivered messages.
    pub fn sent(&self) -> Vec<String> {
        self.inner.lock().sent.clone()
    }

    /// Number of send calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.attempts += 1;
        let call = inner.attempts;
        let fails = inner.fail_all
            || inner.fail_calls.contains(&call)
            || inner
                .fail_containing
                .iter()
                .any(|needle| message.contains(needle.as_str()));
        if fails {
            return Err(Error::Notify(format!("send #{call} rejected")));
        }
        inner.sent.push(message.to_string());
        Ok(())
    }
}
