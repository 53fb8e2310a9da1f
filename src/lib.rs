//! Bankwatch - Bank portal transaction watcher.
//!
//! Keeps one authenticated browser session against a corporate banking
//! portal, polls it for transactions, and forwards every transaction not
//! seen before to a chat channel and, when the description carries an
//! order reference, to an order system.
//!
//! # Architecture
//!
//! - [`domain`] - Transactions, fetch batches, validity and order-reference rules
//! - [`port`] - Traits for the portal, fetcher, clock, store, notifier and orders
//! - [`application`] - Session lifecycle, dedup store, forwarder and scheduler loop
//! - [`adapter`] - HTTP clients, JSON batch files and the CLI
//! - [`infrastructure`] - Configuration, logging, system clock and wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Scripted fakes and builders for integration tests
//!
//! # Example
//!
//! ```no_run
//! use bankwatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     let credentials = config.credentials()?;
//!     println!("watching as {}", credentials.username);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{Error, Result};
