//! Outbound adapters implementing the port traits.
//!
//! - [`notifier`] - Lark chat and log-only notifiers
//! - [`order`] - WooCommerce order gateway
//! - [`portal`] - Browser-automation sidecar client and challenge solver
//! - [`store`] - JSON-file and in-memory batch stores

pub mod notifier;
pub mod order;
pub mod portal;
pub mod store;
