//! Order system adapters.

pub mod woo;

pub use woo::{WooCommerceGateway, WooSettings};
