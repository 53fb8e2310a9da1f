//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the collaborators around the polling core: the
//! browser session, transaction fetching, batch storage, the chat channel,
//! the order system, and time itself.

pub mod clock;
pub mod fetcher;
pub mod notifier;
pub mod order;
pub mod portal;
pub mod store;
