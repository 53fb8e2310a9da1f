//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] - `FakeClock`, a manually advanced [`Clock`](crate::port::Clock).
//! - [`portal`] - `ScriptedDriver` and `FixedSolver` for session tests.
//! - [`fetcher`] - `ScriptedFetcher` with call recording.
//! - [`notifier`] - `RecordingNotifier` with injectable failures.
//! - [`order`] - `RecordingOrders`, an in-memory order system.
//! - [`domain`] - Builders for transactions, timestamps, and credentials.

pub mod clock;
pub mod domain;
pub mod fetcher;
pub mod notifier;
pub mod order;
pub mod portal;
