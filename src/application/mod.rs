//! Application services: the polling core.
//!
//! - [`session`] - Browser session lifecycle with classified login retries.
//! - [`dedup`] - Batch history, watermark and new-transaction detection.
//! - [`forwarder`] - Per-transaction fan-out to chat and order system.
//! - [`scheduler`] - The loop tying them together, with recovery and restarts.

pub mod dedup;
pub mod forwarder;
pub mod scheduler;
pub mod session;

pub use dedup::{DedupSettings, DedupStore, NewTransactions};
pub use forwarder::{
    ForwardReport, Forwarder, ForwarderSettings, MessageLabels, OrderOutcome, TransactionOutcome,
};
pub use scheduler::{
    ExitStatus, FatalError, FatalKind, Phase, RecoveryCause, Scheduler, SchedulerSettings,
    SchedulerState, TickOutcome,
};
pub use session::{SessionHandle, SessionHealth, SessionSettings, SessionState};
