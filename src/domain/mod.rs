//! Domain types: transactions, fetch batches, and the policies applied to them.
//!
//! Nothing here performs I/O. Ports and adapters build on these types.

pub mod batch;
pub mod order;
pub mod policy;
pub mod time;
pub mod transaction;

pub use batch::{AccountSnapshot, BatchStatus, FetchBatch, NewBatch};
pub use order::OrderReferencePattern;
pub use policy::ReferencePolicy;
pub use time::BusinessTime;
pub use transaction::{Direction, Transaction};
