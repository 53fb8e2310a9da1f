//! Infrastructure configuration modules.

pub mod logging;
pub mod notify;
pub mod orders;
pub mod portal;
pub mod schedule;
pub mod settings;
pub mod store;
