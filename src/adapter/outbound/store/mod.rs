//! Batch store implementations.

pub mod json;
pub mod memory;

pub use json::JsonBatchStore;
pub use memory::MemoryBatchStore;
