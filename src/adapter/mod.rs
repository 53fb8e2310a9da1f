//! Adapters: the CLI on the way in, HTTP clients and file storage on the
//! way out.

pub mod inbound;
pub mod outbound;
