//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`clock`] - Wall-clock implementation of the clock port
//! - [`config`] - Configuration loading and validation

pub mod bootstrap;
pub mod clock;
pub mod config;
