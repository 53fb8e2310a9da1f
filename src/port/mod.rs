//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │       Application       │
//!                    │  session · dedup · loop │
//!                    └────────────┬────────────┘
//!        ┌──────────────┬─────────┼──────────┬──────────────┐
//!        ▼              ▼         ▼          ▼              ▼
//!   ┌─────────┐   ┌──────────┐ ┌───────┐ ┌──────────┐ ┌──────────┐
//!   │ Portal  │   │ Fetcher  │ │ Store │ │ Notifier │ │  Orders  │
//!   └─────────┘   └──────────┘ └───────┘ └──────────┘ └──────────┘
//! ```

pub mod outbound;

pub use outbound::clock::Clock;
pub use outbound::fetcher::{FetchResult, FetchStatus, TransactionFetcher};
pub use outbound::notifier::Notifier;
pub use outbound::order::{OrderGateway, OrderRequest};
pub use outbound::portal::{
    Challenge, ChallengeSolver, Credentials, LoginResponse, PortalDriver, SessionId,
};
pub use outbound::store::BatchStore;
