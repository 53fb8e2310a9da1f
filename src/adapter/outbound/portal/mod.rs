//! Portal adapters: the browser-automation sidecar and the OCR solver.

pub mod http;
pub mod solver;

pub use http::HttpPortal;
pub use solver::HttpChallengeSolver;
