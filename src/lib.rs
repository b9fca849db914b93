//! # Token Refresh Library
//!
//! Keeps one access credential fresh in the background and serves it to any
//! number of concurrent readers without exposing an expired value.
//!
//! Modules:
//! - `cell`: the refreshing credential cell and the `Authorizer` contract
//! - `authorizers`: simulated flaky authorization endpoint
//! - `resilience`: retry with exponential backoff around an authorizer
//! - `config`: YAML service configuration, loading and validation
//! - `observability`: prometheus metrics and the metrics route
//! - `server`: HTTP server exposing the metrics route

pub mod cell;
pub mod authorizers;
pub mod resilience;
pub mod config;
pub mod observability;
pub mod server;
pub mod utils;
#[cfg(test)]
mod tests;


pub use crate::cell::{Authorization, Authorizer, CellError, Denial, Grant, RefreshSchedule, RefreshingCell};
pub use crate::config::types::ServiceConfig;
