//! Self-refreshing credential cell.
//!
//! A `RefreshingCell` owns one credential, keeps it fresh from a background
//! loop and hands it out to any number of concurrent readers.

pub mod authorizer;
pub mod error;
pub mod refreshing_cell;
pub mod schedule;
pub mod slot;

pub use authorizer::{Authorization, Authorizer, Denial, Grant};
pub use error::CellError;
pub use refreshing_cell::RefreshingCell;
pub use schedule::RefreshSchedule;
