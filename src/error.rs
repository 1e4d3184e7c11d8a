use std::collections::TryReserveError;
use thiserror::Error;

/// Failures of table construction and insertion.
///
/// A missing key is not an error; lookups return `None` for that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("table size must be at least one slot")]
    InvalidSize,
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),
}
