//! Error types for response record operations.
//!
//! # Design
//! These are operation-level errors: they are returned to the immediate
//! caller of a mutator and never alter the outcome of the exchange itself.
//! A failed exchange is a reported result, carried by `ExchangeState`, not a
//! `RecordError`.

use thiserror::Error;

use crate::state::ExchangeState;

/// Errors returned by `ResponseRecord` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required argument was missing or malformed (null handle or string at
    /// the C boundary, empty header name).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Copying caller data into record-owned storage could not allocate.
    #[error("allocation of {requested} bytes for {what} failed")]
    AllocationFailed { what: &'static str, requested: usize },

    /// The requested outcome transition would move the exchange backwards.
    #[error("cannot {op} while exchange is {state}")]
    InvalidState {
        state: ExchangeState,
        op: &'static str,
    },
}
