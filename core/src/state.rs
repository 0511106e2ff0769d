//! Outcome of one exchange.
//!
//! # Design
//! The legacy interface signals completion with two booleans, `done` and
//! `fail`. Here they are derived from a single enum so only forward moves are
//! representable: `InProgress` may fail or finish, `Failing` may only
//! finish, and the two terminal variants never change except that a success
//! may still be downgraded to `Failed` when the failure is detected at the
//! instant of completion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// The transfer worker is still running.
    #[default]
    InProgress,
    /// Failure was reported but the terminal signal has not arrived yet.
    Failing,
    /// Finished without failure.
    Succeeded,
    /// Finished with failure.
    Failed,
}

impl ExchangeState {
    /// Legacy `done` flag.
    pub fn is_done(self) -> bool {
        matches!(self, ExchangeState::Succeeded | ExchangeState::Failed)
    }

    /// Legacy `fail` flag.
    pub fn is_failed(self) -> bool {
        matches!(self, ExchangeState::Failing | ExchangeState::Failed)
    }

    /// Rebuild the state from the legacy flag pair.
    pub fn from_flags(done: bool, fail: bool) -> Self {
        match (done, fail) {
            (false, false) => ExchangeState::InProgress,
            (false, true) => ExchangeState::Failing,
            (true, false) => ExchangeState::Succeeded,
            (true, true) => ExchangeState::Failed,
        }
    }

    /// State after a `set_done(done)` request.
    ///
    /// Repeating `done = true` is a no-op. `done = false` is accepted only
    /// while the exchange is still open, where it changes nothing.
    pub fn mark_done(self, done: bool) -> Result<Self, RecordError> {
        match (self, done) {
            (ExchangeState::InProgress, true) => Ok(ExchangeState::Succeeded),
            (ExchangeState::Failing, true) => Ok(ExchangeState::Failed),
            (state, true) => Ok(state),
            (state, false) if state.is_done() => Err(RecordError::InvalidState {
                state,
                op: "clear done",
            }),
            (state, false) => Ok(state),
        }
    }

    /// State after a `set_fail(fail)` request.
    pub fn mark_fail(self, fail: bool) -> Result<Self, RecordError> {
        match (self, fail) {
            (ExchangeState::InProgress, true) => Ok(ExchangeState::Failing),
            (ExchangeState::Succeeded, true) => Ok(ExchangeState::Failed),
            (state, true) => Ok(state),
            (state, false) if state.is_failed() => Err(RecordError::InvalidState {
                state,
                op: "clear fail",
            }),
            (state, false) => Ok(state),
        }
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExchangeState::InProgress => "in progress",
            ExchangeState::Failing => "failing",
            ExchangeState::Succeeded => "succeeded",
            ExchangeState::Failed => "failed",
        };
        f.write_str(s)
    }
}
