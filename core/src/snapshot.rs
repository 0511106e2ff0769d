//! Owned, point-in-time copies of a record.
//!
//! # Design
//! Observers must not keep references into a record across lock releases,
//! since the next mutation may replace the underlying storage. These types
//! are what they keep instead: plain owned data, captured in a single
//! critical section so every field belongs to the same instant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::header::HeaderEntry;
use crate::state::ExchangeState;

/// Transfer counters and outcome, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub uploaded_size: u64,
    pub downloaded_size: u64,
    pub body_size: u64,
    pub state: ExchangeState,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }
}

/// Everything an observer can see of a record except the body bytes.
///
/// `done` and `fail` repeat what `state` already says; they are kept for
/// consumers that only understand the flag pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub id: Uuid,
    pub status_code: u32,
    pub status_text: String,
    pub headers: Vec<HeaderEntry>,
    pub body_size: u64,
    pub uploaded_size: u64,
    pub downloaded_size: u64,
    pub state: ExchangeState,
    pub done: bool,
    pub fail: bool,
}
