//! Shared response record for one in-flight HTTP exchange.
//!
//! # Overview
//! A transfer worker fills a `ResponseRecord` as the exchange progresses:
//! status line, headers, body bytes, upload/download counters and finally
//! the outcome. Observers on other threads read it concurrently to report
//! progress or to detect completion. The crate performs no I/O; the worker
//! owns the socket and the observers own their polling strategy.
//!
//! # Design
//! - One `std::sync::Mutex` per record guards every field; each handle
//!   method is a single critical section.
//! - `ResponseRecord::lock` hands out a scoped `RecordGuard` for composite
//!   reads or writes; the lock is released on every exit path.
//! - The outcome is an `ExchangeState` enum; the legacy `done`/`fail` flags
//!   are derived from it and can only move forward.
//! - Observers copy data out (`find`, `body`, `snapshot`); nothing borrowed
//!   from the record survives a lock release.

pub mod error;
pub mod header;
pub mod record;
pub mod snapshot;
pub mod state;

mod storage;

pub use error::RecordError;
pub use header::{HeaderEntry, HeaderList};
pub use record::{RecordGuard, RecordState, ResponseRecord};
pub use snapshot::{Progress, ResponseSnapshot};
pub use state::ExchangeState;
