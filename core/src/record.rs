//! The shared, lock-guarded record of one HTTP exchange.
//!
//! # Design
//! `ResponseRecord` is a clonable handle; the transfer worker and every
//! observer hold their own clone. All state lives in `RecordState` behind a
//! single `std::sync::Mutex`, and is reachable only through methods:
//!
//! - Each handle method takes the lock for exactly its own operation and
//!   returns owned data, so nothing borrowed outlives the critical section.
//! - `lock()` returns a `RecordGuard` for composite reads or writes. The
//!   guard derefs to `RecordState`, whose accessors borrow from the guard, so
//!   the borrow checker enforces the copy-out discipline.
//! - The mutex is a leaf lock. No method calls out while holding it, and it
//!   is not reentrant: calling a handle method while holding a guard from
//!   the same thread deadlocks.
//!
//! A poisoned mutex is recovered rather than propagated. Every mutator
//! leaves `RecordState` consistent before it can panic, so a panicking
//! holder elsewhere does not invalidate the record.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};
use uuid::Uuid;

use crate::error::RecordError;
use crate::header::{HeaderEntry, HeaderList};
use crate::snapshot::{Progress, ResponseSnapshot};
use crate::state::ExchangeState;
use crate::storage::{copy_bytes, copy_str, extend_bytes};

/// Fields of one exchange. Only reachable through a `RecordGuard`.
#[derive(Debug)]
pub struct RecordState {
    id: Uuid,
    status_code: u32,
    status_text: String,
    headers: HeaderList,
    body: Option<Vec<u8>>,
    uploaded_size: u64,
    downloaded_size: u64,
    state: ExchangeState,
}

impl RecordState {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            status_code: 0,
            status_text: String::new(),
            headers: HeaderList::new(),
            body: None,
            uploaded_size: 0,
            downloaded_size: 0,
            state: ExchangeState::InProgress,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `0` until the status line has been received.
    pub fn status_code(&self) -> u32 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// First header value named `key`, ignoring ASCII case.
    pub fn find(&self, key: &str) -> Option<&str> {
        self.headers.find(key)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_size(&self) -> u64 {
        self.body.as_ref().map_or(0, |b| b.len() as u64)
    }

    pub fn uploaded_size(&self) -> u64 {
        self.uploaded_size
    }

    pub fn downloaded_size(&self) -> u64 {
        self.downloaded_size
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            uploaded_size: self.uploaded_size,
            downloaded_size: self.downloaded_size,
            body_size: self.body_size(),
            state: self.state,
        }
    }

    pub fn snapshot(&self) -> ResponseSnapshot {
        ResponseSnapshot {
            id: self.id,
            status_code: self.status_code,
            status_text: self.status_text.clone(),
            headers: self.headers.as_slice().to_vec(),
            body_size: self.body_size(),
            uploaded_size: self.uploaded_size,
            downloaded_size: self.downloaded_size,
            state: self.state,
            done: self.state.is_done(),
            fail: self.state.is_failed(),
        }
    }

    /// Replace the status code and text. On error the previous status is kept.
    pub fn set_status(&mut self, code: u32, text: &str) -> Result<(), RecordError> {
        self.status_text = copy_str(text, "status text")?;
        self.status_code = code;
        Ok(())
    }

    pub fn add_header(&mut self, key: &str, value: &str) -> Result<(), RecordError> {
        self.headers.push(key, value)?;
        trace!("record {}: header {key}: {value}", self.id);
        Ok(())
    }

    /// Take ownership of `body`, releasing the previous buffer.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }

    /// Copy `body` into record-owned storage, releasing the previous buffer.
    pub fn copy_body(&mut self, body: &[u8]) -> Result<(), RecordError> {
        self.body = Some(copy_bytes(body, "body")?);
        Ok(())
    }

    /// Drop the body entirely; `body()` is `None` afterwards.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Append a received chunk and advance `downloaded_size` by its length.
    pub fn append_body(&mut self, chunk: &[u8]) -> Result<(), RecordError> {
        extend_bytes(self.body.get_or_insert_with(Vec::new), chunk, "body")?;
        self.downloaded_size = self.downloaded_size.saturating_add(chunk.len() as u64);
        Ok(())
    }

    pub fn set_uploaded_size(&mut self, size: u64) {
        if size < self.uploaded_size {
            debug!(
                "record {}: uploaded size moved back from {} to {size}",
                self.id, self.uploaded_size
            );
        }
        self.uploaded_size = size;
    }

    pub fn set_downloaded_size(&mut self, size: u64) {
        if size < self.downloaded_size {
            debug!(
                "record {}: downloaded size moved back from {} to {size}",
                self.id, self.downloaded_size
            );
        }
        self.downloaded_size = size;
    }

    pub fn set_done(&mut self, done: bool) -> Result<(), RecordError> {
        let next = self.state.mark_done(done);
        self.apply(next)
    }

    pub fn set_fail(&mut self, fail: bool) -> Result<(), RecordError> {
        let next = self.state.mark_fail(fail);
        self.apply(next)
    }

    /// Deliver the terminal signal. Equivalent to `set_done(true)`.
    pub fn complete(&mut self) {
        let next = self.state.mark_done(true).unwrap_or(self.state);
        self.transition(next);
    }

    /// Mark the exchange failed and finished in one step, releasing any
    /// observer waiting on `done`.
    pub fn abort(&mut self) {
        let failing = self.state.mark_fail(true).unwrap_or(self.state);
        let next = failing.mark_done(true).unwrap_or(failing);
        self.transition(next);
    }

    fn apply(&mut self, next: Result<ExchangeState, RecordError>) -> Result<(), RecordError> {
        match next {
            Ok(next) => {
                self.transition(next);
                Ok(())
            }
            Err(err) => {
                warn!("record {}: {err}", self.id);
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        if next != self.state {
            debug!("record {}: {} -> {next}", self.id, self.state);
            self.state = next;
        }
    }
}

impl Drop for RecordState {
    fn drop(&mut self) {
        if self.state.is_done() {
            debug!("record {}: released ({})", self.id, self.state);
        } else {
            warn!(
                "record {}: released while {}; the terminal signal was never delivered",
                self.id, self.state
            );
        }
    }
}

/// Exclusive access to a record for composite reads and writes.
///
/// The lock is released when the guard is dropped or `unlock`ed.
#[must_use = "the record is unlocked again as soon as the guard is dropped"]
pub struct RecordGuard<'a> {
    guard: MutexGuard<'a, RecordState>,
}

impl RecordGuard<'_> {
    pub fn unlock(self) {
        drop(self);
    }
}

impl Deref for RecordGuard<'_> {
    type Target = RecordState;

    fn deref(&self) -> &RecordState {
        &self.guard
    }
}

impl DerefMut for RecordGuard<'_> {
    fn deref_mut(&mut self) -> &mut RecordState {
        &mut self.guard
    }
}

/// Handle to the response record of one exchange.
///
/// Clones share the same record. Storage is released when the last clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    id: Uuid,
    inner: Arc<Mutex<RecordState>>,
}

impl Default for ResponseRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRecord {
    /// An empty, in-progress record: status 0, no headers, no body.
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        debug!("record {id}: created");
        Self {
            id,
            inner: Arc::new(Mutex::new(RecordState::new(id))),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lock(&self) -> RecordGuard<'_> {
        RecordGuard {
            guard: self.inner.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Release this handle. The record itself goes away with its last handle.
    pub fn destroy(self) {
        let others = Arc::strong_count(&self.inner) - 1;
        if others > 0 {
            debug!("record {}: handle destroyed, {others} still held", self.id);
        }
    }

    pub fn set_status(&self, code: u32, text: &str) -> Result<(), RecordError> {
        self.lock().set_status(code, text)
    }

    pub fn add_header(&self, key: &str, value: &str) -> Result<(), RecordError> {
        self.lock().add_header(key, value)
    }

    /// Copy of the first header value named `key`, ignoring ASCII case.
    pub fn find(&self, key: &str) -> Option<String> {
        self.lock().find(key).map(str::to_owned)
    }

    pub fn headers(&self) -> Vec<HeaderEntry> {
        self.lock().headers().as_slice().to_vec()
    }

    pub fn header_count(&self) -> usize {
        self.lock().header_count()
    }

    pub fn set_body(&self, body: Vec<u8>) {
        self.lock().set_body(body);
    }

    pub fn copy_body(&self, body: &[u8]) -> Result<(), RecordError> {
        self.lock().copy_body(body)
    }

    pub fn clear_body(&self) {
        self.lock().clear_body();
    }

    pub fn append_body(&self, chunk: &[u8]) -> Result<(), RecordError> {
        self.lock().append_body(chunk)
    }

    pub fn body(&self) -> Option<Vec<u8>> {
        self.lock().body().map(<[u8]>::to_vec)
    }

    pub fn body_size(&self) -> u64 {
        self.lock().body_size()
    }

    pub fn status_code(&self) -> u32 {
        self.lock().status_code()
    }

    pub fn status_text(&self) -> String {
        self.lock().status_text().to_owned()
    }

    pub fn set_uploaded_size(&self, size: u64) {
        self.lock().set_uploaded_size(size);
    }

    pub fn set_downloaded_size(&self, size: u64) {
        self.lock().set_downloaded_size(size);
    }

    pub fn uploaded_size(&self) -> u64 {
        self.lock().uploaded_size()
    }

    pub fn downloaded_size(&self) -> u64 {
        self.lock().downloaded_size()
    }

    pub fn set_done(&self, done: bool) -> Result<(), RecordError> {
        self.lock().set_done(done)
    }

    pub fn set_fail(&self, fail: bool) -> Result<(), RecordError> {
        self.lock().set_fail(fail)
    }

    pub fn complete(&self) {
        self.lock().complete();
    }

    pub fn abort(&self) {
        self.lock().abort();
    }

    pub fn state(&self) -> ExchangeState {
        self.lock().state()
    }

    pub fn is_done(&self) -> bool {
        self.lock().is_done()
    }

    pub fn is_failed(&self) -> bool {
        self.lock().is_failed()
    }

    pub fn progress(&self) -> Progress {
        self.lock().progress()
    }

    pub fn snapshot(&self) -> ResponseSnapshot {
        self.lock().snapshot()
    }
}
