//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The record itself stays opaque to C; callers only ever hold a pointer to
//! `FfiResponseRecord`. Data crosses the boundary as result codes and as
//! plain-value structs that C can keep on its stack. Conversions from core
//! types live here to keep `lib.rs` focused on the `extern "C"` surface.

use response_core::{ExchangeState, RecordError, RecordState, ResponseRecord};

/// Opaque handle to a `ResponseRecord`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiResponseRecord {
    pub(crate) inner: ResponseRecord,
}

/// Result code returned by every operation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRet {
    Ok = 0,
    InvalidArgument = 1,
    AllocationFailed = 2,
    InvalidState = 3,
    NotFound = 4,
    Panic = 5,
}

impl From<&RecordError> for FfiRet {
    fn from(err: &RecordError) -> Self {
        match err {
            RecordError::InvalidArgument(_) => FfiRet::InvalidArgument,
            RecordError::AllocationFailed { .. } => FfiRet::AllocationFailed,
            RecordError::InvalidState { .. } => FfiRet::InvalidState,
        }
    }
}

impl From<Result<(), RecordError>> for FfiRet {
    fn from(result: Result<(), RecordError>) -> Self {
        match result {
            Ok(()) => FfiRet::Ok,
            Err(err) => FfiRet::from(&err),
        }
    }
}

/// Outcome of the exchange as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FfiExchangeState {
    #[default]
    InProgress = 0,
    Failing = 1,
    Succeeded = 2,
    Failed = 3,
}

impl From<ExchangeState> for FfiExchangeState {
    fn from(state: ExchangeState) -> Self {
        match state {
            ExchangeState::InProgress => FfiExchangeState::InProgress,
            ExchangeState::Failing => FfiExchangeState::Failing,
            ExchangeState::Succeeded => FfiExchangeState::Succeeded,
            ExchangeState::Failed => FfiExchangeState::Failed,
        }
    }
}

/// Every scalar field of a record, read in one lock acquisition.
///
/// The C caller allocates this (usually on the stack) and passes a pointer
/// to `http_response_read_state`. `done` and `fail` are derived from `state`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FfiResponseState {
    pub status_code: u32,
    pub header_count: u32,
    pub body_size: u64,
    pub uploaded_size: u64,
    pub downloaded_size: u64,
    pub state: FfiExchangeState,
    pub done: bool,
    pub fail: bool,
}

impl From<&RecordState> for FfiResponseState {
    fn from(record: &RecordState) -> Self {
        FfiResponseState {
            status_code: record.status_code(),
            header_count: u32::try_from(record.header_count()).unwrap_or(u32::MAX),
            body_size: record.body_size(),
            uploaded_size: record.uploaded_size(),
            downloaded_size: record.downloaded_size(),
            state: record.state().into(),
            done: record.is_done(),
            fail: record.is_failed(),
        }
    }
}
