//! C-ABI wrapper around `response-core`.
//!
//! # Overview
//! Exposes the response record through `extern "C"` functions so a transfer
//! worker or UI written in any language with a C FFI can share one record
//! across threads.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Every operation returns an `FfiRet` code. Null handles, null required
//!   strings and strings that are not UTF-8 yield `InvalidArgument`.
//! - Manual `lock`/`unlock` is not exported, so C code can never leave the
//!   record locked. Composite reads take the lock once per call instead:
//!   `http_response_read_state` fills a plain struct with every scalar
//!   field, and `http_response_snapshot_json` returns the full record
//!   (status text and headers included, body bytes excluded) as one JSON
//!   document. Use the JSON snapshot when status text or headers must agree
//!   with `done`/`fail`; separate `copy_status_text`/`find` calls may see a
//!   later state.
//! - Status codes are `uint32_t` and stored as given, without range checks.
//! - Everything handed out (strings, body copies) is an owned copy; the
//!   caller must release it with the matching `http_response_free_*`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use response_core::ResponseRecord;

use types::*;

/// Borrow a C string argument. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Run `f` against the record behind `resp`, mapping null and panics to
/// result codes.
fn with_record(
    resp: *const FfiResponseRecord,
    f: impl FnOnce(&ResponseRecord) -> FfiRet,
) -> FfiRet {
    catch_unwind(AssertUnwindSafe(|| {
        if resp.is_null() {
            return FfiRet::InvalidArgument;
        }
        let record = unsafe { &(*resp).inner };
        f(record)
    }))
    .unwrap_or(FfiRet::Panic)
}

/// Hand `s` to C through `out`.
fn write_string(out: *mut *mut c_char, s: String) -> FfiRet {
    match CString::new(s) {
        Ok(s) => {
            unsafe { *out = s.into_raw() };
            FfiRet::Ok
        }
        // stored through the Rust API with an interior NUL
        Err(_) => FfiRet::InvalidArgument,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Create an empty, in-progress record.
///
/// Returns null if allocation panics. The caller must release the pointer
/// with `http_response_destroy` once no other thread uses it.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_create() -> *mut FfiResponseRecord {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiResponseRecord {
            inner: ResponseRecord::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Destroy a record created by `http_response_create`.
///
/// No other thread may be inside an `http_response_*` call on `resp`.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_destroy(resp: *mut FfiResponseRecord) -> FfiRet {
    if resp.is_null() {
        return FfiRet::InvalidArgument;
    }
    catch_unwind(|| {
        let record = unsafe { Box::from_raw(resp) };
        record.inner.destroy();
        FfiRet::Ok
    })
    .unwrap_or(FfiRet::Panic)
}

// ---------------------------------------------------------------------------
// Mutators
// ---------------------------------------------------------------------------

/// Set the status code and text. A null `text` stores an empty text.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_set_status(
    resp: *const FfiResponseRecord,
    code: u32,
    text: *const c_char,
) -> FfiRet {
    with_record(resp, |record| {
        let text = if text.is_null() {
            ""
        } else {
            match unsafe { str_arg(text) } {
                Some(text) => text,
                None => return FfiRet::InvalidArgument,
            }
        };
        record.set_status(code, text).into()
    })
}

/// Append a header. Existing headers with the same name are kept.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_add_header(
    resp: *const FfiResponseRecord,
    key: *const c_char,
    value: *const c_char,
) -> FfiRet {
    with_record(resp, |record| {
        let (Some(key), Some(value)) = (unsafe { str_arg(key) }, unsafe { str_arg(value) }) else {
            return FfiRet::InvalidArgument;
        };
        record.add_header(key, value).into()
    })
}

/// Copy `len` bytes at `data` into the record as its body.
///
/// A null `data` with `len == 0` removes the body.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_set_body(
    resp: *const FfiResponseRecord,
    data: *const u8,
    len: usize,
) -> FfiRet {
    with_record(resp, |record| {
        if data.is_null() {
            if len != 0 {
                return FfiRet::InvalidArgument;
            }
            record.clear_body();
            return FfiRet::Ok;
        }
        let body = unsafe { std::slice::from_raw_parts(data, len) };
        record.copy_body(body).into()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn http_response_set_uploaded_size(
    resp: *const FfiResponseRecord,
    size: u64,
) -> FfiRet {
    with_record(resp, |record| {
        record.set_uploaded_size(size);
        FfiRet::Ok
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn http_response_set_downloaded_size(
    resp: *const FfiResponseRecord,
    size: u64,
) -> FfiRet {
    with_record(resp, |record| {
        record.set_downloaded_size(size);
        FfiRet::Ok
    })
}

/// Set the completion flag. Clearing it after it was set is `InvalidState`.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_set_done(resp: *const FfiResponseRecord, done: bool) -> FfiRet {
    with_record(resp, |record| record.set_done(done).into())
}

/// Set the failure flag. Does not set `done`; the worker must still call
/// `http_response_set_done`. Clearing it after it was set is `InvalidState`.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_set_fail(resp: *const FfiResponseRecord, fail: bool) -> FfiRet {
    with_record(resp, |record| record.set_fail(fail).into())
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// Look up the first header named `key`, ignoring ASCII case.
///
/// On `Ok`, `*out_value` receives a copy the caller must free with
/// `http_response_free_string`. Otherwise `*out_value` is set to null and
/// `NotFound` is returned when no header matches.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_find(
    resp: *const FfiResponseRecord,
    key: *const c_char,
    out_value: *mut *mut c_char,
) -> FfiRet {
    with_record(resp, |record| {
        if out_value.is_null() {
            return FfiRet::InvalidArgument;
        }
        unsafe { *out_value = std::ptr::null_mut() };
        let Some(key) = (unsafe { str_arg(key) }) else {
            return FfiRet::InvalidArgument;
        };
        match record.find(key) {
            Some(value) => write_string(out_value, value),
            None => FfiRet::NotFound,
        }
    })
}

/// Fill `*out` with status code, counters, header count and outcome, all
/// read inside one lock acquisition.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_read_state(
    resp: *const FfiResponseRecord,
    out: *mut FfiResponseState,
) -> FfiRet {
    with_record(resp, |record| {
        if out.is_null() {
            return FfiRet::InvalidArgument;
        }
        let state = FfiResponseState::from(&*record.lock());
        unsafe { out.write(state) };
        FfiRet::Ok
    })
}

/// Copy the status text. Free `*out` with `http_response_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_copy_status_text(
    resp: *const FfiResponseRecord,
    out: *mut *mut c_char,
) -> FfiRet {
    with_record(resp, |record| {
        if out.is_null() {
            return FfiRet::InvalidArgument;
        }
        unsafe { *out = std::ptr::null_mut() };
        write_string(out, record.status_text())
    })
}

/// Copy the body. Returns `NotFound` with `*out_data` null when the record
/// has no body. Free the copy with `http_response_free_body(*out_data, *out_len)`.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_copy_body(
    resp: *const FfiResponseRecord,
    out_data: *mut *mut u8,
    out_len: *mut usize,
) -> FfiRet {
    with_record(resp, |record| {
        if out_data.is_null() || out_len.is_null() {
            return FfiRet::InvalidArgument;
        }
        unsafe {
            *out_data = std::ptr::null_mut();
            *out_len = 0;
        }
        let Some(body) = record.body() else {
            return FfiRet::NotFound;
        };
        let body = body.into_boxed_slice();
        let len = body.len();
        unsafe {
            *out_data = Box::into_raw(body) as *mut u8;
            *out_len = len;
        }
        FfiRet::Ok
    })
}

/// Serialize a snapshot of the record (without body bytes) as JSON.
///
/// This is the composite read for C callers: id, status code and text, all
/// headers in insertion order, counters, `state`, `done` and `fail` are taken
/// under one lock acquisition, so they always describe the same moment.
///
/// Returns null if `resp` is null or serialization fails. Free the string
/// with `http_response_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_snapshot_json(resp: *const FfiResponseRecord) -> *mut c_char {
    catch_unwind(|| {
        if resp.is_null() {
            return std::ptr::null_mut();
        }
        let record = unsafe { &(*resp).inner };
        serde_json::to_string(&record.snapshot())
            .ok()
            .and_then(|json| CString::new(json).ok())
            .map_or(std::ptr::null_mut(), CString::into_raw)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

/// Free a body copy from `http_response_copy_body`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_free_body(data: *mut u8, len: usize) {
    if !data.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(data, len)) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
