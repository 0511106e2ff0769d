//! Fallible copies of caller data into record-owned storage.

use crate::error::RecordError;

pub(crate) fn copy_str(src: &str, what: &'static str) -> Result<String, RecordError> {
    let mut out = String::new();
    out.try_reserve_exact(src.len())
        .map_err(|_| RecordError::AllocationFailed {
            what,
            requested: src.len(),
        })?;
    out.push_str(src);
    Ok(out)
}

pub(crate) fn copy_bytes(src: &[u8], what: &'static str) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::new();
    extend_bytes(&mut out, src, what)?;
    Ok(out)
}

/// Append `src` to `dst`, growing it without aborting on exhaustion.
pub(crate) fn extend_bytes(
    dst: &mut Vec<u8>,
    src: &[u8],
    what: &'static str,
) -> Result<(), RecordError> {
    dst.try_reserve(src.len())
        .map_err(|_| RecordError::AllocationFailed {
            what,
            requested: src.len(),
        })?;
    dst.extend_from_slice(src);
    Ok(())
}
