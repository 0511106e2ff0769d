//! Ordered response header storage.
//!
//! # Design
//! Headers are kept exactly as received: insertion order is preserved, keys
//! keep their original case, and repeated keys are stored side by side.
//! Lookup compares names ASCII-case-insensitively, as HTTP field names are
//! case-insensitive, and returns the earliest match.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::storage::copy_str;

/// A single response header as received from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderList {
    entries: Vec<HeaderEntry>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a copy of `key: value`. Existing entries with the same name
    /// are left untouched.
    pub fn push(&mut self, key: &str, value: &str) -> Result<(), RecordError> {
        if key.is_empty() {
            return Err(RecordError::InvalidArgument("header key is empty"));
        }
        let entry = HeaderEntry {
            key: copy_str(key, "header key")?,
            value: copy_str(value, "header value")?,
        };
        self.entries
            .try_reserve(1)
            .map_err(|_| RecordError::AllocationFailed {
                what: "header list",
                requested: std::mem::size_of::<HeaderEntry>(),
            })?;
        self.entries.push(entry);
        Ok(())
    }

    /// Value of the first entry named `key`, ignoring ASCII case.
    pub fn find(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value.as_str())
    }

    /// Values of every entry named `key`, in insertion order.
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[HeaderEntry] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a HeaderEntry;
    type IntoIter = std::slice::Iter<'a, HeaderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
