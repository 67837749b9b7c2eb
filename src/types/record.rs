//! Fixed-size records and their 16-byte encoding.

use std::cmp::Ordering;
use std::fmt;

use crate::types::{Result, StoreError};

/// Encoded size of one record: four little-endian `i32` fields.
pub const RECORD_SIZE: usize = 16;

/// Key marking an unused slot.
pub const EMPTY_KEY: i32 = i32::MAX;

/// Key written over a removed record.
pub const DELETED_KEY: i32 = i32::MIN;

/// A fixed-arity entry: a key plus three opaque payload fields.
///
/// Equality and ordering consider the key only; use [`Record::as_ints`]
/// when every field matters.
#[derive(Debug, Copy, Clone)]
pub struct Record {
    /// Lookup key.
    pub key: i32,
    /// First payload field.
    pub a: i32,
    /// Second payload field.
    pub b: i32,
    /// Third payload field.
    pub c: i32,
}

impl Record {
    /// Creates a record from explicit fields.
    pub fn new(key: i32, a: i32, b: i32, c: i32) -> Self {
        Self { key, a, b, c }
    }

    /// Returns the placeholder stored in unused slots.
    pub const fn empty() -> Self {
        Self {
            key: EMPTY_KEY,
            a: 0,
            b: 0,
            c: 0,
        }
    }

    /// Builds a record from `[key, a, b, c, ..]`; trailing values are ignored.
    pub fn from_ints(values: &[i32]) -> Result<Self> {
        match values {
            [key, a, b, c, ..] => Ok(Self::new(*key, *a, *b, *c)),
            _ => Err(StoreError::Decode(format!(
                "record needs 4 integers, got {}",
                values.len()
            ))),
        }
    }

    /// Returns the fields in encoding order.
    pub fn as_ints(&self) -> [i32; 4] {
        [self.key, self.a, self.b, self.c]
    }

    /// True for an unused slot.
    pub fn is_empty(&self) -> bool {
        self.key == EMPTY_KEY
    }

    /// True for a tombstone left by a removal.
    pub fn is_deleted(&self) -> bool {
        self.key == DELETED_KEY
    }

    /// True when the slot holds neither a placeholder nor a tombstone.
    pub fn is_live(&self) -> bool {
        !self.is_empty() && !self.is_deleted()
    }

    /// Encodes the record into its 16-byte block.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        for (chunk, value) in out.chunks_exact_mut(4).zip(self.as_ints()) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Writes the encoded record into the front of `dst`.
    pub fn write_to(&self, dst: &mut [u8]) -> Result<()> {
        if dst.len() < RECORD_SIZE {
            return Err(StoreError::Decode(
                "destination slice shorter than a record".into(),
            ));
        }
        dst[..RECORD_SIZE].copy_from_slice(&self.to_bytes());
        Ok(())
    }

    /// Decodes the record stored at `offset` within `bytes`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self> {
        let end = offset
            .checked_add(RECORD_SIZE)
            .ok_or_else(|| StoreError::Decode("record offset overflow".into()))?;
        let block = bytes.get(offset..end).ok_or_else(|| {
            StoreError::Decode(format!(
                "record at offset {offset} truncated (buffer is {} bytes)",
                bytes.len()
            ))
        })?;
        let mut ints = [0i32; 4];
        for (value, chunk) in ints.iter_mut().zip(block.chunks_exact(4)) {
            *value = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self::from_ints(&ints)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {} {} {}", self.key, self.a, self.b, self.c)
    }
}
