//! Fixed-capacity, key-sorted record pages and their block encoding.
//!
//! Block layout (little-endian):
//!
//! ```text
//! offset  size            field
//! 0       4               count (i32)
//! 4       4               depth (i32)
//! 8       16 * capacity   slots, each `key a b c` as i32
//! ```
//!
//! Page `n` lives at byte offset `n * block_size(capacity)`.

use std::slice;

use crate::types::{Record, Result, StoreError, DELETED_KEY, RECORD_SIZE};

/// Bytes occupied by the `(count, depth)` header.
pub const PAGE_HEADER_SIZE: usize = 8;

/// Size in bytes of one page block holding `capacity` records.
pub const fn block_size(capacity: usize) -> usize {
    capacity * RECORD_SIZE + PAGE_HEADER_SIZE
}

/// File offset of page `number`.
pub fn page_offset(number: u64, capacity: usize) -> Result<u64> {
    number
        .checked_mul(block_size(capacity) as u64)
        .ok_or_else(|| StoreError::InvalidArgument(format!("page {number} offset overflows")))
}

/// Page number whose block starts at or contains `offset`.
pub fn page_number_at(offset: u64, capacity: usize) -> u64 {
    offset / block_size(capacity) as u64
}

/// An in-memory page: `count` live records sorted by key in the leading
/// slots, followed by empty or stale slots.
#[derive(Debug, Clone)]
pub struct Page {
    number: u64,
    depth: u32,
    count: usize,
    slots: Vec<Record>,
}

impl Page {
    /// Creates an empty page with every slot set to the empty record.
    pub fn new(number: u64, depth: u32, capacity: usize) -> Self {
        Self {
            number,
            depth,
            count: 0,
            slots: vec![Record::empty(); capacity],
        }
    }

    /// Page number (file ordinal).
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Local depth: hash bits shared by every record on this page.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Overrides the local depth.
    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Slot capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot is free.
    pub fn is_full(&self) -> bool {
        self.count >= self.slots.len()
    }

    /// True when the page holds no live record.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Key of the first occupied slot.
    pub fn first_key(&self) -> Option<i32> {
        self.live().first().map(|record| record.key)
    }

    /// The occupied, key-sorted prefix.
    pub fn live(&self) -> &[Record] {
        &self.slots[..self.count]
    }

    /// All slots, including empty and stale ones.
    pub fn slots(&self) -> slice::Iter<'_, Record> {
        self.slots.iter()
    }

    /// Adds a record, keeping the occupied prefix sorted.
    ///
    /// Returns `false` without touching the page when it is full.
    pub fn add(&mut self, record: Record) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.count] = record;
        self.count += 1;
        self.slots[..self.count].sort_unstable_by_key(|r| r.key);
        true
    }

    /// Slot index of `key` within the occupied prefix.
    pub fn index_of(&self, key: i32) -> Result<usize> {
        self.live()
            .binary_search_by_key(&key, |r| r.key)
            .map_err(|_| StoreError::RecordNotFound { key })
    }

    /// Returns the live record stored under `key`.
    pub fn get(&self, key: i32) -> Option<&Record> {
        self.index_of(key).ok().map(|idx| &self.slots[idx])
    }

    /// Overwrites the record with the same key, keeping its slot.
    pub fn replace(&mut self, record: Record) -> Result<()> {
        let idx = self.index_of(record.key)?;
        self.slots[idx] = record;
        Ok(())
    }

    /// Tombstones `key` and returns the record it held.
    ///
    /// Live records are reordered ahead of vacant slots before the count
    /// drops, so the tombstone lands at slot `count` and the next
    /// [`Page::add`] reclaims it.
    pub fn remove(&mut self, key: i32) -> Result<Record> {
        let idx = self.index_of(key)?;
        let removed = self.slots[idx];
        self.slots[idx].key = DELETED_KEY;
        self.slots[..self.count].sort_unstable_by_key(|r| (!r.is_live(), r.key));
        self.count -= 1;
        Ok(removed)
    }

    /// Encodes the page into a freshly allocated block.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; block_size(self.capacity())];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Encodes the page into `dst`, which must be exactly one block long.
    pub fn encode_into(&self, dst: &mut [u8]) -> Result<()> {
        let expected = block_size(self.capacity());
        if dst.len() != expected {
            return Err(StoreError::InvalidArgument(format!(
                "page block is {expected} bytes, buffer is {}",
                dst.len()
            )));
        }
        let count = i32::try_from(self.count)
            .map_err(|_| StoreError::InvalidArgument("page count exceeds i32".into()))?;
        let depth = i32::try_from(self.depth)
            .map_err(|_| StoreError::InvalidArgument("page depth exceeds i32".into()))?;
        dst[0..4].copy_from_slice(&count.to_le_bytes());
        dst[4..8].copy_from_slice(&depth.to_le_bytes());
        for (record, chunk) in self
            .slots
            .iter()
            .zip(dst[PAGE_HEADER_SIZE..].chunks_exact_mut(RECORD_SIZE))
        {
            record.write_to(chunk)?;
        }
        Ok(())
    }

    /// Decodes page `number` from a block holding `capacity` records.
    pub fn decode(number: u64, bytes: &[u8], capacity: usize) -> Result<Self> {
        let corrupt = |reason: String| StoreError::PageRead {
            page: number,
            reason,
        };
        if bytes.len() != block_size(capacity) {
            return Err(corrupt(format!(
                "block is {} bytes, expected {}",
                bytes.len(),
                block_size(capacity)
            )));
        }
        let count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let depth = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let count = usize::try_from(count)
            .ok()
            .filter(|&c| c <= capacity)
            .ok_or_else(|| corrupt(format!("count {count} outside 0..={capacity}")))?;
        let depth = u32::try_from(depth)
            .ok()
            .filter(|&d| d < u32::BITS)
            .ok_or_else(|| corrupt(format!("depth {depth} out of range")))?;

        let mut slots = Vec::with_capacity(capacity);
        for idx in 0..capacity {
            slots.push(Record::decode(bytes, PAGE_HEADER_SIZE + idx * RECORD_SIZE)?);
        }
        Ok(Self {
            number,
            depth,
            count,
            slots,
        })
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Record;
    type IntoIter = slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots()
    }
}
