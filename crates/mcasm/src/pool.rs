//! Object pool: constants and object references addressed by index.
//!
//! Values that cannot be materialised cheaply as inline immediates are
//! registered here once and loaded through the pool pointer register at
//! run time. The pool is laid out as an array of machine words.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Opaque reference to an object managed outside the assembler.
///
/// The assembler never dereferences it; it is stored in the pool as a raw
/// word (typically an address or a handle understood by the runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// Wrap a raw reference value.
    pub const fn new(raw: u64) -> Self {
        ObjectRef(raw)
    }

    /// The raw reference value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolEntry {
    /// An untagged machine word.
    Immediate(u64),
    /// An object reference.
    Object(ObjectRef),
}

impl PoolEntry {
    /// The word stored in the slot.
    pub const fn raw(self) -> u64 {
        match self {
            PoolEntry::Immediate(v) => v,
            PoolEntry::Object(r) => r.raw(),
        }
    }
}

/// The pool of one code object.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<PoolEntry>", into = "Vec<PoolEntry>")
)]
pub struct ObjectPool {
    entries: Vec<PoolEntry>,
    lookup: BTreeMap<PoolEntry, usize>,
}

impl PartialEq for ObjectPool {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ObjectPool {}

impl From<Vec<PoolEntry>> for ObjectPool {
    fn from(entries: Vec<PoolEntry>) -> Self {
        let mut pool = ObjectPool::new();
        for entry in entries {
            pool.add(entry);
        }
        pool
    }
}

impl From<ObjectPool> for Vec<PoolEntry> {
    fn from(pool: ObjectPool) -> Self {
        pool.entries
    }
}

impl ObjectPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` and return its index. Never deduplicates.
    pub fn add(&mut self, entry: PoolEntry) -> usize {
        let index = self.entries.len();
        self.entries.push(entry);
        self.lookup.entry(entry).or_insert(index);
        index
    }

    /// Return the index of an existing equal entry, or append it.
    pub fn find_or_add(&mut self, entry: PoolEntry) -> usize {
        if let Some(&index) = self.lookup.get(&entry) {
            return index;
        }
        self.add(entry)
    }

    /// The entry at `index`.
    pub fn get(&self, index: usize) -> Option<PoolEntry> {
        self.entries.get(index).copied()
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All slots in index order.
    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    /// Byte offset of slot `index` from the pool base.
    pub const fn offset_of(index: usize, word_size: usize) -> usize {
        index * word_size
    }

    /// Serialize the pool as little-endian words of `word_size` bytes
    /// (4 or 8). Values wider than a word are truncated.
    pub fn to_bytes(&self, word_size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * word_size);
        for entry in &self.entries {
            out.extend_from_slice(&entry.raw().to_le_bytes()[..word_size]);
        }
        out
    }
}
