//! A single typed read request inside a scatter round.

use crate::memory::Scalar;

/// Widest value a scatter entry can hold inline.
///
/// Scalar reads fit with room to spare; anything wider belongs to a
/// snapshot capture, which has pooled backing storage.
pub const MAX_ENTRY_WIDTH: usize = 16;

/// One `(address, width)` read request plus its result slot.
///
/// Entries are created when registered on an index and populated exactly
/// once, when their owning round executes. The result lives inline so a
/// round of hundreds of entries costs no per-entry heap allocation.
#[derive(Debug, Clone, Copy)]
pub struct ScatterEntry {
    index_key: i32,
    key: i32,
    address: u64,
    width: u8,
    cache_override: Option<bool>,
    buf: [u8; MAX_ENTRY_WIDTH],
    filled: bool,
}

impl ScatterEntry {
    pub(crate) fn new(
        index_key: i32,
        key: i32,
        address: u64,
        width: usize,
        cache_override: Option<bool>,
    ) -> Self {
        debug_assert!(width <= MAX_ENTRY_WIDTH);
        Self {
            index_key,
            key,
            address,
            width: width as u8,
            cache_override,
            buf: [0; MAX_ENTRY_WIDTH],
            filled: false,
        }
    }

    /// Key of the index this entry belongs to.
    pub fn index_key(&self) -> i32 {
        self.index_key
    }

    /// Key of this entry within its index.
    pub fn key(&self) -> i32 {
        self.key
    }

    /// Remote address to read from.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Number of bytes to read.
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Cache policy for this entry given the round-wide default.
    ///
    /// The round's policy applies uniformly unless the entry carries an
    /// explicit override (for transports with per-request caching).
    pub fn effective_cache(&self, round_default: bool) -> bool {
        self.cache_override.unwrap_or(round_default)
    }

    /// Store the read result. Called by the transport; `bytes` must match
    /// the requested width or the entry stays unset.
    pub fn fill(&mut self, bytes: &[u8]) {
        if bytes.len() != self.width() {
            return;
        }
        self.buf[..bytes.len()].copy_from_slice(bytes);
        self.filled = true;
    }

    /// Whether the result slot has been populated.
    pub fn is_set(&self) -> bool {
        self.filled
    }

    /// Raw result bytes, if the read succeeded.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.filled.then(|| &self.buf[..self.width()])
    }

    /// Decode the result as `T`, if the read succeeded and the widths
    /// agree.
    pub fn result<T: Scalar>(&self) -> Option<T> {
        let bytes = self.bytes()?;
        (bytes.len() == T::WIDTH).then(|| T::from_bytes(bytes))
    }
}
