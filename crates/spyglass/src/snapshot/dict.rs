//! Snapshot of a remote managed dictionary.

use crate::error::Result;
use crate::memory::{ReadMemory, Scalar, layout};
use crate::pool::Reusable;
use crate::snapshot::{read_backing_ptr, read_count};

/// Immutable copy of a managed dictionary's key/value payloads.
///
/// The entries array holds fixed-stride slot records of
/// `{ hash, next, key, value }`; the hash-table internals are read as
/// part of the single bulk transfer but never interpreted — only the
/// payloads are exposed.
pub struct DictSnapshot<K: Scalar, V: Scalar> {
    pairs: Vec<(K, V)>,
    scratch: Vec<u8>,
}

impl<K: Scalar, V: Scalar> Default for DictSnapshot<K, V> {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

impl<K: Scalar, V: Scalar> DictSnapshot<K, V> {
    /// Stride of one slot record in the entries array.
    pub const SLOT_WIDTH: usize = layout::dict::SLOT_HEADER + K::WIDTH + V::WIDTH;

    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the dictionary at `address` using the default bounds
    /// ceiling.
    pub fn capture<R: ReadMemory + ?Sized>(
        &mut self,
        reader: &R,
        address: u64,
        use_cache: bool,
    ) -> Result<()> {
        self.capture_bounded(reader, address, use_cache, layout::MAX_ELEMENTS)
    }

    /// Capture with an explicit bounds ceiling.
    pub fn capture_bounded<R: ReadMemory + ?Sized>(
        &mut self,
        reader: &R,
        address: u64,
        use_cache: bool,
        limit: usize,
    ) -> Result<()> {
        self.pairs.clear();

        let count = read_count(reader, address + layout::dict::COUNT, use_cache, limit)?;
        if count == 0 {
            return Ok(());
        }

        let entries = read_backing_ptr(reader, address + layout::dict::ENTRIES, use_cache)?;
        let start = entries + layout::dict::SLOTS_START;

        self.scratch.clear();
        self.scratch.resize(count * Self::SLOT_WIDTH, 0);
        reader.read_buf(start, &mut self.scratch, use_cache)?;

        self.pairs.extend(
            self.scratch
                .chunks_exact(Self::SLOT_WIDTH)
                .map(|slot| {
                    let payload = &slot[layout::dict::SLOT_HEADER..];
                    (
                        K::from_bytes(&payload[..K::WIDTH]),
                        V::from_bytes(&payload[K::WIDTH..K::WIDTH + V::WIDTH]),
                    )
                }),
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Linear lookup by key; snapshots are small and short-lived, so no
    /// index is built.
    pub fn get(&self, key: K) -> Option<&V>
    where
        K: PartialEq,
    {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (K, V)> {
        self.pairs.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.pairs.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.pairs.iter().map(|(_, v)| v)
    }
}

impl<'a, K: Scalar, V: Scalar> IntoIterator for &'a DictSnapshot<K, V> {
    type Item = &'a (K, V);
    type IntoIter = std::slice::Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl<K: Scalar, V: Scalar> Reusable for DictSnapshot<K, V> {
    fn reset(&mut self) -> bool {
        self.pairs.clear();
        self.scratch.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    const BASE: u64 = 0x4300_0000;
    const ENTRIES: u64 = 0x4400_0000;

    fn seeded_dict(pairs: &[(i32, u64)]) -> MockMemoryReader {
        let mut bytes = Vec::new();
        for (i, (k, v)) in pairs.iter().enumerate() {
            // Slot record: hash, next, key, value. Internals are junk on
            // purpose; the capture must not interpret them.
            bytes.extend_from_slice(&0x7E57_1D00u32.to_le_bytes());
            bytes.extend_from_slice(&(i as i32 - 1).to_le_bytes());
            bytes.extend_from_slice(&k.to_le_bytes());
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        MockMemoryBuilder::new()
            .with_i32(BASE + layout::dict::COUNT, pairs.len() as i32)
            .with_u64(BASE + layout::dict::ENTRIES, ENTRIES)
            .with_bytes(ENTRIES + layout::dict::SLOTS_START, &bytes)
            .build()
    }

    #[test]
    fn test_capture_exposes_payloads_only() {
        let reader = seeded_dict(&[(1, 100), (2, 200), (3, 300)]);
        let mut snap = DictSnapshot::<i32, u64>::new();
        snap.capture(&reader, BASE, false).unwrap();

        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get(2), Some(&200));
        assert_eq!(snap.get(9), None);
        let keys: Vec<i32> = snap.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_slot_width_accounts_for_header() {
        assert_eq!(DictSnapshot::<i32, u64>::SLOT_WIDTH, 8 + 4 + 8);
        assert_eq!(DictSnapshot::<u64, u64>::SLOT_WIDTH, 8 + 8 + 8);
    }

    #[test]
    fn test_capture_empty_dict() {
        let reader = seeded_dict(&[]);
        let mut snap = DictSnapshot::<i32, u64>::new();
        snap.capture(&reader, BASE, false).unwrap();
        assert!(snap.is_empty());
        assert_eq!(reader.buf_read_count(), 1);
    }
}
