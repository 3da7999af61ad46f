//! Snapshot of a remote managed hash-set.

use crate::error::Result;
use crate::memory::{ReadMemory, Scalar, layout};
use crate::pool::Reusable;
use crate::snapshot::{read_backing_ptr, read_count};

/// Immutable copy of a managed hash-set's values.
///
/// Slot records carry `{ hash, next, value }`; as with the dictionary,
/// the table internals travel in the bulk read but only the value
/// payload is exposed.
pub struct HashSetSnapshot<T: Scalar> {
    items: Vec<T>,
    scratch: Vec<u8>,
}

impl<T: Scalar> Default for HashSetSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

impl<T: Scalar> HashSetSnapshot<T> {
    /// Stride of one slot record in the slots array.
    pub const SLOT_WIDTH: usize = layout::hash_set::SLOT_HEADER + T::WIDTH;

    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the set at `address` using the default bounds ceiling.
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
        self.items.clear();

        let count = read_count(reader, address + layout::hash_set::COUNT, use_cache, limit)?;
        if count == 0 {
            return Ok(());
        }

        let slots = read_backing_ptr(reader, address + layout::hash_set::SLOTS, use_cache)?;
        let start = slots + layout::hash_set::SLOTS_START;

        self.scratch.clear();
        self.scratch.resize(count * Self::SLOT_WIDTH, 0);
        reader.read_buf(start, &mut self.scratch, use_cache)?;

        self.items.extend(
            self.scratch
                .chunks_exact(Self::SLOT_WIDTH)
                .map(|slot| T::from_bytes(&slot[layout::hash_set::SLOT_HEADER..])),
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Linear membership check against the snapshot contents.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.items.contains(value)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T: Scalar> IntoIterator for &'a HashSetSnapshot<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Scalar> Reusable for HashSetSnapshot<T> {
    fn reset(&mut self) -> bool {
        self.items.clear();
        self.scratch.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    const BASE: u64 = 0x4500_0000;
    const SLOTS: u64 = 0x4600_0000;

    fn seeded_set(values: &[u32]) -> MockMemoryReader {
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(&0xAAAA_AAAAu32.to_le_bytes());
            bytes.extend_from_slice(&(-1i32).to_le_bytes());
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        MockMemoryBuilder::new()
            .with_i32(BASE + layout::hash_set::COUNT, values.len() as i32)
            .with_u64(BASE + layout::hash_set::SLOTS, SLOTS)
            .with_bytes(SLOTS + layout::hash_set::SLOTS_START, &bytes)
            .build()
    }

    #[test]
    fn test_capture_values() {
        let reader = seeded_set(&[5, 6, 7]);
        let mut snap = HashSetSnapshot::<u32>::new();
        snap.capture(&reader, BASE, false).unwrap();
        assert_eq!(snap.as_slice(), &[5, 6, 7]);
        assert!(snap.contains(&6));
        assert!(!snap.contains(&8));
    }

    #[test]
    fn test_capture_empty_set() {
        let reader = seeded_set(&[]);
        let mut snap = HashSetSnapshot::<u32>::new();
        snap.capture(&reader, BASE, false).unwrap();
        assert!(snap.is_empty());
        assert_eq!(reader.buf_read_count(), 1);
    }
}
