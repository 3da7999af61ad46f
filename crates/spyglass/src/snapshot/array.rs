//! Snapshot of a remote managed array (`T[]`).

use crate::error::Result;
use crate::memory::{ReadMemory, Scalar, layout};
use crate::pool::Reusable;
use crate::snapshot::read_count;

/// Immutable copy of a managed array, taken with one bulk read.
///
/// The raw-array form carries its elements inline: count at a fixed
/// header offset, elements starting right after the header, no
/// indirection.
pub struct ArraySnapshot<T: Scalar> {
    items: Vec<T>,
    scratch: Vec<u8>,
}

impl<T: Scalar> Default for ArraySnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

impl<T: Scalar> ArraySnapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the array at `address` using the default bounds ceiling.
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

        let count = read_count(reader, address + layout::array::COUNT, use_cache, limit)?;
        if count == 0 {
            return Ok(());
        }

        self.scratch.clear();
        self.scratch.resize(count * T::WIDTH, 0);
        reader.read_buf(address + layout::array::ITEMS, &mut self.scratch, use_cache)?;

        self.items
            .extend(self.scratch.chunks_exact(T::WIDTH).map(T::from_bytes));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T: Scalar> IntoIterator for &'a ArraySnapshot<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Scalar> Reusable for ArraySnapshot<T> {
    fn reset(&mut self) -> bool {
        self.items.clear();
        self.scratch.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::memory::MockMemoryBuilder;
    use crate::pool::Pool;

    const BASE: u64 = 0x4000_0000;

    fn seeded_array(values: &[i32]) -> crate::memory::MockMemoryReader {
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        MockMemoryBuilder::new()
            .with_i32(BASE + layout::array::COUNT, values.len() as i32)
            .with_bytes(BASE + layout::array::ITEMS, &bytes)
            .build()
    }

    #[test]
    fn test_capture_preserves_order() {
        let reader = seeded_array(&[1, 2, 3]);
        let mut snap = ArraySnapshot::<i32>::new();
        snap.capture(&reader, BASE, false).unwrap();
        assert_eq!(snap.as_slice(), &[1, 2, 3]);
        assert_eq!(snap.get(1), Some(&2));
    }

    #[test]
    fn test_capture_empty_issues_no_bulk_read() {
        let reader = seeded_array(&[]);
        let mut snap = ArraySnapshot::<i32>::new();
        snap.capture(&reader, BASE, false).unwrap();
        assert!(snap.is_empty());
        // Only the count field was read.
        assert_eq!(reader.buf_read_count(), 1);
    }

    #[test]
    fn test_capture_oversized_count_rejected_before_read() {
        let reader = MockMemoryBuilder::new()
            .with_i32(BASE + layout::array::COUNT, 1_000_000)
            .build();
        let mut snap = ArraySnapshot::<i32>::new();
        let err = snap.capture(&reader, BASE, false).unwrap_err();
        assert!(matches!(err, Error::SnapshotTooLarge { .. }));
        assert!(snap.is_empty());
        assert_eq!(reader.buf_read_count(), 1);
    }

    #[test]
    fn test_capture_all_counts_up_to_ceiling() {
        for count in [0usize, 1, 2, 16] {
            let values: Vec<i32> = (0..count as i32).collect();
            let reader = seeded_array(&values);
            let mut snap = ArraySnapshot::<i32>::new();
            snap.capture(&reader, BASE, false).unwrap();
            assert_eq!(snap.len(), count);
        }
    }

    #[test]
    fn test_custom_ceiling() {
        let reader = seeded_array(&[1, 2, 3, 4, 5]);
        let mut snap = ArraySnapshot::<i32>::new();
        assert!(snap.capture_bounded(&reader, BASE, false, 4).is_err());
        assert!(snap.capture_bounded(&reader, BASE, false, 5).is_ok());
    }

    #[test]
    fn test_pooled_snapshot_resets() {
        let pool: Pool<ArraySnapshot<i32>> = Pool::new();
        let reader = seeded_array(&[9, 8]);
        {
            let mut snap = pool.lease();
            snap.capture(&reader, BASE, false).unwrap();
            assert_eq!(snap.len(), 2);
        }
        let snap = pool.lease();
        assert!(snap.is_empty());
    }
}
