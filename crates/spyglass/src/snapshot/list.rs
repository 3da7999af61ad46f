//! Snapshot of a remote managed list.

use crate::error::Result;
use crate::memory::{ReadMemory, Scalar, layout};
use crate::pool::Reusable;
use crate::snapshot::{read_backing_ptr, read_count};

/// Immutable copy of a managed list, taken with one bulk read.
///
/// Unlike the raw array, a list's header holds a pointer to a backing
/// array; the logical count lives in the list header, so the capture
/// dereferences the backing pointer and skips the backing array's own
/// header before reading elements.
pub struct ListSnapshot<T: Scalar> {
    items: Vec<T>,
    scratch: Vec<u8>,
}

impl<T: Scalar> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

impl<T: Scalar> ListSnapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the list at `address` using the default bounds ceiling.
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

        let count = read_count(reader, address + layout::list::COUNT, use_cache, limit)?;
        if count == 0 {
            return Ok(());
        }

        let backing = read_backing_ptr(reader, address + layout::list::ITEMS, use_cache)?;
        let start = backing + layout::list::ITEMS_START;

        self.scratch.clear();
        self.scratch.resize(count * T::WIDTH, 0);
        reader.read_buf(start, &mut self.scratch, use_cache)?;

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

impl<'a, T: Scalar> IntoIterator for &'a ListSnapshot<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Scalar> Reusable for ListSnapshot<T> {
    fn reset(&mut self) -> bool {
        self.items.clear();
        self.scratch.clear();
        true
    }
}
