//! One physical batch of scatter reads.
//!
//! A round collects entries across any number of indices and submits them
//! to the transport as a single [`ReadMemory::read_scatter`] call. Entries
//! within a round are logically simultaneous; reads that depend on each
//! other belong in separate rounds of the same map.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};

use crate::error::Result;
use crate::memory::{ReadMemory, Scalar};
use crate::scatter::entry::{MAX_ENTRY_WIDTH, ScatterEntry};

type IndexCallback = Box<dyn for<'a> FnMut(&IndexView<'a>) + Send>;

/// Per-key callback registrations. Entry storage itself lives flat in the
/// round so a batch can be handed to the transport as one slice.
struct IndexState {
    key: i32,
    callbacks: Vec<IndexCallback>,
}

/// An unordered set of indices read together in one bulk operation.
///
/// The cache policy is fixed when the round is added to its map and
/// applies uniformly to every entry read in the round.
pub struct ScatterRound {
    use_cache: bool,
    entries: Vec<ScatterEntry>,
    indices: Vec<IndexState>,
    live_indices: usize,
}

impl Default for ScatterRound {
    fn default() -> Self {
        Self {
            use_cache: true,
            entries: Vec::new(),
            indices: Vec::new(),
            live_indices: 0,
        }
    }
}

impl ScatterRound {
    pub(crate) fn rebind(&mut self, use_cache: bool) {
        self.use_cache = use_cache;
    }

    /// Round-wide cache policy.
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// Number of entries registered so far, across all indices.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Get or create the index for `key`.
    ///
    /// Keys are small caller-chosen integers, typically an enumeration of
    /// the objects being tracked this cycle.
    pub fn index(&mut self, key: i32) -> ScatterIndex<'_> {
        let slot = match self.indices[..self.live_indices]
            .iter()
            .position(|idx| idx.key == key)
        {
            Some(slot) => slot,
            None => {
                if self.live_indices < self.indices.len() {
                    // Recycle a previously-allocated index slot.
                    self.indices[self.live_indices].key = key;
                } else {
                    self.indices.push(IndexState {
                        key,
                        callbacks: Vec::new(),
                    });
                }
                self.live_indices += 1;
                self.live_indices - 1
            }
        };
        ScatterIndex { round: self, slot }
    }

    /// Read-only access to an index's results, valid once the round has
    /// executed. Unknown keys yield a view where every lookup misses.
    pub fn view(&self, index_key: i32) -> IndexView<'_> {
        IndexView {
            key: index_key,
            entries: &self.entries,
        }
    }

    /// Submit every entry as one bulk read, then fire each index's
    /// callbacks.
    ///
    /// A panicking callback is logged and isolated: sibling indices and
    /// subsequent rounds are unaffected, and its index simply looks like
    /// "no data" to downstream readers.
    pub(crate) fn run<R: ReadMemory + ?Sized>(&mut self, reader: &R) -> Result<()> {
        debug!(
            "scatter round: {} entries across {} indices (cache={})",
            self.entries.len(),
            self.live_indices,
            self.use_cache
        );
        reader.read_scatter(&mut self.entries, self.use_cache)?;

        for slot in 0..self.live_indices {
            let mut callbacks = std::mem::take(&mut self.indices[slot].callbacks);
            {
                let view = IndexView {
                    key: self.indices[slot].key,
                    entries: &self.entries,
                };
                for cb in callbacks.iter_mut() {
                    if catch_unwind(AssertUnwindSafe(|| cb(&view))).is_err() {
                        warn!("scatter index {} callback panicked, skipping", view.key);
                    }
                }
            }
            self.indices[slot].callbacks = callbacks;
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        for idx in &mut self.indices[..self.live_indices] {
            idx.callbacks.clear();
        }
        self.live_indices = 0;
        self.use_cache = true;
    }
}

/// Mutable handle to one index of a round, used while populating it.
pub struct ScatterIndex<'r> {
    round: &'r mut ScatterRound,
    slot: usize,
}

impl ScatterIndex<'_> {
    /// This index's key within its round.
    pub fn key(&self) -> i32 {
        self.round.indices[self.slot].key
    }

    /// Register a fixed-width typed read at `address` under `key`.
    ///
    /// Keys must be fresh per logical field; re-registering a key with a
    /// different request leaves which result wins unspecified.
    pub fn add_entry<T: Scalar>(&mut self, key: i32, address: u64) {
        const {
            assert!(T::WIDTH <= MAX_ENTRY_WIDTH);
        }
        let index_key = self.key();
        self.round
            .entries
            .push(ScatterEntry::new(index_key, key, address, T::WIDTH, None));
    }

    /// Like [`Self::add_entry`] with an explicit per-entry cache policy
    /// overriding the round default.
    pub fn add_entry_with_cache<T: Scalar>(&mut self, key: i32, address: u64, use_cache: bool) {
        const {
            assert!(T::WIDTH <= MAX_ENTRY_WIDTH);
        }
        let index_key = self.key();
        self.round.entries.push(ScatterEntry::new(
            index_key,
            key,
            address,
            T::WIDTH,
            Some(use_cache),
        ));
    }

    /// Register an untyped read of `width` bytes; results are exposed via
    /// [`IndexView::bytes`]. Widths beyond the inline maximum are rejected
    /// here, before any I/O.
    pub fn add_entry_sized(&mut self, key: i32, address: u64, width: usize) -> Result<()> {
        if width > MAX_ENTRY_WIDTH {
            return Err(crate::error::Error::EntryTooWide {
                width,
                max: MAX_ENTRY_WIDTH,
            });
        }
        let index_key = self.key();
        self.round
            .entries
            .push(ScatterEntry::new(index_key, key, address, width, None));
        Ok(())
    }

    /// Subscribe a completion callback, invoked once this index's entries
    /// have settled. Subscribers run in subscription order.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&IndexView<'_>) + Send + 'static,
    {
        self.round.indices[self.slot]
            .callbacks
            .push(Box::new(callback));
    }
}

/// Read-only window over one index's settled entries.
pub struct IndexView<'a> {
    key: i32,
    entries: &'a [ScatterEntry],
}

impl IndexView<'_> {
    /// Key of the index this view covers.
    pub fn key(&self) -> i32 {
        self.key
    }

    fn entry(&self, key: i32) -> Option<&ScatterEntry> {
        self.entries
            .iter()
            .find(|e| e.index_key() == self.key && e.key() == key)
    }

    /// Decode the entry registered under `key` as `T`.
    ///
    /// `None` for an unregistered key, an entry whose round has not
    /// executed, a failed read, or a width mismatch. Never panics; "not
    /// found" means "skip this field this cycle".
    pub fn result<T: Scalar>(&self, key: i32) -> Option<T> {
        self.entry(key)?.result()
    }

    /// Raw result bytes for `key`, if settled.
    pub fn bytes(&self, key: i32) -> Option<&[u8]> {
        self.entry(key)?.bytes()
    }

    /// Whether the entry under `key` was read successfully.
    pub fn is_set(&self, key: i32) -> bool {
        self.entry(key).is_some_and(|e| e.is_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    #[test]
    fn test_round_get_or_create_index() {
        let mut round = ScatterRound::default();
        round.index(3).add_entry::<u32>(0, 0x1000);
        round.index(3).add_entry::<u32>(1, 0x1004);
        round.index(7).add_entry::<u32>(0, 0x2000);

        assert_eq!(round.live_indices, 2);
        assert_eq!(round.entry_count(), 3);
    }

    #[test]
    fn test_round_zero_entries_runs_clean() {
        let reader = MockMemoryBuilder::new().build();
        let mut round = ScatterRound::default();
        round.run(&reader).unwrap();
        assert_eq!(round.view(0).result::<u32>(0), None);
    }

    #[test]
    fn test_view_before_execution_is_unset() {
        let mut round = ScatterRound::default();
        round.index(0).add_entry::<u32>(0, 0x1000);
        assert_eq!(round.view(0).result::<u32>(0), None);
        assert!(!round.view(0).is_set(0));
    }

    #[test]
    fn test_entry_too_wide_rejected_at_registration() {
        let mut round = ScatterRound::default();
        let err = round.index(0).add_entry_sized(0, 0x1000, 64).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::EntryTooWide { width: 64, .. }
        ));
        assert_eq!(round.entry_count(), 0);
    }

    #[test]
    fn test_reset_clears_indices_and_callbacks() {
        let mut round = ScatterRound::default();
        round.index(1).add_entry::<u32>(0, 0x1000);
        round.index(1).on_complete(|_| {});
        round.rebind(false);

        round.reset();
        assert_eq!(round.entry_count(), 0);
        assert_eq!(round.live_indices, 0);
        assert!(round.use_cache());
        // Recycled slot must not leak the old callback.
        round.index(9).add_entry::<u32>(0, 0x2000);
        assert!(round.indices[0].callbacks.is_empty());
    }
}
