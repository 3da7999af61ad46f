//! Point-in-time copies of remote managed collections.
//!
//! Each snapshot type reconstructs one collection with a bounded count
//! check followed by a single contiguous bulk read — never one read per
//! element. Construction is all-or-nothing: any failure leaves the
//! snapshot empty and propagates to the caller, who treats the owning
//! object as unavailable for this cycle.
//!
//! Snapshot instances implement [`crate::pool::Reusable`] and are meant
//! to be leased from a [`crate::pool::Pool`]; releasing the lease clears
//! the logical contents but keeps the backing capacity for the next
//! cycle.

mod array;
mod dict;
mod list;
mod set;
mod string;

pub use array::ArraySnapshot;
pub use dict::DictSnapshot;
pub use list::ListSnapshot;
pub use set::HashSetSnapshot;
pub use string::{read_managed_string, read_managed_string_bounded};

use strum::{Display, EnumIter, EnumString};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// The managed collection shapes the engine can snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CollectionKind {
    Array,
    List,
    Dict,
    Set,
}

/// Read a collection's count field and validate it against the ceiling.
///
/// This single check is what stops a corrupted or stale base pointer from
/// turning into an implausibly large allocation and bulk read: it runs
/// before any storage is sized and before any bulk I/O is issued.
pub(crate) fn read_count<R: ReadMemory + ?Sized>(
    reader: &R,
    address: u64,
    use_cache: bool,
    limit: usize,
) -> Result<usize> {
    let mut buf = [0u8; 4];
    reader.read_buf(address, &mut buf, use_cache)?;
    let count = i32::from_le_bytes(buf);
    if count < 0 || count as usize > limit {
        return Err(Error::SnapshotTooLarge {
            count: count as i64,
            limit,
        });
    }
    Ok(count as usize)
}

/// Dereference a collection's backing-store pointer field.
///
/// A zero or non-canonical value with a nonzero element count means the
/// header is garbage; surface it rather than reading from nowhere.
pub(crate) fn read_backing_ptr<R: ReadMemory + ?Sized>(
    reader: &R,
    address: u64,
    use_cache: bool,
) -> Result<u64> {
    let ptr = reader.read_ptr(address, use_cache)?;
    if ptr == 0 {
        return Err(Error::InvalidPointer { address });
    }
    Ok(ptr)
}
