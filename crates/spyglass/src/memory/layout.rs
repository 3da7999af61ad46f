//! Memory layout constants for the target runtime's managed collections.
//!
//! This module centralizes the fixed byte offsets used to reconstruct
//! collection snapshots. Constants are organized by collection type; all
//! offsets are relative to the object's base address unless noted.

/// Hard ceiling on reported element counts.
///
/// A count above this is taken as evidence of a corrupted or stale base
/// pointer, and the snapshot is rejected before any allocation or bulk
/// read is attempted. The value is an empirical safety ceiling carried
/// over for compatibility; `capture_bounded` accepts a different one.
pub const MAX_ELEMENTS: usize = 16384;

/// Ceiling on managed string lengths, in UTF-16 code units.
pub const MAX_STRING_CHARS: usize = 4096;

/// Managed array (`T[]`) layout.
pub mod array {
    /// Element count (32-bit) at the array header.
    pub const COUNT: u64 = 0x18;

    /// First element; the raw-array form reads here directly, no
    /// indirection.
    pub const ITEMS: u64 = 0x20;
}

/// Managed list layout. The backing store is itself a managed array, so
/// elements begin [`super::array::ITEMS`] bytes past the backing pointer.
pub mod list {
    /// Pointer to the backing array.
    pub const ITEMS: u64 = 0x10;

    /// Logical element count (32-bit); the backing array may be larger.
    pub const COUNT: u64 = 0x18;

    /// Offset of the first element inside the backing array.
    pub const ITEMS_START: u64 = 0x20;
}

/// Managed dictionary layout.
///
/// Entries live in a single slots array of fixed-stride records:
/// `{ hash: i32, next: i32, key: K, value: V }`. Only the key/value
/// payload is interpreted; hash and next are table internals.
pub mod dict {
    /// Pointer to the entries array.
    pub const ENTRIES: u64 = 0x10;

    /// Used entry count (32-bit).
    pub const COUNT: u64 = 0x20;

    /// Offset of the first slot record inside the entries array.
    pub const SLOTS_START: u64 = 0x20;

    /// Bytes of table internals (hash + next) preceding each payload.
    pub const SLOT_HEADER: usize = 8;
}

/// Managed hash-set layout. Same slot scheme as the dictionary with a
/// single payload value per slot.
pub mod hash_set {
    /// Pointer to the slots array.
    pub const SLOTS: u64 = 0x10;

    /// Used slot count (32-bit).
    pub const COUNT: u64 = 0x20;

    /// Offset of the first slot record inside the slots array.
    pub const SLOTS_START: u64 = 0x20;

    /// Bytes of table internals (hash + next) preceding each payload.
    pub const SLOT_HEADER: usize = 8;
}

/// Managed string layout (length-prefixed UTF-16).
pub mod string {
    /// Length in UTF-16 code units (32-bit).
    pub const LENGTH: u64 = 0x10;

    /// First code unit.
    pub const CHARS: u64 = 0x14;
}
