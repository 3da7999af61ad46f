//! # spyglass
//!
//! Batched remote-memory introspection engine.
//!
//! This crate provides:
//! - Scatter reads: hundreds of discontiguous typed reads per physical
//!   round-trip, with ordered rounds for dependent (pointer-chasing)
//!   reads
//! - Snapshot collections: bounded, single-bulk-read copies of remote
//!   managed arrays, lists, dictionaries and hash-sets
//! - An instance pool with scoped leases, so per-cycle read plumbing
//!   allocates nothing in steady state
//! - Transports behind the [`ReadMemory`] boundary: a live Windows
//!   process, a recorded dump file, and a seeded mock for tests
//!
//! The engine is synchronous and read-only. A leased map/round/index
//! chain belongs to one thread for its whole lifetime; pools are the
//! only cross-thread shared resource. Nothing here terminates the
//! process: corrupt counts and transport faults surface as errors for
//! the poll loop to log and retry next cycle.

pub mod error;
pub mod memory;
pub mod pool;
pub mod retry;
pub mod scatter;
pub mod snapshot;

pub use error::{Error, Result};
pub use memory::{
    MemoryDump, ReadMemory, RegionMeta, Scalar, ScalarKind, is_valid_address, layout,
    pattern::Signature,
};
pub use pool::{Lease, Pool, Reusable};
pub use retry::{ExponentialBackoff, FixedDelay, NoRetry, RetryStrategy};
pub use scatter::{IndexView, ScatterEntry, ScatterIndex, ScatterMap, ScatterRound};
pub use snapshot::{
    ArraySnapshot, CollectionKind, DictSnapshot, HashSetSnapshot, ListSnapshot,
    read_managed_string, read_managed_string_bounded,
};

#[cfg(target_os = "windows")]
pub use memory::ProcessHandle;
