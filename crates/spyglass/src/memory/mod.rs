//! Remote memory access boundary.
//!
//! The engine never performs I/O itself; everything goes through the
//! [`ReadMemory`] trait, implemented by whatever transport the host
//! provides: a live process handle, a recorded dump, or a test mock.

pub mod layout;
pub mod pattern;

mod dump;
mod scalar;

#[cfg(target_os = "windows")]
mod process;

#[cfg(test)]
pub mod mock;

pub use dump::{MemoryDump, RegionMeta};
pub use scalar::{MAX_SCALAR_WIDTH, Scalar, ScalarKind};

#[cfg(target_os = "windows")]
pub use process::ProcessHandle;

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};

use tracing::debug;

use crate::error::Result;
use crate::scatter::ScatterEntry;

/// Lowest address considered plausible for a user-space allocation.
const MIN_USER_ADDRESS: u64 = 0x10000;

/// One past the highest canonical user-space address on x86-64.
const MAX_USER_ADDRESS: u64 = 0x0000_8000_0000_0000;

/// Validity predicate for remote pointers.
///
/// Addresses outside the canonical user-space range are treated as
/// "not present" by every read site; they must never be dereferenced.
pub fn is_valid_address(address: u64) -> bool {
    (MIN_USER_ADDRESS..MAX_USER_ADDRESS).contains(&address)
}

/// Primitive read operations against a remote address space.
///
/// `use_cache` is a hint for transports that keep a page cache (a round
/// may be satisfied from recently-read pages instead of fresh I/O);
/// transports without one ignore it.
pub trait ReadMemory {
    /// Fill `buf` with `buf.len()` bytes starting at `address`.
    fn read_buf(&self, address: u64, buf: &mut [u8], use_cache: bool) -> Result<()>;

    /// Read a fixed-width scalar value at `address`.
    fn read_scalar<T: Scalar>(&self, address: u64, use_cache: bool) -> Result<T>
    where
        Self: Sized,
    {
        let mut buf = [0u8; MAX_SCALAR_WIDTH];
        self.read_buf(address, &mut buf[..T::WIDTH], use_cache)?;
        Ok(T::from_bytes(&buf[..T::WIDTH]))
    }

    /// Read a platform-width pointer at `address`.
    ///
    /// Values failing [`is_valid_address`] come back as `0` ("not
    /// present") rather than an error, so callers can branch without
    /// exception handling. The zero value itself is never a valid target.
    fn read_ptr(&self, address: u64, use_cache: bool) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_buf(address, &mut buf, use_cache)?;
        let value = u64::from_le_bytes(buf);
        Ok(if is_valid_address(value) { value } else { 0 })
    }

    /// Satisfy a batch of scatter entries, ideally in one physical
    /// transaction.
    ///
    /// A failed entry is left unset and must not fail its siblings; only
    /// a transport-level fault (connection gone, handle invalid) may fail
    /// the whole batch. The default implementation issues one read per
    /// entry, which is correct but forfeits the batching win.
    fn read_scatter(&self, entries: &mut [ScatterEntry], use_cache: bool) -> Result<()> {
        for entry in entries.iter_mut() {
            let fresh = entry.effective_cache(use_cache);
            let width = entry.width();
            let mut buf = [0u8; MAX_SCALAR_WIDTH];
            match self.read_buf(entry.address(), &mut buf[..width], fresh) {
                Ok(()) => entry.fill(&buf[..width]),
                Err(e) => {
                    debug!("scatter entry at {:#x} failed: {}", entry.address(), e);
                }
            }
        }
        Ok(())
    }

    /// Read a 32-bit signed integer (uncached).
    fn read_i32(&self, address: u64) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_buf(address, &mut buf, false)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read a 32-bit unsigned integer (uncached).
    fn read_u32(&self, address: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_buf(address, &mut buf, false)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a 64-bit unsigned integer (uncached).
    fn read_u64(&self, address: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_buf(address, &mut buf, false)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a 32-bit float (uncached).
    fn read_f32(&self, address: u64) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_buf(address, &mut buf, false)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Read `len` bytes into a fresh buffer (uncached).
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_buf(address, &mut buf, false)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validity() {
        assert!(!is_valid_address(0));
        assert!(!is_valid_address(0xFFFF));
        assert!(is_valid_address(0x10000));
        assert!(is_valid_address(0x7FFF_0000_1234));
        assert!(!is_valid_address(0x8000_0000_0000));
        assert!(!is_valid_address(u64::MAX));
    }

    #[test]
    fn test_read_ptr_sanitizes_invalid_values() {
        let reader = MockMemoryBuilder::new()
            .with_u64(0x1000, 0x2000_0000)
            .with_u64(0x1008, 0xFFFF_FFFF_FFFF_FFFF)
            .with_u64(0x1010, 0)
            .build();

        assert_eq!(reader.read_ptr(0x1000, false).unwrap(), 0x2000_0000);
        assert_eq!(reader.read_ptr(0x1008, false).unwrap(), 0);
        assert_eq!(reader.read_ptr(0x1010, false).unwrap(), 0);
    }

    #[test]
    fn test_typed_convenience_reads() {
        let reader = MockMemoryBuilder::new()
            .with_i32(0x100, -7)
            .with_u64(0x104, 0xDEAD_BEEF)
            .with_f32(0x10C, 3.25)
            .build();

        assert_eq!(reader.read_i32(0x100).unwrap(), -7);
        assert_eq!(reader.read_u64(0x104).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_f32(0x10C).unwrap(), 3.25);
        assert!(reader.read_i32(0x9999_9999).is_err());
    }
}
