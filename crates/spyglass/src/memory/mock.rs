//! In-memory mock transport for tests.
//!
//! Seeded with byte regions at chosen addresses; counts every physical
//! read so tests can assert how much I/O an operation issued (or that it
//! issued none at all).

use std::cell::Cell;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::scatter::ScatterEntry;

/// Builder for [`MockMemoryReader`].
#[derive(Default)]
pub struct MockMemoryBuilder {
    regions: Vec<(u64, Vec<u8>)>,
    fail_scatter: bool,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw bytes at `address`.
    pub fn with_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        self.regions.push((address, bytes.to_vec()));
        self
    }

    pub fn with_i32(self, address: u64, value: i32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_u32(self, address: u64, value: u32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_u64(self, address: u64, value: u64) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_f32(self, address: u64, value: f32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    /// Make every scatter batch fail wholesale, simulating a transport
    /// fault rather than a bad address.
    pub fn fail_scatter(mut self) -> Self {
        self.fail_scatter = true;
        self
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            regions: self.regions,
            fail_scatter: self.fail_scatter,
            buf_reads: Cell::new(0),
            scatter_calls: Cell::new(0),
        }
    }
}

/// Mock address space with read accounting.
pub struct MockMemoryReader {
    regions: Vec<(u64, Vec<u8>)>,
    fail_scatter: bool,
    buf_reads: Cell<usize>,
    scatter_calls: Cell<usize>,
}

impl MockMemoryReader {
    /// Number of `read_buf` calls issued so far (bulk and scalar reads
    /// alike).
    pub fn buf_read_count(&self) -> usize {
        self.buf_reads.get()
    }

    /// Number of scatter batches submitted so far.
    pub fn scatter_call_count(&self) -> usize {
        self.scatter_calls.get()
    }

    fn copy_from_regions(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        let len = buf.len() as u64;
        for (base, data) in &self.regions {
            let end = base + data.len() as u64;
            if address >= *base && address + len <= end {
                let start = (address - base) as usize;
                buf.copy_from_slice(&data[start..start + buf.len()]);
                return Ok(());
            }
        }
        Err(Error::MemoryReadFailed {
            address,
            message: "address not seeded in mock".to_string(),
        })
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_buf(&self, address: u64, buf: &mut [u8], _use_cache: bool) -> Result<()> {
        self.buf_reads.set(self.buf_reads.get() + 1);
        self.copy_from_regions(address, buf)
    }

    fn read_scatter(&self, entries: &mut [ScatterEntry], _use_cache: bool) -> Result<()> {
        self.scatter_calls.set(self.scatter_calls.get() + 1);
        if self.fail_scatter {
            return Err(Error::MemoryReadFailed {
                address: entries.first().map(|e| e.address()).unwrap_or(0),
                message: "scatter transport failure (mock)".to_string(),
            });
        }
        for entry in entries.iter_mut() {
            let mut buf = [0u8; crate::scatter::MAX_ENTRY_WIDTH];
            let width = entry.width();
            // Partial failure: a bad address skips this entry only.
            if self.copy_from_regions(entry.address(), &mut buf[..width]).is_ok() {
                entry.fill(&buf[..width]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ReadMemory;
    use crate::scatter::ScatterEntry;

    #[test]
    fn test_mock_read_counts() {
        let reader = MockMemoryBuilder::new().with_u32(0x100, 3).build();
        assert_eq!(reader.buf_read_count(), 0);
        reader.read_u32(0x100).unwrap();
        reader.read_u32(0x100).unwrap();
        assert_eq!(reader.buf_read_count(), 2);
    }

    #[test]
    fn test_mock_unseeded_read_fails() {
        let reader = MockMemoryBuilder::new().with_u32(0x100, 3).build();
        assert!(reader.read_u32(0x200).is_err());
        // Reads straddling the end of a region fail too.
        assert!(reader.read_u64(0x102).is_err());
    }

    #[test]
    fn test_mock_scatter_partial_failure() {
        let reader = MockMemoryBuilder::new().with_u32(0x100, 11).build();
        let mut batch = [
            ScatterEntry::new(0, 0, 0x100, 4, None),
            ScatterEntry::new(0, 1, 0xDEAD_0000, 4, None),
        ];
        reader.read_scatter(&mut batch, true).unwrap();
        assert_eq!(batch[0].result::<u32>(), Some(11));
        assert!(!batch[1].is_set());
        assert_eq!(reader.scatter_call_count(), 1);
    }
}
