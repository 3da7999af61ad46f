//! File-backed replay transport.
//!
//! A dump records one or more regions of a target's address space into a
//! single container file, which then serves as a [`ReadMemory`] transport
//! on any platform: the format is a fixed magic, a JSON manifest
//! describing the regions, and the raw region payloads in manifest
//! order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

const DUMP_MAGIC: &[u8; 4] = b"SGDP";
const DUMP_VERSION: u32 = 1;

/// Manifest entry describing one recorded region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionMeta {
    /// Remote base address the region was captured from.
    pub base: u64,
    /// Region size in bytes.
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DumpManifest {
    version: u32,
    created_at: DateTime<Utc>,
    regions: Vec<RegionMeta>,
}

struct Region {
    base: u64,
    data: Vec<u8>,
}

/// A recorded address-space slice usable as a read transport.
///
/// `use_cache` hints are ignored: a dump never goes stale.
#[derive(Default)]
pub struct MemoryDump {
    regions: Vec<Region>,
}

impl MemoryDump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a captured region. Regions may not overlap; lookups take the
    /// first region covering the requested range.
    pub fn add_region(&mut self, base: u64, data: Vec<u8>) {
        debug!("dump region: base={:#x}, size={}", base, data.len());
        self.regions.push(Region { base, data });
    }

    /// Manifest view of the recorded regions.
    pub fn regions(&self) -> Vec<RegionMeta> {
        self.regions
            .iter()
            .map(|r| RegionMeta {
                base: r.base,
                size: r.data.len() as u64,
            })
            .collect()
    }

    /// Total payload bytes across all regions.
    pub fn total_bytes(&self) -> u64 {
        self.regions.iter().map(|r| r.data.len() as u64).sum()
    }

    /// Borrow the raw bytes of the region based at exactly `base`.
    pub fn region_bytes(&self, base: u64) -> Option<&[u8]> {
        self.regions
            .iter()
            .find(|r| r.base == base)
            .map(|r| r.data.as_slice())
    }

    /// Write the container file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let manifest = DumpManifest {
            version: DUMP_VERSION,
            created_at: Utc::now(),
            regions: self.regions(),
        };
        let manifest_json = serde_json::to_vec(&manifest)?;

        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(DUMP_MAGIC)?;
        writer.write_all(&(manifest_json.len() as u32).to_le_bytes())?;
        writer.write_all(&manifest_json)?;
        for region in &self.regions {
            writer.write_all(&region.data)?;
        }
        writer.flush()?;

        info!(
            "Saved dump to {} ({} regions, {} bytes)",
            path.as_ref().display(),
            self.regions.len(),
            self.total_bytes()
        );
        Ok(())
    }

    /// Read a container file, validating magic and version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(&path)?);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != DUMP_MAGIC {
            return Err(Error::DumpFormat("bad magic".to_string()));
        }

        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let manifest_len = u32::from_le_bytes(len_buf) as usize;

        let mut manifest_json = vec![0u8; manifest_len];
        reader.read_exact(&mut manifest_json)?;
        let manifest: DumpManifest = serde_json::from_slice(&manifest_json)?;
        if manifest.version != DUMP_VERSION {
            return Err(Error::DumpFormat(format!(
                "unsupported version {}",
                manifest.version
            )));
        }

        let mut dump = Self::new();
        for meta in &manifest.regions {
            let mut data = vec![0u8; meta.size as usize];
            reader
                .read_exact(&mut data)
                .map_err(|_| Error::DumpFormat("truncated region payload".to_string()))?;
            dump.regions.push(Region {
                base: meta.base,
                data,
            });
        }

        debug!(
            "Loaded dump from {} ({} regions, created {})",
            path.as_ref().display(),
            dump.regions.len(),
            manifest.created_at
        );
        Ok(dump)
    }
}

impl ReadMemory for MemoryDump {
    fn read_buf(&self, address: u64, buf: &mut [u8], _use_cache: bool) -> Result<()> {
        let len = buf.len() as u64;
        for region in &self.regions {
            let end = region.base + region.data.len() as u64;
            if address >= region.base && address + len <= end {
                let start = (address - region.base) as usize;
                buf.copy_from_slice(&region.data[start..start + buf.len()]);
                return Ok(());
            }
        }
        Err(Error::MemoryReadFailed {
            address,
            message: "address range not covered by dump".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ReadMemory;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = NamedTempFile::new().unwrap();

        let mut dump = MemoryDump::new();
        dump.add_region(0x1000, vec![1, 2, 3, 4]);
        dump.add_region(0x9000, (0..64).collect());
        dump.save(temp.path()).unwrap();

        let loaded = MemoryDump::load(temp.path()).unwrap();
        assert_eq!(loaded.regions().len(), 2);
        assert_eq!(loaded.total_bytes(), 68);
        assert_eq!(loaded.read_u32(0x1000).unwrap(), u32::from_le_bytes([1, 2, 3, 4]));
        assert_eq!(loaded.read_bytes(0x9000 + 60, 4).unwrap(), vec![60, 61, 62, 63]);
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"NOPE0000").unwrap();
        assert!(matches!(
            MemoryDump::load(temp.path()),
            Err(Error::DumpFormat(_))
        ));
    }

    #[test]
    fn test_read_outside_regions_fails() {
        let mut dump = MemoryDump::new();
        dump.add_region(0x1000, vec![0; 16]);

        assert!(dump.read_u32(0x1000).is_ok());
        assert!(dump.read_u32(0x100E).is_err());
        assert!(dump.read_u32(0x2000).is_err());
    }
}
