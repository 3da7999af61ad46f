//! Record command (Windows): capture live process memory into a dump.

use std::path::Path;

use anyhow::{Context, Result};
use spyglass::{MemoryDump, ProcessHandle, ReadMemory};
use tracing::info;

pub fn run(process_name: &str, address: Option<u64>, size: usize, out: &Path) -> Result<()> {
    let process = ProcessHandle::find_and_open(process_name)
        .with_context(|| format!("cannot open process '{}'", process_name))?;

    // Default to the main module image when no address is given.
    let (base, size) = match address {
        Some(addr) => (addr, size),
        None => (process.base_address, process.module_size as usize),
    };

    info!(
        "Recording {} bytes at {:#x} from {} (pid {})",
        size, base, process.name, process.pid
    );

    let data = process
        .read_bytes(base, size)
        .with_context(|| format!("failed to read {} bytes at {:#x}", size, base))?;

    let mut dump = MemoryDump::new();
    dump.add_region(base, data);
    dump.save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Wrote {} ({} bytes).", out.display(), size);
    Ok(())
}
