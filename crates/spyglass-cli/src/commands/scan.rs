//! Signature scan command.

use std::path::Path;

use anyhow::{Context, Result};
use spyglass::{MemoryDump, Signature};

pub fn run(dump_path: &Path, pattern: &str, all: bool) -> Result<()> {
    let dump = MemoryDump::load(dump_path)
        .with_context(|| format!("failed to load dump {}", dump_path.display()))?;
    let signature: Signature = pattern.parse().context("invalid pattern")?;

    println!("Scanning for: {}", signature);

    let mut total = 0usize;
    for meta in dump.regions() {
        let Some(bytes) = dump.region_bytes(meta.base) else {
            continue;
        };
        for offset in signature.scan_all(bytes) {
            println!("{:#018x}", meta.base + offset as u64);
            total += 1;
            if !all {
                break;
            }
        }
        if total > 0 && !all {
            break;
        }
    }

    if total == 0 {
        println!("No matches.");
    } else {
        println!("{} match(es).", total);
    }
    Ok(())
}
