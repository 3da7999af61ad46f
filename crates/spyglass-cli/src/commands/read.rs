//! Batched scalar read command.
//!
//! All requested addresses go through one scatter round, so the whole
//! set costs a single physical transaction on transports that support
//! batching.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use spyglass::{MemoryDump, Pool, ScalarKind, ScatterMap};

pub fn run(dump_path: &Path, kind: ScalarKind, addresses: &[u64]) -> Result<()> {
    let dump = MemoryDump::load(dump_path)
        .with_context(|| format!("failed to load dump {}", dump_path.display()))?;

    let pool: Pool<ScatterMap> = Pool::new();
    let mut map = pool.lease();
    {
        let round = map.add_round(true);
        for (i, address) in addresses.iter().enumerate() {
            round
                .index(i as i32)
                .add_entry_sized(0, *address, kind.width())?;
        }
    }
    map.execute(&dump).context("scatter read failed")?;

    for (i, address) in addresses.iter().enumerate() {
        let view = map.rounds()[0].view(i as i32);
        match view.bytes(0) {
            Some(bytes) => println!("{:#018x}  {}", address, kind.format_bytes(bytes)),
            None => println!("{:#018x}  {}", address, "<unreadable>".dimmed()),
        }
    }

    Ok(())
}
