//! Hexdump command.
//!
//! Prints raw dump bytes in 16-byte rows with an ASCII gutter:
//!
//! ```text
//! 0x000: 48 65 6C 6C 6F 00 00 00  00 00 00 00 00 00 00 00  |Hello...........|
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use spyglass::{MemoryDump, ReadMemory};

pub fn run(dump_path: &Path, address: u64, size: usize, ascii: bool) -> Result<()> {
    let dump = MemoryDump::load(dump_path)
        .with_context(|| format!("failed to load dump {}", dump_path.display()))?;
    let bytes = dump
        .read_bytes(address, size)
        .with_context(|| format!("failed to read {} bytes at {:#x}", size, address))?;

    println!("Hexdump at {:#x} ({} bytes):", address, size);
    println!();

    for (i, chunk) in bytes.chunks(16).enumerate() {
        print!("{}", format!("0x{:04X}: ", i * 16).dimmed());

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                print!(" ");
            }
            print!("{:02X} ", byte);
        }
        for j in chunk.len()..16 {
            if j == 8 {
                print!(" ");
            }
            print!("   ");
        }

        if ascii {
            print!(" |");
            for byte in chunk {
                if byte.is_ascii_graphic() || *byte == b' ' {
                    print!("{}", *byte as char);
                } else {
                    print!("{}", ".".dimmed());
                }
            }
            for _ in chunk.len()..16 {
                print!(" ");
            }
            print!("|");
        }

        println!();
    }

    Ok(())
}
