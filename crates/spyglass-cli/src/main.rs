use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use spyglass::ScalarKind;
use spyglass::snapshot::CollectionKind;
use tracing_subscriber::EnvFilter;

mod commands;
mod shutdown;

use commands::{parse_address, parse_collection_kind, parse_scalar_kind};

#[derive(Parser)]
#[command(name = "spyglass")]
#[command(about = "Remote-memory introspection toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Display raw bytes from a dump in hexdump format
    Hexdump {
        /// Dump file to read from
        dump: PathBuf,
        /// Address to start at (0x-prefixed hex or decimal)
        #[arg(value_parser = parse_address)]
        address: u64,
        /// Number of bytes to display
        #[arg(short, long, default_value_t = 256)]
        size: usize,
        /// Suppress the ASCII gutter
        #[arg(long)]
        no_ascii: bool,
    },
    /// Read typed scalars, batched through one scatter round
    Read {
        dump: PathBuf,
        /// Value type to decode
        #[arg(short = 't', long = "type", value_parser = parse_scalar_kind, default_value = "u64")]
        kind: ScalarKind,
        /// Addresses to read
        #[arg(value_parser = parse_address, required = true)]
        addresses: Vec<u64>,
    },
    /// Decode a managed collection at an address
    Snapshot {
        dump: PathBuf,
        /// Collection shape: array, list, dict or set
        #[arg(short, long, value_parser = parse_collection_kind)]
        kind: CollectionKind,
        #[arg(value_parser = parse_address)]
        address: u64,
        /// Element (or dictionary value) type
        #[arg(short, long, value_parser = parse_scalar_kind, default_value = "u32")]
        elem: ScalarKind,
        /// Dictionary key type (i32, u32, i64 or u64)
        #[arg(long, value_parser = parse_scalar_kind, default_value = "i32")]
        key: ScalarKind,
        /// Override the element-count ceiling
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Scan a dump for a wildcard byte signature, e.g. "48 8B ?? 05"
    Scan {
        dump: PathBuf,
        pattern: String,
        /// Report every match instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Poll addresses on an interval until interrupted
    Watch {
        dump: PathBuf,
        #[arg(short = 't', long = "type", value_parser = parse_scalar_kind, default_value = "u64")]
        kind: ScalarKind,
        #[arg(value_parser = parse_address, required = true)]
        addresses: Vec<u64>,
        /// Poll interval in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Record live process memory into a dump file
    #[cfg(target_os = "windows")]
    Record {
        /// Executable name, e.g. "target.exe"
        process: String,
        /// Output dump file
        #[arg(short, long, default_value = "memory.dump")]
        out: PathBuf,
        /// Region base (defaults to the main module image)
        #[arg(long, value_parser = parse_address)]
        address: Option<u64>,
        /// Region size in bytes (ignored when --address is omitted)
        #[arg(long, default_value_t = 0x1000)]
        size: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spyglass=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Hexdump {
            dump,
            address,
            size,
            no_ascii,
        } => commands::hexdump::run(&dump, address, size, !no_ascii),
        Command::Read {
            dump,
            kind,
            addresses,
        } => commands::read::run(&dump, kind, &addresses),
        Command::Snapshot {
            dump,
            kind,
            address,
            elem,
            key,
            limit,
        } => commands::snapshot::run(
            &dump,
            &commands::snapshot::SnapshotArgs {
                kind,
                address,
                elem,
                key,
                limit,
            },
        ),
        Command::Scan { dump, pattern, all } => commands::scan::run(&dump, &pattern, all),
        Command::Watch {
            dump,
            kind,
            addresses,
            interval_ms,
        } => commands::watch::run(
            &dump,
            &commands::watch::WatchArgs {
                kind,
                addresses,
                interval: Duration::from_millis(interval_ms),
            },
        ),
        #[cfg(target_os = "windows")]
        Command::Record {
            process,
            out,
            address,
            size,
        } => commands::record::run(&process, address, size, &out),
    }
}
