//! Poll-loop watch command.
//!
//! Re-reads a set of addresses every interval through one scatter round
//! per cycle, printing values when they change. Transient read failures
//! are logged and retried with backoff; Ctrl+C cancels the current wait
//! and exits cleanly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use spyglass::{
    ExponentialBackoff, MemoryDump, Pool, ReadMemory, RetryStrategy, ScalarKind, ScatterMap,
};
use tracing::{info, warn};

use crate::shutdown::CancelToken;

pub struct WatchArgs {
    pub kind: ScalarKind,
    pub addresses: Vec<u64>,
    pub interval: Duration,
}

pub fn run(dump_path: &Path, args: &WatchArgs) -> Result<()> {
    let dump = MemoryDump::load(dump_path)
        .with_context(|| format!("failed to load dump {}", dump_path.display()))?;

    let cancel = Arc::new(CancelToken::new());
    let cancel_handler = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        info!("Received interrupt, stopping...");
        cancel_handler.cancel();
    })
    .context("failed to install interrupt handler")?;

    watch_loop(&dump, args, &cancel)
}

/// The poll loop proper, generic over the transport.
pub fn watch_loop<R: ReadMemory>(reader: &R, args: &WatchArgs, cancel: &CancelToken) -> Result<()> {
    let pool: Pool<ScatterMap> = Pool::new();
    let backoff = ExponentialBackoff::new(args.interval, args.interval * 8, u32::MAX);
    let mut last: Vec<Option<Vec<u8>>> = vec![None; args.addresses.len()];
    let mut failures = 0u32;

    info!(
        "Watching {} address(es) every {:?}",
        args.addresses.len(),
        args.interval
    );

    while !cancel.is_cancelled() {
        match poll_once(reader, args, &pool, &mut last) {
            Ok(()) => failures = 0,
            Err(e) => {
                // Keep polling: a failed cycle means "no data this
                // cycle", not a dead loop.
                failures += 1;
                warn!("poll cycle failed ({}), consecutive failures: {}", e, failures);
            }
        }

        let delay = if failures > 0 {
            backoff.next_delay(failures).unwrap_or(args.interval)
        } else {
            args.interval
        };
        if cancel.wait(delay) {
            break;
        }
    }

    info!("Watch stopped.");
    Ok(())
}

fn poll_once<R: ReadMemory>(
    reader: &R,
    args: &WatchArgs,
    pool: &Pool<ScatterMap>,
    last: &mut [Option<Vec<u8>>],
) -> Result<()> {
    let mut map = pool.lease();
    {
        let round = map.add_round(false);
        for (i, address) in args.addresses.iter().enumerate() {
            round
                .index(i as i32)
                .add_entry_sized(0, *address, args.kind.width())?;
        }
    }
    map.execute(reader)?;

    for (i, address) in args.addresses.iter().enumerate() {
        let view = map.rounds()[0].view(i as i32);
        let current = view.bytes(0).map(|b| b.to_vec());
        if current != last[i] {
            match &current {
                Some(bytes) => info!("{:#018x} = {}", address, args.kind.format_bytes(bytes)),
                None => info!("{:#018x} = <unreadable>", address),
            }
            last[i] = current;
        }
    }
    Ok(())
}
