//! Ordered sequence of scatter rounds.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};

use crate::error::Result;
use crate::memory::ReadMemory;
use crate::pool::Reusable;
use crate::scatter::round::ScatterRound;

type MapCallback = Box<dyn FnOnce() + Send>;

/// A multi-round scatter read.
///
/// Rounds execute strictly in the order they were added, one bulk read
/// each; a callback in round *N* may capture addresses that entries in
/// round *N + 1* were built from — this two-level split is what makes
/// dependent (pointer-chasing) reads possible. Entries within a single
/// round cannot depend on each other.
///
/// Maps are built for pooling: lease one, populate, execute, and let the
/// lease return it. Rounds, indices and entries are recycled in place
/// across cycles, so a steady-state poll loop performs no heap
/// allocation for its read plumbing.
pub struct ScatterMap {
    rounds: Vec<ScatterRound>,
    live_rounds: usize,
    on_complete: Option<MapCallback>,
}

impl Default for ScatterMap {
    fn default() -> Self {
        Self {
            rounds: Vec::new(),
            live_rounds: 0,
            on_complete: None,
        }
    }
}

impl ScatterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a round with the given cache policy and return a handle for
    /// populating it.
    pub fn add_round(&mut self, use_cache: bool) -> &mut ScatterRound {
        if self.live_rounds < self.rounds.len() {
            self.rounds[self.live_rounds].rebind(use_cache);
        } else {
            let mut round = ScatterRound::default();
            round.rebind(use_cache);
            self.rounds.push(round);
        }
        self.live_rounds += 1;
        &mut self.rounds[self.live_rounds - 1]
    }

    /// Number of rounds added since the last reset.
    pub fn round_count(&self) -> usize {
        self.live_rounds
    }

    pub fn is_empty(&self) -> bool {
        self.live_rounds == 0
    }

    /// The rounds added so far, in execution order.
    pub fn rounds(&self) -> &[ScatterRound] {
        &self.rounds[..self.live_rounds]
    }

    /// Set the map-level completion callback.
    ///
    /// It fires after the last round completes — only if at least one
    /// round exists; executing an empty map is a no-op that fires
    /// nothing. A transport error part-way also skips it.
    pub fn set_completion<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Run every round in order against `reader`.
    ///
    /// Each round performs one bulk read and then fires its index
    /// callbacks; callbacks for round *N* observe only round *N*'s data.
    /// A transport failure propagates to the caller immediately; entries
    /// of the failed and later rounds stay unset, and the map remains
    /// safe to return to its pool.
    pub fn execute<R: ReadMemory + ?Sized>(&mut self, reader: &R) -> Result<()> {
        if self.live_rounds == 0 {
            return Ok(());
        }
        debug!("executing scatter map: {} rounds", self.live_rounds);

        for i in 0..self.live_rounds {
            self.rounds[i].run(reader)?;
        }

        if let Some(callback) = self.on_complete.take()
            && catch_unwind(AssertUnwindSafe(callback)).is_err()
        {
            warn!("scatter map completion callback panicked");
        }
        Ok(())
    }
}

impl Reusable for ScatterMap {
    fn reset(&mut self) -> bool {
        for round in &mut self.rounds[..self.live_rounds] {
            round.reset();
        }
        self.live_rounds = 0;
        self.on_complete = None;
        true
    }
}
