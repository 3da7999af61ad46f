//! Batched scatter-read engine.
//!
//! The scatter types form a strict ownership chain: a [`ScatterMap`] owns
//! rounds, a [`ScatterRound`] owns indices, an index owns entries. One
//! round is one physical bulk read; one map is an ordered pipeline of
//! rounds, which is what dependent (pointer-chasing) reads hang off.
//!
//! Typical cycle:
//!
//! ```ignore
//! let mut map = pools.maps.lease();
//! {
//!     let round = map.add_round(true);
//!     let mut hp = round.index(0);
//!     hp.add_entry::<u64>(0, player_base + offsets::HEALTH_PTR);
//!     hp.on_complete(move |view| { /* stash the pointer somewhere */ });
//! }
//! map.execute(&reader)?;
//! // lease drop resets the map and returns it to the pool
//! ```

mod entry;
mod map;
mod round;

pub use entry::{MAX_ENTRY_WIDTH, ScatterEntry};
pub use map::ScatterMap;
pub use round::{IndexView, ScatterIndex, ScatterRound};
