use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wf_core::ValueRange;

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::EventRecord;

/// A simulation subsystem ticked by the coordinator.
///
/// Subsystems run in a fixed order each sub-tick and hand back the events
/// they produced; the coordinator publishes them.
pub trait Subsystem: std::fmt::Debug {
    /// Human-readable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Advance by `ctx.delta_hours`.
    fn update(&mut self, ctx: &TickContext<'_>) -> SimResult<Vec<EventRecord>>;
}

/// Derive an independent RNG stream for one subsystem.
///
/// The same `(seed, salt, tick)` always yields the same stream, which is how a
/// restored simulation resumes deterministically.
pub(crate) fn rng_stream(seed: u64, salt: u64, tick: u64) -> StdRng {
    let mixed = seed ^ salt ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed)
}

/// Bernoulli roll with the probability clamped into `0..=1`.
pub(crate) fn roll(rng: &mut StdRng, probability: f64) -> bool {
    if probability.is_nan() || probability <= 0.0 {
        return false;
    }
    rng.random_bool(probability.min(1.0))
}

/// Uniform draw from an inclusive range.
pub(crate) fn sample(rng: &mut StdRng, range: ValueRange) -> f64 {
    if range.max <= range.min {
        return range.min;
    }
    rng.random_range(range.min..=range.max)
}
