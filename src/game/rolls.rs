//! # Combat Rolls
//!
//! Source of randomness for combat outcomes. Swapping the roller is how
//! tests force specific damage values.

use rand::Rng;
use std::collections::VecDeque;

/// Uniform integer rolls for combat.
pub trait CombatRoller {
    /// Returns a value in `[low, high)`. Returns `low` when the range is empty.
    fn roll(&mut self, low: u32, high: u32) -> u32;
}

/// Default roller backed by any [`rand::Rng`].
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use shadowrealm::{CombatRoller, RngRoller};
///
/// let mut roller = RngRoller::new(StdRng::seed_from_u64(7));
/// let value = roller.roll(25, 75);
/// assert!((25..75).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct RngRoller<R: Rng> {
    rng: R,
}

impl<R: Rng> RngRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> CombatRoller for RngRoller<R> {
    fn roll(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}

/// Replays a fixed sequence of rolls, clamped into the requested range.
///
/// Once the script runs out every roll returns `low`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    script: VecDeque<u32>,
}

impl ScriptedRolls {
    pub fn new<I: IntoIterator<Item = u32>>(rolls: I) -> Self {
        Self {
            script: rolls.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl CombatRoller for ScriptedRolls {
    fn roll(&mut self, low: u32, high: u32) -> u32 {
        let next = self.script.pop_front().unwrap_or(low);
        if high <= low {
            low
        } else {
            next.clamp(low, high - 1)
        }
    }
}
