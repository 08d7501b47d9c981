//! Sources of d20 rolls for the race resolver.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use rand::Rng;

/// Faces on the race die; rolls are uniform in `1..=DIE_SIDES`.
pub const DIE_SIDES: i32 = 20;

/// Produces one die roll per call.
pub trait RollSource: Send + Sync + fmt::Debug {
    fn roll(&self) -> i32;
}

/// Uniform rolls from the thread-local RNG. Not suitable for anything that
/// needs unpredictability guarantees.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngRolls;

impl RollSource for ThreadRngRolls {
    fn roll(&self) -> i32 {
        rand::rng().random_range(1..=DIE_SIDES)
    }
}

/// Replays a fixed sequence of rolls, then falls back to [`ThreadRngRolls`].
///
/// Used to reproduce a specific race, e.g. forcing a dead heat.
#[derive(Debug, Default)]
pub struct ScriptedRolls {
    queue: Mutex<VecDeque<i32>>,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self {
            queue: Mutex::new(rolls.into_iter().collect()),
        }
    }

    /// Appends rolls to the end of the script.
    pub fn push(&self, rolls: impl IntoIterator<Item = i32>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.extend(rolls);
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&self) -> i32 {
        let scripted = self.queue.lock().ok().and_then(|mut queue| queue.pop_front());
        scripted.unwrap_or_else(|| ThreadRngRolls.roll())
    }
}
