//! Sources of die rolls.

use rand::Rng;

/// Anything that can roll a single die.
///
/// Every random number the bot produces goes through this trait so the
/// rules can be driven by a pseudo-random generator, the true-random pool,
/// or a fixed script in tests.
pub trait Dice: Send + Sync {
    /// Roll one die with `faces` sides, returning a value in `1..=faces`.
    fn roll(&self, faces: u32) -> u32;

    /// Roll `count` dice with `faces` sides each.
    fn roll_many(&self, count: u32, faces: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll(faces)).collect()
    }
}

/// Local pseudo-random dice backed by the thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDice;

impl Dice for LocalDice {
    fn roll(&self, faces: u32) -> u32 {
        rand::thread_rng().gen_range(1..=faces.max(1))
    }
}

/// Dice that replay a fixed script of faces, cycling when exhausted.
///
/// Scripted values larger than the die are clamped to `faces`.
#[cfg(test)]
#[derive(Debug)]
pub struct ScriptedDice {
    script: Vec<u32>,
    position: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedDice {
    pub fn new(script: impl Into<Vec<u32>>) -> Self {
        Self {
            script: script.into(),
            position: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl Dice for ScriptedDice {
    fn roll(&self, faces: u32) -> u32 {
        if self.script.is_empty() {
            return 1;
        }
        let index = self
            .position
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.script[index % self.script.len()].clamp(1, faces.max(1))
    }
}
