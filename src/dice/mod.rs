//! Dice: expression evaluation and random sources.

pub mod entropy;
pub mod expr;
pub mod percentile;
pub mod source;

pub use entropy::EntropyPool;
pub use expr::{evaluate, DiceLimits, RollOutcome};
pub use percentile::{roll_percentile, Modifier, PercentileRoll};
pub use source::{Dice, LocalDice};

#[cfg(test)]
pub use source::ScriptedDice;
