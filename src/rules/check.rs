//! Percentile success tiers and flavor text.

use std::collections::HashMap;

use crate::config::types::FlavorConfig;
use crate::dice::Dice;

/// Outcome tier of a percentile check, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Fumble,
    Failure,
    Success,
    HardSuccess,
    ExtremeSuccess,
    CriticalSuccess,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::CriticalSuccess,
        Tier::ExtremeSuccess,
        Tier::HardSuccess,
        Tier::Success,
        Tier::Failure,
        Tier::Fumble,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::CriticalSuccess => "🎉 Critical Success",
            Self::ExtremeSuccess => "✨ Extreme Success",
            Self::HardSuccess => "✔ Hard Success",
            Self::Success => "✅ Success",
            Self::Failure => "❌ Failure",
            Self::Fumble => "💀 Fumble",
        }
    }
}

/// Classify `roll` against `target`.
///
/// Extreme and hard thresholds are `target / 5` and `target / 2` without
/// truncation. A roll within the extreme threshold is never a fumble.
/// Otherwise 100, or 96 and up against a target below 50, fumbles.
pub fn classify(roll: i64, target: i64) -> Tier {
    if roll <= 1 || (roll <= 5 && target >= 50) {
        return Tier::CriticalSuccess;
    }
    if (roll >= 100 || (roll >= 96 && target < 50)) && roll.saturating_mul(5) > target {
        return Tier::Fumble;
    }
    if roll.saturating_mul(5) <= target {
        Tier::ExtremeSuccess
    } else if roll.saturating_mul(2) <= target {
        Tier::HardSuccess
    } else if roll <= target {
        Tier::Success
    } else {
        Tier::Failure
    }
}

/// Flavor lines appended to check verdicts, one list per tier.
#[derive(Debug, Clone, Default)]
pub struct FlavorText {
    lines: HashMap<Tier, Vec<String>>,
}

impl FlavorText {
    /// Build from config. A disabled section yields no flavor at all.
    pub fn from_config(config: &FlavorConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }

        let lines = Tier::ALL
            .iter()
            .map(|tier| (*tier, config.lines_for(*tier).to_vec()))
            .filter(|(_, lines)| !lines.is_empty())
            .collect();
        Self { lines }
    }

    /// Pick a line for `tier` uniformly at random.
    pub fn pick(&self, tier: Tier, dice: &dyn Dice) -> Option<&str> {
        let lines = self.lines.get(&tier)?;
        let index = dice.roll(lines.len() as u32) as usize - 1;
        lines.get(index).map(String::as_str)
    }

    /// The tier label followed by a flavor line, if any.
    pub fn verdict(&self, tier: Tier, dice: &dyn Dice) -> String {
        match self.pick(tier, dice) {
            Some(line) => format!("{}\n> {}", tier.label(), line),
            None => tier.label().to_string(),
        }
    }
}
