//! Percentile (d100) rolls with bonus and penalty dice.

use crate::dice::source::Dice;

/// Extra tens dice applied to a percentile roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Keep the lowest candidate.
    Bonus,
    /// Keep the highest candidate.
    Penalty,
}

impl Modifier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bonus => "bonus",
            Self::Penalty => "penalty",
        }
    }
}

/// Result of a percentile roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentileRoll {
    /// Every candidate value (one per tens die).
    pub candidates: Vec<u32>,
    /// The value that counts.
    pub result: u32,
}

impl PercentileRoll {
    /// Render as `[a, b] → result`, or just the result for a plain roll.
    pub fn render(&self) -> String {
        if self.candidates.len() <= 1 {
            return self.result.to_string();
        }
        let candidates: Vec<String> = self.candidates.iter().map(u32::to_string).collect();
        format!("[{}] → {}", candidates.join(", "), self.result)
    }
}

/// Roll 1d100, optionally with `extra` bonus or penalty dice.
///
/// All candidates share one ones digit and get their own tens digit; a
/// `00` candidate counts as 100.
pub fn roll_percentile(dice: &dyn Dice, modifier: Option<(Modifier, u32)>) -> PercentileRoll {
    let (modifier, extra) = match modifier {
        Some((modifier, extra)) if extra > 0 => (modifier, extra),
        _ => {
            let result = dice.roll(100);
            return PercentileRoll {
                candidates: vec![result],
                result,
            };
        }
    };

    let ones = dice.roll(10) - 1;
    let candidates: Vec<u32> = (0..=extra)
        .map(|_| {
            let tens = dice.roll(10) - 1;
            match tens * 10 + ones {
                0 => 100,
                value => value,
            }
        })
        .collect();

    let result = match modifier {
        Modifier::Bonus => candidates.iter().copied().min(),
        Modifier::Penalty => candidates.iter().copied().max(),
    }
    .unwrap_or(100);

    PercentileRoll { candidates, result }
}
