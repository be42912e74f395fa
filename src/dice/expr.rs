//! Dice expression evaluator.
//!
//! Grammar: `[N#]term(+|-term)*` where a term is a product (`*`) of factors
//! and a factor is either an integer or `[count]d<faces>[k<keep>]`.
//! `N#p` and `N#b` roll 1d100 with a penalty or bonus die.

use crate::common::error::DiceError;
use crate::dice::percentile::{roll_percentile, Modifier};
use crate::dice::source::Dice;

/// Characters allowed in an expression body.
const ALLOWED: &[char] = &['d', 'k', '+', '-', '*'];

/// Bounds applied while evaluating expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceLimits {
    pub max_count: u32,
    pub max_faces: u32,
    pub max_repeat: u32,
}

impl Default for DiceLimits {
    fn default() -> Self {
        Self {
            max_count: 100,
            max_faces: 1000,
            max_repeat: 10,
        }
    }
}

/// Result of evaluating an expression, one entry per repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Total of every repetition, in order.
    pub totals: Vec<i64>,
    /// Breakdown line of every repetition, e.g. `[2+4+6] + 2 = 14`.
    pub lines: Vec<String>,
    /// Whether any die was rolled (false for plain arithmetic).
    pub rolled_dice: bool,
}

impl RollOutcome {
    /// Total of the last repetition.
    pub fn total(&self) -> i64 {
        self.totals.last().copied().unwrap_or(0)
    }

    /// All breakdown lines joined with newlines.
    pub fn description(&self) -> String {
        self.lines.join("\n")
    }
}

/// Evaluate a dice expression.
pub fn evaluate(
    expression: &str,
    dice: &dyn Dice,
    limits: &DiceLimits,
) -> Result<RollOutcome, DiceError> {
    let normalized: String = expression
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'x' { '*' } else { c })
        .collect();

    if normalized.is_empty() {
        return Err(DiceError::Empty);
    }

    let (repeat, body, prefixed) = split_repeat(&normalized, limits)?;

    let modifier = match body {
        "p" if prefixed => Some(Modifier::Penalty),
        "b" if prefixed => Some(Modifier::Bonus),
        _ => None,
    };
    if let Some(modifier) = modifier {
        let mut outcome = RollOutcome {
            totals: Vec::new(),
            lines: Vec::new(),
            rolled_dice: true,
        };
        for _ in 0..repeat {
            let roll = roll_percentile(dice, Some((modifier, 1)));
            outcome.totals.push(i64::from(roll.result));
            outcome
                .lines
                .push(format!("1d100 with {} die {}", modifier.name(), roll.render()));
        }
        return Ok(outcome);
    }

    if let Some(bad) = body
        .chars()
        .find(|c| !c.is_ascii_digit() && !ALLOWED.contains(c))
    {
        return Err(DiceError::IllegalCharacter(bad));
    }

    let mut outcome = RollOutcome {
        totals: Vec::new(),
        lines: Vec::new(),
        rolled_dice: body.contains('d'),
    };
    for _ in 0..repeat {
        let (total, breakdown) = roll_body(body, dice, limits)?;
        outcome.totals.push(total);
        outcome.lines.push(format!("{} = {}", breakdown, total));
    }
    Ok(outcome)
}

/// Split an optional `N#` prefix off the expression.
///
/// The flag reports whether a prefix was present.
fn split_repeat<'a>(
    normalized: &'a str,
    limits: &DiceLimits,
) -> Result<(u32, &'a str, bool), DiceError> {
    let Some((count, body)) = normalized.split_once('#') else {
        return Ok((1, normalized, false));
    };
    // Only a leading run of digits is a repeat count; "1d6#2" is rejected later.
    if !count.chars().all(|c| c.is_ascii_digit()) {
        return Ok((1, normalized, false));
    }

    let repeat = if count.is_empty() { 1 } else { parse_number(count)? };
    if repeat == 0 || repeat > u64::from(limits.max_repeat) {
        return Err(DiceError::RepeatOutOfRange {
            got: repeat,
            max: limits.max_repeat,
        });
    }
    if body.is_empty() {
        return Err(DiceError::Empty);
    }

    Ok((repeat as u32, body, true))
}

/// Roll every term of a body once, returning the total and its rendering.
fn roll_body(body: &str, dice: &dyn Dice, limits: &DiceLimits) -> Result<(i64, String), DiceError> {
    let folded = body.replace('-', "+-");
    let mut total: i64 = 0;
    let mut rendered = String::new();
    let mut first = true;

    for (index, raw) in folded.split('+').enumerate() {
        if raw.is_empty() {
            // "-2+1" folds to "+-2+1", leaving one empty leading segment.
            if index == 0 && body.starts_with('-') {
                continue;
            }
            return Err(DiceError::Malformed(body.to_string()));
        }

        let (negative, term) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let (value, text) = roll_term(term, dice, limits)?;

        if first {
            total = if negative { value.checked_neg().ok_or(DiceError::Overflow)? } else { value };
            rendered = if negative { format!("-{}", text) } else { text };
            first = false;
        } else if negative {
            total = total.checked_sub(value).ok_or(DiceError::Overflow)?;
            rendered.push_str(" - ");
            rendered.push_str(&text);
        } else {
            total = total.checked_add(value).ok_or(DiceError::Overflow)?;
            rendered.push_str(" + ");
            rendered.push_str(&text);
        }
    }

    if first {
        return Err(DiceError::Malformed(body.to_string()));
    }
    Ok((total, rendered))
}

/// Roll a product term such as `2d6*3`.
fn roll_term(term: &str, dice: &dyn Dice, limits: &DiceLimits) -> Result<(i64, String), DiceError> {
    let mut product: i64 = 1;
    let mut parts = Vec::new();

    for factor in term.split('*') {
        if factor.is_empty() {
            return Err(DiceError::Malformed(term.to_string()));
        }
        let (value, text) = if factor.contains('d') {
            roll_factor(factor, dice, limits)?
        } else {
            let value = i64::try_from(parse_number(factor)?).map_err(|_| DiceError::Overflow)?;
            (value, value.to_string())
        };
        product = product.checked_mul(value).ok_or(DiceError::Overflow)?;
        parts.push(text);
    }

    Ok((product, parts.join("*")))
}

/// Roll a single `NdM[kK]` factor.
fn roll_factor(factor: &str, dice: &dyn Dice, limits: &DiceLimits) -> Result<(i64, String), DiceError> {
    let malformed = || DiceError::Malformed(factor.to_string());

    let (count, rest) = factor.split_once('d').ok_or_else(malformed)?;
    let (faces, keep) = match rest.split_once('k') {
        Some((faces, keep)) => (faces, Some(keep)),
        None => (rest, None),
    };

    let count = if count.is_empty() { 1 } else { parse_number(count).map_err(|_| malformed())? };
    let faces = parse_number(faces).map_err(|_| malformed())?;
    let keep = match keep {
        Some(keep) => Some(parse_number(keep).map_err(|_| malformed())?),
        None => None,
    };

    if count == 0 || count > u64::from(limits.max_count) {
        return Err(DiceError::CountOutOfRange {
            got: count,
            max: limits.max_count,
        });
    }
    if faces == 0 || faces > u64::from(limits.max_faces) {
        return Err(DiceError::FacesOutOfRange {
            got: faces,
            max: limits.max_faces,
        });
    }
    if keep == Some(0) {
        return Err(DiceError::KeepOutOfRange);
    }

    let count = count as u32;
    let rolls = dice.roll_many(count, faces as u32);
    let keep = keep.map(|k| k.min(u64::from(count)) as usize).unwrap_or(rolls.len());

    if keep >= rolls.len() {
        let total: i64 = rolls.iter().map(|&r| i64::from(r)).sum();
        return Ok((total, format!("[{}]", join_rolls(&rolls))));
    }

    let mut sorted = rolls;
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let (kept, dropped) = sorted.split_at(keep);
    let total: i64 = kept.iter().map(|&r| i64::from(r)).sum();

    Ok((total, format!("[{}|{}]", join_rolls(kept), join_rolls(dropped))))
}

fn join_rolls(rolls: &[u32]) -> String {
    rolls
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

/// Parse a run of ASCII digits.
fn parse_number(text: &str) -> Result<u64, DiceError> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(DiceError::Malformed(text.to_string()));
    }
    text.parse().map_err(|_| DiceError::Overflow)
}
