//! Character generators and fixed-damage spells.

use crate::dice::Dice;

/// Lowest spell level fireball can be cast at.
pub const FIREBALL_BASE_LEVEL: u32 = 3;
/// Highest spell slot level.
pub const FIREBALL_MAX_LEVEL: u32 = 9;
const FIREBALL_BASE_DICE: u32 = 8;

/// A freshly rolled Call of Cthulhu investigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Investigator {
    pub str: u32,
    pub con: u32,
    pub siz: u32,
    pub dex: u32,
    pub app: u32,
    pub int: u32,
    pub pow: u32,
    pub edu: u32,
    pub luck: u32,
}

impl Investigator {
    /// Roll 3d6×5 or (2d6+6)×5 per characteristic.
    pub fn roll(dice: &dyn Dice) -> Self {
        let three_d6 = || sum(dice, 3, 6) * 5;
        let two_d6_plus_six = || (sum(dice, 2, 6) + 6) * 5;
        Self {
            str: three_d6(),
            con: three_d6(),
            siz: two_d6_plus_six(),
            dex: three_d6(),
            app: three_d6(),
            int: two_d6_plus_six(),
            pow: three_d6(),
            edu: two_d6_plus_six(),
            luck: three_d6(),
        }
    }

    pub fn hp(&self) -> u32 {
        (self.siz + self.con) / 10
    }

    pub fn mp(&self) -> u32 {
        self.pow / 5
    }

    pub fn san(&self) -> u32 {
        self.pow
    }

    /// Damage bonus and build from STR + SIZ.
    pub fn damage_bonus(&self) -> (&'static str, i32) {
        match self.str + self.siz {
            0..=64 => ("-2", -2),
            65..=84 => ("-1", -1),
            85..=124 => ("+0", 0),
            125..=164 => ("+1D4", 1),
            165..=204 => ("+1D6", 2),
            _ => ("+2D6", 3),
        }
    }

    /// Sum of the eight characteristics, luck excluded.
    pub fn total(&self) -> u32 {
        self.str + self.con + self.siz + self.dex + self.app + self.int + self.pow + self.edu
    }

    /// Attribute text accepted by `st create`.
    pub fn sheet_text(&self) -> String {
        format!(
            "str{}con{}siz{}dex{}app{}int{}pow{}edu{}luck{}hp{}mp{}san{}",
            self.str,
            self.con,
            self.siz,
            self.dex,
            self.app,
            self.int,
            self.pow,
            self.edu,
            self.luck,
            self.hp(),
            self.mp(),
            self.san()
        )
    }

    pub fn format(&self, index: usize) -> String {
        let (db, build) = self.damage_bonus();
        format!(
            "Investigator #{}\n\
             STR: {}  CON: {}  SIZ: {}\n\
             DEX: {}  APP: {}  INT: {}\n\
             POW: {}  EDU: {}\n\
             HP: {}  MP: {}  SAN: {}  LUCK: {}\n\
             DB: {}  Build: {}  Total: {} / {}\n\
             `{}`",
            index,
            self.str,
            self.con,
            self.siz,
            self.dex,
            self.app,
            self.int,
            self.pow,
            self.edu,
            self.hp(),
            self.mp(),
            self.san(),
            self.luck,
            db,
            build,
            self.total(),
            self.total() + self.luck,
            self.sheet_text()
        )
    }
}

/// Six ability scores rolled with 4d6, dropping the lowest die.
pub fn roll_ability_scores(dice: &dyn Dice) -> Vec<u32> {
    let mut scores: Vec<u32> = (0..6)
        .map(|_| {
            let mut rolls = dice.roll_many(4, 6);
            rolls.sort_unstable();
            rolls[1..].iter().sum()
        })
        .collect();
    scores.sort_unstable_by(|a, b| b.cmp(a));
    scores
}

pub fn format_ability_scores(scores: &[u32], index: usize) -> String {
    let values: Vec<String> = scores.iter().map(u32::to_string).collect();
    format!(
        "Adventurer #{}\n[{}] → total {}",
        index,
        values.join(", "),
        scores.iter().sum::<u32>()
    )
}

/// Damage of one fireball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireballDamage {
    pub level: u32,
    pub rolls: Vec<u32>,
    pub total: u32,
}

impl FireballDamage {
    /// 8d6 at 3rd level, one more d6 per slot level above. `None` outside 3..=9.
    pub fn roll(level: u32, dice: &dyn Dice) -> Option<Self> {
        if !(FIREBALL_BASE_LEVEL..=FIREBALL_MAX_LEVEL).contains(&level) {
            return None;
        }
        let rolls = dice.roll_many(FIREBALL_BASE_DICE + level - FIREBALL_BASE_LEVEL, 6);
        let total = rolls.iter().sum();
        Some(Self { level, rolls, total })
    }

    pub fn format(&self) -> String {
        let breakdown: Vec<String> = self.rolls.iter().map(u32::to_string).collect();
        format!(
            "A bright streak flashes from your pointing finger to a point you choose, then blossoms with a low roar into an explosion of flame.\n\
             Level {} fireball damage: {} = 🔥{}🔥",
            self.level,
            breakdown.join(" + "),
            self.total
        )
    }
}

fn sum(dice: &dyn Dice, count: u32, faces: u32) -> u32 {
    dice.roll_many(count, faces).iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{LocalDice, ScriptedDice};

    #[test]
    fn test_investigator_derived_values() {
        // Every die shows 3: 3d6 = 9 -> 45, 2d6+6 = 12 -> 60
        let inv = Investigator::roll(&ScriptedDice::new(vec![3]));
        assert_eq!(inv.str, 45);
        assert_eq!(inv.siz, 60);
        assert_eq!(inv.hp(), (60 + 45) / 10);
        assert_eq!(inv.mp(), 9);
        assert_eq!(inv.san(), 45);
        assert_eq!(inv.damage_bonus(), ("+0", 0));
        assert_eq!(inv.total(), 45 * 5 + 60 * 3);
    }

    #[test]
    fn test_damage_bonus_bands() {
        let mut inv = Investigator::roll(&ScriptedDice::new(vec![1]));
        inv.str = 30;
        inv.siz = 30;
        assert_eq!(inv.damage_bonus().1, -2);
        inv.siz = 50;
        assert_eq!(inv.damage_bonus().1, -1);
        inv.str = 90;
        inv.siz = 90;
        assert_eq!(inv.damage_bonus(), ("+1D6", 2));
        inv.siz = 120;
        assert_eq!(inv.damage_bonus(), ("+2D6", 3));
    }

    #[test]
    fn test_investigator_ranges() {
        for _ in 0..100 {
            let inv = Investigator::roll(&LocalDice);
            assert!((15..=90).contains(&inv.str));
            assert!((40..=90).contains(&inv.edu));
        }
    }

    #[test]
    fn test_investigator_format_has_sheet_text() {
        let inv = Investigator::roll(&ScriptedDice::new(vec![3]));
        let text = inv.format(2);
        assert!(text.starts_with("Investigator #2"));
        assert!(text.contains("str45con45siz60"));
    }

    #[test]
    fn test_ability_scores_drop_lowest() {
        let dice = ScriptedDice::new(vec![1, 6, 5, 4]);
        let scores = roll_ability_scores(&dice);
        assert_eq!(scores, vec![15; 6]);
        assert_eq!(
            format_ability_scores(&scores, 1),
            "Adventurer #1\n[15, 15, 15, 15, 15, 15] → total 90"
        );
    }

    #[test]
    fn test_fireball_dice_count() {
        let dice = ScriptedDice::new(vec![6]);
        let third = FireballDamage::roll(3, &dice).unwrap();
        assert_eq!(third.rolls.len(), 8);
        assert_eq!(third.total, 48);

        let fifth = FireballDamage::roll(5, &dice).unwrap();
        assert_eq!(fifth.rolls.len(), 10);
        assert!(fifth.format().contains("🔥60🔥"));
    }

    #[test]
    fn test_fireball_level_bounds() {
        let dice = ScriptedDice::new(vec![1]);
        assert!(FireballDamage::roll(2, &dice).is_none());
        assert!(FireballDamage::roll(10, &dice).is_none());
        assert!(FireballDamage::roll(9, &dice).is_some());
    }
}
