//! Sanity checks and bouts of madness.

use crate::common::resources::ResourceTables;
use crate::dice::Dice;

/// Loss threshold at which an investigator risks temporary insanity.
pub const TEMPORARY_INSANITY_LOSS: i64 = 5;

/// A `success/failure` sanity loss formula, e.g. `1/1d6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanLoss {
    pub on_success: String,
    pub on_failure: String,
}

impl SanLoss {
    /// Parse `a/b`. A single expression applies to both outcomes.
    pub fn parse(formula: &str) -> Option<Self> {
        let formula = formula.trim();
        let (success, failure) = match formula.split_once('/') {
            Some((success, failure)) => (success.trim(), failure.trim()),
            None => (formula, formula),
        };
        if success.is_empty() || failure.is_empty() || failure.contains('/') {
            return None;
        }
        Some(Self {
            on_success: success.to_string(),
            on_failure: failure.to_string(),
        })
    }

    pub fn expression(&self, passed: bool) -> &str {
        if passed {
            &self.on_success
        } else {
            &self.on_failure
        }
    }
}

/// Short bout symptoms, each lasting 1d10 rounds.
const TEMPORARY_SYMPTOMS: [&str; 10] = [
    "Amnesia for {} rounds",
    "Psychosomatic disability for {} rounds",
    "Violence for {} rounds",
    "Paranoia for {} rounds",
    "Significant person for {} rounds",
    "Faint for {} rounds",
    "Flee in panic for {} rounds",
    "Physical hysterics or emotional outburst for {} rounds",
    "Phobia for {} rounds",
    "Mania for {} rounds",
];

/// Summary symptoms for a bout that happens off-screen.
const LONG_TERM_SYMPTOMS: [&str; 10] = [
    "Amnesia",
    "Robbed",
    "Battered",
    "Violence",
    "Ideology or beliefs",
    "Significant people",
    "Institutionalized",
    "Flee in panic",
    "Phobia",
    "Mania",
];

const PHOBIA_ROLL: u32 = 9;
const MANIA_ROLL: u32 = 10;

/// Roll a temporary (real-time) bout of madness.
pub fn temporary_insanity(dice: &dyn Dice, tables: &ResourceTables) -> String {
    let roll = dice.roll(10);
    let duration = dice.roll(10);
    let symptom = TEMPORARY_SYMPTOMS[roll as usize - 1].replace("{}", &duration.to_string());

    format!(
        "🎲 **Bout of Madness - Real Time (1D10={})**\n{}{}",
        roll,
        symptom,
        detail_line(roll, dice, tables)
    )
}

/// Roll a long-term (summary) bout of madness.
pub fn long_term_insanity(dice: &dyn Dice, tables: &ResourceTables) -> String {
    let roll = dice.roll(10);
    let symptom = LONG_TERM_SYMPTOMS[roll as usize - 1];

    format!(
        "🎲 **Bout of Madness - Summary (1D10={})**\n{}{}",
        roll,
        symptom,
        detail_line(roll, dice, tables)
    )
}

fn detail_line(roll: u32, dice: &dyn Dice, tables: &ResourceTables) -> String {
    let (kind, table) = match roll {
        PHOBIA_ROLL => ("phobia", &tables.phobias),
        MANIA_ROLL => ("mania", &tables.manias),
        _ => return String::new(),
    };
    match table.pick(dice) {
        Some((id, text)) => format!("\n→ Specific {} #{}: {}", kind, id, text),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::resources::LookupTable;
    use crate::dice::ScriptedDice;

    fn tables() -> ResourceTables {
        ResourceTables {
            phobias: LookupTable::from_json(
                r#"{"phobias": {"1": "Acrophobia", "2": "Scotophobia"}}"#,
                "phobias",
            )
            .unwrap(),
            manias: LookupTable::from_json(r#"{"manias": {"1": "Pyromania"}}"#, "manias").unwrap(),
        }
    }

    #[test]
    fn test_parse_loss_formula() {
        assert_eq!(
            SanLoss::parse("1/1d6"),
            Some(SanLoss {
                on_success: "1".to_string(),
                on_failure: "1d6".to_string()
            })
        );
        let single = SanLoss::parse("1d4").unwrap();
        assert_eq!(single.expression(true), "1d4");
        assert_eq!(single.expression(false), "1d4");
        assert_eq!(SanLoss::parse("0/1d10+1").unwrap().expression(false), "1d10+1");
    }

    #[test]
    fn test_parse_loss_rejects_garbage() {
        assert_eq!(SanLoss::parse(""), None);
        assert_eq!(SanLoss::parse("/1d6"), None);
        assert_eq!(SanLoss::parse("1/"), None);
        assert_eq!(SanLoss::parse("1/2/3"), None);
    }

    #[test]
    fn test_temporary_insanity_plain_symptom() {
        let dice = ScriptedDice::new(vec![3, 7]);
        let text = temporary_insanity(&dice, &tables());
        assert!(text.contains("1D10=3"));
        assert!(text.contains("Violence for 7 rounds"));
        assert!(!text.contains("Specific"));
    }

    #[test]
    fn test_temporary_insanity_phobia_lookup() {
        let dice = ScriptedDice::new(vec![9, 4, 2]);
        let text = temporary_insanity(&dice, &tables());
        assert!(text.contains("Phobia for 4 rounds"));
        assert!(text.contains("Specific phobia #2: Scotophobia"));
    }

    #[test]
    fn test_long_term_mania_lookup() {
        let dice = ScriptedDice::new(vec![10, 1]);
        let text = long_term_insanity(&dice, &tables());
        assert!(text.contains("Summary (1D10=10)"));
        assert!(text.contains("Mania"));
        assert!(text.contains("Specific mania #1: Pyromania"));
    }

    #[test]
    fn test_missing_table_omits_detail() {
        let dice = ScriptedDice::new(vec![9]);
        let text = long_term_insanity(&dice, &ResourceTables::default());
        assert!(text.ends_with("Phobia"));
    }
}
