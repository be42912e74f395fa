//! The `dicehelp` screen.

/// Help text in Discord markdown. `{prefix}` is replaced with the first
/// configured command prefix.
const HELP_TEMPLATE: &str = r#"## 🎲 The Dice Oracle
*In the corner of the tavern an old man shakes a leather cup. "Ask," he says, "and the bones will answer."*

### Rolling
- `{prefix}r [expr] [target|label]`: roll an expression, e.g. `{prefix}r 3d6+2`, `{prefix}r 4d6k3`, `{prefix}r 3#1d20`. A number after the expression is a target and the result is judged against it.
- `{prefix}rh [expr]`: roll in secret. The result arrives by direct message.
- Expressions: `NdM` dice, `kK` keeps the highest K, `+ - *` combine terms, `N#` repeats, `#p` / `#b` roll 1d100 with a penalty / bonus die.

### Checks
- `{prefix}ra <skill> [value]`: percentile check. Without a value the active character's skill is used.
- `{prefix}rap [n] <skill> [value]`: check with n penalty dice.
- `{prefix}rab [n] <skill> [value]`: check with n bonus dice.
- Outcomes: 🎉 critical, ✨ extreme, ✔ hard, ✅ success, ❌ failure, 💀 fumble.

### Sanity
- `{prefix}sc <success>/<failure>`: sanity check against the active character's SAN, e.g. `{prefix}sc 1/1d6`.
- `{prefix}ti`: temporary bout of madness (real time).
- `{prefix}li`: long-term bout of madness (summary).

### Characters
- `{prefix}st create <name> <attributes>`: e.g. `{prefix}st create Alice str60 dex50 hp12 san55`.
- `{prefix}st show` / `{prefix}st list` / `{prefix}st change <name>` / `{prefix}st delete <name>`
- `{prefix}st update <attribute> <[+|-|*]value>`: e.g. `{prefix}st update hp -1d3`.
- `{prefix}sn`: set your server nickname to your character's HP and SAN.

### Generators
- `{prefix}coc [n]`: roll n Call of Cthulhu investigators (max 10).
- `{prefix}dnd [n]`: roll n D&D ability arrays, 4d6 drop lowest (max 10).
- `{prefix}fireball [level]`: 8d6 fire damage at level 3, one more d6 per level up to 9.

*The old man sweeps the bones back into the cup. "The dice remember nothing," he says. "That is their mercy."*"#;

/// Render the help screen for the given prefix.
pub fn help_text(prefix: &str) -> String {
    HELP_TEMPLATE.replace("{prefix}", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_mentions_every_command() {
        let text = help_text(".");
        for command in [
            ".r ", ".rh ", ".ra ", ".rap ", ".rab ", ".sc ", ".ti", ".li", ".st create", ".st show",
            ".st list", ".st change", ".st update", ".st delete", ".sn", ".coc", ".dnd", ".fireball",
        ] {
            assert!(text.contains(command), "missing {}", command);
        }
        assert!(!text.contains("{prefix}"));
    }
}
