//! Turns raw chat text into a `Command`.

use tracing::trace;

use crate::dice::Modifier;
use crate::rules::SanLoss;

/// Upper bound for `coc` / `dnd` batch sizes.
pub const MAX_GENERATED: u32 = 10;
/// Upper bound for bonus / penalty dice.
pub const MAX_MODIFIER_DICE: u32 = 10;

/// Character sheet subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetCommand {
    Create { name: String, attributes: String },
    Show,
    List,
    Change { name: String },
    Update { attribute: String, value: String },
    Delete { name: String },
}

/// A recognized bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `r [expr] [target|label]`
    Roll {
        expression: Option<String>,
        target: Option<i64>,
        label: Option<String>,
    },
    /// `rh [expr]`
    HiddenRoll { expression: Option<String> },
    /// `ra`, `rap`, `rab`
    Check {
        skill: String,
        value: Option<i64>,
        modifier: Option<(Modifier, u32)>,
    },
    /// `sc` / `sanc`
    SanityCheck { loss: SanLoss },
    TemporaryInsanity,
    LongTermInsanity,
    Sheet(SheetCommand),
    GenerateCoc { count: u32 },
    GenerateDnd { count: u32 },
    Fireball { level: u32 },
    Help,
    Nickname,
    /// Known command with bad arguments; carries the usage hint.
    Invalid(String),
}

/// Parses prefixed chat messages.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefixes: Vec<String>,
}

impl CommandParser {
    pub fn new(prefixes: &[String]) -> Self {
        let mut prefixes: Vec<String> = prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        // Longest first so "!!" wins over "!".
        prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
        Self { prefixes }
    }

    /// Parse a message. `None` when it is not addressed to the bot.
    pub fn parse(&self, raw: &str) -> Option<Command> {
        let trimmed = raw.trim();
        let body = self
            .prefixes
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix.as_str()))?;

        let mut words = body.split_whitespace();
        let name = words.next()?.to_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match name.as_str() {
            "r" => parse_roll(&args),
            "rh" => Command::HiddenRoll {
                expression: optional_expression(&args),
            },
            "ra" => parse_check(&args, None),
            "rap" => parse_check(&args, Some(Modifier::Penalty)),
            "rab" => parse_check(&args, Some(Modifier::Bonus)),
            "sc" | "sanc" => parse_sanity(&args),
            "ti" => Command::TemporaryInsanity,
            "li" => Command::LongTermInsanity,
            "st" => parse_sheet(&args),
            "coc" => match parse_count(&args) {
                Ok(count) => Command::GenerateCoc { count },
                Err(message) => Command::Invalid(message),
            },
            "dnd" => match parse_count(&args) {
                Ok(count) => Command::GenerateDnd { count },
                Err(message) => Command::Invalid(message),
            },
            "fireball" => parse_fireball(&args),
            "dicehelp" => Command::Help,
            "sn" => Command::Nickname,
            other => return parse_glued_roll(other, &args),
        };

        trace!("Parsed {:?} from '{}'", command, raw);
        Some(command)
    }
}

/// `.r3d6` / `.rh2d10`: the expression is glued to the command name.
fn parse_glued_roll(name: &str, args: &[&str]) -> Option<Command> {
    let starts_expression =
        |rest: &str| rest.starts_with(|c: char| c.is_ascii_digit() || c == 'd' || c == '#');

    if let Some(rest) = name.strip_prefix("rh").filter(|rest| starts_expression(rest)) {
        return Some(Command::HiddenRoll {
            expression: Some(rest.to_string()),
        });
    }
    let rest = name.strip_prefix('r').filter(|rest| starts_expression(rest))?;
    let mut all = vec![rest];
    all.extend_from_slice(args);
    Some(parse_roll(&all))
}

fn optional_expression(args: &[&str]) -> Option<String> {
    args.first().map(|expr| expr.to_string())
}

fn parse_roll(args: &[&str]) -> Command {
    let expression = optional_expression(args);
    let rest = args.get(1..).unwrap_or_default();

    let (target, label) = match rest {
        [] => (None, None),
        [single] => match single.parse::<i64>() {
            Ok(target) => (Some(target), None),
            Err(_) => (None, Some(single.to_string())),
        },
        words => (None, Some(words.join(" "))),
    };

    Command::Roll {
        expression,
        target,
        label,
    }
}

fn parse_check(args: &[&str], modifier: Option<Modifier>) -> Command {
    let usage = match modifier {
        None => "Usage: `ra <skill> [value]`",
        Some(Modifier::Penalty) => "Usage: `rap [dice] <skill> [value]`",
        Some(Modifier::Bonus) => "Usage: `rab [dice] <skill> [value]`",
    };

    let mut args = args;
    let mut extra = 1;
    if modifier.is_some() && args.len() >= 2 {
        if let Ok(count) = args[0].parse::<u32>() {
            if !(1..=MAX_MODIFIER_DICE).contains(&count) {
                return Command::Invalid(format!(
                    "Number of {} dice must be 1-{}",
                    modifier.map(|m| m.name()).unwrap_or_default(),
                    MAX_MODIFIER_DICE
                ));
            }
            extra = count;
            args = &args[1..];
        }
    }

    let (skill, value) = match args {
        [skill] => (*skill, None),
        [skill, value] => match value.parse::<i64>() {
            Ok(value) => (*skill, Some(value)),
            Err(_) => return Command::Invalid("Skill value must be an integer".to_string()),
        },
        _ => return Command::Invalid(usage.to_string()),
    };

    Command::Check {
        skill: skill.to_string(),
        value,
        modifier: modifier.map(|m| (m, extra)),
    }
}

fn parse_sanity(args: &[&str]) -> Command {
    let usage = "Usage: `sc <success loss>/<failure loss>`, e.g. `sc 1/1d6`";
    match args {
        [formula] => match SanLoss::parse(formula) {
            Some(loss) => Command::SanityCheck { loss },
            None => Command::Invalid(usage.to_string()),
        },
        _ => Command::Invalid(usage.to_string()),
    }
}

fn parse_sheet(args: &[&str]) -> Command {
    let Some(sub) = args.first() else {
        return Command::Invalid(
            "Usage: `st create|show|list|change|update|delete ...`".to_string(),
        );
    };
    let rest = &args[1..];

    let sheet = match (sub.to_lowercase().as_str(), rest) {
        ("create", [name, attributes @ ..]) if !attributes.is_empty() => SheetCommand::Create {
            name: name.to_string(),
            attributes: attributes.join(" "),
        },
        ("create", _) => {
            return Command::Invalid("Usage: `st create <name> <attributes>`, e.g. `st create Alice str60 hp12 san55`".to_string())
        }
        ("show", _) => SheetCommand::Show,
        ("list", _) => SheetCommand::List,
        ("change", [name]) => SheetCommand::Change {
            name: name.to_string(),
        },
        ("change", _) => return Command::Invalid("Usage: `st change <name>`".to_string()),
        ("update", [attribute, value]) => SheetCommand::Update {
            attribute: attribute.to_string(),
            value: value.to_string(),
        },
        ("update", _) => {
            return Command::Invalid("Usage: `st update <attribute> <[+|-|*]value>`, e.g. `st update hp -1d3`".to_string())
        }
        ("delete", [name]) => SheetCommand::Delete {
            name: name.to_string(),
        },
        ("delete", _) => return Command::Invalid("Usage: `st delete <name>`".to_string()),
        (other, _) => return Command::Invalid(format!("Unknown sheet command `{}`", other)),
    };
    Command::Sheet(sheet)
}

fn parse_count(args: &[&str]) -> Result<u32, String> {
    let count = match args.first() {
        None => 1,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| "Count must be a number".to_string())?,
    };
    if (1..=MAX_GENERATED).contains(&count) {
        Ok(count)
    } else {
        Err(format!("Count must be 1-{}", MAX_GENERATED))
    }
}

fn parse_fireball(args: &[&str]) -> Command {
    match args.first() {
        None => Command::Fireball { level: 3 },
        Some(raw) => match raw.parse::<u32>() {
            Ok(level) => Command::Fireball { level },
            Err(_) => Command::Invalid("Usage: `fireball [level]`".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new(&[".".to_string(), "/".to_string(), "。".to_string()])
    }

    fn parse(raw: &str) -> Option<Command> {
        parser().parse(raw)
    }

    #[test]
    fn test_ignores_unprefixed_and_unknown() {
        assert_eq!(parse("r 1d20"), None);
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse(".unknown"), None);
        assert_eq!(parse("."), None);
    }

    #[test]
    fn test_prefixes() {
        let expected = Some(Command::Roll {
            expression: Some("1d20".to_string()),
            target: None,
            label: None,
        });
        assert_eq!(parse(".r 1d20"), expected);
        assert_eq!(parse("/r 1d20"), expected);
        assert_eq!(parse("。r 1d20"), expected);
        assert_eq!(parse("  .R 1d20  "), expected);
    }

    #[test]
    fn test_roll_variants() {
        assert_eq!(
            parse(".r"),
            Some(Command::Roll {
                expression: None,
                target: None,
                label: None
            })
        );
        assert_eq!(
            parse(".r 1d100 65"),
            Some(Command::Roll {
                expression: Some("1d100".to_string()),
                target: Some(65),
                label: None
            })
        );
        assert_eq!(
            parse(".r 2d6 sword swing"),
            Some(Command::Roll {
                expression: Some("2d6".to_string()),
                target: None,
                label: Some("sword swing".to_string())
            })
        );
    }

    #[test]
    fn test_glued_roll() {
        assert_eq!(
            parse(".r3d6 50"),
            Some(Command::Roll {
                expression: Some("3d6".to_string()),
                target: Some(50),
                label: None
            })
        );
        assert_eq!(
            parse(".rd20"),
            Some(Command::Roll {
                expression: Some("d20".to_string()),
                target: None,
                label: None
            })
        );
        assert_eq!(
            parse(".rh2d10"),
            Some(Command::HiddenRoll {
                expression: Some("2d10".to_string())
            })
        );
        assert_eq!(parse(".rx"), None);
    }

    #[test]
    fn test_checks() {
        assert_eq!(
            parse(".ra spot"),
            Some(Command::Check {
                skill: "spot".to_string(),
                value: None,
                modifier: None
            })
        );
        assert_eq!(
            parse(".ra spot 60"),
            Some(Command::Check {
                skill: "spot".to_string(),
                value: Some(60),
                modifier: None
            })
        );
        assert_eq!(
            parse(".rap 2 spot 60"),
            Some(Command::Check {
                skill: "spot".to_string(),
                value: Some(60),
                modifier: Some((Modifier::Penalty, 2))
            })
        );
        assert_eq!(
            parse(".rab spot 60"),
            Some(Command::Check {
                skill: "spot".to_string(),
                value: Some(60),
                modifier: Some((Modifier::Bonus, 1))
            })
        );
        assert!(matches!(parse(".ra"), Some(Command::Invalid(_))));
        assert!(matches!(parse(".ra spot lots"), Some(Command::Invalid(_))));
        assert!(matches!(parse(".rab 11 spot 60"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_sanity() {
        assert_eq!(
            parse(".sanc 1/1d6"),
            Some(Command::SanityCheck {
                loss: SanLoss::parse("1/1d6").unwrap()
            })
        );
        assert!(matches!(parse(".sc 1/1d6"), Some(Command::SanityCheck { .. })));
        assert!(matches!(parse(".sc"), Some(Command::Invalid(_))));
        assert!(matches!(parse(".sc 1//2"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_sheet_commands() {
        assert_eq!(
            parse(".st create Alice str60 hp12"),
            Some(Command::Sheet(SheetCommand::Create {
                name: "Alice".to_string(),
                attributes: "str60 hp12".to_string()
            }))
        );
        assert_eq!(parse(".st show"), Some(Command::Sheet(SheetCommand::Show)));
        assert_eq!(parse(".st LIST"), Some(Command::Sheet(SheetCommand::List)));
        assert_eq!(
            parse(".st update hp -1d3"),
            Some(Command::Sheet(SheetCommand::Update {
                attribute: "hp".to_string(),
                value: "-1d3".to_string()
            }))
        );
        assert_eq!(
            parse(".st delete Alice"),
            Some(Command::Sheet(SheetCommand::Delete {
                name: "Alice".to_string()
            }))
        );
        assert!(matches!(parse(".st create Alice"), Some(Command::Invalid(_))));
        assert!(matches!(parse(".st"), Some(Command::Invalid(_))));
        assert!(matches!(parse(".st burn"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_generators_and_misc() {
        assert_eq!(parse(".coc"), Some(Command::GenerateCoc { count: 1 }));
        assert_eq!(parse(".dnd 5"), Some(Command::GenerateDnd { count: 5 }));
        assert!(matches!(parse(".coc 11"), Some(Command::Invalid(_))));
        assert!(matches!(parse(".coc 0"), Some(Command::Invalid(_))));
        assert_eq!(parse(".fireball"), Some(Command::Fireball { level: 3 }));
        assert_eq!(parse(".fireball 5"), Some(Command::Fireball { level: 5 }));
        assert_eq!(parse(".dicehelp"), Some(Command::Help));
        assert_eq!(parse(".sn"), Some(Command::Nickname));
        assert_eq!(parse(".ti"), Some(Command::TemporaryInsanity));
        assert_eq!(parse(".li"), Some(Command::LongTermInsanity));
    }
}
