//! Executes parsed commands and produces replies.

use std::sync::Arc;

use tracing::{debug, error};

use crate::commands::help::help_text;
use crate::commands::parser::{Command, SheetCommand};
use crate::common::error::SheetError;
use crate::common::{Reply, ResourceTables};
use crate::config::Config;
use crate::dice::{evaluate, roll_percentile, Dice, DiceLimits, Modifier};
use crate::rules::generate::{format_ability_scores, roll_ability_scores, FIREBALL_BASE_LEVEL};
use crate::rules::sanity::{long_term_insanity, temporary_insanity, TEMPORARY_INSANITY_LOSS};
use crate::rules::{classify, FireballDamage, FlavorText, Investigator, SanLoss};
use crate::sheet::SheetStore;

const STORAGE_FAILURE: &str =
    "⚠️ Character storage is unavailable right now. Please try again later.";

/// A command together with who sent it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub user_id: String,
    pub user_name: String,
    pub command: Command,
}

/// Runs commands against the sheet store and dice.
pub struct Dispatcher {
    store: SheetStore,
    dice: Arc<dyn Dice>,
    tables: Arc<ResourceTables>,
    flavor: FlavorText,
    limits: DiceLimits,
    default_faces: u32,
    help_prefix: String,
}

fn warning(message: impl std::fmt::Display) -> Vec<Reply> {
    vec![Reply::Channel(format!("⚠️ {}", message))]
}

fn say(text: String) -> Vec<Reply> {
    vec![Reply::Channel(text)]
}

impl Dispatcher {
    pub fn new(
        store: SheetStore,
        dice: Arc<dyn Dice>,
        tables: Arc<ResourceTables>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            dice,
            tables,
            flavor: FlavorText::from_config(&config.flavor),
            limits: config.dice.limits(),
            default_faces: config.dice.default_faces,
            help_prefix: config
                .discord
                .prefixes
                .first()
                .cloned()
                .unwrap_or_else(|| ".".to_string()),
        }
    }

    fn dice(&self) -> &dyn Dice {
        self.dice.as_ref()
    }

    /// Execute one command. Every command yields at least one reply.
    pub async fn dispatch(&self, invocation: &Invocation) -> Vec<Reply> {
        debug!(
            "Dispatching {:?} for {} ({})",
            invocation.command, invocation.user_name, invocation.user_id
        );
        let user = invocation.user_id.as_str();
        let name = invocation.user_name.as_str();

        let result = match &invocation.command {
            Command::Roll {
                expression,
                target,
                label,
            } => Ok(self.roll(name, expression.as_deref(), *target, label.as_deref())),
            Command::HiddenRoll { expression } => Ok(self.hidden_roll(name, expression.as_deref())),
            Command::Check {
                skill,
                value,
                modifier,
            } => self.check(user, name, skill, *value, *modifier).await,
            Command::SanityCheck { loss } => self.sanity_check(user, name, loss).await,
            Command::TemporaryInsanity => Ok(say(temporary_insanity(self.dice(), &self.tables))),
            Command::LongTermInsanity => Ok(say(long_term_insanity(self.dice(), &self.tables))),
            Command::Sheet(command) => self.sheet(user, command).await,
            Command::GenerateCoc { count } => Ok(say(self.generate_coc(*count))),
            Command::GenerateDnd { count } => Ok(say(self.generate_dnd(*count))),
            Command::Fireball { level } => Ok(self.fireball(*level)),
            Command::Help => Ok(say(help_text(&self.help_prefix))),
            Command::Nickname => self
                .store
                .require_current(user)
                .await
                .map(|sheet| vec![Reply::Nickname(sheet.nickname_card())]),
            Command::Invalid(message) => Ok(warning(message)),
        };

        result.unwrap_or_else(|e| self.sheet_failure(user, e))
    }

    fn sheet_failure(&self, user: &str, e: SheetError) -> Vec<Reply> {
        if e.is_user_error() {
            warning(e)
        } else {
            error!("Character storage failed for user {}: {}", user, e);
            vec![Reply::Channel(STORAGE_FAILURE.to_string())]
        }
    }

    fn default_expression(&self) -> String {
        format!("1d{}", self.default_faces)
    }

    fn roll(
        &self,
        name: &str,
        expression: Option<&str>,
        target: Option<i64>,
        label: Option<&str>,
    ) -> Vec<Reply> {
        let expression = expression
            .map(str::to_string)
            .unwrap_or_else(|| self.default_expression());
        let outcome = match evaluate(&expression, self.dice(), &self.limits) {
            Ok(outcome) => outcome,
            Err(e) => return warning(e),
        };

        let mut lines = outcome.lines.clone();
        if let Some(target) = target {
            for (line, total) in lines.iter_mut().zip(&outcome.totals) {
                line.push_str(&format!(" / {} : {}", target, classify(*total, target).label()));
            }
            let tier = classify(outcome.total(), target);
            if let Some(flavor) = self.flavor.pick(tier, self.dice()) {
                lines.push(format!("> {}", flavor));
            }
        }

        let header = match label {
            Some(label) => format!("🎲 **{}** rolls {} for {}:", name, expression, label),
            None => format!("🎲 **{}** rolls {}:", name, expression),
        };
        say(format!("{}\n{}", header, lines.join("\n")))
    }

    fn hidden_roll(&self, name: &str, expression: Option<&str>) -> Vec<Reply> {
        let expression = expression
            .map(str::to_string)
            .unwrap_or_else(|| self.default_expression());
        let private = match evaluate(&expression, self.dice(), &self.limits) {
            Ok(outcome) => format!("🎲 Secret roll {}:\n{}", expression, outcome.description()),
            Err(e) => format!("⚠️ {}", e),
        };

        vec![
            Reply::Direct(private),
            Reply::Channel(format!("🤫 **{}** rolls some dice in secret.", name)),
        ]
    }

    async fn check(
        &self,
        user: &str,
        name: &str,
        skill: &str,
        value: Option<i64>,
        modifier: Option<(Modifier, u32)>,
    ) -> Result<Vec<Reply>, SheetError> {
        let value = match value {
            Some(value) => value,
            None => self.store.attribute_value(user, skill).await?,
        };

        let roll = roll_percentile(self.dice(), modifier);
        let tier = classify(i64::from(roll.result), value);
        let verdict = self.flavor.verdict(tier, self.dice());

        let text = match modifier {
            Some((modifier, count)) => format!(
                "🎲 **{}** checks **{}** with {} {} {}: {}/{} : {}",
                name,
                skill,
                count,
                modifier.name(),
                if count == 1 { "die" } else { "dice" },
                roll.render(),
                value,
                verdict
            ),
            None => format!(
                "🎲 **{}** checks **{}**: {}/{} : {}",
                name, skill, roll.result, value, verdict
            ),
        };
        Ok(say(text))
    }

    async fn sanity_check(
        &self,
        user: &str,
        name: &str,
        loss: &SanLoss,
    ) -> Result<Vec<Reply>, SheetError> {
        let mut sheet = self.store.require_current(user).await?;
        let san = sheet.attribute("san").unwrap_or(0);

        let roll = i64::from(self.dice().roll(100));
        let passed = roll <= san;
        let outcome = match evaluate(loss.expression(passed), self.dice(), &self.limits) {
            Ok(outcome) => outcome,
            Err(e) => return Ok(warning(format!("Invalid sanity loss: {}", e))),
        };

        let lost = outcome.total().max(0);
        let new_san = san.saturating_sub(lost).max(0);
        sheet.attributes.insert("san".to_string(), new_san);
        self.store.save(user, &sheet).await?;

        let mut text = format!(
            "🧠 **{}** SAN check {}/{} : {}\n💀 SAN reduced by **{}**",
            name,
            roll,
            san,
            if passed { "✅ Success" } else { "❌ Failure" },
            lost
        );
        if outcome.rolled_dice {
            text.push_str(&format!(" ({})", outcome.description()));
        }
        text.push_str(&format!(", now {}", new_san));

        if lost >= TEMPORARY_INSANITY_LOSS {
            text.push_str(
                "\n⚠️ A loss of 5 or more: roll INT. On a success the investigator suffers a bout of madness (`ti`).",
            );
        }
        if new_san == 0 {
            text.push_str("\n🕯️ SAN has reached 0. The investigator is permanently insane.");
        }
        Ok(say(text))
    }

    async fn sheet(&self, user: &str, command: &SheetCommand) -> Result<Vec<Reply>, SheetError> {
        let text = match command {
            SheetCommand::Create { name, attributes } => {
                let sheet = self.store.create(user, name, attributes).await?;
                format!(
                    "✅ Character **{}** created (ID: {})\n🔄 Switched to **{}**",
                    sheet.name, sheet.id, sheet.name
                )
            }
            SheetCommand::Show => self.store.require_current(user).await?.render(),
            SheetCommand::List => {
                let sheets = self.store.list(user).await?;
                if sheets.is_empty() {
                    return Ok(warning("You have no characters yet. Use `st create` to make one."));
                }
                let current = self.store.current_id(user).await?;
                let lines: Vec<String> = sheets
                    .iter()
                    .map(|sheet| {
                        let marker = if current.as_deref() == Some(sheet.id.as_str()) {
                            " ← current"
                        } else {
                            ""
                        };
                        format!("- **{}** ({}){}", sheet.name, sheet.id, marker)
                    })
                    .collect();
                format!("📜 Your characters:\n{}", lines.join("\n"))
            }
            SheetCommand::Change { name } => {
                let sheet = self.store.switch_current(user, name).await?;
                format!("✅ Switched to **{}**", sheet.name)
            }
            SheetCommand::Update { attribute, value } => {
                let change = self
                    .store
                    .update_attribute(user, attribute, value, self.dice(), &self.limits)
                    .await?;
                let mut text = format!(
                    "✅ `{}` changed: {} → {}",
                    change.attribute, change.old, change.new
                );
                if let Some(breakdown) = change.breakdown {
                    text.push_str(&format!("\n🎲 Roll: {}", breakdown));
                }
                text
            }
            SheetCommand::Delete { name } => {
                let sheet = self.store.delete(user, name).await?;
                format!("🗑️ Character **{}** deleted", sheet.name)
            }
        };
        Ok(say(text))
    }

    fn generate_coc(&self, count: u32) -> String {
        (1..=count as usize)
            .map(|index| Investigator::roll(self.dice()).format(index))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn generate_dnd(&self, count: u32) -> String {
        (1..=count as usize)
            .map(|index| format_ability_scores(&roll_ability_scores(self.dice()), index))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn fireball(&self, level: u32) -> Vec<Reply> {
        match FireballDamage::roll(level, self.dice()) {
            Some(damage) => say(damage.format()),
            None if level < FIREBALL_BASE_LEVEL => warning("Please don't try to downcast a fireball!"),
            None => warning("Spell slots only go up to level 9."),
        }
    }
}
