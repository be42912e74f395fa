//! Configuration type definitions.

use serde::Deserialize;

use crate::dice::DiceLimits;
use crate::rules::Tier;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dice: DiceConfig,
    #[serde(default)]
    pub true_random: TrueRandomConfig,
    #[serde(default)]
    pub flavor: FlavorConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Message prefixes that mark a command, e.g. `.r 1d20` or `/r 1d20`.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
}

fn default_prefixes() -> Vec<String> {
    vec![".".to_string(), "/".to_string(), "。".to_string()]
}

/// Where sheets and static tables live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub phobias: String,
    pub manias: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/characters".to_string(),
            phobias: "data/phobias.json".to_string(),
            manias: "data/mania.json".to_string(),
        }
    }
}

/// Dice expression limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Faces of the die rolled by a bare `r`.
    pub default_faces: u32,
    pub max_count: u32,
    pub max_faces: u32,
    pub max_repeat: u32,
}

impl Default for DiceConfig {
    fn default() -> Self {
        let limits = DiceLimits::default();
        Self {
            default_faces: 100,
            max_count: limits.max_count,
            max_faces: limits.max_faces,
            max_repeat: limits.max_repeat,
        }
    }
}

impl DiceConfig {
    pub fn limits(&self) -> DiceLimits {
        DiceLimits {
            max_count: self.max_count,
            max_faces: self.max_faces,
            max_repeat: self.max_repeat,
        }
    }
}

/// random.org backed dice.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrueRandomConfig {
    pub enabled: bool,
    pub url: String,
    /// Fractions requested per refill.
    pub batch_size: u32,
    /// Refill when fewer than this many fractions remain.
    pub low_water: u32,
    pub timeout_secs: u64,
}

impl Default for TrueRandomConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://www.random.org/decimal-fractions/".to_string(),
            batch_size: 100,
            low_water: 20,
            timeout_secs: 5,
        }
    }
}

/// Flavor lines appended to check results, per tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlavorConfig {
    pub enabled: bool,
    pub critical_success: Vec<String>,
    pub extreme_success: Vec<String>,
    pub hard_success: Vec<String>,
    pub success: Vec<String>,
    pub failure: Vec<String>,
    pub fumble: Vec<String>,
}

impl FlavorConfig {
    pub fn lines_for(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::CriticalSuccess => &self.critical_success,
            Tier::ExtremeSuccess => &self.extreme_success,
            Tier::HardSuccess => &self.hard_success,
            Tier::Success => &self.success,
            Tier::Failure => &self.failure,
            Tier::Fumble => &self.fumble,
        }
    }
}

impl Default for FlavorConfig {
    fn default() -> Self {
        let lines = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            enabled: true,
            critical_success: lines(&[
                "The dry stone splits open, and for an instant you hear running water.",
            ]),
            extreme_success: lines(&[
                "Beneath the rubble you find a key that has not yet rusted through.",
            ]),
            hard_success: lines(&[
                "The lamp gutters but holds, and the writing on the wall is legible at last.",
            ]),
            success: lines(&[
                "The door at the end of the corridor swings open onto another, identical corridor.",
            ]),
            failure: lines(&[
                "Your shadow falls on the wall like a chalk drawing, and does not move.",
            ]),
            fumble: lines(&[
                "You hear a dry laugh, like a rat running over broken glass, but the room is empty.",
            ]),
        }
    }
}
