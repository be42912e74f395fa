//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `TRPG_DICE_DISCORD_TOKEN` - Discord bot token
//! - `TRPG_DICE_DATA_DIR` - Character sheet directory
//! - `TRPG_DICE_TRUE_RANDOM` - Enable random.org dice (`true`/`false`)

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "TRPG_DICE";

/// Apply environment variable overrides to a config.
///
/// Lets the bot token live outside the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Ok(dir) = env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
        config.storage.data_dir = dir;
    }

    if let Ok(flag) = env::var(format!("{}_TRUE_RANDOM", ENV_PREFIX)) {
        if let Ok(enabled) = flag.trim().to_lowercase().parse() {
            config.true_random.enabled = enabled;
        }
    }

    config
}

/// Names of override variables that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_DISCORD_TOKEN", ENV_PREFIX),
        format!("{}_DATA_DIR", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `TRPG_DICE_CONFIG` environment variable, otherwise returns "trpg-dice.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "trpg-dice.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::load_config_str;

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "TRPG_DICE");
    }

    #[test]
    fn test_overrides() {
        // Single test touching these variables so parallel tests don't race.
        env::remove_var("TRPG_DICE_CONFIG");
        assert_eq!(get_config_path(), "trpg-dice.conf");

        let config = load_config_str(r#"discord { token = "original_token" }"#).unwrap();

        env::remove_var("TRPG_DICE_DISCORD_TOKEN");
        env::remove_var("TRPG_DICE_DATA_DIR");
        env::remove_var("TRPG_DICE_TRUE_RANDOM");
        let unchanged = apply_env_overrides(config.clone());
        assert_eq!(unchanged.discord.token, "original_token");
        assert_eq!(unchanged.storage.data_dir, "data/characters");

        env::set_var("TRPG_DICE_DISCORD_TOKEN", "from_env");
        env::set_var("TRPG_DICE_DATA_DIR", "");
        env::set_var("TRPG_DICE_TRUE_RANDOM", "TRUE");
        let changed = apply_env_overrides(config);
        assert_eq!(changed.discord.token, "from_env");
        assert!(changed.true_random.enabled);
        assert_eq!(check_empty_env_vars(), vec!["TRPG_DICE_DATA_DIR".to_string()]);

        env::remove_var("TRPG_DICE_DISCORD_TOKEN");
        env::remove_var("TRPG_DICE_DATA_DIR");
        env::remove_var("TRPG_DICE_TRUE_RANDOM");
    }
}
