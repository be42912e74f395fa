//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Discord
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.prefixes.is_empty() {
        errors.push("discord.prefixes must contain at least one prefix".to_string());
    }
    for (i, prefix) in config.discord.prefixes.iter().enumerate() {
        if prefix.trim().is_empty() {
            errors.push(format!("discord.prefixes[{}] is empty", i));
        }
    }

    // Storage
    if config.storage.data_dir.trim().is_empty() {
        errors.push("storage.data_dir is required".to_string());
    }

    // Dice limits
    let dice = &config.dice;
    if dice.max_count == 0 {
        errors.push("dice.max_count must be non-zero".to_string());
    }
    if dice.max_faces == 0 {
        errors.push("dice.max_faces must be non-zero".to_string());
    }
    if dice.max_repeat == 0 {
        errors.push("dice.max_repeat must be non-zero".to_string());
    }
    if dice.default_faces == 0 || dice.default_faces > dice.max_faces {
        errors.push(format!(
            "dice.default_faces must be 1-{} (got {})",
            dice.max_faces, dice.default_faces
        ));
    }

    // True random
    let true_random = &config.true_random;
    if true_random.enabled {
        if true_random.url.is_empty() {
            errors.push("true_random.url is required when enabled".to_string());
        }
        if true_random.batch_size == 0 {
            errors.push("true_random.batch_size must be non-zero".to_string());
        }
        if true_random.low_water >= true_random.batch_size {
            errors.push(format!(
                "true_random.low_water ({}) must be below batch_size ({})",
                true_random.low_water, true_random.batch_size
            ));
        }
        if true_random.timeout_secs == 0 {
            errors.push("true_random.timeout_secs must be non-zero".to_string());
        }
    }

    // Flavor
    let flavor = &config.flavor;
    if flavor.enabled {
        let lists = [
            ("critical_success", &flavor.critical_success),
            ("extreme_success", &flavor.extreme_success),
            ("hard_success", &flavor.hard_success),
            ("success", &flavor.success),
            ("failure", &flavor.failure),
            ("fumble", &flavor.fumble),
        ];
        if lists.iter().all(|(_, lines)| lines.is_empty()) {
            errors.push("flavor is enabled but every flavor list is empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::load_config_str;

    fn make_valid_config() -> Config {
        load_config_str(r#"discord { token = "valid_token_here" }"#).unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_empty_prefixes_fail() {
        let mut config = make_valid_config();
        config.discord.prefixes = vec![];
        assert!(validate_config(&config).is_err());

        config.discord.prefixes = vec![" ".to_string()];
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.prefixes[0]"));
    }

    #[test]
    fn test_default_faces_must_fit_limits() {
        let mut config = make_valid_config();
        config.dice.default_faces = 2000;
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("dice.default_faces"));
    }

    #[test]
    fn test_true_random_low_water() {
        let mut config = make_valid_config();
        config.true_random.low_water = 500;
        // Disabled sections are not checked.
        assert!(validate_config(&config).is_ok());

        config.true_random.enabled = true;
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("low_water"));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = make_valid_config();
        config.discord.token = String::new();
        config.dice.max_count = 0;
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.token"));
        assert!(message.contains("dice.max_count"));
    }

    #[test]
    fn test_enabled_flavor_needs_lines() {
        let mut config = make_valid_config();
        let flavor = &mut config.flavor;
        flavor.critical_success.clear();
        flavor.extreme_success.clear();
        flavor.hard_success.clear();
        flavor.success.clear();
        flavor.failure.clear();
        flavor.fumble.clear();
        assert!(validate_config(&config).is_err());

        config.flavor.enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
