//! Character sheets and their file-backed store.

pub mod store;

use std::collections::BTreeMap;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::{SheetError, SheetResult};

pub use store::{AttributeChange, SheetStore};

/// Longest accepted character name, in characters.
const MAX_NAME_LEN: usize = 32;

/// Attributes mirrored into a `max_` counterpart when a sheet is created.
const DERIVED_MAXIMUMS: [&str; 3] = ["hp", "san", "mp"];

/// A saved character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub id: String,
    pub name: String,
    pub attributes: BTreeMap<String, i64>,
}

impl CharacterSheet {
    /// New sheet with a fresh id. `max_hp`, `max_san` and `max_mp` default
    /// to the starting `hp`, `san` and `mp` (0 when absent).
    pub fn new(name: &str, mut attributes: BTreeMap<String, i64>) -> Self {
        for attribute in DERIVED_MAXIMUMS {
            let current = attributes.get(attribute).copied().unwrap_or(0);
            attributes.entry(format!("max_{}", attribute)).or_insert(current);
        }

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            attributes,
        }
    }

    /// Case-insensitive attribute lookup.
    pub fn attribute(&self, name: &str) -> Option<i64> {
        self.attributes.get(&name.to_lowercase()).copied()
    }

    /// Server nickname of the form `name HP:hp/max_hp SAN:san/max_san`.
    pub fn nickname_card(&self) -> String {
        let value = |name: &str| self.attribute(name).unwrap_or(0);
        format!(
            "{} HP:{}/{} SAN:{}/{}",
            self.name,
            value("hp"),
            value("max_hp"),
            value("san"),
            value("max_san")
        )
    }

    /// Multi-line `name: value` listing.
    pub fn render(&self) -> String {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n");
        format!("📜 Current character: **{}**\n{}", self.name, attributes)
    }
}

/// Extracts `name value` pairs such as `str60 dex 50 hp:12` from free text.
#[derive(Debug)]
pub struct AttributeParser {
    pattern: Regex,
}

impl AttributeParser {
    pub fn new() -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"([\p{L}_]+)\s*[:=]?\s*(\d+)")?,
        })
    }

    /// Parse every pair in `text`. Names are lower-cased; later pairs win.
    pub fn parse(&self, text: &str) -> SheetResult<BTreeMap<String, i64>> {
        let mut attributes = BTreeMap::new();

        for captures in self.pattern.captures_iter(text) {
            let captures = captures.map_err(|e| SheetError::InvalidValue {
                value: text.to_string(),
                reason: e.to_string(),
            })?;
            let (Some(name), Some(value)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let number = value
                .as_str()
                .parse::<i64>()
                .map_err(|e| SheetError::InvalidValue {
                    value: value.as_str().to_string(),
                    reason: e.to_string(),
                })?;
            attributes.insert(name.as_str().to_lowercase(), number);
        }

        if attributes.is_empty() {
            return Err(SheetError::NoAttributes {
                text: text.to_string(),
            });
        }
        Ok(attributes)
    }
}

/// Check a character name before it is stored.
pub fn validate_name(name: &str) -> SheetResult<()> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME_LEN
        && !name.chars().any(|c| c.is_control() || c.is_whitespace());

    if valid {
        Ok(())
    } else {
        Err(SheetError::InvalidName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SheetResult<BTreeMap<String, i64>> {
        AttributeParser::new().unwrap().parse(text)
    }

    #[test]
    fn test_parse_attributes() {
        let attributes = parse("str60dex 50 HP:12 san=55").unwrap();
        assert_eq!(attributes.get("str"), Some(&60));
        assert_eq!(attributes.get("dex"), Some(&50));
        assert_eq!(attributes.get("hp"), Some(&12));
        assert_eq!(attributes.get("san"), Some(&55));
    }

    #[test]
    fn test_parse_unicode_names() {
        let attributes = parse("力量60侦查70").unwrap();
        assert_eq!(attributes.get("力量"), Some(&60));
        assert_eq!(attributes.get("侦查"), Some(&70));
    }

    #[test]
    fn test_parse_nothing() {
        assert!(matches!(parse("no numbers"), Err(SheetError::NoAttributes { .. })));
    }

    #[test]
    fn test_parse_overflow() {
        assert!(matches!(
            parse("str99999999999999999999999"),
            Err(SheetError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_new_derives_maximums() {
        let sheet = CharacterSheet::new("Alice", parse("hp12 san55").unwrap());
        assert_eq!(sheet.attribute("max_hp"), Some(12));
        assert_eq!(sheet.attribute("max_san"), Some(55));
        assert_eq!(sheet.attribute("max_mp"), Some(0));
        assert!(Uuid::parse_str(&sheet.id).is_ok());
    }

    #[test]
    fn test_explicit_maximum_is_kept() {
        let sheet = CharacterSheet::new("Alice", parse("hp5 max_hp12").unwrap());
        assert_eq!(sheet.attribute("max_hp"), Some(12));
    }

    #[test]
    fn test_attribute_is_case_insensitive() {
        let sheet = CharacterSheet::new("Alice", parse("san55").unwrap());
        assert_eq!(sheet.attribute("SAN"), Some(55));
    }

    #[test]
    fn test_nickname_card() {
        let mut sheet = CharacterSheet::new("Alice", parse("hp12 san55").unwrap());
        sheet.attributes.insert("hp".to_string(), 9);
        assert_eq!(sheet.nickname_card(), "Alice HP:9/12 SAN:55/55");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Alice").is_ok());
        assert!(validate_name("阿尔法").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("two words").is_err());
        assert!(validate_name(&"x".repeat(33)).is_err());
    }
}
