//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Sheet(#[from] SheetError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Failed to load resource table '{path}': {message}")]
    ResourceError { path: String, message: String },
}

/// Dice expression errors. The display text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Empty dice expression")]
    Empty,

    #[error("Illegal character `{0}` in dice expression")]
    IllegalCharacter(char),

    #[error("Malformed term `{0}`")]
    Malformed(String),

    #[error("Dice count must be 1-{max}, got {got}")]
    CountOutOfRange { got: u64, max: u32 },

    #[error("Dice faces must be 1-{max}, got {got}")]
    FacesOutOfRange { got: u64, max: u32 },

    #[error("Keep count must be at least 1")]
    KeepOutOfRange,

    #[error("Repeat count must be 1-{max}, got {got}")]
    RepeatOutOfRange { got: u64, max: u32 },

    #[error("Result is too large")]
    Overflow,
}

/// Character sheet store errors.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Character **{name}** already exists")]
    DuplicateName { name: String },

    #[error("Character **{name}** does not exist")]
    NotFound { name: String },

    #[error("You have no active character. Use `st create` or `st change` first")]
    NoCurrent,

    #[error("Attribute `{name}` does not exist on this character")]
    UnknownAttribute { name: String },

    #[error("No attributes found in `{text}`")]
    NoAttributes { text: String },

    #[error("Invalid character name `{name}`")]
    InvalidName { name: String },

    #[error("Invalid value `{value}`: {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("Invalid dice expression: {0}")]
    Dice(#[from] DiceError),

    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt character file '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid attribute pattern: {0}")]
    Pattern(#[from] fancy_regex::Error),
}

impl SheetError {
    /// Whether this error is caused by the user's request rather than by storage.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::Json { .. } | Self::Pattern(_))
    }
}

/// Discord-related errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Nickname can only be set inside a server")]
    NotInGuild,

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Result type alias for sheet store operations.
pub type SheetResult<T> = std::result::Result<T, SheetError>;
