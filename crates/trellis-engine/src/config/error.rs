//! Configuration loader errors (§4.E, §12, the *ConfigurationError* kind of
//! §7). Each malformation gets its own variant carrying the offending
//! group/set name rather than a single generic string.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("configuration document at {path:?} is not valid TOML: {reason}")]
    Malformed { path: String, reason: String },

    #[error("transformation set {name:?} references a document that was not found: {path:?}")]
    MissingSet { name: String, path: String },

    #[error("duplicate group name {0:?}")]
    DuplicateGroup(String),

    #[error("group {group:?} has no class path")]
    MissingClass { group: String },

    #[error("group {group:?} is a translation-unit-triggered block transformation, which is not a valid combination")]
    TranslationUnitBlock { group: String },

    #[error(
        "configuration declares compiler version {declared}, older than the engine's {engine}"
    )]
    VersionMismatch { engine: String, declared: String },
}

pub type ConfigurationResult<T> = std::result::Result<T, ConfigurationError>;
