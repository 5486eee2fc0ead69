//! Debug info configuration types and error definitions.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Debug information detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugLevel {
    /// No debug information. Builders become no-ops.
    #[default]
    None,
    /// Line tables and function boundaries.
    Full,
}

impl DebugLevel {
    /// Check if debug info should be generated.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for DebugLevel {
    type Err = DebugInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "off" | "none" => Ok(Self::None),
            "1" | "true" | "on" | "full" => Ok(Self::Full),
            _ => Err(DebugInfoError::UnknownLevel(s.to_owned())),
        }
    }
}

/// Metadata schema understood by the consuming backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataSchema {
    /// Hierarchical `DI*` nodes (general-purpose backends).
    #[default]
    Modern,
    /// Flat numerically tagged tuples (NVVM and other GPU backends that
    /// predate the hierarchical schema).
    Legacy,
}

impl MetadataSchema {
    /// Determine the schema for a target triple.
    #[must_use]
    pub fn for_target(target: &str) -> Self {
        if target.starts_with("nvptx") {
            Self::Legacy
        } else {
            Self::Modern
        }
    }
}

impl fmt::Display for MetadataSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modern => write!(f, "modern"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for MetadataSchema {
    type Err = DebugInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(Self::Modern),
            "legacy" | "nvvm" => Ok(Self::Legacy),
            _ => Err(DebugInfoError::UnknownSchema(s.to_owned())),
        }
    }
}

/// DWARF source language recorded in the compile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceLanguage {
    /// Closest to Ori's semantics.
    #[default]
    C,
    C99,
    Python,
}

impl SourceLanguage {
    /// `DW_LANG_*` code, used by the legacy schema.
    pub fn dwarf_code(self) -> i64 {
        match self {
            Self::C => 0x0002,
            Self::C99 => 0x000c,
            Self::Python => 0x0014,
        }
    }

    /// `DW_LANG_*` enumerator name, used by the modern schema.
    pub fn token(self) -> &'static str {
        match self {
            Self::C => "DW_LANG_C",
            Self::C99 => "DW_LANG_C99",
            Self::Python => "DW_LANG_Python",
        }
    }
}

/// Configuration for debug information generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfoConfig {
    /// Debug information detail level.
    pub level: DebugLevel,
    /// Schema of the consuming backend.
    pub schema: MetadataSchema,
    /// Language tag for the compile unit.
    pub language: SourceLanguage,
    /// Producer string for the compile unit.
    pub producer: String,
    /// Value of the `isOptimized` fields. JIT code is always optimized.
    pub optimized: bool,
}

impl Default for DebugInfoConfig {
    fn default() -> Self {
        Self {
            level: DebugLevel::None,
            schema: MetadataSchema::Modern,
            language: SourceLanguage::C,
            producer: DebugInfoConfig::PRODUCER.to_owned(),
            optimized: true,
        }
    }
}

impl DebugInfoConfig {
    /// Producer string identifying the Ori compiler.
    pub const PRODUCER: &'static str = "Ori Compiler";

    /// Environment variable enabling debug info (`1`/`full`, `0`/`none`).
    pub const ENV_LEVEL: &'static str = "ORI_DEBUGINFO";

    /// Environment variable selecting the schema (`modern`/`legacy`).
    pub const ENV_SCHEMA: &'static str = "ORI_DEBUGINFO_SCHEMA";

    /// Create a new debug info configuration with the given level.
    #[must_use]
    pub fn new(level: DebugLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Full debug info with the modern schema.
    #[must_use]
    pub fn development() -> Self {
        Self::new(DebugLevel::Full)
    }

    /// Create a configuration appropriate for a target triple.
    #[must_use]
    pub fn for_target(level: DebugLevel, target: &str) -> Self {
        Self {
            level,
            schema: MetadataSchema::for_target(target),
            ..Default::default()
        }
    }

    /// Read the configuration from `ORI_DEBUGINFO` and `ORI_DEBUGINFO_SCHEMA`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, DebugInfoError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DebugInfoError> {
        let mut config = Self::default();
        if let Some(level) = lookup(Self::ENV_LEVEL) {
            config.level = level.parse()?;
        }
        if let Some(schema) = lookup(Self::ENV_SCHEMA) {
            config.schema = schema.parse()?;
        }
        Ok(config)
    }

    /// Set the metadata schema.
    #[must_use]
    pub fn with_schema(mut self, schema: MetadataSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the compile unit language.
    #[must_use]
    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.language = language;
        self
    }

    /// Set the producer string.
    #[must_use]
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    /// Set whether this is an optimized build.
    #[must_use]
    pub fn with_optimized(mut self, optimized: bool) -> Self {
        self.optimized = optimized;
        self
    }
}

/// Error type for debug info operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DebugInfoError {
    /// The source path cannot be turned into a (directory, filename) pair.
    #[error("invalid source path '{path}': {reason}")]
    InvalidSourcePath { path: String, reason: String },
    #[error("unknown debug info level '{0}' (expected none or full)")]
    UnknownLevel(String),
    #[error("unknown metadata schema '{0}' (expected modern or legacy)")]
    UnknownSchema(String),
}

/// Create a `DebugInfoError::InvalidSourcePath` error (cold path).
#[cold]
#[inline(never)]
pub(crate) fn invalid_source_path(path: &Path, reason: impl Into<String>) -> DebugInfoError {
    DebugInfoError::InvalidSourcePath {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests;
