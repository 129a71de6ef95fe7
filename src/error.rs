//! Error types for linelex

use std::path::PathBuf;

use thiserror::Error;

use crate::syntax::Category;

/// Result type alias for linelex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error wrapping every fatal failure
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A grammar load failed; the previously active grammar stays in force
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("cannot read grammar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed grammar definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("grammar definition has no name")]
    MissingName,

    #[error("grammar {0:?} is already registered")]
    DuplicateName(String),

    #[error("no grammar named {0:?}")]
    NotFound(String),

    #[error("grammar inheritance cycle: {}", .0.join(" -> "))]
    InheritanceCycle(Vec<String>),
}

/// A single rule was rejected; the rest of the grammar loads normally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("{category} rule {index}: invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        category: Category,
        index: usize,
        pattern: String,
        message: String,
    },

    #[error("{category} rule type {index} out of range (capacity {capacity})")]
    TypeOutOfRange {
        category: Category,
        index: i64,
        capacity: usize,
    },

    #[error("{category} rule needs an integer type, found {found}")]
    InvalidType { category: Category, found: String },

    #[error("{category} rule {index}: block needs both start and end")]
    IncompleteBlock { category: Category, index: usize },

    #[error("{category} rule {index}: needs a pattern or a word list")]
    EmptyRule { category: Category, index: usize },
}

/// A style document could not be loaded at all
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("cannot read style {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed style definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no style named {0:?}")]
    NotFound(String),
}

/// A color literal could not be understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("empty color value")]
    Empty,

    #[error("invalid hex color {0:?}")]
    InvalidHex(String),

    #[error("color channel {0:?} is not a number in 0-255")]
    InvalidChannel(String),

    #[error("expected 3 or 4 color channels, got {0}")]
    ChannelCount(usize),

    #[error("unknown color name {0:?}")]
    UnknownName(String),
}

/// Configuration file problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
}
