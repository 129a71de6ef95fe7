//! Loader configuration
//!
//! Loads settings from ~/.linelex.toml (or %USERPROFILE%\.linelex.toml on
//! Windows). The configuration is an explicit value handed to the grammar
//! and style loaders; nothing here is global.
//!
//! Example:
//! ```text
//! # linelex configuration
//! grammar_dirs = ["/usr/share/linelex/grammars"]
//! style_dirs = ["/usr/share/linelex/styles"]
//!
//! [limits]
//! keywords = 8
//! expressions = 7
//! line_expressions = 6
//! block_expressions = 6
//!
//! [default_style]
//! foreground = "#d4d4d4"
//! background = "#1e1e1e"
//! family = "monospace"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::syntax::Category;

/// Number of rule slots per indexed category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryLimits {
    pub keywords: usize,
    pub expressions: usize,
    pub line_expressions: usize,
    pub block_expressions: usize,
}

impl Default for CategoryLimits {
    fn default() -> Self {
        Self {
            keywords: 8,
            expressions: 7,
            line_expressions: 6,
            block_expressions: 6,
        }
    }
}

impl CategoryLimits {
    /// Slots available for a category; unindexed categories hold one rule
    pub fn capacity(&self, category: Category) -> usize {
        match category {
            Category::Keyword => self.keywords,
            Category::Expression => self.expressions,
            Category::LineExpression => self.line_expressions,
            Category::BlockExpression => self.block_expressions,
            _ => 1,
        }
    }
}

/// Attributes of the fixed default style (id 0)
///
/// Colors are kept as literals and parsed by the style registry, so a bad
/// value degrades to "no color" like any other style declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DefaultStyleConfig {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub family: Option<String>,
}

/// Configuration settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Directories searched for `<name>.toml` grammar files
    pub grammar_dirs: Vec<PathBuf>,
    /// Directories searched for `<name>.toml` style files
    pub style_dirs: Vec<PathBuf>,
    /// Rule slots per indexed category
    pub limits: CategoryLimits,
    /// Default style attributes
    pub default_style: DefaultStyleConfig,
}

impl HighlightConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".linelex.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".linelex.toml"))
        }
    }

    /// Load configuration from the user's config file
    ///
    /// A missing file gives the defaults; an unreadable or malformed one
    /// is logged and also gives the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Builder: add a grammar search directory
    pub fn with_grammar_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.grammar_dirs.push(dir.into());
        self
    }

    /// Builder: add a style search directory
    pub fn with_style_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.style_dirs.push(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let contents = r##"
# Comment
grammar_dirs = ["/tmp/grammars"]

[limits]
keywords = 12

[default_style]
foreground = "#d4d4d4"
        "##;

        let config = HighlightConfig::from_toml(contents).unwrap();
        assert_eq!(config.grammar_dirs, vec![PathBuf::from("/tmp/grammars")]);
        assert!(config.style_dirs.is_empty());
        assert_eq!(config.limits.keywords, 12);
        // Unset limits keep their defaults
        assert_eq!(config.limits.expressions, 7);
        assert_eq!(config.default_style.foreground.as_deref(), Some("#d4d4d4"));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(HighlightConfig::from_toml("").unwrap(), HighlightConfig::default());
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            HighlightConfig::from_toml("limits = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_capacity() {
        let limits = CategoryLimits::default();
        assert_eq!(limits.capacity(Category::Keyword), 8);
        assert_eq!(limits.capacity(Category::Expression), 7);
        assert_eq!(limits.capacity(Category::LineExpression), 6);
        assert_eq!(limits.capacity(Category::BlockExpression), 6);
        assert_eq!(limits.capacity(Category::Quotation), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linelex.toml");
        fs::write(&path, "style_dirs = [\"styles\"]\n").unwrap();

        let config = HighlightConfig::load_from(&path).unwrap();
        assert_eq!(config.style_dirs, vec![PathBuf::from("styles")]);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            HighlightConfig::load_from(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
