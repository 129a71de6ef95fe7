//! Style definition loading
//!
//! Style documents are TOML with a root `format` table:
//!
//! ```text
//! [format.linecomment]
//! color = "128 128 128"
//! italic = true
//!
//! [[format.keywords]]
//! type = 0
//! color = "#569cd6"
//! bold = true
//! ```
//!
//! Every category also accepts an array of declarations
//! (`[[format.numbers]]`). Declarations are applied in document order, so
//! the last one for a given slot wins. A declaration with a bad value is
//! local: a color that does not parse, or a field of the wrong type, is
//! skipped and the slot keeps what it had. A `type` that is not a
//! non-negative integer skips the whole declaration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml::Value;

use crate::config::HighlightConfig;
use crate::error::StyleError;

use super::category::{Category, StyleId};
use super::registry::StyleRegistry;
use super::style::Rgba;

/// Raw style document as parsed from TOML
#[derive(Debug, Default, Deserialize)]
struct StyleDocument {
    #[serde(default)]
    format: FormatDocument,
}

#[derive(Debug, Default, Deserialize)]
struct FormatDocument {
    default: Option<Declarations>,
    numbers: Option<Declarations>,
    linecomment: Option<Declarations>,
    blockcomment: Option<Declarations>,
    quotations: Option<Declarations>,
    escapes: Option<Declarations>,
    keywords: Option<Declarations>,
    expression: Option<Declarations>,
    lineexpression: Option<Declarations>,
    blockexpression: Option<Declarations>,
}

/// A category declared as one table or as an array of tables
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Declarations {
    Many(Vec<StyleEntry>),
    One(StyleEntry),
}

impl Declarations {
    fn into_vec(self) -> Vec<StyleEntry> {
        match self {
            Declarations::One(entry) => vec![entry],
            Declarations::Many(entries) => entries,
        }
    }
}

/// One style declaration; `type` only matters for indexed categories
#[derive(Debug, Default, Deserialize)]
struct StyleEntry {
    #[serde(rename = "type")]
    index: Option<Value>,
    color: Option<Value>,
    background: Option<Value>,
    family: Option<Value>,
    bold: Option<Value>,
    italic: Option<Value>,
    underline: Option<Value>,
}

/// Loads style definitions into registries
pub struct StyleLoader {
    config: HighlightConfig,
    /// In-memory definitions by lowercase name
    sources: HashMap<String, String>,
}

impl StyleLoader {
    /// Create a loader using the given configuration
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            sources: HashMap::new(),
        }
    }

    /// Make a definition available under `name` without touching disk
    pub fn register_source(&mut self, name: &str, text: impl Into<String>) {
        self.sources.insert(name.trim().to_lowercase(), text.into());
    }

    /// Registry every load starts from
    pub fn base_registry(&self) -> StyleRegistry {
        StyleRegistry::builtin(&self.config)
    }

    /// Load a style definition over the built-in styles
    pub fn load(&self, source: &str) -> Result<StyleRegistry, StyleError> {
        self.load_over(&self.base_registry(), source)
    }

    /// Load a style definition over an existing registry
    pub fn load_over(
        &self,
        base: &StyleRegistry,
        source: &str,
    ) -> Result<StyleRegistry, StyleError> {
        let doc: StyleDocument = toml::from_str(source)?;
        let mut registry = base.clone();
        let format = doc.format;

        let categories = [
            (Category::Default, format.default),
            (Category::Number, format.numbers),
            (Category::LineComment, format.linecomment),
            (Category::BlockComment, format.blockcomment),
            (Category::Quotation, format.quotations),
            (Category::Escape, format.escapes),
            (Category::Keyword, format.keywords),
            (Category::Expression, format.expression),
            (Category::LineExpression, format.lineexpression),
            (Category::BlockExpression, format.blockexpression),
        ];
        for (category, declarations) in categories {
            let entries = declarations.map(Declarations::into_vec).unwrap_or_default();
            for entry in entries {
                if let Some(id) = entry_id(category, entry.index.as_ref()) {
                    apply_entry(&mut registry, id, &entry);
                }
            }
        }

        tracing::debug!("Loaded style definition ({} slots)", registry.len());
        Ok(registry)
    }

    /// Load a style definition file over the built-in styles
    pub fn load_file(&self, path: &Path) -> Result<StyleRegistry, StyleError> {
        let text = fs::read_to_string(path).map_err(|source| StyleError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        self.load(&text)
    }

    /// Load a style by name from registered sources, the style
    /// directories, or as a path
    pub fn load_named(&self, name: &str) -> Result<StyleRegistry, StyleError> {
        if let Some(text) = self.sources.get(&name.trim().to_lowercase()) {
            return self.load(text);
        }

        let file_name = format!("{}.toml", name.trim());
        let found = self
            .config
            .style_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file());
        if let Some(path) = found {
            return self.load_file(&path);
        }

        let direct = Path::new(name);
        if direct.is_file() {
            return self.load_file(direct);
        }
        Err(StyleError::NotFound(name.to_string()))
    }
}

/// Slot a declaration targets, `None` when its `type` is unusable
fn entry_id(category: Category, index: Option<&Value>) -> Option<StyleId> {
    if !category.is_indexed() {
        return Some(StyleId::new(category, 0));
    }
    let Some(value) = index else {
        return Some(StyleId::new(category, 0));
    };
    match value.as_integer().map(usize::try_from) {
        Some(Ok(n)) => Some(StyleId::new(category, n)),
        _ => {
            tracing::warn!("Style {}: ignoring declaration with type {}", category, value);
            None
        }
    }
}

/// Layer one declaration over the current content of a slot
fn apply_entry(registry: &mut StyleRegistry, id: StyleId, entry: &StyleEntry) {
    let mut style = registry.get(id).clone();

    if let Some(color) = parse_color(id, "color", entry.color.as_ref()) {
        style.foreground = Some(color);
    }
    if let Some(color) = parse_color(id, "background", entry.background.as_ref()) {
        style.background = Some(color);
    }
    if let Some(family) = field(id, "family", entry.family.as_ref(), Value::as_str) {
        style.font.family = Some(family.to_string());
    }
    if let Some(bold) = field(id, "bold", entry.bold.as_ref(), Value::as_bool) {
        style.font.bold = bold;
    }
    if let Some(italic) = field(id, "italic", entry.italic.as_ref(), Value::as_bool) {
        style.font.italic = italic;
    }
    if let Some(underline) = field(id, "underline", entry.underline.as_ref(), Value::as_bool) {
        style.font.underline = underline;
    }

    registry.set(id, style);
}

/// Read a field of the expected type, logging and skipping anything else
fn field<'v, T>(
    id: StyleId,
    name: &str,
    value: Option<&'v Value>,
    read: impl Fn(&'v Value) -> Option<T>,
) -> Option<T> {
    let value = value?;
    let read = read(value);
    if read.is_none() {
        tracing::warn!("Style {}: ignoring {} {}: wrong type", id, name, value);
    }
    read
}

fn parse_color(id: StyleId, name: &str, value: Option<&Value>) -> Option<Rgba> {
    let literal = field(id, name, value, Value::as_str)?;
    match literal.parse::<Rgba>() {
        Ok(color) => Some(color),
        Err(e) => {
            tracing::warn!("Style {}: ignoring {} {:?}: {}", id, name, literal, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::style::TextStyle;

    fn loader() -> StyleLoader {
        StyleLoader::new(HighlightConfig::default())
    }

    #[test]
    fn test_color_forms() {
        let registry = loader()
            .load(
                r##"
[format.numbers]
color = "0 0 255"

[format.linecomment]
color = "10 20 30 40"

[format.blockcomment]
color = "#0f0"

[format.quotations]
color = " Dark Green "
background = "#11223344"
"##,
            )
            .unwrap();

        assert_eq!(registry.get(StyleId::Number).foreground, Some(Rgba::rgb(0, 0, 255)));
        assert_eq!(
            registry.get(StyleId::LineComment).foreground,
            Some(Rgba::rgba(10, 20, 30, 40))
        );
        assert_eq!(
            registry.get(StyleId::BlockComment).foreground,
            Some(Rgba::rgb(0, 255, 0))
        );
        let quote = registry.get(StyleId::Quotation);
        assert_eq!(quote.foreground, Some(Rgba::rgb(0, 128, 0)));
        assert_eq!(quote.background, Some(Rgba::rgba(0x11, 0x22, 0x33, 0x44)));
    }

    #[test]
    fn test_last_declaration_wins() {
        let registry = loader()
            .load(
                r##"
[[format.keywords]]
type = 1
color = "#ff0000"
bold = true

[[format.keywords]]
type = 1
color = "#0000ff"
"##,
            )
            .unwrap();

        let style = registry.get(StyleId::Keyword(1));
        assert_eq!(style.foreground, Some(Rgba::rgb(0, 0, 255)));
        // Attributes the later declaration omits are kept
        assert!(style.font.bold);
    }

    #[test]
    fn test_bad_color_keeps_prior_value() {
        let loader = loader();
        let base = loader.base_registry();
        let registry = loader
            .load(
                r##"
[format.numbers]
color = "300 0 0"
italic = true

[[format.blockexpression]]
type = 2
color = "no-such-color"
"##,
            )
            .unwrap();

        let number = registry.get(StyleId::Number);
        assert_eq!(number.foreground, base.get(StyleId::Number).foreground);
        assert!(number.font.italic);
        assert_eq!(
            registry.get(StyleId::BlockExpression(2)),
            base.get(StyleId::BlockExpression(2))
        );
    }

    #[test]
    fn test_escape_and_default_slots() {
        let registry = StyleLoader::new(HighlightConfig::default())
            .load_over(
                &StyleRegistry::default(),
                r##"
[format.default]
color = "white"
family = "Fira Code"

[format.quotations]
color = "green"
"##,
            )
            .unwrap();

        assert_eq!(registry.default_style().foreground, Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(registry.default_style().font.family.as_deref(), Some("Fira Code"));
        assert_eq!(registry.get(StyleId::Escape).foreground, Some(Rgba::rgb(0, 255, 0)));
    }

    #[test]
    fn test_load_over_keeps_undeclared() {
        let mut base = StyleRegistry::default();
        base.set(StyleId::Expression(3), TextStyle::fg(Rgba::rgb(1, 1, 1)));
        let registry = loader()
            .load_over(&base, "[format.numbers]\ncolor = 'red'\n")
            .unwrap();
        assert_eq!(registry.get(StyleId::Expression(3)), base.get(StyleId::Expression(3)));
        assert_eq!(registry.get(StyleId::Number).foreground, Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_badly_typed_values_are_local() {
        let loader = loader();
        let base = loader.base_registry();
        let registry = loader
            .load(
                r##"
[format.numbers]
color = 255
italic = true

[format.linecomment]
color = "red"
bold = "yes"

[[format.keywords]]
type = -2
color = "blue"

[[format.keywords]]
type = "1"
color = "blue"

[[format.keywords]]
type = 1
color = "green"
"##,
            )
            .unwrap();

        let number = registry.get(StyleId::Number);
        assert_eq!(number.foreground, base.get(StyleId::Number).foreground);
        assert!(number.font.italic);

        let comment = registry.get(StyleId::LineComment);
        assert_eq!(comment.foreground, Some(Rgba::rgb(255, 0, 0)));
        assert!(!comment.font.bold);

        assert_eq!(registry.get(StyleId::Keyword(0)), base.get(StyleId::Keyword(0)));
        assert_eq!(registry.get(StyleId::Keyword(1)).foreground, Some(Rgba::rgb(0, 255, 0)));
    }

    #[test]
    fn test_single_category_as_array() {
        let registry = loader()
            .load(
                r##"
[[format.numbers]]
color = "red"
bold = true

[[format.numbers]]
color = "blue"
"##,
            )
            .unwrap();

        let number = registry.get(StyleId::Number);
        assert_eq!(number.foreground, Some(Rgba::rgb(0, 0, 255)));
        assert!(number.font.bold);
    }

    #[test]
    fn test_empty_document() {
        let loader = loader();
        assert_eq!(loader.load("").unwrap(), loader.base_registry());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(loader().load("[format"), Err(StyleError::Parse(_))));
    }

    #[test]
    fn test_load_named() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dark.toml"), "[format.numbers]\ncolor = '#123456'\n").unwrap();

        let mut loader = StyleLoader::new(HighlightConfig::default().with_style_dir(dir.path()));
        let registry = loader.load_named("dark").unwrap();
        assert_eq!(
            registry.get(StyleId::Number).foreground,
            Some(Rgba::rgb(0x12, 0x34, 0x56))
        );

        loader.register_source("Light", "[format.numbers]\ncolor = 'black'\n");
        let registry = loader.load_named("light").unwrap();
        assert_eq!(registry.get(StyleId::Number).foreground, Some(Rgba::rgb(0, 0, 0)));

        assert!(matches!(loader.load_named("missing"), Err(StyleError::NotFound(_))));
    }
}
