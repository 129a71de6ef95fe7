//! Style registry
//!
//! Maps style identifiers to the visual record a collaborator paints with.

use std::collections::HashMap;

use crate::config::HighlightConfig;

use super::category::{Category, StyleId};
use super::style::{FontStyle, Rgba, StyleSpan, TextStyle};

/// Rotating foreground palette for the built-in keyword/expression slots
const INDEXED_PALETTE: &[Rgba] = &[
    Rgba::rgb(0xc5, 0x86, 0xc0),
    Rgba::rgb(0x56, 0x9c, 0xd6),
    Rgba::rgb(0x4e, 0xc9, 0xb0),
    Rgba::rgb(0xdc, 0xdc, 0xaa),
    Rgba::rgb(0x9c, 0xdc, 0xfe),
    Rgba::rgb(0xd7, 0xba, 0x7d),
    Rgba::rgb(0xd1, 0x69, 0x69),
    Rgba::rgb(0xb5, 0xce, 0xa8),
];

/// Style slots by identifier, with a default that always exists
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleRegistry {
    default: TextStyle,
    styles: HashMap<StyleId, TextStyle>,
}

impl StyleRegistry {
    /// Create a registry holding only the default style
    pub fn new(default: TextStyle) -> Self {
        Self {
            default,
            styles: HashMap::new(),
        }
    }

    /// Built-in styles for every category, with the default style taken
    /// from the configuration
    pub fn builtin(config: &HighlightConfig) -> Self {
        let mut registry = Self::new(default_from_config(config));
        let comment = TextStyle::fg(Rgba::rgb(0x6a, 0x99, 0x55)).with_italic();

        registry.set(StyleId::Number, TextStyle::fg(Rgba::rgb(0xb5, 0xce, 0xa8)));
        registry.set(StyleId::Quotation, TextStyle::fg(Rgba::rgb(0xce, 0x91, 0x78)));
        registry.set(StyleId::LineComment, comment.clone());
        registry.set(StyleId::BlockComment, comment);

        let limits = &config.limits;
        for category in [
            Category::Keyword,
            Category::Expression,
            Category::LineExpression,
            Category::BlockExpression,
        ] {
            for i in 0..limits.capacity(category) {
                let color = INDEXED_PALETTE[i % INDEXED_PALETTE.len()];
                let mut style = TextStyle::fg(color);
                if category == Category::Keyword && i == 0 {
                    style = style.with_bold();
                }
                registry.set(StyleId::new(category, i), style);
            }
        }
        registry
    }

    /// The fixed default style
    pub fn default_style(&self) -> &TextStyle {
        &self.default
    }

    /// Style for an id
    ///
    /// Undeclared escapes look like their quotation; anything else
    /// undeclared uses the default style.
    pub fn get(&self, id: StyleId) -> &TextStyle {
        if let Some(style) = self.styles.get(&id) {
            return style;
        }
        match id {
            StyleId::Escape => self.get(StyleId::Quotation),
            _ => &self.default,
        }
    }

    /// Whether an id has its own slot
    pub fn contains(&self, id: StyleId) -> bool {
        id == StyleId::Default || self.styles.contains_key(&id)
    }

    /// Set the style of a slot; `StyleId::Default` replaces the default
    pub fn set(&mut self, id: StyleId, style: TextStyle) {
        if id == StyleId::Default {
            self.default = style;
        } else {
            self.styles.insert(id, style);
        }
    }

    /// Number of declared slots, the default included
    pub fn len(&self) -> usize {
        self.styles.len() + 1
    }

    /// Never empty: the default slot always exists
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Pair each span with its style record
    pub fn resolve<'a>(
        &'a self,
        spans: &'a [StyleSpan],
    ) -> impl Iterator<Item = (StyleSpan, &'a TextStyle)> + 'a {
        spans.iter().map(move |span| (*span, self.get(span.style)))
    }
}

fn default_from_config(config: &HighlightConfig) -> TextStyle {
    let parse = |value: &Option<String>| {
        value.as_deref().and_then(|literal| match literal.parse::<Rgba>() {
            Ok(color) => Some(color),
            Err(e) => {
                tracing::warn!("Ignoring default style color {:?}: {}", literal, e);
                None
            }
        })
    };

    let defaults = &config.default_style;
    TextStyle {
        foreground: parse(&defaults.foreground),
        background: parse(&defaults.background),
        font: FontStyle {
            family: defaults.family.clone(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultStyleConfig;

    #[test]
    fn test_default_always_exists() {
        let registry = StyleRegistry::default();
        assert!(registry.contains(StyleId::Default));
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(StyleId::Keyword(99)).is_default());
    }

    #[test]
    fn test_open_slots() {
        let mut registry = StyleRegistry::default();
        let style = TextStyle::fg(Rgba::rgb(1, 2, 3));
        registry.set(StyleId::Keyword(1000), style.clone());
        assert_eq!(registry.get(StyleId::Keyword(1000)), &style);
        assert!(registry.contains(StyleId::Keyword(1000)));
    }

    #[test]
    fn test_escape_falls_back_to_quotation() {
        let mut registry = StyleRegistry::default();
        let quote = TextStyle::fg(Rgba::rgb(0, 128, 0));
        registry.set(StyleId::Quotation, quote.clone());
        assert_eq!(registry.get(StyleId::Escape), &quote);

        let escape = TextStyle::fg(Rgba::rgb(255, 165, 0));
        registry.set(StyleId::Escape, escape.clone());
        assert_eq!(registry.get(StyleId::Escape), &escape);
    }

    #[test]
    fn test_builtin_uses_config_default() {
        let config = HighlightConfig {
            default_style: DefaultStyleConfig {
                foreground: Some("#d4d4d4".to_string()),
                background: Some("not a color".to_string()),
                family: Some("monospace".to_string()),
            },
            ..Default::default()
        };
        let registry = StyleRegistry::builtin(&config);
        let default = registry.default_style();
        assert_eq!(default.foreground, Some(Rgba::rgb(0xd4, 0xd4, 0xd4)));
        assert_eq!(default.background, None);
        assert_eq!(default.font.family.as_deref(), Some("monospace"));

        assert!(registry.get(StyleId::BlockComment).font.italic);
        assert!(registry.contains(StyleId::BlockExpression(5)));
        // Beyond configured capacity only the default applies
        assert_eq!(registry.get(StyleId::Keyword(8)), default);
    }

    #[test]
    fn test_resolve() {
        let registry = StyleRegistry::builtin(&HighlightConfig::default());
        let spans = [StyleSpan::new(0, 2, StyleId::Number)];
        let resolved: Vec<_> = registry.resolve(&spans).collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].1, registry.get(StyleId::Number));
    }
}
