//! Terminal rendering of style records

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

use super::style::{Rgba, TextStyle};

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        // Terminals have no alpha channel
        Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

impl From<&TextStyle> for ContentStyle {
    fn from(style: &TextStyle) -> Self {
        let mut attributes = Attributes::default();
        if style.font.bold {
            attributes.set(Attribute::Bold);
        }
        if style.font.italic {
            attributes.set(Attribute::Italic);
        }
        if style.font.underline {
            attributes.set(Attribute::Underlined);
        }

        ContentStyle {
            foreground_color: style.foreground.map(Color::from),
            background_color: style.background.map(Color::from),
            underline_color: None,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_style_to_content_style() {
        let style = TextStyle::fg(Rgba::rgba(1, 2, 3, 4)).with_bold().with_underline();
        let content = ContentStyle::from(&style);

        assert_eq!(content.foreground_color, Some(Color::Rgb { r: 1, g: 2, b: 3 }));
        assert_eq!(content.background_color, None);
        assert!(content.attributes.has(Attribute::Bold));
        assert!(content.attributes.has(Attribute::Underlined));
        assert!(!content.attributes.has(Attribute::Italic));
    }

    #[test]
    fn test_default_style_is_plain() {
        let content = ContentStyle::from(&TextStyle::default());
        assert_eq!(content, ContentStyle::new());
    }
}
