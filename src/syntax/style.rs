//! Style types for highlighted text
//!
//! Colors, font attributes, the style record a registry slot holds, and
//! the spans the match engine emits.

use std::fmt;
use std::str::FromStr;

use crate::error::ColorError;

use super::category::StyleId;

/// An RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Fixed named-color palette, keys lowercase without whitespace
const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::rgb(0x00, 0x00, 0x00)),
    ("white", Rgba::rgb(0xff, 0xff, 0xff)),
    ("red", Rgba::rgb(0xff, 0x00, 0x00)),
    ("green", Rgba::rgb(0x00, 0xff, 0x00)),
    ("blue", Rgba::rgb(0x00, 0x00, 0xff)),
    ("cyan", Rgba::rgb(0x00, 0xff, 0xff)),
    ("magenta", Rgba::rgb(0xff, 0x00, 0xff)),
    ("yellow", Rgba::rgb(0xff, 0xff, 0x00)),
    ("gray", Rgba::rgb(0xa0, 0xa0, 0xa4)),
    ("grey", Rgba::rgb(0xa0, 0xa0, 0xa4)),
    ("darkgray", Rgba::rgb(0x80, 0x80, 0x80)),
    ("darkgrey", Rgba::rgb(0x80, 0x80, 0x80)),
    ("lightgray", Rgba::rgb(0xc0, 0xc0, 0xc0)),
    ("lightgrey", Rgba::rgb(0xc0, 0xc0, 0xc0)),
    ("darkred", Rgba::rgb(0x80, 0x00, 0x00)),
    ("darkgreen", Rgba::rgb(0x00, 0x80, 0x00)),
    ("darkblue", Rgba::rgb(0x00, 0x00, 0x80)),
    ("darkcyan", Rgba::rgb(0x00, 0x80, 0x80)),
    ("darkmagenta", Rgba::rgb(0x80, 0x00, 0x80)),
    ("darkyellow", Rgba::rgb(0x80, 0x80, 0x00)),
    ("orange", Rgba::rgb(0xff, 0xa5, 0x00)),
    ("purple", Rgba::rgb(0x80, 0x00, 0x80)),
    ("brown", Rgba::rgb(0xa5, 0x2a, 0x2a)),
    ("pink", Rgba::rgb(0xff, 0xc0, 0xcb)),
    ("navy", Rgba::rgb(0x00, 0x00, 0x80)),
    ("teal", Rgba::rgb(0x00, 0x80, 0x80)),
    ("olive", Rgba::rgb(0x80, 0x80, 0x00)),
    ("maroon", Rgba::rgb(0x80, 0x00, 0x00)),
    ("lime", Rgba::rgb(0x00, 0xff, 0x00)),
    ("silver", Rgba::rgb(0xc0, 0xc0, 0xc0)),
    ("gold", Rgba::rgb(0xff, 0xd7, 0x00)),
    ("violet", Rgba::rgb(0xee, 0x82, 0xee)),
    ("transparent", Rgba::rgba(0x00, 0x00, 0x00, 0x00)),
];

impl Rgba {
    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Color with explicit alpha
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB`, `#RGBA` or `#RRGGBBAA`
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s.trim().trim_start_matches('#');
        let invalid = || ColorError::InvalidHex(s.to_string());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let short = |i: usize| -> Result<u8, ColorError> {
            let v = u8::from_str_radix(&digits[i..i + 1], 16).map_err(|_| invalid())?;
            Ok(v * 0x11)
        };
        let long = |i: usize| -> Result<u8, ColorError> {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid())
        };

        match digits.len() {
            3 => Ok(Rgba::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Ok(Rgba::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Ok(Rgba::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Ok(Rgba::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => Err(invalid()),
        }
    }

    /// Parse space separated decimal channels, `"R G B"` or `"R G B A"`
    pub fn from_channels(s: &str) -> Result<Self, ColorError> {
        let channels = s
            .split_whitespace()
            .map(|part| {
                part.parse::<u8>()
                    .map_err(|_| ColorError::InvalidChannel(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match channels[..] {
            [r, g, b] => Ok(Rgba::rgb(r, g, b)),
            [r, g, b, a] => Ok(Rgba::rgba(r, g, b, a)),
            _ => Err(ColorError::ChannelCount(channels.len())),
        }
    }

    /// Look up a palette color, ignoring case and whitespace
    pub fn from_name(s: &str) -> Result<Self, ColorError> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, color)| *color)
            .ok_or_else(|| ColorError::UnknownName(s.trim().to_string()))
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    /// Accepts every color literal form a style document may use
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorError::Empty);
        }
        if s.starts_with('#') {
            return Self::from_hex(s);
        }
        if s.starts_with(|c: char| c.is_ascii_digit()) {
            return Self::from_channels(s);
        }
        Self::from_name(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Font attributes of a style
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontStyle {
    /// Font family, `None` keeps the collaborator's font
    pub family: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// Visual attributes of one style slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextStyle {
    /// Foreground color, `None` keeps the collaborator's default
    pub foreground: Option<Rgba>,
    /// Background color, `None` keeps the collaborator's default
    pub background: Option<Rgba>,
    pub font: FontStyle,
}

impl TextStyle {
    /// Create a style with just a foreground color
    pub fn fg(color: Rgba) -> Self {
        Self {
            foreground: Some(color),
            ..Default::default()
        }
    }

    /// Builder: set background color
    pub fn with_bg(mut self, color: Rgba) -> Self {
        self.background = Some(color);
        self
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.font.bold = true;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self) -> Self {
        self.font.italic = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.font.underline = true;
        self
    }

    /// Check if this is the default (no styling)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A styled span of text within a line
///
/// Offsets are in bytes and fall on character boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpan {
    /// Byte offset where this span starts
    pub start: usize,
    /// Length in bytes
    pub length: usize,
    /// Style slot to paint with
    pub style: StyleId,
}

impl StyleSpan {
    /// Create a span
    pub fn new(start: usize, length: usize, style: StyleId) -> Self {
        Self { start, length, style }
    }

    /// Create a span from a start and an exclusive end
    pub fn between(start: usize, end: usize, style: StyleId) -> Self {
        Self::new(start, end.saturating_sub(start), style)
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Check if this span contains a byte position
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end()
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Resolve paint-ordered, possibly overlapping spans into sorted,
/// non-overlapping runs
///
/// Where spans overlap the later one wins. Adjacent runs with the same
/// style are merged.
pub fn flatten(spans: &[StyleSpan]) -> Vec<StyleSpan> {
    let mut bounds: Vec<usize> = spans
        .iter()
        .filter(|s| !s.is_empty())
        .flat_map(|s| [s.start, s.end()])
        .collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut runs: Vec<StyleSpan> = Vec::new();
    for pair in bounds.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let top = spans
            .iter()
            .rev()
            .find(|s| !s.is_empty() && s.start <= from && s.end() >= to);
        let Some(top) = top else { continue };

        match runs.last_mut() {
            Some(last) if last.style == top.style && last.end() == from => {
                last.length += to - from;
            }
            _ => runs.push(StyleSpan::between(from, to, top.style)),
        }
    }
    runs
}
