//! Pattern rules for syntax highlighting
//!
//! This module defines the rule types a grammar is built from and the
//! per-line state the engine carries between lines.

use std::ops::Range;

use regex::Regex;

use super::category::StyleId;
use super::style::StyleSpan;

/// A single-pattern rule
///
/// A rule without a pattern never matches. Empty or invalid patterns are
/// turned into such rules by the loader.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Compiled pattern, `None` = never matches
    pub pattern: Option<Regex>,
    /// Style slot for matches
    pub style: StyleId,
}

impl Rule {
    /// Create a rule from a pattern string
    ///
    /// Returns the compile error so the caller can record it; the rule
    /// itself should then be created with [`Rule::disabled`].
    pub fn new(pattern: &str, style: StyleId) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Self::disabled(style));
        }
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
            style,
        })
    }

    /// A rule that never matches
    pub fn disabled(style: StyleId) -> Self {
        Self { pattern: None, style }
    }

    /// Whether this rule can match at all
    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    /// Find the first match starting at or after `start`
    pub fn find_at(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start > text.len() {
            return None;
        }
        let m = self.pattern.as_ref()?.find_at(text, start)?;
        Some((m.start(), m.end()))
    }

    /// Iterate over all non-overlapping matches in the line
    pub fn find_all<'t>(&'t self, text: &'t str) -> impl Iterator<Item = (usize, usize)> + 't {
        self.pattern
            .iter()
            .flat_map(move |re| re.find_iter(text))
            .map(|m| (m.start(), m.end()))
    }
}

/// Result of searching for the end of a delimited construct
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndSearch {
    /// Byte offset just past the terminator, `None` if the line ends first
    pub end: Option<usize>,
    /// Escape matches passed over while searching
    pub escapes: Vec<Range<usize>>,
}

/// A delimited construct rule (quotations, block comments, block expressions)
///
/// Start and end are enabled or disabled as a pair.
#[derive(Debug, Clone)]
pub struct BlockRule {
    /// Pattern that opens the construct
    pub start: Option<Regex>,
    /// Pattern that closes the construct
    pub end: Option<Regex>,
    /// Style slot for the construct
    pub style: StyleId,
    /// Escape sequences that hide a terminator
    pub escape: Option<Regex>,
}

impl BlockRule {
    /// Create a block rule from pattern strings
    ///
    /// An empty start or end yields a disabled rule.
    pub fn new(
        start: &str,
        end: &str,
        escape: Option<&str>,
        style: StyleId,
    ) -> Result<Self, regex::Error> {
        if start.is_empty() || end.is_empty() {
            return Ok(Self::disabled(style));
        }
        let escape = match escape {
            Some(pattern) if !pattern.is_empty() => Some(Regex::new(pattern)?),
            _ => None,
        };
        Ok(Self {
            start: Some(Regex::new(start)?),
            end: Some(Regex::new(end)?),
            style,
            escape,
        })
    }

    /// A rule that never matches
    pub fn disabled(style: StyleId) -> Self {
        Self {
            start: None,
            end: None,
            style,
            escape: None,
        }
    }

    /// Whether both delimiters are usable
    pub fn is_enabled(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Find the first start match at or after `pos`
    pub fn find_start(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        if pos > text.len() || !self.is_enabled() {
            return None;
        }
        let m = self.start.as_ref()?.find_at(text, pos)?;
        Some((m.start(), m.end()))
    }

    /// Find the end of this construct, searching from `from`, respecting escapes
    ///
    /// Each escape match met on the way is recorded. A terminator is hidden
    /// when it lies inside an escape match, or when it directly follows an
    /// odd-length run of adjacent one-character escapes (`\\"` ends a
    /// string, `\"` does not). When no terminator is found, the escapes up
    /// to end of line are still reported.
    pub fn find_end(&self, text: &str, from: usize) -> EndSearch {
        let mut search = EndSearch::default();
        let Some(end) = self.end.as_ref() else {
            return search;
        };
        if from > text.len() {
            return search;
        }

        let mut pos = from;
        while pos <= text.len() {
            let terminator = end.find_at(text, pos);
            let escape = self
                .escape
                .as_ref()
                .and_then(|re| re.find_at(text, pos))
                .filter(|m| !m.as_str().is_empty());

            if let Some(esc) = escape {
                if terminator.map_or(true, |t| esc.start() <= t.start()) {
                    search.escapes.push(esc.range());
                    pos = esc.end();
                    continue;
                }
            }

            let Some(t) = terminator else { break };
            if odd_escape_run(text, &search.escapes, t.start()) {
                pos = if t.end() > t.start() {
                    t.end()
                } else {
                    next_boundary(text, t.start())
                };
                continue;
            }
            search.end = Some(t.end());
            return search;
        }
        search
    }
}

/// Count adjacent one-character escapes ending exactly at `at`
fn odd_escape_run(text: &str, escapes: &[Range<usize>], at: usize) -> bool {
    let mut cursor = at;
    let mut run = 0;
    for esc in escapes.iter().rev() {
        let single = text[esc.clone()].chars().count() == 1;
        if esc.end != cursor || !single {
            break;
        }
        run += 1;
        cursor = esc.start;
    }
    run % 2 == 1
}

/// Byte offset of the character after `pos`
pub(crate) fn next_boundary(text: &str, pos: usize) -> usize {
    let mut next = pos + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

/// Line state for tracking multi-line constructs
///
/// Stored per line: the state in force at the end of that line, which is
/// the entry state of the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineState {
    /// Outside any multi-line construct
    #[default]
    Default,
    /// Inside an unterminated block comment
    InBlockComment,
    /// Inside an unterminated block expression of this type
    InBlockExpression(usize),
}

impl LineState {
    /// Check if we're inside a multiline construct
    pub fn is_inside_multiline(&self) -> bool {
        !self.is_normal()
    }

    /// Check if we're in normal (no multiline) state
    pub fn is_normal(&self) -> bool {
        *self == LineState::Default
    }
}

/// Result of highlighting a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightResult {
    /// Spans in paint order, later spans overwrite earlier ones
    pub spans: Vec<StyleSpan>,
    /// State at end of line (for next line)
    pub end_state: LineState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotation(escape: Option<&str>) -> BlockRule {
        BlockRule::new(r#"""#, r#"""#, escape, StyleId::Quotation).unwrap()
    }

    #[test]
    fn test_pattern_rule() {
        let rule = Rule::new(r"\d+", StyleId::Number).unwrap();
        assert_eq!(rule.find_at("abc 123 def", 0), Some((4, 7)));
        assert_eq!(rule.find_at("abc 123 def", 5), Some((5, 7)));
        assert_eq!(rule.find_at("no numbers", 0), None);
        assert_eq!(rule.find_all("1 22 333").count(), 3);
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let rule = Rule::new("", StyleId::Keyword(0)).unwrap();
        assert!(!rule.is_enabled());
        assert_eq!(rule.find_at("anything", 0), None);
        assert_eq!(rule.find_all("anything").count(), 0);
    }

    #[test]
    fn test_invalid_pattern_reports_error() {
        assert!(Rule::new(r"(unclosed", StyleId::Number).is_err());
        assert!(BlockRule::new(r"/\*", r"[", None, StyleId::BlockComment).is_err());
    }

    #[test]
    fn test_block_disabled_as_pair() {
        let rule = BlockRule::new(r"/\*", "", None, StyleId::BlockComment).unwrap();
        assert!(!rule.is_enabled());
        assert_eq!(rule.find_start("/* x", 0), None);
    }

    #[test]
    fn test_block_rule() {
        let rule = BlockRule::new(r"/\*", r"\*/", None, StyleId::BlockComment).unwrap();
        assert_eq!(rule.find_start("/* comment */", 0), Some((0, 2)));
        assert_eq!(rule.find_end("/* comment */", 2).end, Some(13));
        assert_eq!(rule.find_end("/* comment", 2).end, None);
    }

    #[test]
    fn test_escape_consumes_terminator() {
        let rule = quotation(Some(r"\\(.?)"));
        let search = rule.find_end(r#""a\"b""#, 1);
        assert_eq!(search.end, Some(6));
        assert_eq!(search.escapes, vec![2..4]);
    }

    #[test]
    fn test_escaped_backslash_terminates() {
        let rule = quotation(Some(r"\\(.?)"));
        let search = rule.find_end(r#""\\" rest"#, 1);
        assert_eq!(search.end, Some(4));
        assert_eq!(search.escapes, vec![1..3]);
    }

    #[test]
    fn test_single_char_escape_run_parity() {
        let rule = quotation(Some(r"\\"));
        // One backslash hides the quote
        assert_eq!(rule.find_end(r#""a\"b""#, 1).end, Some(6));
        // Two backslashes do not
        assert_eq!(rule.find_end(r#""a\\"b""#, 1).end, Some(5));
    }

    #[test]
    fn test_unterminated_reports_escapes() {
        let rule = quotation(Some(r"\\(.?)"));
        let search = rule.find_end(r#""abc\n"#, 1);
        assert_eq!(search.end, None);
        assert_eq!(search.escapes, vec![4..6]);
    }

    #[test]
    fn test_without_escape_terminates_at_first_quote() {
        let rule = quotation(None);
        assert_eq!(rule.find_end(r#""a\"b""#, 1).end, Some(4));
    }

    #[test]
    fn test_line_state() {
        let normal = LineState::default();
        assert!(normal.is_normal());
        assert!(!normal.is_inside_multiline());

        let inside = LineState::InBlockExpression(1);
        assert!(!inside.is_normal());
        assert!(inside.is_inside_multiline());
    }
}
