//! Incremental highlighting of a whole buffer
//!
//! The highlighter keeps the exit state and spans of every line. After an
//! edit it rehighlights the edited lines, then keeps going down the buffer
//! only while the exit states it produces differ from the recorded ones.

use std::borrow::Cow;
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;

use super::engine;
use super::grammar::GrammarModel;
use super::registry::StyleRegistry;
use super::rules::LineState;
use super::style::StyleSpan;

/// Read access to the lines of a text buffer
pub trait LineSource {
    /// Number of lines in the buffer
    fn line_count(&self) -> usize;

    /// Text of a line without its line terminator
    fn line(&self, index: usize) -> Cow<'_, str>;
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl<S: AsRef<str>> LineSource for [S] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Cow<'_, str> {
        Cow::Borrowed(self.get(index).map_or("", |s| strip_terminator(s.as_ref())))
    }
}

impl<S: AsRef<str>> LineSource for Vec<S> {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Cow<'_, str> {
        self.as_slice().line(index)
    }
}

/// A change to a buffer, in lines
///
/// `removed` lines starting at `start` were replaced by `inserted` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl LineEdit {
    /// Lines whose content changed in place
    pub fn modified(lines: RangeInclusive<usize>) -> Self {
        let count = lines.end().saturating_sub(*lines.start()) + 1;
        Self {
            start: *lines.start(),
            removed: count,
            inserted: count,
        }
    }

    /// Lines inserted before `start`
    pub fn inserted(start: usize, count: usize) -> Self {
        Self {
            start,
            removed: 0,
            inserted: count,
        }
    }

    /// Lines removed from `start`
    pub fn removed(start: usize, count: usize) -> Self {
        Self {
            start,
            removed: count,
            inserted: 0,
        }
    }
}

/// Lines whose highlighting changed and must be repainted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repaint {
    pub lines: Range<usize>,
}

impl Repaint {
    /// Whether nothing needs repainting
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether a line needs repainting
    pub fn contains(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }
}

/// Spans of one repainted line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpans {
    pub line: usize,
    pub spans: Vec<StyleSpan>,
}

/// Result of [`IncrementalHighlighter::update`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightUpdate {
    pub repaint: Repaint,
    pub lines: Vec<LineSpans>,
}

/// Cached result for one line
#[derive(Debug, Clone, Default)]
struct LineEntry {
    /// Exit state, `None` until the line is first highlighted
    state: Option<LineState>,
    spans: Vec<StyleSpan>,
}

/// Per-buffer highlighting state
pub struct IncrementalHighlighter {
    grammar: Arc<GrammarModel>,
    styles: Arc<StyleRegistry>,
    lines: Vec<LineEntry>,
}

impl IncrementalHighlighter {
    /// Create a highlighter for a grammar/style snapshot
    pub fn new(grammar: Arc<GrammarModel>, styles: Arc<StyleRegistry>) -> Self {
        Self {
            grammar,
            styles,
            lines: Vec::new(),
        }
    }

    pub fn grammar(&self) -> &Arc<GrammarModel> {
        &self.grammar
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    /// Number of lines tracked
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Exit state of a line, `None` if it was never highlighted
    pub fn state(&self, line: usize) -> Option<LineState> {
        self.lines.get(line).and_then(|entry| entry.state)
    }

    /// Spans of a line in paint order
    pub fn spans(&self, line: usize) -> &[StyleSpan] {
        self.lines
            .get(line)
            .map(|entry| entry.spans.as_slice())
            .unwrap_or(&[])
    }

    /// Swap in a new grammar and style snapshot and recompute everything
    pub fn set_snapshot(
        &mut self,
        grammar: Arc<GrammarModel>,
        styles: Arc<StyleRegistry>,
        buffer: &(impl LineSource + ?Sized),
    ) -> Repaint {
        self.grammar = grammar;
        self.styles = styles;
        self.rehighlight_all(buffer)
    }

    /// Swap in a new style snapshot and recompute everything
    pub fn set_styles(
        &mut self,
        styles: Arc<StyleRegistry>,
        buffer: &(impl LineSource + ?Sized),
    ) -> Repaint {
        self.styles = styles;
        self.rehighlight_all(buffer)
    }

    /// Forget every line and highlight the whole buffer
    pub fn rehighlight_all(&mut self, buffer: &(impl LineSource + ?Sized)) -> Repaint {
        self.lines = vec![LineEntry::default(); buffer.line_count()];
        let end = self.cascade(buffer, 0, self.lines.len());
        tracing::debug!("Highlighted {} lines with {}", end, self.grammar.name);
        Repaint { lines: 0..end }
    }

    /// Bring the cache up to date after an edit
    ///
    /// `buffer` is the content after the edit. Returns the lines that were
    /// recomputed.
    pub fn on_lines_changed(
        &mut self,
        buffer: &(impl LineSource + ?Sized),
        edit: LineEdit,
    ) -> Repaint {
        let start = edit.start.min(self.lines.len());
        let removed = edit.removed.min(self.lines.len() - start);

        // State the line after the edit was entered with before the edit
        let old_tail = match (removed, start) {
            (0, 0) => Some(LineState::Default),
            (0, n) => self.lines[n - 1].state,
            (r, n) => self.lines[n + r - 1].state,
        };
        let old: Vec<LineEntry> = self
            .lines
            .splice(
                start..start + removed,
                std::iter::repeat_with(LineEntry::default).take(edit.inserted),
            )
            .collect();

        // Replacement lines keep the old states for the fixed-point check
        let new_lines = &mut self.lines[start..start + edit.inserted];
        for (entry, old) in new_lines.iter_mut().zip(old) {
            entry.state = old.state;
        }
        if let Some(last) = new_lines.last_mut() {
            last.state = old_tail;
        }

        if self.lines.len() != buffer.line_count() {
            tracing::warn!(
                "Edit left {} lines tracked for a {} line buffer, rehighlighting",
                self.lines.len(),
                buffer.line_count()
            );
            return self.rehighlight_all(buffer);
        }

        // Edited lines are always recomputed, even when a deletion left none
        let must_reach = (start + edit.inserted.max(1)).min(self.lines.len());

        // Lazily created lines above the edit need a state first
        let from = self.lines[..start]
            .iter()
            .position(|entry| entry.state.is_none())
            .unwrap_or(start);

        let end = self.cascade(buffer, from, must_reach);
        tracing::trace!("Edit {:?} repaints lines {}..{}", edit, from, end);
        Repaint { lines: from..end }
    }

    /// Apply an edit and return the spans of every repainted line
    pub fn update(
        &mut self,
        buffer: &(impl LineSource + ?Sized),
        edit: LineEdit,
    ) -> HighlightUpdate {
        let repaint = self.on_lines_changed(buffer, edit);
        let lines = repaint
            .lines
            .clone()
            .map(|line| LineSpans {
                line,
                spans: self.lines[line].spans.clone(),
            })
            .collect();
        HighlightUpdate { repaint, lines }
    }

    /// Recompute lines from `from`, always through `must_reach`, then until
    /// a line's exit state matches its recorded one
    ///
    /// Returns the index just past the last recomputed line.
    fn cascade(
        &mut self,
        buffer: &(impl LineSource + ?Sized),
        from: usize,
        must_reach: usize,
    ) -> usize {
        let mut entry = match from {
            0 => LineState::Default,
            n => self.lines[n - 1].state.unwrap_or_default(),
        };

        let mut line = from;
        while line < self.lines.len() {
            let text = buffer.line(line);
            let result = engine::highlight(&self.grammar, &text, entry);
            let previous = self.lines[line].state.replace(result.end_state);
            self.lines[line].spans = result.spans;
            entry = result.end_state;
            line += 1;

            if line >= must_reach && previous == Some(result.end_state) {
                break;
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightConfig;
    use crate::syntax::category::StyleId;
    use crate::syntax::loader::GrammarLoader;

    fn highlighter() -> IncrementalHighlighter {
        let grammar = GrammarLoader::new(HighlightConfig::default())
            .load(
                r#"
name = "test"
linecomment = '//'

[blockcomment]
start = '/\*'
end = '\*/'

[[keywords]]
type = 0
pattern = '\b(if|else)\b'
"#,
            )
            .unwrap();
        IncrementalHighlighter::new(Arc::new(grammar), Arc::new(StyleRegistry::default()))
    }

    fn buffer(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_highlight() {
        let mut hl = highlighter();
        let text = buffer(&["x /* start", "middle", "end */ y", "if"]);
        let repaint = hl.rehighlight_all(&text);

        assert_eq!(repaint.lines, 0..4);
        assert_eq!(hl.state(0), Some(LineState::InBlockComment));
        assert_eq!(hl.state(1), Some(LineState::InBlockComment));
        assert_eq!(hl.state(2), Some(LineState::Default));
        assert_eq!(hl.spans(1), &[StyleSpan::new(0, 6, StyleId::BlockComment)]);
        assert_eq!(hl.spans(3), &[StyleSpan::new(0, 2, StyleId::Keyword(0))]);
    }

    #[test]
    fn test_edit_without_state_change_stops() {
        let mut hl = highlighter();
        let mut text = buffer(&["a", "b", "c", "d"]);
        hl.rehighlight_all(&text);

        text[1] = "if b".to_string();
        let repaint = hl.on_lines_changed(&text, LineEdit::modified(1..=1));
        assert_eq!(repaint.lines, 1..2);
        assert_eq!(hl.spans(1), &[StyleSpan::new(0, 2, StyleId::Keyword(0))]);
    }

    #[test]
    fn test_opening_comment_cascades_to_end() {
        let mut hl = highlighter();
        let mut text = buffer(&["a", "b", "c", "d"]);
        hl.rehighlight_all(&text);

        text[1] = "b /* open".to_string();
        let repaint = hl.on_lines_changed(&text, LineEdit::modified(1..=1));
        assert_eq!(repaint.lines, 1..4);
        assert_eq!(hl.state(3), Some(LineState::InBlockComment));
        assert_eq!(hl.spans(3), &[StyleSpan::new(0, 1, StyleId::BlockComment)]);
    }

    #[test]
    fn test_cascade_stops_at_downstream_terminator() {
        let mut hl = highlighter();
        let mut text = buffer(&["a", "b", "c */ d", "e", "f"]);
        hl.rehighlight_all(&text);

        text[0] = "/* a".to_string();
        let repaint = hl.on_lines_changed(&text, LineEdit::modified(0..=0));
        // Line 2 now closes the comment and its exit state is unchanged
        assert_eq!(repaint.lines, 0..3);
        assert_eq!(hl.state(1), Some(LineState::InBlockComment));
        assert_eq!(hl.state(2), Some(LineState::Default));
        assert_eq!(hl.spans(2), &[StyleSpan::new(0, 4, StyleId::BlockComment)]);
    }

    #[test]
    fn test_closing_comment_cascades_back() {
        let mut hl = highlighter();
        let mut text = buffer(&["/* a", "b", "c", "d"]);
        hl.rehighlight_all(&text);
        assert_eq!(hl.state(3), Some(LineState::InBlockComment));

        text[0] = "/* a */".to_string();
        let repaint = hl.on_lines_changed(&text, LineEdit::modified(0..=0));
        assert_eq!(repaint.lines, 0..4);
        assert!(hl.spans(2).is_empty());
        assert_eq!(hl.state(3), Some(LineState::Default));
    }

    #[test]
    fn test_inserted_lines() {
        let mut hl = highlighter();
        let mut text = buffer(&["a", "b"]);
        hl.rehighlight_all(&text);

        text.insert(1, "/* x".to_string());
        text.insert(2, "y */".to_string());
        let repaint = hl.on_lines_changed(&text, LineEdit::inserted(1, 2));

        assert_eq!(hl.line_count(), 4);
        assert_eq!(repaint.lines, 1..3);
        assert_eq!(hl.state(1), Some(LineState::InBlockComment));
        assert_eq!(hl.state(2), Some(LineState::Default));
    }

    #[test]
    fn test_removed_lines_recompute_follower() {
        let mut hl = highlighter();
        let mut text = buffer(&["/* a", "b */", "if"]);
        hl.rehighlight_all(&text);
        assert!(hl.spans(2).iter().all(|s| s.style == StyleId::Keyword(0)));

        text.remove(1);
        let repaint = hl.on_lines_changed(&text, LineEdit::removed(1, 1));
        assert_eq!(hl.line_count(), 2);
        assert_eq!(repaint.lines, 1..2);
        assert_eq!(hl.spans(1), &[StyleSpan::new(0, 2, StyleId::BlockComment)]);
        assert_eq!(hl.state(1), Some(LineState::InBlockComment));
    }

    #[test]
    fn test_removed_at_end() {
        let mut hl = highlighter();
        let mut text = buffer(&["a", "b"]);
        hl.rehighlight_all(&text);

        text.pop();
        let repaint = hl.on_lines_changed(&text, LineEdit::removed(1, 1));
        assert!(repaint.is_empty());
        assert_eq!(hl.line_count(), 1);
    }

    #[test]
    fn test_count_mismatch_rehighlights() {
        let mut hl = highlighter();
        let text = buffer(&["a", "b", "c"]);
        let repaint = hl.on_lines_changed(&text, LineEdit::modified(0..=0));
        assert_eq!(repaint.lines, 0..3);
        assert_eq!(hl.line_count(), 3);
    }

    #[test]
    fn test_update_reports_spans() {
        let mut hl = highlighter();
        let mut text = buffer(&["a", "b"]);
        hl.rehighlight_all(&text);

        text[0] = "// if".to_string();
        let update = hl.update(&text, LineEdit::modified(0..=0));
        assert_eq!(update.repaint.lines, 0..1);
        assert_eq!(
            update.lines,
            vec![LineSpans {
                line: 0,
                spans: vec![StyleSpan::new(0, 5, StyleId::LineComment)],
            }]
        );
    }

    #[test]
    fn test_grammar_swap_recomputes_everything() {
        let mut hl = highlighter();
        let text = buffer(&["/* a", "b"]);
        hl.rehighlight_all(&text);

        let plain = GrammarLoader::new(HighlightConfig::default())
            .load("name = 'plain'")
            .unwrap();
        let repaint = hl.set_snapshot(Arc::new(plain), Arc::new(StyleRegistry::default()), &text);
        assert_eq!(repaint.lines, 0..2);
        assert_eq!(hl.state(0), Some(LineState::Default));
        assert_eq!(hl.grammar().name, "plain");
    }

    #[test]
    fn test_line_source_strips_terminators() {
        let text = ["a\r\n", "b\n", "c"];
        assert_eq!(text[..].line_count(), 3);
        assert_eq!(text[..].line(0), "a");
        assert_eq!(text[..].line(1), "b");
        assert_eq!(text[..].line(5), "");
    }
}
