//! Per-line match engine
//!
//! Highlighting a line happens in two layers. The first paints every match
//! of the keyword, number and expression rules. The second is a single
//! left-to-right scan for the "major" constructs (block expressions,
//! quotations, comments, line expressions), which overwrite whatever the
//! first layer painted underneath them and decide the line's exit state.

use regex::Regex;

use super::category::StyleId;
use super::grammar::GrammarModel;
use super::rules::{next_boundary, BlockRule, HighlightResult, LineState};
use super::style::StyleSpan;

/// Highlight a single line of text
///
/// Takes the line text (without its newline) and the exit state of the
/// previous line. Returns spans in paint order and the state for the next
/// line. The result depends only on the arguments.
pub fn highlight(grammar: &GrammarModel, text: &str, entry: LineState) -> HighlightResult {
    let mut spans = Vec::new();
    paint_simple_rules(grammar, text, &mut spans);
    let layer_one = spans.len();

    let end_state = scan_major(grammar, text, entry, &mut spans, layer_one);
    HighlightResult { spans, end_state }
}

/// Layer 1: every match of keywords, then numbers, then expressions
fn paint_simple_rules(grammar: &GrammarModel, text: &str, spans: &mut Vec<StyleSpan>) {
    let rules = grammar
        .keywords
        .iter()
        .chain(std::iter::once(&grammar.numbers))
        .chain(grammar.expressions.iter());

    for rule in rules {
        for (start, end) in rule.find_all(text) {
            push_span(spans, start, end, rule.style);
        }
    }
}

/// Major constructs, listed in the order they are tried at each offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Major {
    BlockExpression(usize),
    Quotation,
    LineComment,
    BlockComment,
    LineExpression(usize),
}

/// A start pattern together with its next known match
struct Candidate<'g> {
    kind: Major,
    pattern: &'g Regex,
    /// Next match at or after `searched_from`; `None` once exhausted
    next: Option<(usize, usize)>,
    searched_from: Option<usize>,
}

impl<'g> Candidate<'g> {
    fn new(kind: Major, pattern: Option<&'g Regex>) -> Option<Self> {
        Some(Self {
            kind,
            pattern: pattern?,
            next: None,
            searched_from: None,
        })
    }

    /// Match starting exactly at `pos`, if any
    ///
    /// A previous search result stays valid as long as it does not start
    /// before `pos`.
    fn match_at(&mut self, text: &str, pos: usize) -> Option<(usize, usize)> {
        let stale = match (self.searched_from, self.next) {
            (None, _) => true,
            (Some(_), Some((start, _))) => start < pos,
            (Some(from), None) => pos < from,
        };
        if stale {
            self.next = self.pattern.find_at(text, pos).map(|m| (m.start(), m.end()));
            self.searched_from = Some(pos);
        }
        self.next.filter(|(start, _)| *start == pos)
    }
}

fn block_start(rule: &BlockRule) -> Option<&Regex> {
    if rule.is_enabled() {
        rule.start.as_ref()
    } else {
        None
    }
}

fn candidates(grammar: &GrammarModel) -> Vec<Candidate<'_>> {
    let mut list = Vec::new();
    for (i, rule) in grammar.block_expressions.iter().enumerate() {
        list.extend(Candidate::new(Major::BlockExpression(i), block_start(rule)));
    }
    list.extend(Candidate::new(Major::Quotation, block_start(&grammar.quotation)));
    list.extend(Candidate::new(Major::LineComment, grammar.line_comment.pattern.as_ref()));
    list.extend(Candidate::new(Major::BlockComment, block_start(&grammar.block_comment)));
    for (i, rule) in grammar.line_expressions.iter().enumerate() {
        list.extend(Candidate::new(Major::LineExpression(i), rule.pattern.as_ref()));
    }
    list
}

/// Layer 2: the exclusive scan
fn scan_major(
    grammar: &GrammarModel,
    text: &str,
    entry: LineState,
    spans: &mut Vec<StyleSpan>,
    layer_one: usize,
) -> LineState {
    let mut pos = 0;

    // Continue a construct left open by the previous line
    let open = match entry {
        LineState::InBlockComment if grammar.block_comment.is_enabled() => {
            Some(&grammar.block_comment)
        }
        LineState::InBlockExpression(t) => grammar.block_expression(t),
        _ => None,
    };
    if let Some(rule) = open {
        match close_block(rule, text, 0, 0, spans) {
            Some(end) => pos = end,
            None => {
                discard_from(spans, layer_one, 0);
                return entry;
            }
        }
    }

    let mut candidates = candidates(grammar);
    while pos < text.len() {
        let hit = candidates
            .iter_mut()
            .find_map(|c| c.match_at(text, pos).map(|(start, end)| (c.kind, start, end)));

        let Some((kind, start, end)) = hit else {
            // Nothing starts here; jump to the nearest later start
            match candidates.iter().filter_map(|c| c.next).map(|(s, _)| s).min() {
                Some(next) if next > pos => pos = next,
                _ => break,
            }
            continue;
        };

        let resume = match kind {
            Major::BlockExpression(t) => {
                let rule = &grammar.block_expressions[t];
                match close_block(rule, text, start, end, spans) {
                    Some(close) => close,
                    None => {
                        discard_from(spans, layer_one, start);
                        return LineState::InBlockExpression(t);
                    }
                }
            }
            Major::BlockComment => {
                match close_block(&grammar.block_comment, text, start, end, spans) {
                    Some(close) => close,
                    None => {
                        discard_from(spans, layer_one, start);
                        return LineState::InBlockComment;
                    }
                }
            }
            Major::Quotation => match close_block(&grammar.quotation, text, start, end, spans) {
                Some(close) => close,
                // Quotations never span lines
                None => break,
            },
            Major::LineComment => {
                push_span(spans, start, text.len(), grammar.line_comment.style);
                discard_from(spans, layer_one, start);
                break;
            }
            Major::LineExpression(t) => {
                push_span(spans, start, text.len(), grammar.line_expressions[t].style);
                discard_from(spans, layer_one, start);
                break;
            }
        };

        pos = if resume > pos { resume } else { next_boundary(text, pos) };
    }

    LineState::Default
}

/// Paint a delimited construct from `span_start`, searching its end from
/// `from`
///
/// Returns the offset just past the terminator, or `None` when the
/// construct runs to end of line.
fn close_block(
    rule: &BlockRule,
    text: &str,
    span_start: usize,
    from: usize,
    spans: &mut Vec<StyleSpan>,
) -> Option<usize> {
    let search = rule.find_end(text, from);
    let end = search.end.unwrap_or(text.len());

    push_span(spans, span_start, end, rule.style);
    for escape in search.escapes {
        push_span(spans, escape.start, escape.end, StyleId::Escape);
    }
    search.end
}

/// Drop first-layer spans that a construct running to end of line hides
fn discard_from(spans: &mut Vec<StyleSpan>, layer_one: usize, from: usize) {
    let mut index = 0;
    spans.retain(|span| {
        let keep = index >= layer_one || span.start < from;
        index += 1;
        keep
    });
}

fn push_span(spans: &mut Vec<StyleSpan>, start: usize, end: usize, style: StyleId) {
    if end > start {
        spans.push(StyleSpan::between(start, end, style));
    }
}
