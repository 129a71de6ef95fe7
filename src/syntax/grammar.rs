//! Grammar model
//!
//! A `GrammarModel` holds one language's rules, one instance per rule
//! category. It has no behavior of its own; the loader fills it and the
//! match engine reads it.

use crate::config::CategoryLimits;

use super::category::{Category, StyleId};
use super::rules::{BlockRule, Rule};

/// Number rule used when a grammar declares none
pub const DEFAULT_NUMBERS: &str = r"\b\d+\b";
/// Quotation delimiter used when a grammar declares none
pub const DEFAULT_QUOTE: &str = "\"";
/// Quotation escape used when a grammar declares no quotations
pub const DEFAULT_ESCAPE: &str = r"\\(.?)";

/// A complete language grammar
#[derive(Debug, Clone)]
pub struct GrammarModel {
    /// Language name (e.g., "C", "Rust")
    pub name: String,
    /// Grammar this one was derived from
    pub parent: Option<String>,
    /// Style definition the grammar asks for
    pub style: Option<String>,
    /// File extensions (e.g., ["rs"], ["py", "pyw"])
    pub extensions: Vec<String>,
    pub numbers: Rule,
    pub quotation: BlockRule,
    pub line_comment: Rule,
    pub block_comment: BlockRule,
    /// One slot per keyword type
    pub keywords: Vec<Rule>,
    /// One slot per expression type
    pub expressions: Vec<Rule>,
    /// One slot per line expression type
    pub line_expressions: Vec<Rule>,
    /// One slot per block expression type
    pub block_expressions: Vec<BlockRule>,
}

impl GrammarModel {
    /// Create a grammar with the default number and quotation rules and
    /// every other slot disabled
    pub fn new(name: &str, limits: &CategoryLimits) -> Self {
        let slots = |category: Category| {
            (0..limits.capacity(category))
                .map(|i| Rule::disabled(StyleId::new(category, i)))
                .collect::<Vec<_>>()
        };
        let block_slots = (0..limits.capacity(Category::BlockExpression))
            .map(|i| BlockRule::disabled(StyleId::BlockExpression(i)))
            .collect();

        Self {
            name: name.to_string(),
            parent: None,
            style: None,
            extensions: Vec::new(),
            numbers: Rule::new(DEFAULT_NUMBERS, StyleId::Number)
                .unwrap_or_else(|_| Rule::disabled(StyleId::Number)),
            quotation: BlockRule::new(
                DEFAULT_QUOTE,
                DEFAULT_QUOTE,
                Some(DEFAULT_ESCAPE),
                StyleId::Quotation,
            )
            .unwrap_or_else(|_| BlockRule::disabled(StyleId::Quotation)),
            line_comment: Rule::disabled(StyleId::LineComment),
            block_comment: BlockRule::disabled(StyleId::BlockComment),
            keywords: slots(Category::Keyword),
            expressions: slots(Category::Expression),
            line_expressions: slots(Category::LineExpression),
            block_expressions: block_slots,
        }
    }

    /// Rule slots of a single-pattern indexed category
    pub fn indexed_rules_mut(&mut self, category: Category) -> Option<&mut Vec<Rule>> {
        match category {
            Category::Keyword => Some(&mut self.keywords),
            Category::Expression => Some(&mut self.expressions),
            Category::LineExpression => Some(&mut self.line_expressions),
            _ => None,
        }
    }

    /// Block expression of a type, if that slot exists and is enabled
    pub fn block_expression(&self, index: usize) -> Option<&BlockRule> {
        self.block_expressions.get(index).filter(|r| r.is_enabled())
    }

    /// Whether a file name extension belongs to this language
    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
