//! Rule categories and style identifiers
//!
//! Every grammar rule belongs to a category, and every span the engine
//! produces carries a [`StyleId`] naming the category (and rule type for
//! the indexed categories) that produced it.

use std::fmt;

/// Grammar rule categories, named as they appear in definition files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Plain text
    Default,
    /// Numeric literals
    Number,
    /// Quoted strings
    Quotation,
    /// Escape sequences inside quoted regions
    Escape,
    /// Comment running to end of line
    LineComment,
    /// Delimited comment, may span lines
    BlockComment,
    /// Keyword groups, indexed by type
    Keyword,
    /// Generic expressions, indexed by type
    Expression,
    /// Constructs running to end of line, indexed by type
    LineExpression,
    /// Delimited constructs that may span lines, indexed by type
    BlockExpression,
}

impl Category {
    /// Name used for this category in grammar and style documents
    pub fn name(&self) -> &'static str {
        match self {
            Category::Default => "default",
            Category::Number => "numbers",
            Category::Quotation => "quotations",
            Category::Escape => "escapes",
            Category::LineComment => "linecomment",
            Category::BlockComment => "blockcomment",
            Category::Keyword => "keywords",
            Category::Expression => "expression",
            Category::LineExpression => "lineexpression",
            Category::BlockExpression => "blockexpression",
        }
    }

    /// Parse a category from its document name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Category::Default),
            "numbers" => Some(Category::Number),
            "quotations" => Some(Category::Quotation),
            "escapes" => Some(Category::Escape),
            "linecomment" => Some(Category::LineComment),
            "blockcomment" => Some(Category::BlockComment),
            "keywords" => Some(Category::Keyword),
            "expression" => Some(Category::Expression),
            "lineexpression" => Some(Category::LineExpression),
            "blockexpression" => Some(Category::BlockExpression),
            _ => None,
        }
    }

    /// Whether rules of this category carry a `type` index
    pub fn is_indexed(&self) -> bool {
        matches!(
            self,
            Category::Keyword
                | Category::Expression
                | Category::LineExpression
                | Category::BlockExpression
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a style slot
///
/// The set of identifiers is open: indexed categories accept any type
/// number, and a registry only stores the slots a document declares.
/// `StyleId::Default` is the fixed id 0 every registry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StyleId {
    #[default]
    Default,
    Number,
    Quotation,
    Escape,
    LineComment,
    BlockComment,
    Keyword(usize),
    Expression(usize),
    LineExpression(usize),
    BlockExpression(usize),
}

impl StyleId {
    /// Build an id from a category and a type index
    ///
    /// The index is ignored for categories that are not indexed.
    pub fn new(category: Category, index: usize) -> Self {
        match category {
            Category::Default => StyleId::Default,
            Category::Number => StyleId::Number,
            Category::Quotation => StyleId::Quotation,
            Category::Escape => StyleId::Escape,
            Category::LineComment => StyleId::LineComment,
            Category::BlockComment => StyleId::BlockComment,
            Category::Keyword => StyleId::Keyword(index),
            Category::Expression => StyleId::Expression(index),
            Category::LineExpression => StyleId::LineExpression(index),
            Category::BlockExpression => StyleId::BlockExpression(index),
        }
    }

    /// Category of this id
    pub fn category(&self) -> Category {
        match self {
            StyleId::Default => Category::Default,
            StyleId::Number => Category::Number,
            StyleId::Quotation => Category::Quotation,
            StyleId::Escape => Category::Escape,
            StyleId::LineComment => Category::LineComment,
            StyleId::BlockComment => Category::BlockComment,
            StyleId::Keyword(_) => Category::Keyword,
            StyleId::Expression(_) => Category::Expression,
            StyleId::LineExpression(_) => Category::LineExpression,
            StyleId::BlockExpression(_) => Category::BlockExpression,
        }
    }

    /// Type index, 0 for categories that are not indexed
    pub fn index(&self) -> usize {
        match self {
            StyleId::Keyword(i)
            | StyleId::Expression(i)
            | StyleId::LineExpression(i)
            | StyleId::BlockExpression(i) => *i,
            _ => 0,
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category().is_indexed() {
            write!(f, "{}[{}]", self.category(), self.index())
        } else {
            write!(f, "{}", self.category())
        }
    }
}
