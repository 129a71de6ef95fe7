//! Syntax highlighting module
//!
//! This module provides rule-driven highlighting:
//! - Grammar and style definitions loaded from TOML
//! - A per-line match engine with multi-line constructs
//! - Incremental rehighlighting of edited buffers

mod builtin;
mod category;
mod engine;
mod grammar;
mod highlighter;
mod loader;
mod manager;
mod registry;
mod rules;
mod style;
mod style_loader;
mod term;

pub use category::{Category, StyleId};
pub use engine::highlight;
pub use grammar::GrammarModel;
pub use highlighter::{
    HighlightUpdate, IncrementalHighlighter, LineEdit, LineSource, LineSpans, Repaint,
};
pub use loader::GrammarLoader;
pub use manager::SyntaxManager;
pub use registry::StyleRegistry;
pub use rules::{BlockRule, EndSearch, HighlightResult, LineState, Rule};
pub use style::{flatten, FontStyle, Rgba, StyleSpan, TextStyle};
pub use style_loader::StyleLoader;
