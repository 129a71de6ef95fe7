//! linelex - rule-driven incremental syntax highlighting
//!
//! Grammars describe a language as regular-expression rules grouped by
//! category. The engine turns one line plus the state the previous line
//! ended in into style spans, and [`IncrementalHighlighter`] keeps a
//! whole buffer highlighted across edits by only recomputing lines whose
//! state may have changed.
//!
//! ```no_run
//! use linelex::{LineEdit, SyntaxManager};
//! use std::path::Path;
//!
//! let mut manager = SyntaxManager::from_config_file(Path::new("linelex.toml"))?;
//! manager.add_style("dim", "[format.linecomment]\ncolor = '#808080'\n")?;
//! let mut lines = vec!["fn main() {".to_string(), "}".to_string()];
//! manager.open_buffer(0, Some(Path::new("main.rs")), &lines)?;
//!
//! lines[1] = "/* }".to_string();
//! let repaint = manager.lines_changed(0, &lines, LineEdit::modified(1..=1));
//! for line in repaint.lines {
//!     let _spans = manager.spans(0, line);
//! }
//! # Ok::<(), linelex::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod syntax;

pub use config::HighlightConfig;
pub use error::{Error, Result};
pub use syntax::{
    highlight, GrammarLoader, GrammarModel, IncrementalHighlighter, LineEdit, LineSource,
    LineState, StyleLoader, StyleRegistry, StyleSpan, SyntaxManager,
};
