//! Built-in language definitions
//!
//! Grammar and style documents for common languages, embedded in the
//! binary and registered with a [`SyntaxManager`](super::SyntaxManager)
//! on creation.

/// Name the built-in style is registered under
pub const DEFAULT_STYLE_NAME: &str = "default";

/// The built-in style definition
pub const DEFAULT_STYLE: &str = include_str!("default_style.toml");

/// Get all built-in grammar definitions as (name, document) pairs
///
/// Parents come before the grammars that use them.
pub fn all_grammars() -> Vec<(&'static str, &'static str)> {
    vec![
        ("c", include_str!("c.toml")),
        ("c++", include_str!("cpp.toml")),
        ("rust", include_str!("rust.toml")),
        ("python", include_str!("python.toml")),
        ("toml", include_str!("toml.toml")),
    ]
}
