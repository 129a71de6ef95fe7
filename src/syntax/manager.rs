//! Syntax highlighting manager
//!
//! This module provides the SyntaxManager that coordinates language
//! detection, grammar/style snapshots and per-buffer highlighters.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::HighlightConfig;
use crate::error::GrammarError;

use super::builtin;
use super::grammar::GrammarModel;
use super::highlighter::{IncrementalHighlighter, LineEdit, LineSource, Repaint};
use super::loader::GrammarLoader;
use super::registry::StyleRegistry;
use super::style::StyleSpan;
use super::style_loader::StyleLoader;

/// Main syntax highlighting manager
pub struct SyntaxManager {
    grammars: GrammarLoader,
    styles: StyleLoader,
    /// Lowercase language name -> declared name
    languages: HashMap<String, String>,
    /// Extension to language name mapping
    extension_map: HashMap<String, String>,
    /// Loaded style registries by style name
    style_cache: HashMap<String, Arc<StyleRegistry>>,
    /// Registry used when a grammar names no style or a broken one
    default_styles: Arc<StyleRegistry>,
    /// Per-buffer highlighters (buffer index -> highlighter)
    buffers: HashMap<usize, IncrementalHighlighter>,
    /// Whether syntax highlighting is enabled
    pub enabled: bool,
}

impl SyntaxManager {
    /// Create a syntax manager with built-in languages and the default
    /// configuration
    pub fn new() -> Self {
        Self::with_config(HighlightConfig::default())
    }

    /// Create a syntax manager with built-in languages
    pub fn with_config(config: HighlightConfig) -> Self {
        let mut styles = StyleLoader::new(config.clone());
        styles.register_source(builtin::DEFAULT_STYLE_NAME, builtin::DEFAULT_STYLE);
        let default_styles = match styles.load_named(builtin::DEFAULT_STYLE_NAME) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!("Built-in style failed to load: {}", e);
                styles.base_registry()
            }
        };

        let mut manager = Self {
            grammars: GrammarLoader::new(config),
            styles,
            languages: HashMap::new(),
            extension_map: HashMap::new(),
            style_cache: HashMap::new(),
            default_styles: Arc::new(default_styles),
            buffers: HashMap::new(),
            enabled: true,
        };

        // Register every source first so parents resolve in any order
        let sources = builtin::all_grammars();
        for (name, text) in &sources {
            manager.grammars.register_source(name, *text);
        }
        for (name, _) in &sources {
            if let Err(e) = manager.catalog(name) {
                tracing::warn!("Built-in grammar {} failed to load: {}", name, e);
            }
        }

        manager
    }

    /// Create a syntax manager configured from a TOML file
    pub fn from_config_file(path: &Path) -> crate::Result<Self> {
        let config = HighlightConfig::load_from(path)?;
        Ok(Self::with_config(config))
    }

    /// Add a language from grammar definition text
    pub fn add_language(&mut self, text: &str) -> Result<(), GrammarError> {
        let name = self.grammars.declared_name(text)?;
        if self.languages.contains_key(&name.to_lowercase()) {
            return Err(GrammarError::DuplicateName(name));
        }
        self.grammars.register_source(&name, text);
        if let Err(e) = self.catalog(&name) {
            self.grammars.forget_source(&name);
            return Err(e);
        }
        Ok(())
    }

    /// Add a language from a grammar file
    pub fn add_language_file(&mut self, path: &Path) -> crate::Result<()> {
        let text = fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.add_language(&text)?)
    }

    /// Add a style definition under a name grammars can refer to
    ///
    /// A malformed document is rejected and leaves any earlier style of
    /// that name in place.
    pub fn add_style(&mut self, name: &str, text: &str) -> crate::Result<()> {
        let registry = self.styles.load(text)?;
        self.styles.register_source(name, text);
        self.style_cache.insert(name.to_lowercase(), Arc::new(registry));
        Ok(())
    }

    /// Load a grammar and record its name and extensions
    fn catalog(&mut self, name: &str) -> Result<(), GrammarError> {
        let grammar = self.grammars.load_named(name)?;
        for ext in &grammar.extensions {
            self.extension_map.insert(ext.to_lowercase(), grammar.name.clone());
        }
        self.languages.insert(grammar.name.to_lowercase(), grammar.name.clone());
        Ok(())
    }

    /// Detect language from filename
    pub fn detect_language(&self, filename: &Path) -> Option<&str> {
        let ext = filename.extension()?.to_str()?.to_lowercase();
        self.extension_map.get(&ext).map(|s| s.as_str())
    }

    /// List available languages
    pub fn list_languages(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.languages.values().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Grammar and style snapshot for a language
    pub fn snapshot(
        &mut self,
        language: &str,
    ) -> Result<(Arc<GrammarModel>, Arc<StyleRegistry>), GrammarError> {
        let grammar = self.grammars.load_named(language)?;
        let styles = match grammar.style.as_deref() {
            Some(style) => self.style_registry(style),
            None => Arc::clone(&self.default_styles),
        };
        Ok((grammar, styles))
    }

    /// Load a style registry once, falling back to the default on failure
    fn style_registry(&mut self, name: &str) -> Arc<StyleRegistry> {
        let cache_key = name.to_lowercase();
        if let Some(registry) = self.style_cache.get(&cache_key) {
            return Arc::clone(registry);
        }

        let registry = match self.styles.load_named(name) {
            Ok(registry) => Arc::new(registry),
            Err(e) => {
                tracing::warn!("Style {} unavailable, using default: {}", name, e);
                return Arc::clone(&self.default_styles);
            }
        };
        self.style_cache.insert(cache_key, Arc::clone(&registry));
        registry
    }

    /// Switch a buffer to a language
    ///
    /// On failure the buffer keeps whatever grammar it had.
    pub fn set_buffer_language(
        &mut self,
        buffer_idx: usize,
        language: &str,
        buffer: &(impl LineSource + ?Sized),
    ) -> Result<Repaint, GrammarError> {
        let (grammar, styles) = self.snapshot(language)?;
        tracing::debug!("Buffer {} now highlighted as {}", buffer_idx, grammar.name);

        let repaint = match self.buffers.get_mut(&buffer_idx) {
            Some(highlighter) => highlighter.set_snapshot(grammar, styles, buffer),
            None => {
                let mut highlighter = IncrementalHighlighter::new(grammar, styles);
                let repaint = highlighter.rehighlight_all(buffer);
                self.buffers.insert(buffer_idx, highlighter);
                repaint
            }
        };
        Ok(repaint)
    }

    /// Set language for a buffer based on filename
    ///
    /// A file with no known language is not highlighted.
    pub fn open_buffer(
        &mut self,
        buffer_idx: usize,
        filename: Option<&Path>,
        buffer: &(impl LineSource + ?Sized),
    ) -> Result<Repaint, GrammarError> {
        let language = filename
            .and_then(|f| self.detect_language(f))
            .map(|s| s.to_string());
        match language {
            Some(language) => self.set_buffer_language(buffer_idx, &language, buffer),
            None => {
                self.buffers.remove(&buffer_idx);
                Ok(Repaint::default())
            }
        }
    }

    /// Remove the highlighter of a buffer (when buffer is closed)
    pub fn close_buffer(&mut self, buffer_idx: usize) {
        self.buffers.remove(&buffer_idx);
    }

    /// Highlighter of a buffer, if it has a language
    pub fn highlighter(&self, buffer_idx: usize) -> Option<&IncrementalHighlighter> {
        self.buffers.get(&buffer_idx)
    }

    /// Name of the language a buffer is highlighted as
    pub fn buffer_language(&self, buffer_idx: usize) -> Option<&str> {
        self.buffers.get(&buffer_idx).map(|h| h.grammar().name.as_str())
    }

    /// Forward an edit to a buffer's highlighter
    pub fn lines_changed(
        &mut self,
        buffer_idx: usize,
        buffer: &(impl LineSource + ?Sized),
        edit: LineEdit,
    ) -> Repaint {
        match self.buffers.get_mut(&buffer_idx) {
            Some(highlighter) => highlighter.on_lines_changed(buffer, edit),
            None => Repaint::default(),
        }
    }

    /// Spans for a line of a buffer
    ///
    /// Empty if highlighting is off or the buffer has no language.
    pub fn spans(&self, buffer_idx: usize, line_idx: usize) -> &[StyleSpan] {
        if !self.enabled {
            return &[];
        }
        self.buffers
            .get(&buffer_idx)
            .map(|highlighter| highlighter.spans(line_idx))
            .unwrap_or(&[])
    }

    /// Toggle syntax highlighting on/off
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

impl Default for SyntaxManager {
    fn default() -> Self {
        Self::new()
    }
}
