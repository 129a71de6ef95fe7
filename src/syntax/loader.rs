//! Grammar definition loading
//!
//! Grammar documents are TOML:
//!
//! ```text
//! name = "C"
//! use = "base"
//! style = "default"
//! extensions = ["c", "h"]
//! linecomment = '//'
//!
//! [blockcomment]
//! start = '/\*'
//! end = '\*/'
//!
//! [[keywords]]
//! type = 0
//! words = ["if", "else", "while"]
//! ```
//!
//! A grammar naming a parent with `use` starts from a copy of the parent,
//! and every slot it declares replaces the parent's. Parents are parsed
//! once and cached by name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use toml::Value;

use crate::config::HighlightConfig;
use crate::error::{GrammarError, RuleError};

use super::category::{Category, StyleId};
use super::grammar::GrammarModel;
use super::rules::{BlockRule, Rule};

/// Raw grammar document as parsed from TOML
///
/// Rule fields are kept as raw values so a badly typed rule is reported
/// and disabled on its own instead of failing the whole document.
#[derive(Debug, Deserialize)]
struct GrammarDocument {
    name: Option<String>,
    #[serde(rename = "use")]
    parent: Option<String>,
    style: Option<String>,
    extensions: Option<Vec<String>>,
    numbers: Option<Value>,
    quotations: Option<BlockDocument>,
    linecomment: Option<Value>,
    blockcomment: Option<BlockDocument>,
    #[serde(default)]
    keywords: Vec<IndexedRuleDocument>,
    #[serde(default)]
    expression: Vec<IndexedRuleDocument>,
    #[serde(default)]
    lineexpression: Vec<IndexedRuleDocument>,
    #[serde(default)]
    blockexpression: Vec<IndexedBlockDocument>,
}

#[derive(Debug, Deserialize)]
struct BlockDocument {
    start: Option<Value>,
    end: Option<Value>,
    escapes: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IndexedRuleDocument {
    #[serde(rename = "type")]
    index: Option<Value>,
    pattern: Option<Value>,
    words: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IndexedBlockDocument {
    #[serde(rename = "type")]
    index: Option<Value>,
    start: Option<Value>,
    end: Option<Value>,
    escapes: Option<Value>,
}

impl IndexedBlockDocument {
    fn block(self) -> BlockDocument {
        BlockDocument {
            start: self.start,
            end: self.end,
            escapes: self.escapes,
        }
    }
}

impl BlockDocument {
    /// Start, end and escape patterns, each checked to be a string
    fn patterns(
        &self,
        category: Category,
        index: usize,
    ) -> Result<(String, String, Option<String>), RuleError> {
        let text = |value: Option<&Value>| -> Result<Option<String>, RuleError> {
            match value {
                None => Ok(None),
                Some(value) => value
                    .as_str()
                    .map(|s| Some(s.to_string()))
                    .ok_or_else(|| not_a_string(category, index, value)),
            }
        };
        Ok((
            text(self.start.as_ref())?.unwrap_or_default(),
            text(self.end.as_ref())?.unwrap_or_default(),
            text(self.escapes.as_ref())?,
        ))
    }
}

impl GrammarDocument {
    /// Declared name, rejected when missing or blank
    fn name(&self) -> Result<&str, GrammarError> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(GrammarError::MissingName),
        }
    }
}

/// Cache key for a grammar name
fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Loads grammar definitions and resolves their inheritance
pub struct GrammarLoader {
    config: HighlightConfig,
    /// In-memory definitions by name key
    sources: HashMap<String, String>,
    /// Grammars resolved by name, by the key they were requested under
    cache: HashMap<String, Arc<GrammarModel>>,
    /// Rule problems met during the last top-level load
    warnings: Vec<RuleError>,
    /// Documents parsed since creation
    parsed: usize,
}

impl GrammarLoader {
    /// Create a loader using the given configuration
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            sources: HashMap::new(),
            cache: HashMap::new(),
            warnings: Vec::new(),
            parsed: 0,
        }
    }

    /// Configuration this loader was created with
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Make a definition available under `name` without touching disk
    ///
    /// Replaces any cached grammar of that name and every cached grammar
    /// derived from it.
    pub fn register_source(&mut self, name: &str, text: impl Into<String>) {
        let name = key(name);
        self.evict(&name);
        self.sources.insert(name, text.into());
    }

    /// Drop an in-memory definition and any grammar merged from it
    pub fn forget_source(&mut self, name: &str) {
        let name = key(name);
        self.evict(&name);
        self.sources.remove(&name);
    }

    /// Name a definition declares, without resolving its parents
    pub fn declared_name(&self, source: &str) -> Result<String, GrammarError> {
        let doc: GrammarDocument = toml::from_str(source)?;
        doc.name().map(str::to_string)
    }

    /// Names of the registered in-memory definitions
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Rule problems of the last load; the affected rules never match
    pub fn warnings(&self) -> &[RuleError] {
        &self.warnings
    }

    /// Number of grammar documents parsed so far
    pub fn documents_parsed(&self) -> usize {
        self.parsed
    }

    /// Forget every merged grammar
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Load a grammar from definition text
    ///
    /// The result is not cached; only parents it names are.
    pub fn load(&mut self, source: &str) -> Result<GrammarModel, GrammarError> {
        self.warnings.clear();
        self.load_document(source, &mut Vec::new())
    }

    /// Load a grammar from a definition file
    pub fn load_file(&mut self, path: &Path) -> Result<GrammarModel, GrammarError> {
        let text = read_source(path)?;
        self.load(&text)
    }

    /// Load a grammar by name from registered sources or the grammar
    /// directories, reusing the cache
    pub fn load_named(&mut self, name: &str) -> Result<Arc<GrammarModel>, GrammarError> {
        self.warnings.clear();
        self.resolve(name, &mut Vec::new())
    }

    /// Remove a cached grammar and, transitively, every cached grammar
    /// whose parent chain passes through it
    fn evict(&mut self, name_key: &str) {
        let mut stale = vec![name_key.to_string()];
        loop {
            let dependents: Vec<String> = self
                .cache
                .iter()
                .filter(|(k, _)| !stale.contains(k))
                .filter(|(_, g)| g.parent.as_deref().is_some_and(|p| stale.contains(&key(p))))
                .map(|(k, _)| k.clone())
                .collect();
            if dependents.is_empty() {
                break;
            }
            stale.extend(dependents);
        }

        for name in &stale {
            if self.cache.remove(name).is_some() {
                tracing::debug!("Evicted cached grammar {}", name);
            }
        }
    }

    fn resolve(
        &mut self,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<Arc<GrammarModel>, GrammarError> {
        let name_key = key(name);
        if chain.contains(&name_key) {
            let mut cycle = chain.clone();
            cycle.push(name_key);
            return Err(GrammarError::InheritanceCycle(cycle));
        }
        if let Some(grammar) = self.cache.get(&name_key) {
            return Ok(Arc::clone(grammar));
        }

        let text = self.find_source(name)?;
        let grammar = Arc::new(self.load_document(&text, chain)?);
        self.cache.insert(name_key, Arc::clone(&grammar));
        Ok(grammar)
    }

    fn find_source(&self, name: &str) -> Result<String, GrammarError> {
        if let Some(text) = self.sources.get(&key(name)) {
            return Ok(text.clone());
        }

        let file_names = [format!("{}.toml", name.trim()), format!("{}.toml", key(name))];
        let found = self
            .config
            .grammar_dirs
            .iter()
            .flat_map(|dir| file_names.iter().map(move |f| dir.join(f)))
            .find(|path| path.is_file());

        match found {
            Some(path) => read_source(&path),
            None => Err(GrammarError::NotFound(name.to_string())),
        }
    }

    fn load_document(
        &mut self,
        source: &str,
        chain: &mut Vec<String>,
    ) -> Result<GrammarModel, GrammarError> {
        let doc: GrammarDocument = toml::from_str(source)?;
        self.parsed += 1;
        let name = doc.name()?.to_string();
        let name_key = key(&name);
        if chain.contains(&name_key) {
            let mut cycle = chain.clone();
            cycle.push(name_key);
            return Err(GrammarError::InheritanceCycle(cycle));
        }

        chain.push(name_key);
        let base = match doc.parent.as_deref() {
            Some(parent) => self.resolve(parent, chain),
            None => Ok(Arc::new(GrammarModel::new(&name, &self.config.limits))),
        };
        chain.pop();

        let mut grammar = (*base?).clone();
        self.apply(&mut grammar, name, doc);

        tracing::debug!(
            "Loaded grammar {} (parent: {})",
            grammar.name,
            grammar.parent.as_deref().unwrap_or("none")
        );
        Ok(grammar)
    }

    /// Layer a document's declarations over a (possibly inherited) grammar
    fn apply(&mut self, grammar: &mut GrammarModel, name: String, doc: GrammarDocument) {
        grammar.name = name;
        grammar.parent = doc.parent;
        if doc.style.is_some() {
            grammar.style = doc.style;
        }
        if let Some(extensions) = doc.extensions {
            grammar.extensions = extensions;
        }

        if let Some(pattern) = doc.numbers {
            grammar.numbers = self.compile_value(&grammar.name, Category::Number, 0, &pattern);
        }
        if let Some(block) = doc.quotations {
            grammar.quotation = self.compile_block(&grammar.name, Category::Quotation, 0, &block);
        }
        if let Some(pattern) = doc.linecomment {
            grammar.line_comment =
                self.compile_value(&grammar.name, Category::LineComment, 0, &pattern);
        }
        if let Some(block) = doc.blockcomment {
            grammar.block_comment =
                self.compile_block(&grammar.name, Category::BlockComment, 0, &block);
        }

        let indexed = [
            (Category::Keyword, doc.keywords),
            (Category::Expression, doc.expression),
            (Category::LineExpression, doc.lineexpression),
        ];
        for (category, rules) in indexed {
            for rule in rules {
                self.apply_indexed(grammar, category, rule);
            }
        }

        for block in doc.blockexpression {
            let capacity = grammar.block_expressions.len();
            let category = Category::BlockExpression;
            let Some(index) = self.slot(&grammar.name, category, block.index.as_ref(), capacity)
            else {
                continue;
            };
            grammar.block_expressions[index] =
                self.compile_block(&grammar.name, category, index, &block.block());
        }
    }

    fn apply_indexed(
        &mut self,
        grammar: &mut GrammarModel,
        category: Category,
        doc: IndexedRuleDocument,
    ) {
        let capacity = grammar
            .indexed_rules_mut(category)
            .map_or(0, |slots| slots.len());
        let Some(index) = self.slot(&grammar.name, category, doc.index.as_ref(), capacity) else {
            return;
        };

        let rule = match (doc.pattern, doc.words) {
            (Some(pattern), _) => self.compile_value(&grammar.name, category, index, &pattern),
            (None, Some(words)) => match words_pattern(&words) {
                Some(pattern) => self.compile_rule(&grammar.name, category, index, &pattern),
                None => {
                    let error = RuleError::InvalidPattern {
                        category,
                        index,
                        pattern: words.to_string(),
                        message: "expected a non-empty list of strings".to_string(),
                    };
                    self.warn(&grammar.name, error);
                    Rule::disabled(StyleId::new(category, index))
                }
            },
            (None, None) => {
                self.warn(&grammar.name, RuleError::EmptyRule { category, index });
                Rule::disabled(StyleId::new(category, index))
            }
        };

        if let Some(slots) = grammar.indexed_rules_mut(category) {
            slots[index] = rule;
        }
    }

    /// Slot a rule's `type` selects, or `None` after recording why it has none
    fn slot(
        &mut self,
        grammar: &str,
        category: Category,
        value: Option<&Value>,
        capacity: usize,
    ) -> Option<usize> {
        let error = match value {
            Some(Value::Integer(index)) => match usize::try_from(*index) {
                Ok(slot) if slot < capacity => return Some(slot),
                _ => RuleError::TypeOutOfRange {
                    category,
                    index: *index,
                    capacity,
                },
            },
            Some(other) => RuleError::InvalidType {
                category,
                found: other.to_string(),
            },
            None => RuleError::InvalidType {
                category,
                found: "nothing".to_string(),
            },
        };
        self.warn(grammar, error);
        None
    }

    /// Compile a pattern field that may hold a value of the wrong type
    fn compile_value(
        &mut self,
        grammar: &str,
        category: Category,
        index: usize,
        value: &Value,
    ) -> Rule {
        match value.as_str() {
            Some(pattern) => self.compile_rule(grammar, category, index, pattern),
            None => {
                let error = not_a_string(category, index, value);
                self.warn(grammar, error);
                Rule::disabled(StyleId::new(category, index))
            }
        }
    }

    fn compile_rule(
        &mut self,
        grammar: &str,
        category: Category,
        index: usize,
        pattern: &str,
    ) -> Rule {
        let style = StyleId::new(category, index);
        Rule::new(pattern, style).unwrap_or_else(|e| {
            self.warn(
                grammar,
                RuleError::InvalidPattern {
                    category,
                    index,
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                },
            );
            Rule::disabled(style)
        })
    }

    fn compile_block(
        &mut self,
        grammar: &str,
        category: Category,
        index: usize,
        doc: &BlockDocument,
    ) -> BlockRule {
        let style = StyleId::new(category, index);
        let (start, end, escape) = match doc.patterns(category, index) {
            Ok(patterns) => patterns,
            Err(error) => {
                self.warn(grammar, error);
                return BlockRule::disabled(style);
            }
        };

        if start.is_empty() || end.is_empty() {
            self.warn(grammar, RuleError::IncompleteBlock { category, index });
            return BlockRule::disabled(style);
        }

        BlockRule::new(&start, &end, escape.as_deref(), style).unwrap_or_else(|e| {
            self.warn(
                grammar,
                RuleError::InvalidPattern {
                    category,
                    index,
                    pattern: format!("{} .. {}", start, end),
                    message: e.to_string(),
                },
            );
            BlockRule::disabled(style)
        })
    }

    fn warn(&mut self, grammar: &str, error: RuleError) {
        tracing::warn!("Grammar {}: {}", grammar, error);
        self.warnings.push(error);
    }
}

fn not_a_string(category: Category, index: usize, value: &Value) -> RuleError {
    RuleError::InvalidPattern {
        category,
        index,
        pattern: value.to_string(),
        message: format!("expected a string, found {}", value.type_str()),
    }
}

/// Whole-word alternation over a keyword list, `None` unless it is a
/// non-empty list of strings
fn words_pattern(words: &Value) -> Option<String> {
    let words = words.as_array()?;
    let alternatives = words
        .iter()
        .map(|w| w.as_str().map(regex::escape))
        .collect::<Option<Vec<String>>>()?;
    if alternatives.is_empty() {
        return None;
    }
    Some(format!(r"\b(?:{})\b", alternatives.join("|")))
}

fn read_source(path: &Path) -> Result<String, GrammarError> {
    fs::read_to_string(path).map_err(|source| GrammarError::Io {
        path: PathBuf::from(path),
        source,
    })
}
