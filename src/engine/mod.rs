//! The template instance: local symbol tables, the render entry points and
//! layout composition
//!
//! # Example
//!
//! ```rust
//! use stencil::{EngineConfig, SharedRegistry, Template};
//!
//! let shared = SharedRegistry::handle();
//! let mut template = Template::from_text("Hi {{name}}!", EngineConfig::default(), shared);
//! template.set_keyword("name", "World");
//! assert_eq!(template.render(false).unwrap(), "Hi World!");
//! ```

mod args;
mod builtins;
mod render;
mod scanner;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::collection::{CollectionStore, Row};
use crate::config::{EngineConfig, UnmatchedKeywords};
use crate::error::EngineError;
use crate::loader;
use crate::registry::{Args, OperatorSet, SharedHandle, TemplateFn};
use crate::source::{Cursor, RenderStats, SourceBuffer};

/// A template instance.
///
/// Owns its source buffer, configuration, local keyword/function/operator
/// tables and collections; shares a registry handle with sibling instances.
/// Local entries shadow shared entries on lookup. All mutation goes through
/// the instance's own setters; rendering is synchronous and single-threaded.
pub struct Template {
    pub(crate) source: SourceBuffer,
    pub(crate) config: EngineConfig,
    pub(crate) keywords: HashMap<String, String>,
    pub(crate) functions: HashMap<String, TemplateFn>,
    pub(crate) operators: OperatorSet,
    pub(crate) collections: CollectionStore,
    pub(crate) shared: SharedHandle,
    pub(crate) stats: RenderStats,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("keywords", &self.keywords)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("collections", &self.collections)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Create an instance from raw text. The text is copied and truncated to
    /// the configured maximum buffer length.
    pub fn from_text(text: &str, config: EngineConfig, shared: SharedHandle) -> Self {
        let source = SourceBuffer::new(text, config.max_buffer_len);
        Self::with_source(source, config, shared)
    }

    /// Create an instance from a file, resolved against the configured base
    /// path when relative.
    pub fn from_file(
        path: impl AsRef<Path>,
        config: EngineConfig,
        shared: SharedHandle,
    ) -> Result<Self, EngineError> {
        let source = loader::load(
            path.as_ref(),
            config.base_path.as_deref(),
            config.max_buffer_len,
        )?;
        Ok(Self::with_source(source, config, shared))
    }

    fn with_source(source: SourceBuffer, config: EngineConfig, shared: SharedHandle) -> Self {
        Self {
            source,
            config,
            keywords: HashMap::new(),
            functions: HashMap::new(),
            operators: OperatorSet::default(),
            collections: CollectionStore::new(),
            shared,
            stats: RenderStats::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set the base directory for relative block/template paths.
    pub fn set_base_path(&mut self, path: impl Into<PathBuf>) {
        self.config.base_path = Some(path.into());
    }

    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Counters from the last `render` call.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    // --- local symbol tables -------------------------------------------

    pub fn set_keyword(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.keywords.insert(name.into(), value.into());
    }

    /// Look a keyword up, local table first, then the shared registry.
    pub fn keyword(&self, name: &str) -> Option<String> {
        self.keywords
            .get(name)
            .cloned()
            .or_else(|| self.shared.borrow().keyword(name))
    }

    pub fn set_function<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&mut Template, &Args, &str) -> Result<String, EngineError> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(callback));
    }

    pub fn set_operator_str<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&str, &str) -> bool + 'static,
    {
        self.operators.set_str(name, callback);
    }

    pub fn set_operator_int<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(i64, i64) -> bool + 'static,
    {
        self.operators.set_int(name, callback);
    }

    pub fn set_operator_float<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(f64, f64) -> bool + 'static,
    {
        self.operators.set_float(name, callback);
    }

    // --- collections ---------------------------------------------------

    /// Create or replace a collection wholesale.
    pub fn add_collection(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.collections.insert(name, rows);
    }

    /// Append a whole row; returns its index.
    pub fn push_row(&mut self, name: impl Into<String>, row: Row) -> usize {
        self.collections.push_row(name, row)
    }

    /// Upsert a single field at `index` (−1 or past the end appends a new
    /// row); returns the touched index.
    pub fn upsert_row(
        &mut self,
        name: impl Into<String>,
        index: i64,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> usize {
        self.collections.upsert(name, index, key, value)
    }

    pub fn collection(&self, name: &str) -> Option<&[Row]> {
        self.collections.get(name)
    }

    // --- rendering -----------------------------------------------------

    /// Render the template. With `use_layout` and a layout set on the shared
    /// registry, the body is bound to the configured contents keyword and
    /// the layout rendered in a second top-level pass (layouts never nest —
    /// one extra pass only).
    pub fn render(&mut self, use_layout: bool) -> Result<String, EngineError> {
        self.stats = RenderStats::default();
        let body = self.run_pass(self.source.clone())?;
        if !use_layout {
            return Ok(body);
        }
        let layout = self.shared.borrow().layout.clone();
        match layout {
            Some(layout) => {
                let contents_keyword = self.config.contents_keyword.clone();
                self.set_keyword(contents_keyword, body);
                self.run_pass(layout)
            }
            None => Ok(body),
        }
    }

    /// Render an ad-hoc fragment with this instance's tables. Entry point
    /// for callbacks that build output through the engine itself.
    pub fn parse(&mut self, text: &str) -> Result<String, EngineError> {
        let source = SourceBuffer::new(text, self.config.max_buffer_len);
        self.run_pass(source)
    }

    fn run_pass(&mut self, source: SourceBuffer) -> Result<String, EngineError> {
        let mut cursor = Cursor::new(self.config.track_positions);
        let mut out = Vec::with_capacity(source.len());
        self.render_span(&source, &mut cursor, &mut out, true, "", 0)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    // --- lookups used by the render loop -------------------------------

    /// Resolve a keyword for output, applying the unmatched policy.
    pub(crate) fn put_keyword(&mut self, name: &str) -> String {
        self.stats.keywords += 1;
        match self.keyword(name) {
            Some(value) => value,
            None => match self.config.unmatched_keywords {
                UnmatchedKeywords::Leave => format!("{{{{{name}}}}}"),
                UnmatchedKeywords::Drop => String::new(),
            },
        }
    }

    pub(crate) fn lookup_function(&self, name: &str) -> Option<TemplateFn> {
        self.functions
            .get(name)
            .cloned()
            .or_else(|| self.shared.borrow().functions.get(name).cloned())
    }
}
