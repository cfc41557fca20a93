//! Shared symbol tables and the per-domain operator registry

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

use crate::config::DEFAULT_MAX_BUFFER_LEN;
use crate::engine::Template;
use crate::error::EngineError;
use crate::loader;
use crate::source::SourceBuffer;

/// Arguments of one tag, ordered by key. Positional arguments use
/// auto-incrementing keys `"0"`, `"1"`, …; named arguments use their name.
pub type Args = BTreeMap<String, String>;

/// A user function: receives the calling instance, the tag arguments and the
/// already-rendered body text, and returns the text to append.
pub type TemplateFn = Rc<dyn Fn(&mut Template, &Args, &str) -> Result<String, EngineError>>;

/// Custom comparison callbacks, one alias per operand domain.
pub type StrOperator = Rc<dyn Fn(&str, &str) -> bool>;
pub type IntOperator = Rc<dyn Fn(i64, i64) -> bool>;
pub type FloatOperator = Rc<dyn Fn(f64, f64) -> bool>;

/// Custom operators keyed by case-folded name, one table per comparison
/// domain. Checked local-then-shared, mirroring keyword resolution.
#[derive(Clone, Default)]
pub struct OperatorSet {
    string: HashMap<String, StrOperator>,
    integer: HashMap<String, IntOperator>,
    floating: HashMap<String, FloatOperator>,
}

impl OperatorSet {
    pub fn set_str<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&str, &str) -> bool + 'static,
    {
        self.string.insert(name.to_lowercase(), Rc::new(callback));
    }

    pub fn set_int<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(i64, i64) -> bool + 'static,
    {
        self.integer.insert(name.to_lowercase(), Rc::new(callback));
    }

    pub fn set_float<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(f64, f64) -> bool + 'static,
    {
        self.floating.insert(name.to_lowercase(), Rc::new(callback));
    }

    pub fn str_op(&self, name: &str) -> Option<StrOperator> {
        self.string.get(name).cloned()
    }

    pub fn int_op(&self, name: &str) -> Option<IntOperator> {
        self.integer.get(name).cloned()
    }

    pub fn float_op(&self, name: &str) -> Option<FloatOperator> {
        self.floating.get(name).cloned()
    }
}

/// Cheap clonable handle to a shared registry.
pub type SharedHandle = Rc<RefCell<SharedRegistry>>;

/// Keywords, functions, operators and the optional layout shared between the
/// instances holding the same handle.
///
/// Local entries shadow shared entries on lookup by name. Mutation is
/// unsynchronized: the handle is single-threaded (`Rc`), and the design
/// assumes one writer at a time; borrows taken during rendering are scoped
/// to each lookup, so callbacks may mutate shared state mid-render.
#[derive(Default)]
pub struct SharedRegistry {
    pub(crate) keywords: HashMap<String, String>,
    pub(crate) functions: HashMap<String, TemplateFn>,
    pub(crate) operators: OperatorSet,
    pub(crate) layout: Option<SourceBuffer>,
}

impl SharedRegistry {
    /// Create a fresh registry behind its handle type.
    pub fn handle() -> SharedHandle {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn set_keyword(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.keywords.insert(name.into(), value.into());
    }

    pub fn keyword(&self, name: &str) -> Option<String> {
        self.keywords.get(name).cloned()
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

    /// Set the layout template wrapped around rendered bodies.
    pub fn set_layout(&mut self, text: &str) {
        self.layout = Some(SourceBuffer::new(text, DEFAULT_MAX_BUFFER_LEN));
    }

    /// Load the layout from a file.
    pub fn set_layout_file(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.layout = Some(loader::load(
            path.as_ref(),
            None,
            DEFAULT_MAX_BUFFER_LEN,
        )?);
        Ok(())
    }

    pub fn clear_layout(&mut self) {
        self.layout = None;
    }

    pub fn has_layout(&self) -> bool {
        self.layout.is_some()
    }
}
