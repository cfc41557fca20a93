//! Stencil - a single-pass text templating engine
//!
//! Templates mix literal text with tags: keyword substitution (`{{name}}`),
//! user functions (`{!name args}}body{/name}}` or autoclosed `{!name/}`),
//! and engine builtins (`{%if …}}`, `{%collection …}}`, `{%iffun …}}`).
//! Parsing and rendering happen in one fused pass over a bounded buffer —
//! there is no intermediate tree; false branches keep parsing with output
//! suppressed, and collection loops re-enter the same source span once per
//! row.
//!
//! # Example
//!
//! ```rust
//! use stencil::{EngineConfig, SharedRegistry, Template};
//!
//! let shared = SharedRegistry::handle();
//! let mut template = Template::from_text(
//!     "Hi {{name}}! {%if visits>3}}Welcome back.{/if}}",
//!     EngineConfig::default(),
//!     shared,
//! );
//! template.set_keyword("name", "World");
//! template.set_keyword("visits", "5");
//! assert_eq!(template.render(false).unwrap(), "Hi World! Welcome back.");
//! ```
//!
//! Instances sharing a [`SharedRegistry`] handle see the same shared
//! keywords, functions, operators and layout; local entries shadow shared
//! ones. Host callbacks receive the calling instance and may render
//! fragments through [`Template::parse`].

pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod registry;
pub mod source;
pub mod web;

mod condition;

pub use collection::{CollectionStore, Row};
pub use config::{EngineConfig, UnmatchedKeywords};
pub use engine::Template;
pub use error::{EngineError, ErrorKind, Position};
pub use registry::{Args, SharedHandle, SharedRegistry};
pub use source::{RenderStats, SourceBuffer};

/// Render a template string with default configuration and a fresh registry.
///
/// # Example
///
/// ```rust
/// let out = stencil::render_str("2 + 2 = 4").unwrap();
/// assert_eq!(out, "2 + 2 = 4");
/// ```
pub fn render_str(source: &str) -> Result<String, EngineError> {
    Template::from_text(source, EngineConfig::default(), SharedRegistry::handle()).render(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_str_plain() {
        assert_eq!(render_str("plain").expect("renders"), "plain");
    }

    #[test]
    fn test_render_str_leaves_unmatched_keywords() {
        assert_eq!(render_str("{{nope}}").expect("renders"), "{{nope}}");
    }

    #[test]
    fn test_render_str_propagates_errors() {
        let err = render_str("{{open").expect_err("unterminated");
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }
}
