//! Per-instance engine configuration

use std::path::{Path, PathBuf};

/// Default cap on template/layout/block buffers. Bounds memory and parse
/// cost against malformed or hostile input.
pub const DEFAULT_MAX_BUFFER_LEN: usize = 16 * 1024;

/// Default nesting ceiling; recursion depth equals markup nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What to do when `{{name}}` does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedKeywords {
    /// Emit the tag itself, `{{name}}`.
    #[default]
    Leave,
    /// Emit nothing.
    Drop,
}

/// Configuration for a template instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum source length; longer input is truncated at construction.
    pub max_buffer_len: usize,
    /// Base directory for relative template/block paths.
    pub base_path: Option<PathBuf>,
    /// Policy for unresolved keywords.
    pub unmatched_keywords: UnmatchedKeywords,
    /// Keyword the rendered body is bound to during the layout pass.
    pub contents_keyword: String,
    /// Nesting ceiling; `None` leaves recursion unbounded.
    pub max_depth: Option<usize>,
    /// Track line/column statistics while parsing. Costs a little per
    /// character, so it follows the build profile unless a host opts in.
    pub track_positions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
            base_path: None,
            unmatched_keywords: UnmatchedKeywords::default(),
            contents_keyword: "contents".to_string(),
            max_depth: Some(DEFAULT_MAX_DEPTH),
            track_positions: cfg!(debug_assertions),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum source buffer length.
    pub fn with_max_buffer_len(mut self, len: usize) -> Self {
        self.max_buffer_len = len;
        self
    }

    /// Set the base directory for relative paths.
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the unresolved-keyword policy.
    pub fn with_unmatched_keywords(mut self, policy: UnmatchedKeywords) -> Self {
        self.unmatched_keywords = policy;
        self
    }

    /// Rename the keyword the layout pass binds the body to.
    pub fn with_contents_keyword(mut self, name: impl Into<String>) -> Self {
        self.contents_keyword = name.into();
        self
    }

    /// Set or remove the nesting ceiling.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enable or disable line/column tracking.
    pub fn with_track_positions(mut self, track: bool) -> Self {
        self.track_positions = track;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_buffer_len, DEFAULT_MAX_BUFFER_LEN);
        assert_eq!(config.unmatched_keywords, UnmatchedKeywords::Leave);
        assert_eq!(config.contents_keyword, "contents");
        assert_eq!(config.max_depth, Some(DEFAULT_MAX_DEPTH));
        assert!(config.base_path.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = EngineConfig::new()
            .with_max_buffer_len(64)
            .with_base_path("views")
            .with_unmatched_keywords(UnmatchedKeywords::Drop)
            .with_contents_keyword("body")
            .with_max_depth(None)
            .with_track_positions(true);
        assert_eq!(config.max_buffer_len, 64);
        assert_eq!(config.base_path.as_deref(), Some(Path::new("views")));
        assert_eq!(config.unmatched_keywords, UnmatchedKeywords::Drop);
        assert_eq!(config.contents_keyword, "body");
        assert_eq!(config.max_depth, None);
        assert!(config.track_positions);
    }
}
