//! Bounded template loading from storage
//!
//! Templates, layouts and blocks all come through [`load`], so everything
//! read from disk obeys the same length cap as text handed in directly.

use std::path::{Path, PathBuf};

use crate::engine::Template;
use crate::error::{codes, EngineError};
use crate::registry::{Args, SharedRegistry};
use crate::source::SourceBuffer;

/// Read a template file into a bounded buffer. A relative path resolves
/// against `base` when given; any I/O failure is a ResourceError naming the
/// path.
pub fn load(path: &Path, base: Option<&Path>, max_len: usize) -> Result<SourceBuffer, EngineError> {
    let full: PathBuf = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };
    let text = std::fs::read_to_string(&full).map_err(|err| {
        EngineError::resource(
            codes::RESOURCE_NOT_FOUND,
            format!("cannot load {}: {err}", full.display()),
        )
    })?;
    Ok(SourceBuffer::new(&text, max_len))
}

/// Register the `block` function on a shared registry.
pub fn install(registry: &mut SharedRegistry) {
    registry.set_function("block", block);
}

/// Register the `block` function on a single instance.
pub fn install_local(template: &mut Template) {
    template.set_function("block", block);
}

/// `{!block template=file/}` — load a bounded buffer relative to the
/// caller's base path and render it inline with the caller's own engine.
/// Without a `template` argument nothing is rendered.
fn block(caller: &mut Template, args: &Args, _body: &str) -> Result<String, EngineError> {
    let Some(file) = args.get("template") else {
        return Ok(String::new());
    };
    let base = caller.config().base_path.clone();
    let max_len = caller.config().max_buffer_len;
    let source = load(Path::new(file), base.as_deref(), max_len)?;
    caller.parse(source.as_str())
}
