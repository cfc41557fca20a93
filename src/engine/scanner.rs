//! Tag recognition at a `{` character
//!
//! Alternatives are tried in fixed priority order: keyword, function or
//! builtin, close tag. Each scanner leaves the cursor untouched when the
//! input is not its kind of tag, so the renderer falls through to the next
//! alternative and finally to literal output.

use crate::engine::args;
use crate::error::{codes, EngineError};
use crate::registry::Args;
use crate::source::Cursor;

/// Which sigil opened a function-shaped tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// `{!name …}}` — user function.
    Function,
    /// `{%name …}}` — engine builtin.
    Builtin,
}

/// A scanned function or builtin tag.
#[derive(Debug, Clone)]
pub struct ScannedTag {
    pub sigil: Sigil,
    pub name: String,
    pub args: Args,
    pub auto_closed: bool,
}

/// Try to scan `{{name}}` at the cursor. On a match the cursor ends past the
/// closing braces.
pub(crate) fn scan_keyword(src: &[u8], cur: &mut Cursor) -> Result<Option<String>, EngineError> {
    let p = cur.pos;
    if src.get(p + 1) != Some(&b'{') || p + 2 >= src.len() {
        return Ok(None);
    }
    cur.advance_n(src, 2);
    let start = cur.pos;
    while cur.pos < src.len() {
        if src[cur.pos] == b'}' && src.get(cur.pos + 1) == Some(&b'}') {
            let name = String::from_utf8_lossy(&src[start..cur.pos]).into_owned();
            cur.advance_n(src, 2);
            return Ok(Some(name));
        }
        cur.advance(src);
    }
    Err(
        EngineError::syntax(codes::UNTERMINATED_KEYWORD, "unterminated keyword tag")
            .at(cur.position()),
    )
}

/// Try to scan `{!name …}}`, `{!name …/}` or `{%name …}}` at the cursor.
pub(crate) fn scan_function(
    src: &[u8],
    cur: &mut Cursor,
) -> Result<Option<ScannedTag>, EngineError> {
    let p = cur.pos;
    let sigil = match src.get(p + 1) {
        Some(b'!') => Sigil::Function,
        Some(b'%') => Sigil::Builtin,
        _ => return Ok(None),
    };
    if p + 2 >= src.len() {
        return Ok(None);
    }
    cur.advance_n(src, 2);
    let (name, args, auto_closed) = args::scan_tag_body(src, cur, sigil == Sigil::Builtin)?;
    Ok(Some(ScannedTag {
        sigil,
        name,
        args,
        auto_closed,
    }))
}

/// Try to scan `{/name}}` at the cursor; only called while a nesting context
/// is active. The parsed name must equal `expected`.
pub(crate) fn scan_close(
    src: &[u8],
    cur: &mut Cursor,
    expected: &str,
) -> Result<bool, EngineError> {
    let p = cur.pos;
    if src.get(p + 1) != Some(&b'/') || p + 2 >= src.len() {
        return Ok(false);
    }
    cur.advance_n(src, 2);
    let start = cur.pos;
    while cur.pos < src.len() {
        if src[cur.pos] == b'}' && src.get(cur.pos + 1) == Some(&b'}') {
            let name = String::from_utf8_lossy(&src[start..cur.pos]);
            if name != expected {
                return Err(EngineError::syntax(
                    codes::UNMATCHING_CLOSE,
                    format!("close tag {{/{name}}}}} does not match open construct {expected}"),
                )
                .at(cur.position()));
            }
            cur.advance_n(src, 2);
            return Ok(true);
        }
        cur.advance(src);
    }
    Err(
        EngineError::syntax(codes::UNTERMINATED_CLOSE, "unterminated close tag")
            .at(cur.position()),
    )
}
