//! The fused scanner/recursive-descent render loop
//!
//! Parsing and rendering happen in the same pass: there is no intermediate
//! tree. A false branch keeps parsing with the write flag off, so structure
//! is validated (and close tags consumed) even when nothing is emitted.

use crate::engine::scanner::{self, Sigil};
use crate::engine::Template;
use crate::error::{codes, EngineError};
use crate::source::{Cursor, SourceBuffer};

impl Template {
    /// Render one span of the source, from the cursor up to the close tag
    /// named by `expected_close` (or end of input at top level, where
    /// `expected_close` is empty and `depth` is 0).
    pub(crate) fn render_span(
        &mut self,
        src: &SourceBuffer,
        cur: &mut Cursor,
        out: &mut Vec<u8>,
        write: bool,
        expected_close: &str,
        depth: usize,
    ) -> Result<(), EngineError> {
        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                return Err(EngineError::semantic(
                    codes::DEPTH_EXCEEDED,
                    format!("markup nested deeper than {max_depth} levels"),
                )
                .at(cur.position()));
            }
        }

        let bytes = src.as_bytes();
        // Set after a handled tag so the newline a tag-only source line ends
        // with is swallowed instead of stacking up blank output lines.
        let mut just_handled = false;

        while let Some(&c) = bytes.get(cur.pos) {
            match c {
                b'\\' => {
                    just_handled = false;
                    match bytes.get(cur.pos + 1) {
                        Some(b'\\') => {
                            if write {
                                out.push(b'\\');
                            }
                            cur.advance_n(bytes, 2);
                        }
                        Some(b'{') => {
                            if write {
                                out.push(b'{');
                            }
                            cur.advance_n(bytes, 2);
                        }
                        _ => {
                            if write {
                                out.push(b'\\');
                            }
                            cur.advance(bytes);
                        }
                    }
                }
                b'{' => {
                    if let Some(name) = scanner::scan_keyword(bytes, cur)? {
                        if write {
                            let value = self.put_keyword(&name);
                            out.extend_from_slice(value.as_bytes());
                        }
                        just_handled = true;
                    } else if let Some(tag) = scanner::scan_function(bytes, cur)? {
                        match tag.sigil {
                            Sigil::Function => {
                                // The body is always parsed, even when the
                                // name turns out undefined, so structural
                                // errors surface in suppressed branches too.
                                let mut body = Vec::new();
                                if !tag.auto_closed {
                                    self.render_span(src, cur, &mut body, write, &tag.name, depth + 1)?;
                                }
                                let callback =
                                    self.lookup_function(&tag.name).ok_or_else(|| {
                                        EngineError::semantic(
                                            codes::UNDEFINED_FUNCTION,
                                            format!("undefined function {}", tag.name),
                                        )
                                        .at(cur.position())
                                    })?;
                                if write {
                                    self.stats.functions += 1;
                                    let body_text = String::from_utf8_lossy(&body).into_owned();
                                    let produced = callback(self, &tag.args, &body_text)?;
                                    out.extend_from_slice(produced.as_bytes());
                                }
                            }
                            Sigil::Builtin => {
                                self.compute_builtin(src, cur, out, &tag, write, depth)?;
                            }
                        }
                        just_handled = true;
                    } else if !expected_close.is_empty()
                        && scanner::scan_close(bytes, cur, expected_close)?
                    {
                        // Close tag consumed; control returns to the caller.
                        return Ok(());
                    } else {
                        if write {
                            out.push(b'{');
                        }
                        cur.advance(bytes);
                        just_handled = false;
                    }
                }
                b'\n' if just_handled => {
                    // Swallowed.
                    cur.advance(bytes);
                    just_handled = false;
                }
                _ => {
                    if write {
                        out.push(c);
                    }
                    cur.advance(bytes);
                    just_handled = false;
                }
            }
        }

        if depth > 0 {
            return Err(EngineError::syntax(
                codes::UNCLOSED_CONSTRUCT,
                format!("construct {expected_close} left open at end of input, {depth} levels remaining"),
            )
            .at(cur.position()));
        }
        Ok(())
    }
}
