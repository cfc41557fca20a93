//! Argument tokenizer for function and builtin tags

use crate::error::{codes, EngineError};
use crate::registry::Args;
use crate::source::Cursor;

/// Name-then-arguments fill state, fed one completed token at a time.
#[derive(Default)]
struct Fill {
    name: Option<String>,
    key: Option<String>,
    auto_key: u32,
    args: Args,
}

impl Fill {
    /// An unescaped `=` splits the current token into a named argument only
    /// once the tag name is done and no key is pending.
    fn splits_named(&self) -> bool {
        self.name.is_some() && self.key.is_none()
    }

    fn complete(&mut self, token: &mut Vec<u8>) {
        let text = String::from_utf8_lossy(token).into_owned();
        token.clear();
        if self.name.is_none() {
            self.name = Some(text);
        } else if let Some(key) = self.key.take() {
            // An empty key (a token starting with `=`) degrades to positional.
            if key.is_empty() {
                self.push_positional(text);
            } else {
                self.args.insert(key, text);
            }
        } else {
            self.push_positional(text);
        }
    }

    fn split_key(&mut self, token: &mut Vec<u8>) {
        self.key = Some(String::from_utf8_lossy(token).into_owned());
        token.clear();
    }

    fn push_positional(&mut self, value: String) {
        self.args.insert(self.auto_key.to_string(), value);
        self.auto_key += 1;
    }

    fn finish(&mut self, token: &mut Vec<u8>) {
        if self.name.is_none() || !token.is_empty() || self.key.is_some() {
            self.complete(token);
        }
    }
}

/// Scan space-delimited tokens from just after the tag sigil to the closing
/// `}}` or `/}`. Returns (name, arguments, autoclosed).
///
/// For builtin tags `=` is left in the token (the builtin re-splits it) and
/// quotes are kept so the builtin can still see the enclosure.
pub(crate) fn scan_tag_body(
    src: &[u8],
    cur: &mut Cursor,
    builtin: bool,
) -> Result<(String, Args, bool), EngineError> {
    let mut fill = Fill::default();
    let mut token: Vec<u8> = Vec::new();
    let mut enclosed = false;
    let mut auto_closed = false;

    loop {
        let Some(&c) = src.get(cur.pos) else {
            return Err(
                EngineError::syntax(codes::UNTERMINATED_FUNCTION, "unterminated function tag")
                    .at(cur.position()),
            );
        };
        let next = src.get(cur.pos + 1).copied();

        if c == b'}' && next == Some(b'}') {
            cur.advance_n(src, 2);
            break;
        }
        if c == b'/' && next == Some(b'}') {
            auto_closed = true;
            cur.advance_n(src, 2);
            break;
        }
        if c == b' ' && !enclosed && !token.is_empty() {
            fill.complete(&mut token);
            cur.advance(src);
            continue;
        }
        if c == b'"' {
            enclosed = !enclosed;
            if builtin {
                token.push(c);
            }
            cur.advance(src);
            continue;
        }
        if c == b'=' && !enclosed && !builtin && fill.splits_named() {
            fill.split_key(&mut token);
            cur.advance(src);
            continue;
        }
        if c == b'\\' {
            if let Some(escaped @ (b'"' | b'}' | b'=' | b'\\')) = next {
                token.push(escaped);
                cur.advance_n(src, 2);
                continue;
            }
        }
        // Runs of spaces between tokens collapse.
        if c != b' ' || enclosed || !token.is_empty() {
            token.push(c);
        }
        cur.advance(src);
    }

    if enclosed {
        return Err(
            EngineError::syntax(codes::UNFINISHED_ENCLOSED, "unfinished enclosed string")
                .at(cur.position()),
        );
    }
    fill.finish(&mut token);
    Ok((fill.name.unwrap_or_default(), fill.args, auto_closed))
}
