//! Engine builtins: if, iffun, collection

use crate::collection::Row;
use crate::engine::scanner::ScannedTag;
use crate::engine::Template;
use crate::error::{codes, EngineError};
use crate::registry::Args;
use crate::source::{Cursor, SourceBuffer};

/// Generic tag scanning defers `=` for builtins, so their arguments arrive
/// as whole `key=value` tokens. Re-split them and strip surrounding quotes
/// from values.
fn split_builtin_args(args: &Args) -> Args {
    let mut result = Args::new();
    for (key, value) in args {
        match value.find('=') {
            Some(split) => {
                let (name, rest) = value.split_at(split);
                result.insert(name.to_string(), strip_quotes(&rest[1..]).to_string());
            }
            None => {
                result.insert(key.clone(), strip_quotes(value).to_string());
            }
        }
    }
    result
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

impl Template {
    /// Dispatch a builtin tag by name. The set is small and engine-owned;
    /// user extensions go through the function table instead.
    pub(crate) fn compute_builtin(
        &mut self,
        src: &SourceBuffer,
        cur: &mut Cursor,
        out: &mut Vec<u8>,
        tag: &ScannedTag,
        write: bool,
        depth: usize,
    ) -> Result<(), EngineError> {
        let control = matches!(tag.name.as_str(), "if" | "collection" | "iffun");
        if tag.auto_closed && control {
            return Err(EngineError::semantic(
                codes::AUTOCLOSED_BUILTIN,
                format!("builtin {} cannot be autoclosed", tag.name),
            )
            .at(cur.position()));
        }
        match tag.name.as_str() {
            "if" => self.builtin_if(src, cur, out, tag, write, depth),
            "iffun" => self.builtin_iffun(src, cur, out, tag, write, depth),
            "collection" => self.builtin_collection(src, cur, out, tag, write, depth),
            _ => Err(EngineError::semantic(
                codes::UNKNOWN_BUILTIN,
                format!("builtin {} not implemented", tag.name),
            )
            .at(cur.position())),
        }
    }

    /// `{%if clause}}…{/if}}` — the body renders when the clause holds. The
    /// clause is only evaluated while writing; inside a suppressed branch
    /// the body is still parsed for structure.
    fn builtin_if(
        &mut self,
        src: &SourceBuffer,
        cur: &mut Cursor,
        out: &mut Vec<u8>,
        tag: &ScannedTag,
        write: bool,
        depth: usize,
    ) -> Result<(), EngineError> {
        let result = if write {
            match tag.args.get("0") {
                Some(clause) => self.evaluate_condition(clause, cur.position())?,
                None => false,
            }
        } else {
            false
        };
        self.render_span(src, cur, out, result, "if", depth + 1)
    }

    /// `{%iffun name}}…{/iffun}}` — the body renders when `name` resolves to
    /// a user function (local table first, then shared). A leading `!`
    /// negates.
    fn builtin_iffun(
        &mut self,
        src: &SourceBuffer,
        cur: &mut Cursor,
        out: &mut Vec<u8>,
        tag: &ScannedTag,
        write: bool,
        depth: usize,
    ) -> Result<(), EngineError> {
        let argument = tag.args.get("0").ok_or_else(|| {
            EngineError::semantic(codes::MISSING_FUNCTION_NAME, "iffun needs a function name")
                .at(cur.position())
        })?;
        let (negated, name) = match argument.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, argument.as_str()),
        };
        let result = write && (self.lookup_function(name).is_some() != negated);
        self.render_span(src, cur, out, result, "iffun", depth + 1)
    }

    /// `{%collection var=name [loops=n]}}…{/collection}}` — re-parse the body
    /// once per row, exposing the row's fields and the iteration bookkeeping
    /// as transient keywords.
    fn builtin_collection(
        &mut self,
        src: &SourceBuffer,
        cur: &mut Cursor,
        out: &mut Vec<u8>,
        tag: &ScannedTag,
        write: bool,
        depth: usize,
    ) -> Result<(), EngineError> {
        let cargs = split_builtin_args(&tag.args);
        let var = cargs.get("var").ok_or_else(|| {
            EngineError::semantic(
                codes::MISSING_COLLECTION_VAR,
                "collection needs a var argument",
            )
            .at(cur.position())
        })?;
        let rows: Vec<Row> = self
            .collections
            .get(var)
            .map(<[Row]>::to_vec)
            .ok_or_else(|| {
                EngineError::semantic(codes::UNKNOWN_COLLECTION, format!("unknown collection {var}"))
                    .at(cur.position())
            })?;

        let total = rows.len();
        let mut iterations = total;
        if let Some(loops) = cargs.get("loops") {
            let requested: i64 = loops.trim().parse().map_err(|_| {
                EngineError::semantic(
                    codes::BAD_LOOP_COUNT,
                    format!("loops argument {loops} is not numeric"),
                )
                .at(cur.position())
            })?;
            iterations = iterations.min(requested.max(0) as usize);
        }

        self.set_keyword(format!("{var}._totalLines"), total.to_string());
        self.set_keyword(format!("{var}._totalIterations"), iterations.to_string());

        let body_start = cur.pos;
        if iterations == 0 {
            // Still parse the body once so structure is validated and the
            // close tag consumed.
            return self.render_span(src, cur, out, false, "collection", depth + 1);
        }

        for (index, row) in rows.iter().take(iterations).enumerate() {
            if index > 0 {
                // Revisit the same span; the re-entry step must not advance
                // position statistics a second time.
                cur.rewind(body_start);
            }
            self.set_keyword(format!("{var}._lineNumber"), (index + 1).to_string());
            self.set_keyword(format!("{var}._even"), if index % 2 == 0 { "1" } else { "0" });
            self.set_keyword(
                format!("{var}._last"),
                if index + 1 == iterations { "1" } else { "0" },
            );
            for (field, value) in row {
                self.set_keyword(format!("{var}.{field}"), value.clone());
            }
            self.render_span(src, cur, out, write, "collection", depth + 1)?;
        }
        Ok(())
    }
}
