//! Typed condition evaluation for the `if` builtin
//!
//! One clause is one optional comparison: `left OP right`, where `left` is
//! keyword-resolved and `right` is literal. Operands are coerced into one of
//! three domains (integer, floating, string); a double-quoted right side
//! forces the string domain. Custom operators are written `!name!` and
//! dispatch to the registered callback for the selected domain.

use crate::engine::Template;
use crate::error::{codes, EngineError, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Custom(String),
}

/// Split an operator off the front of `text` (which starts at the first of
/// `! < > =`), returning it and the remaining right-hand side.
fn parse_operator(text: &str, pos: Option<Position>) -> Result<(Operator, &str), EngineError> {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b'=') => {
            if bytes.get(1) == Some(&b'=') {
                Ok((Operator::Eq, &text[2..]))
            } else {
                Ok((Operator::Eq, &text[1..]))
            }
        }
        Some(b'!') => {
            if bytes.get(1) == Some(&b'=') {
                Ok((Operator::Ne, &text[2..]))
            } else {
                // Custom operator, `!name!`, case-folded.
                match text[1..].find('!') {
                    Some(end) => Ok((
                        Operator::Custom(text[1..1 + end].to_lowercase()),
                        &text[2 + end..],
                    )),
                    None => Err(EngineError::semantic(
                        codes::UNKNOWN_OPERATOR,
                        format!("malformed operator in condition {text}"),
                    )
                    .at(pos)),
                }
            }
        }
        Some(b'<') => match bytes.get(1) {
            Some(b'=') => Ok((Operator::Le, &text[2..])),
            Some(b'>') => Ok((Operator::Ne, &text[2..])),
            _ => Ok((Operator::Lt, &text[1..])),
        },
        Some(b'>') => {
            if bytes.get(1) == Some(&b'=') {
                Ok((Operator::Ge, &text[2..]))
            } else {
                Ok((Operator::Gt, &text[1..]))
            }
        }
        _ => Err(EngineError::semantic(
            codes::UNKNOWN_OPERATOR,
            format!("no operator in condition {text}"),
        )
        .at(pos)),
    }
}

impl Template {
    /// Evaluate one boolean clause. A leading `!` negates the final result.
    pub(crate) fn evaluate_condition(
        &self,
        clause: &str,
        pos: Option<Position>,
    ) -> Result<bool, EngineError> {
        let clause = clause.trim();
        let (negated, rest) = match clause.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, clause),
        };

        let value = match rest.find(['!', '<', '>', '=']) {
            None => self.bare_clause_value(rest),
            Some(split) => {
                let left = self.keyword(&rest[..split]).unwrap_or_default();
                let (operator, right) = parse_operator(&rest[split..], pos)?;
                if right.is_empty() {
                    return Err(EngineError::semantic(
                        codes::EMPTY_CONDITION_RHS,
                        "condition has an empty right-hand side",
                    )
                    .at(pos));
                }
                self.apply_operator(&left, &operator, right, pos)?
            }
        };
        Ok(value != negated)
    }

    /// Clause with no comparison: all-digits text is truthy iff nonzero,
    /// anything else is a keyword whose presence (and digit value, if it is
    /// one) decides.
    fn bare_clause_value(&self, text: &str) -> bool {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            return text.bytes().any(|b| b != b'0');
        }
        match self.keyword(text) {
            Some(value) if value.bytes().all(|b| b.is_ascii_digit()) => {
                value.bytes().any(|b| b != b'0')
            }
            Some(_) => true,
            None => false,
        }
    }

    fn apply_operator(
        &self,
        left: &str,
        operator: &Operator,
        right_raw: &str,
        pos: Option<Position>,
    ) -> Result<bool, EngineError> {
        // A double-quoted right side forces the string domain.
        if right_raw.len() >= 2 && right_raw.starts_with('"') && right_raw.ends_with('"') {
            let right = &right_raw[1..right_raw.len() - 1];
            return self.compare_str(left, operator, right, pos);
        }
        if let (Ok(l), Ok(r)) = (left.parse::<i64>(), right_raw.parse::<i64>()) {
            return self.compare_int(l, operator, r, pos);
        }
        if let (Ok(l), Ok(r)) = (left.parse::<f64>(), right_raw.parse::<f64>()) {
            return self.compare_float(l, operator, r, pos);
        }
        self.compare_str(left, operator, right_raw, pos)
    }

    fn compare_str(
        &self,
        left: &str,
        operator: &Operator,
        right: &str,
        pos: Option<Position>,
    ) -> Result<bool, EngineError> {
        Ok(match operator {
            Operator::Eq => left == right,
            Operator::Ne => left != right,
            Operator::Lt => left < right,
            Operator::Le => left <= right,
            Operator::Gt => left > right,
            Operator::Ge => left >= right,
            Operator::Custom(name) => {
                let callback = self
                    .operators
                    .str_op(name)
                    .or_else(|| self.shared.borrow().operators.str_op(name))
                    .ok_or_else(|| unknown_operator(name, "string", pos))?;
                callback(left, right)
            }
        })
    }

    fn compare_int(
        &self,
        left: i64,
        operator: &Operator,
        right: i64,
        pos: Option<Position>,
    ) -> Result<bool, EngineError> {
        Ok(match operator {
            Operator::Eq => left == right,
            Operator::Ne => left != right,
            Operator::Lt => left < right,
            Operator::Le => left <= right,
            Operator::Gt => left > right,
            Operator::Ge => left >= right,
            Operator::Custom(name) => {
                let callback = self
                    .operators
                    .int_op(name)
                    .or_else(|| self.shared.borrow().operators.int_op(name))
                    .ok_or_else(|| unknown_operator(name, "integer", pos))?;
                callback(left, right)
            }
        })
    }

    fn compare_float(
        &self,
        left: f64,
        operator: &Operator,
        right: f64,
        pos: Option<Position>,
    ) -> Result<bool, EngineError> {
        Ok(match operator {
            Operator::Eq => left == right,
            Operator::Ne => left != right,
            Operator::Lt => left < right,
            Operator::Le => left <= right,
            Operator::Gt => left > right,
            Operator::Ge => left >= right,
            Operator::Custom(name) => {
                let callback = self
                    .operators
                    .float_op(name)
                    .or_else(|| self.shared.borrow().operators.float_op(name))
                    .ok_or_else(|| unknown_operator(name, "floating", pos))?;
                callback(left, right)
            }
        })
    }
}

fn unknown_operator(name: &str, domain: &str, pos: Option<Position>) -> EngineError {
    EngineError::semantic(
        codes::UNKNOWN_OPERATOR,
        format!("operator !{name}! not registered for {domain} operands"),
    )
    .at(pos)
}
