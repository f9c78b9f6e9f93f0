// Literal parsing
// Handles null, boolean, numeric, character and string literals

use super::{expect, span_of, unexpected, Rule, UnitBuilder};
use crate::ast::*;
use crate::error::*;
use pest::iterators::Pair;

impl UnitBuilder<'_, '_> {
    pub(super) fn literal(&self, pair: Pair<Rule>) -> ParseResult<Literal> {
        let span = span_of(&pair);
        let inner = expect(&mut pair.into_inner(), "literal", span)?;
        let text = inner.as_str();
        let span = span_of(&inner);

        match inner.as_rule() {
            Rule::null_literal => Ok(Literal::Null),
            Rule::boolean_literal => Ok(Literal::Boolean(text == "true")),
            Rule::integer_literal => text
                .parse::<i64>()
                .map(Literal::Integer)
                .map_err(|_| ParseError::invalid_literal(self.source, span, text)),
            Rule::long_literal => text[..text.len() - 1]
                .parse::<i64>()
                .map(Literal::Long)
                .map_err(|_| ParseError::invalid_literal(self.source, span, text)),
            Rule::double_literal => text
                .parse::<f64>()
                .map(Literal::Double)
                .map_err(|_| ParseError::invalid_literal(self.source, span, text)),
            Rule::string_literal => {
                let body = &text[1..text.len() - 1];
                unescape(body)
                    .map(Literal::String)
                    .ok_or_else(|| ParseError::invalid_literal(self.source, span, text))
            }
            Rule::char_literal => {
                let body = &text[1..text.len() - 1];
                let mut chars = unescape(body)
                    .ok_or_else(|| ParseError::invalid_literal(self.source, span, text))?
                    .chars()
                    .collect::<Vec<_>>();
                match (chars.pop(), chars.is_empty()) {
                    (Some(value), true) => Ok(Literal::Char(value)),
                    _ => Err(ParseError::invalid_literal(self.source, span, text)),
                }
            }
            _ => Err(unexpected(&inner, "literal")),
        }
    }
}

/// Process backslash escapes; `None` on an unknown escape
fn unescape(raw: &str) -> Option<String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        };
        result.push(escaped);
    }

    Some(result)
}
