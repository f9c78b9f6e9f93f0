// valinfer host parser
// Pest-based parser building the primary AST and firing parse-time hooks

mod declarations;
mod expressions;
mod literals;
mod statements;
mod types;

use crate::ast::*;
use crate::error::*;
use crate::hooks::CompilerHooks;
use crate::profile::ParseMode;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct HostParser;

/// Parses host sources, notifying hooks as declarations complete
pub struct SourceParser<'h> {
    mode: ParseMode,
    hooks: &'h dyn CompilerHooks,
}

impl<'h> SourceParser<'h> {
    pub fn new(mode: ParseMode, hooks: &'h dyn CompilerHooks) -> Self {
        Self { mode, hooks }
    }

    /// Parse a whole source file
    pub fn parse_unit(
        &self,
        source: &str,
        source_file: Option<String>,
    ) -> ParseResult<CompilationUnit> {
        let mut pairs = HostParser::parse(Rule::compilation_unit, source)
            .map_err(|error| ParseError::from_pest_error(error, source.to_string()))?;
        let unit = expect(&mut pairs, "compilation_unit", Span::new(0, source.len()))?;

        self.builder(source).compilation_unit(unit, source_file)
    }

    /// Parse a standalone expression
    pub fn parse_expression(&self, source: &str) -> ParseResult<Expression> {
        let mut pairs = HostParser::parse(Rule::expression_input, source)
            .map_err(|error| ParseError::from_pest_error(error, source.to_string()))?;
        let input = expect(&mut pairs, "expression_input", Span::new(0, source.len()))?;
        let span = span_of(&input);
        let expression = expect(&mut input.into_inner(), "expression", span)?;

        self.builder(source).expression(expression)
    }

    fn builder<'s>(&self, source: &'s str) -> UnitBuilder<'s, 'h> {
        UnitBuilder {
            source,
            mode: self.mode,
            hooks: self.hooks,
        }
    }
}

/// Per-source parsing state
pub(crate) struct UnitBuilder<'s, 'h> {
    source: &'s str,
    mode: ParseMode,
    hooks: &'h dyn CompilerHooks,
}

pub(crate) fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

/// Take the next pair, failing with an `UnexpectedRule` error when the grammar produced none
pub(crate) fn expect<'i>(
    pairs: &mut Pairs<'i, Rule>,
    expected: &str,
    span: Span,
) -> ParseResult<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| ParseError::UnexpectedRule {
        expected: expected.to_string(),
        found: None,
        span,
    })
}

pub(crate) fn unexpected(pair: &Pair<Rule>, expected: &str) -> ParseError {
    ParseError::UnexpectedRule {
        expected: expected.to_string(),
        found: Some(pair.as_rule()),
        span: span_of(pair),
    }
}
