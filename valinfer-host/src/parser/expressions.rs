// Expression parsing

use super::{expect, span_of, unexpected, Rule, UnitBuilder};
use crate::ast::*;
use crate::error::*;
use pest::iterators::Pair;

impl UnitBuilder<'_, '_> {
    pub(crate) fn expression(&self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let span = span_of(&pair);
        let additive = expect(&mut pair.into_inner(), "additive", span)?;
        self.additive(additive)
    }

    /// Left-associative `a + b + c`
    fn additive(&self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let span = span_of(&pair);
        let mut operands = pair.into_inner();
        let mut left = self.postfix(expect(&mut operands, "postfix", span)?)?;

        for operand in operands {
            let right = self.postfix(operand)?;
            let span = left.span.merge(&right.span);
            left = Expression::new(
                ExpressionKind::Add {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// A primary followed by method calls and array indexing
    fn postfix(&self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let mut current = self.primary(expect(&mut inner, "primary", span)?)?;

        for operation in inner {
            let operation_span = span_of(&operation);
            let suffix = expect(&mut operation.into_inner(), "suffix", operation_span)?;
            let span = current.span.merge(&operation_span);

            current = match suffix.as_rule() {
                Rule::method_suffix => {
                    let mut parts = suffix.into_inner();
                    let name = self.identifier(&expect(&mut parts, "identifier", operation_span)?);
                    let arguments = self.arguments(expect(&mut parts, "arguments", operation_span)?)?;
                    Expression::new(
                        ExpressionKind::MethodCall {
                            receiver: Some(Box::new(current)),
                            name,
                            arguments,
                        },
                        span,
                    )
                }
                Rule::index_suffix => {
                    let index = expect(&mut suffix.into_inner(), "expression", operation_span)?;
                    Expression::new(
                        ExpressionKind::ArrayAccess {
                            array: Box::new(current),
                            index: Box::new(self.expression(index)?),
                        },
                        span,
                    )
                }
                _ => return Err(unexpected(&suffix, "method call or index")),
            };
        }

        Ok(current)
    }

    fn arguments(&self, pair: Pair<Rule>) -> ParseResult<Vec<Expression>> {
        pair.into_inner()
            .map(|argument| self.expression(argument))
            .collect()
    }

    fn primary(&self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let span = span_of(&pair);
        let inner = expect(&mut pair.into_inner(), "primary expression", span)?;

        let kind = match inner.as_rule() {
            Rule::literal => ExpressionKind::Literal(self.literal(inner)?),
            Rule::creation => return self.creation(inner),
            Rule::this_expression => ExpressionKind::This,
            Rule::parenthesized => {
                let value = expect(&mut inner.into_inner(), "expression", span)?;
                ExpressionKind::Parenthesized(Box::new(self.expression(value)?))
            }
            Rule::call => {
                let mut parts = inner.into_inner();
                let name = self.identifier(&expect(&mut parts, "identifier", span)?);
                let arguments = self.arguments(expect(&mut parts, "arguments", span)?)?;
                ExpressionKind::MethodCall {
                    receiver: None,
                    name,
                    arguments,
                }
            }
            Rule::name => {
                let identifier = expect(&mut inner.into_inner(), "identifier", span)?;
                ExpressionKind::Name(self.identifier(&identifier))
            }
            _ => return Err(unexpected(&inner, "primary expression")),
        };

        Ok(Expression::new(kind, span))
    }

    /// `new T(...)`, `new T(...) { ... }`, `new T[n]`, `new T[] { ... }`
    fn creation(&self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let span = span_of(&pair);
        let target = pair
            .into_inner()
            .find(|part| part.as_rule() != Rule::new_keyword)
            .ok_or_else(|| ParseError::UnexpectedRule {
                expected: "array or instance creation".to_string(),
                found: None,
                span,
            })?;

        let kind = match target.as_rule() {
            Rule::instance_creation => self.instance_creation(target, span)?,
            Rule::array_creation => self.array_creation(target, span)?,
            _ => return Err(unexpected(&target, "array or instance creation")),
        };

        Ok(Expression::new(kind, span))
    }

    fn instance_creation(&self, pair: Pair<Rule>, span: Span) -> ParseResult<ExpressionKind> {
        let mut type_ref = None;
        let mut arguments = Vec::new();
        let mut anonymous_body = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::class_type => {
                    let type_span = span_of(&inner);
                    type_ref = Some(self.class_type(inner, 0, type_span)?);
                }
                Rule::arguments => arguments = self.arguments(inner)?,
                Rule::class_body => {
                    anonymous_body = Some(AnonymousBody::new(self.class_body(inner)?))
                }
                _ => return Err(unexpected(&inner, "instance creation part")),
            }
        }

        let type_ref = type_ref.ok_or_else(|| ParseError::UnexpectedRule {
            expected: "class_type".to_string(),
            found: None,
            span,
        })?;

        Ok(ExpressionKind::NewInstance {
            type_ref,
            arguments,
            anonymous_body,
        })
    }

    fn array_creation(&self, pair: Pair<Rule>, span: Span) -> ParseResult<ExpressionKind> {
        let mut element_type = None;
        let mut dimension_expressions = Vec::new();
        let mut dimensions = 0;
        let mut initializer = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::named_type => {
                    let type_span = span_of(&inner);
                    element_type = Some(self.named_type(inner, 0, type_span)?);
                }
                Rule::dim_expr => {
                    let dim_span = span_of(&inner);
                    let size = expect(&mut inner.into_inner(), "expression", dim_span)?;
                    dimension_expressions.push(self.expression(size)?);
                }
                Rule::dim => dimensions += 1,
                Rule::dims => dimensions += inner.into_inner().count(),
                Rule::array_initializer => {
                    initializer = Some(
                        inner
                            .into_inner()
                            .map(|element| self.expression(element))
                            .collect::<ParseResult<Vec<_>>>()?,
                    );
                }
                _ => return Err(unexpected(&inner, "array creation part")),
            }
        }

        let element_type = element_type.ok_or_else(|| ParseError::UnexpectedRule {
            expected: "named_type".to_string(),
            found: None,
            span,
        })?;

        Ok(ExpressionKind::NewArray {
            element_type,
            dimension_expressions,
            dimensions,
            initializer,
        })
    }
}
