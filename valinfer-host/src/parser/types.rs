// Type reference parsing

use super::{expect, span_of, unexpected, Rule, UnitBuilder};
use crate::ast::*;
use crate::error::*;
use pest::iterators::Pair;

impl UnitBuilder<'_, '_> {
    /// `type_ref = { named_type ~ dims? }`
    pub(super) fn type_ref(&self, pair: Pair<Rule>) -> ParseResult<TypeReference> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let named = expect(&mut inner, "named_type", span)?;
        let dimensions = inner.next().map(|dims| dims.into_inner().count()).unwrap_or(0);

        self.named_type(named, dimensions, span)
    }

    pub(super) fn named_type(
        &self,
        pair: Pair<Rule>,
        dimensions: usize,
        span: Span,
    ) -> ParseResult<TypeReference> {
        let named_span = span_of(&pair);
        let inner = expect(&mut pair.into_inner(), "primitive or class type", named_span)?;

        match inner.as_rule() {
            Rule::primitive_type => Ok(TypeReference {
                id: NodeId::fresh(),
                kind: TypeReferenceKind::Simple {
                    token: inner.as_str().to_string(),
                    arguments: Vec::new(),
                    dimensions,
                },
                span,
            }),
            Rule::class_type => self.class_type(inner, dimensions, span),
            _ => Err(unexpected(&inner, "primitive or class type")),
        }
    }

    /// `class_type = { identifier ~ ("." ~ identifier)* ~ type_arguments? }`
    pub(super) fn class_type(
        &self,
        pair: Pair<Rule>,
        dimensions: usize,
        span: Span,
    ) -> ParseResult<TypeReference> {
        let mut tokens = Vec::new();
        let mut arguments = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::identifier => tokens.push(inner.as_str().to_string()),
                Rule::type_arguments => {
                    for argument in inner.into_inner() {
                        arguments.push(self.type_ref(argument)?);
                    }
                }
                _ => return Err(unexpected(&inner, "class type part")),
            }
        }

        let kind = if tokens.len() == 1 {
            TypeReferenceKind::Simple {
                token: tokens.remove(0),
                arguments,
                dimensions,
            }
        } else {
            TypeReferenceKind::Qualified {
                tokens,
                arguments,
                dimensions,
            }
        };

        Ok(TypeReference {
            id: NodeId::fresh(),
            kind,
            span,
        })
    }
}
