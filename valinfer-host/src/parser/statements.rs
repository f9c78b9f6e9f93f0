// Statement parsing
// Local declarations and enhanced for headers are handed to the hooks as soon as they are built

use super::{expect, span_of, unexpected, Rule, UnitBuilder};
use crate::ast::*;
use crate::error::*;
use crate::profile::ParseMode;
use pest::iterators::Pair;
use std::sync::Arc;

/// Modifiers and annotations collected from `variable_modifier*`
#[derive(Default)]
struct VariableModifiers {
    modifiers: Modifiers,
    annotations: Vec<Annotation>,
    source_modifiers: Vec<SourceModifier>,
}

impl UnitBuilder<'_, '_> {
    pub(super) fn block(&self, pair: Pair<Rule>) -> ParseResult<Block> {
        let span = span_of(&pair);
        let statements = pair
            .into_inner()
            .map(|statement| self.statement(statement))
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(Block { statements, span })
    }

    pub(super) fn statement(&self, pair: Pair<Rule>) -> ParseResult<Statement> {
        let span = span_of(&pair);
        let inner = expect(&mut pair.into_inner(), "statement", span)?;

        let kind = match inner.as_rule() {
            Rule::block => StatementKind::Block(self.block(inner)?),
            Rule::foreach_statement => StatementKind::ForEach(self.foreach_statement(inner)?),
            Rule::local_declaration => StatementKind::Local(self.local_declaration(inner)?),
            Rule::return_statement => {
                let value = inner
                    .into_inner()
                    .find(|part| part.as_rule() == Rule::expression)
                    .map(|expression| self.expression(expression))
                    .transpose()?;
                StatementKind::Return(value.map(Arc::new))
            }
            Rule::expression_statement => {
                let expression = expect(&mut inner.into_inner(), "expression", span)?;
                StatementKind::Expression(Arc::new(self.expression(expression)?))
            }
            Rule::empty_statement => StatementKind::Empty,
            _ => return Err(unexpected(&inner, "statement")),
        };

        Ok(Statement { kind, span })
    }

    fn local_declaration(&self, pair: Pair<Rule>) -> ParseResult<LocalDeclaration> {
        let span = span_of(&pair);
        let mut modifiers = VariableModifiers::default();
        let mut type_ref = None;
        let mut name = None;
        let mut initialization = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::variable_modifier => self.variable_modifier(inner, &mut modifiers)?,
                Rule::type_ref => type_ref = Some(self.type_ref(inner)?),
                Rule::identifier => name = Some(self.identifier(&inner)),
                Rule::initializer => {
                    let inner_span = span_of(&inner);
                    let value = expect(&mut inner.into_inner(), "expression", inner_span)?;
                    initialization = Some(Arc::new(self.expression(value)?));
                }
                _ => return Err(unexpected(&inner, "local declaration part")),
            }
        }

        let mut declaration = self.declaration(modifiers, type_ref, name, span)?;
        declaration.initialization = initialization;

        if declaration.initialization.is_some() {
            self.hooks.after_variable_with_initialization(&mut declaration);

            if self.mode == ParseMode::Completion {
                tracing::trace!(local = %declaration.name.name, "completion parse drops initializer");
                declaration.initialization = None;
            }
        }

        Ok(declaration)
    }

    fn declaration(
        &self,
        modifiers: VariableModifiers,
        type_ref: Option<TypeReference>,
        name: Option<Identifier>,
        span: Span,
    ) -> ParseResult<LocalDeclaration> {
        let missing = |expected: &str| ParseError::UnexpectedRule {
            expected: expected.to_string(),
            found: None,
            span,
        };

        Ok(LocalDeclaration {
            id: NodeId::fresh(),
            name: name.ok_or_else(|| missing("identifier"))?,
            type_ref: type_ref.ok_or_else(|| missing("type_ref"))?,
            modifiers: modifiers.modifiers,
            annotations: modifiers.annotations,
            source_modifiers: modifiers.source_modifiers,
            initialization: None,
            injected: InjectedFields::default(),
            binding: None,
            span,
        })
    }

    fn variable_modifier(
        &self,
        pair: Pair<Rule>,
        modifiers: &mut VariableModifiers,
    ) -> ParseResult<()> {
        let span = span_of(&pair);
        let inner = expect(&mut pair.into_inner(), "annotation or final", span)?;

        match inner.as_rule() {
            Rule::final_modifier => {
                modifiers.modifiers.insert(Modifiers::FINAL);
                modifiers
                    .source_modifiers
                    .push(SourceModifier::Final(span_of(&inner)));
            }
            Rule::annotation => {
                let annotation = self.annotation(inner)?;
                modifiers
                    .source_modifiers
                    .push(SourceModifier::Annotation(annotation.id));
                modifiers.annotations.push(annotation);
            }
            _ => return Err(unexpected(&inner, "annotation or final")),
        }

        Ok(())
    }

    fn annotation(&self, pair: Pair<Rule>) -> ParseResult<Annotation> {
        let span = span_of(&pair);
        let name = self.qualified_name(expect(&mut pair.into_inner(), "qualified_name", span)?);
        let tokens: Vec<&str> = name
            .segments
            .iter()
            .map(|segment| segment.name.as_str())
            .collect();

        let type_ref = match tokens.as_slice() {
            [single] => TypeReference::simple(*single, name.span),
            _ => TypeReference::qualified(&tokens, name.span),
        };

        Ok(Annotation::marker(type_ref, span))
    }

    fn foreach_statement(&self, pair: Pair<Rule>) -> ParseResult<ForeachStatement> {
        let span = span_of(&pair);
        let mut header = None;
        let mut body = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::for_keyword => {}
                Rule::foreach_header => header = Some(self.foreach_header(inner, span)?),
                Rule::statement => body = Some(inner),
                _ => return Err(unexpected(&inner, "enhanced for part")),
            }
        }

        let mut statement = header.ok_or_else(|| ParseError::UnexpectedRule {
            expected: "foreach_header".to_string(),
            found: None,
            span,
        })?;

        // The header is complete before the body is parsed
        self.hooks.after_enhanced_for_header(&mut statement);
        if self.mode == ParseMode::Completion {
            tracing::trace!(
                local = %statement.element_variable.name.name,
                "completion parse drops for-each collection"
            );
            statement.collection = None;
        }

        if let Some(body) = body {
            statement.body = Box::new(self.statement(body)?);
        }

        Ok(statement)
    }

    fn foreach_header(&self, pair: Pair<Rule>, span: Span) -> ParseResult<ForeachStatement> {
        let header_span = span_of(&pair);
        let mut modifiers = VariableModifiers::default();
        let mut type_ref = None;
        let mut name: Option<Identifier> = None;
        let mut collection = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::variable_modifier => self.variable_modifier(inner, &mut modifiers)?,
                Rule::type_ref => type_ref = Some(self.type_ref(inner)?),
                Rule::identifier => name = Some(self.identifier(&inner)),
                Rule::expression => collection = Some(Arc::new(self.expression(inner)?)),
                _ => return Err(unexpected(&inner, "enhanced for header part")),
            }
        }

        let variable_end = name
            .as_ref()
            .map(|name| name.span.end)
            .unwrap_or(header_span.end);
        let element_variable = self.declaration(
            modifiers,
            type_ref,
            name,
            Span::new(header_span.start, variable_end),
        )?;

        Ok(ForeachStatement {
            id: NodeId::fresh(),
            element_variable,
            collection,
            body: Box::new(Statement {
                kind: StatementKind::Empty,
                span: Span::new(span.end, span.end),
            }),
            span,
        })
    }
}
