// Compilation unit, type and method declarations

use super::{expect, span_of, unexpected, Rule, UnitBuilder};
use crate::ast::*;
use crate::error::*;
use pest::iterators::Pair;

impl UnitBuilder<'_, '_> {
    pub(super) fn compilation_unit(
        &self,
        pair: Pair<Rule>,
        source_file: Option<String>,
    ) -> ParseResult<CompilationUnit> {
        let span = span_of(&pair);
        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::package_declaration => {
                    let inner_span = span_of(&inner);
                    let name = expect(&mut inner.into_inner(), "qualified_name", inner_span)?;
                    package = Some(self.qualified_name(name));
                }
                Rule::import_declaration => imports.push(self.import_declaration(inner)?),
                Rule::type_declaration => types.push(self.type_declaration(inner)?),
                Rule::EOI => {}
                _ => return Err(unexpected(&inner, "declaration")),
            }
        }

        Ok(CompilationUnit {
            package,
            imports,
            types,
            source_file,
            span,
        })
    }

    pub(super) fn qualified_name(&self, pair: Pair<Rule>) -> QualifiedName {
        let span = span_of(&pair);
        let segments = pair
            .into_inner()
            .map(|segment| self.identifier(&segment))
            .collect();

        QualifiedName { segments, span }
    }

    pub(super) fn identifier(&self, pair: &Pair<Rule>) -> Identifier {
        Identifier::new(pair.as_str(), span_of(pair))
    }

    fn import_declaration(&self, pair: Pair<Rule>) -> ParseResult<ImportDeclaration> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let name = self.qualified_name(expect(&mut inner, "qualified_name", span)?);
        let on_demand = inner.next().is_some();

        Ok(ImportDeclaration {
            name,
            on_demand,
            span,
        })
    }

    fn type_declaration(&self, pair: Pair<Rule>) -> ParseResult<TypeDeclaration> {
        let span = span_of(&pair);
        let mut kind = TypeDeclarationKind::Class;
        let mut name = None;
        let mut type_parameters = Vec::new();
        let mut superclass = None;
        let mut interfaces = Vec::new();
        let mut methods = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::class_modifier => {}
                Rule::type_kind => {
                    kind = match inner.as_str() {
                        "interface" => TypeDeclarationKind::Interface,
                        "@interface" => TypeDeclarationKind::Annotation,
                        _ => TypeDeclarationKind::Class,
                    };
                }
                Rule::identifier => name = Some(self.identifier(&inner)),
                Rule::type_parameters => {
                    type_parameters = inner
                        .into_inner()
                        .map(|parameter| self.identifier(&parameter))
                        .collect();
                }
                Rule::extends_clause => {
                    let mut supertypes = self.type_list(inner)?;
                    // Interfaces extend interfaces; classes have a single superclass
                    if kind == TypeDeclarationKind::Class && !supertypes.is_empty() {
                        superclass = Some(supertypes.remove(0));
                    }
                    interfaces.extend(supertypes);
                }
                Rule::implements_clause => interfaces.extend(self.type_list(inner)?),
                Rule::class_body => methods = self.class_body(inner)?,
                _ => return Err(unexpected(&inner, "type declaration part")),
            }
        }

        let name = name.ok_or_else(|| ParseError::UnexpectedRule {
            expected: "identifier".to_string(),
            found: None,
            span,
        })?;

        Ok(TypeDeclaration {
            kind,
            name,
            type_parameters,
            superclass,
            interfaces,
            methods,
            span,
        })
    }

    fn type_list(&self, pair: Pair<Rule>) -> ParseResult<Vec<TypeReference>> {
        let span = span_of(&pair);
        let list = expect(&mut pair.into_inner(), "type_list", span)?;

        list.into_inner()
            .map(|type_ref| self.type_ref(type_ref))
            .collect()
    }

    pub(super) fn class_body(&self, pair: Pair<Rule>) -> ParseResult<Vec<MethodDeclaration>> {
        pair.into_inner()
            .map(|method| self.method_declaration(method))
            .collect()
    }

    fn method_declaration(&self, pair: Pair<Rule>) -> ParseResult<MethodDeclaration> {
        let span = span_of(&pair);
        let mut return_type = None;
        let mut name = None;
        let mut parameters = Vec::new();
        let mut body = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::class_modifier | Rule::abstract_body => {}
                Rule::return_type => {
                    let inner_span = span_of(&inner);
                    let declared = expect(&mut inner.into_inner(), "return type", inner_span)?;
                    return_type = match declared.as_rule() {
                        Rule::void_type => None,
                        _ => Some(self.type_ref(declared)?),
                    };
                }
                Rule::identifier => name = Some(self.identifier(&inner)),
                Rule::parameter_list => {
                    for parameter in inner.into_inner() {
                        parameters.push(self.parameter(parameter)?);
                    }
                }
                Rule::block => body = Some(self.block(inner)?),
                _ => return Err(unexpected(&inner, "method declaration part")),
            }
        }

        let name = name.ok_or_else(|| ParseError::UnexpectedRule {
            expected: "identifier".to_string(),
            found: None,
            span,
        })?;

        Ok(MethodDeclaration {
            id: NodeId::fresh(),
            return_type,
            name,
            parameters,
            body,
            span,
        })
    }

    fn parameter(&self, pair: Pair<Rule>) -> ParseResult<Parameter> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let type_ref = self.type_ref(expect(&mut inner, "type_ref", span)?)?;
        let name = self.identifier(&expect(&mut inner, "identifier", span)?);

        Ok(Parameter {
            type_ref,
            name,
            span,
        })
    }
}
