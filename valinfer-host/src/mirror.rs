// Tooling AST
// A second tree built from the resolved primary AST for editors and refactoring tools

use crate::ast::{
    Block, CompilationUnit, ForeachStatement, LocalDeclaration, MethodDeclaration, NodeId,
    SourceModifier, Span, Statement, StatementKind, TypeReference, TypeReferenceKind,
};
use crate::error::MirrorError;
use crate::hooks::CompilerHooks;
use crate::profile::AstLevel;
use crate::types::TypeEnvironment;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MirrorNodeId(u32);

impl MirrorNodeId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Start offset and length in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub start: usize,
    pub length: usize,
}

impl From<Span> for SourceRange {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            length: span.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKeyword {
    Final,
}

impl ModifierKeyword {
    pub fn keyword(&self) -> &'static str {
        match self {
            ModifierKeyword::Final => "final",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub id: MirrorNodeId,
    pub keyword: ModifierKeyword,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleName {
    pub id: MirrorNodeId,
    pub identifier: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub id: MirrorNodeId,
    pub qualifier: Box<Name>,
    pub name: SimpleName,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    Simple(SimpleName),
    Qualified(QualifiedName),
}

impl Name {
    pub fn id(&self) -> MirrorNodeId {
        match self {
            Name::Simple(name) => name.id,
            Name::Qualified(name) => name.id,
        }
    }

    pub fn range(&self) -> SourceRange {
        match self {
            Name::Simple(name) => name.range,
            Name::Qualified(name) => name.range,
        }
    }

    /// Set the range of this name and every name inside it
    pub fn set_range(&mut self, range: SourceRange) {
        match self {
            Name::Simple(name) => name.range = range,
            Name::Qualified(name) => {
                name.range = range;
                name.name.range = range;
                name.qualifier.set_range(range);
            }
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        match self {
            Name::Simple(name) => name.identifier.clone(),
            Name::Qualified(name) => format!(
                "{}.{}",
                name.qualifier.fully_qualified_name(),
                name.name.identifier
            ),
        }
    }

    /// Ids of this name and every name inside it
    pub fn node_ids(&self) -> Vec<MirrorNodeId> {
        match self {
            Name::Simple(name) => vec![name.id],
            Name::Qualified(name) => {
                let mut ids = name.qualifier.node_ids();
                ids.push(name.name.id);
                ids.push(name.id);
                ids
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerAnnotation {
    pub id: MirrorNodeId,
    pub type_name: Name,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedModifier {
    Modifier(Modifier),
    Annotation(MarkerAnnotation),
}

impl ExtendedModifier {
    pub fn id(&self) -> MirrorNodeId {
        match self {
            ExtendedModifier::Modifier(modifier) => modifier.id,
            ExtendedModifier::Annotation(annotation) => annotation.id,
        }
    }

    pub fn range(&self) -> SourceRange {
        match self {
            ExtendedModifier::Modifier(modifier) => modifier.range,
            ExtendedModifier::Annotation(annotation) => annotation.range,
        }
    }
}

/// Declared type of a declaration, as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorType {
    pub id: MirrorNodeId,
    pub text: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarationStatement {
    pub id: MirrorNodeId,
    /// `None` at AST levels without modifier nodes
    pub modifiers: Option<Vec<ExtendedModifier>>,
    pub var_type: MirrorType,
    pub name: SimpleName,
    pub initializer_range: Option<SourceRange>,
    pub range: SourceRange,
}

/// The variable of an enhanced for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleVariableDeclaration {
    pub id: MirrorNodeId,
    pub modifiers: Option<Vec<ExtendedModifier>>,
    pub var_type: MirrorType,
    pub name: SimpleName,
    pub range: SourceRange,
}

/// Declarations that carry a modifier list
pub trait MirrorModifiers {
    fn id(&self) -> MirrorNodeId;
    fn name(&self) -> &SimpleName;
    fn var_type(&self) -> &MirrorType;
    fn modifiers(&self) -> Option<&[ExtendedModifier]>;
    fn modifiers_mut(&mut self) -> Option<&mut Vec<ExtendedModifier>>;
}

impl MirrorModifiers for VariableDeclarationStatement {
    fn id(&self) -> MirrorNodeId {
        self.id
    }

    fn name(&self) -> &SimpleName {
        &self.name
    }

    fn var_type(&self) -> &MirrorType {
        &self.var_type
    }

    fn modifiers(&self) -> Option<&[ExtendedModifier]> {
        self.modifiers.as_deref()
    }

    fn modifiers_mut(&mut self) -> Option<&mut Vec<ExtendedModifier>> {
        self.modifiers.as_mut()
    }
}

impl MirrorModifiers for SingleVariableDeclaration {
    fn id(&self) -> MirrorNodeId {
        self.id
    }

    fn name(&self) -> &SimpleName {
        &self.name
    }

    fn var_type(&self) -> &MirrorType {
        &self.var_type
    }

    fn modifiers(&self) -> Option<&[ExtendedModifier]> {
        self.modifiers.as_deref()
    }

    fn modifiers_mut(&mut self) -> Option<&mut Vec<ExtendedModifier>> {
        self.modifiers.as_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedForStatement {
    pub id: MirrorNodeId,
    pub parameter: SingleVariableDeclaration,
    pub expression_range: Option<SourceRange>,
    pub body: Box<MirrorStatement>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatement {
    Block {
        statements: Vec<MirrorStatement>,
        range: SourceRange,
    },
    VariableDeclaration(VariableDeclarationStatement),
    EnhancedFor(EnhancedForStatement),
    /// Statements whose inner structure the tooling tree does not model
    Other { range: SourceRange },
}

impl MirrorStatement {
    fn collect_declarations<'m>(&'m self, found: &mut Vec<&'m dyn MirrorModifiers>) {
        match self {
            MirrorStatement::Block { statements, .. } => {
                for statement in statements {
                    statement.collect_declarations(found);
                }
            }
            MirrorStatement::VariableDeclaration(declaration) => found.push(declaration),
            MirrorStatement::EnhancedFor(foreach) => {
                found.push(&foreach.parameter);
                foreach.body.collect_declarations(found);
            }
            MirrorStatement::Other { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorMethod {
    pub id: MirrorNodeId,
    pub name: SimpleName,
    pub body: Option<Vec<MirrorStatement>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTypeDeclaration {
    pub id: MirrorNodeId,
    pub name: SimpleName,
    pub methods: Vec<MirrorMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorUnit {
    pub types: Vec<MirrorTypeDeclaration>,
}

impl MirrorUnit {
    /// Every variable declaration in the unit, in source order
    pub fn declarations(&self) -> Vec<&dyn MirrorModifiers> {
        let mut found = Vec::new();
        for method in self.types.iter().flat_map(|ty| &ty.methods) {
            for statement in method.body.iter().flatten() {
                statement.collect_declarations(&mut found);
            }
        }
        found
    }

    pub fn declaration(&self, name: &str) -> Option<&dyn MirrorModifiers> {
        self.declarations()
            .into_iter()
            .find(|declaration| declaration.name().identifier == name)
    }
}

/// Node factory for the tooling tree
#[derive(Debug, Clone)]
pub struct MirrorAst {
    level: AstLevel,
    next_id: u32,
}

impl MirrorAst {
    pub fn new(level: AstLevel) -> Self {
        Self { level, next_id: 0 }
    }

    pub fn level(&self) -> AstLevel {
        self.level
    }

    fn next_id(&mut self) -> MirrorNodeId {
        self.next_id += 1;
        MirrorNodeId(self.next_id)
    }

    fn require_modifier_nodes(&self, node: &'static str) -> Result<(), MirrorError> {
        if self.level.supports_modifier_nodes() {
            Ok(())
        } else {
            Err(MirrorError::UnsupportedAtLevel {
                node,
                level: self.level.to_string(),
            })
        }
    }

    pub fn new_simple_name(&mut self, identifier: &str) -> Result<SimpleName, MirrorError> {
        let mut chars = identifier.chars();
        let valid = chars
            .next()
            .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if !valid {
            return Err(MirrorError::InvalidIdentifier {
                identifier: identifier.to_string(),
            });
        }

        Ok(SimpleName {
            id: self.next_id(),
            identifier: identifier.to_string(),
            range: SourceRange::default(),
        })
    }

    pub fn new_qualified_name(&mut self, qualifier: Name, name: SimpleName) -> Name {
        Name::Qualified(QualifiedName {
            id: self.next_id(),
            qualifier: Box::new(qualifier),
            name,
            range: SourceRange::default(),
        })
    }

    /// Simple name for one segment, left-nested qualified names for more
    pub fn new_name(&mut self, segments: &[&str]) -> Result<Name, MirrorError> {
        let (first, rest) = segments.split_first().ok_or(MirrorError::EmptyName)?;
        let mut name = Name::Simple(self.new_simple_name(first)?);
        for segment in rest {
            let simple = self.new_simple_name(segment)?;
            name = self.new_qualified_name(name, simple);
        }
        Ok(name)
    }

    pub fn new_modifier(&mut self, keyword: ModifierKeyword) -> Result<Modifier, MirrorError> {
        self.require_modifier_nodes("Modifier")?;
        Ok(Modifier {
            id: self.next_id(),
            keyword,
            range: SourceRange::default(),
        })
    }

    pub fn new_marker_annotation(&mut self, type_name: Name) -> Result<MarkerAnnotation, MirrorError> {
        self.require_modifier_nodes("MarkerAnnotation")?;
        Ok(MarkerAnnotation {
            id: self.next_id(),
            type_name,
            range: SourceRange::default(),
        })
    }

    pub fn new_type(&mut self, text: String, range: SourceRange) -> MirrorType {
        MirrorType {
            id: self.next_id(),
            text,
            range,
        }
    }
}

/// Builds the tooling tree from a resolved primary AST
pub struct AstConverter<'a> {
    ast: MirrorAst,
    environment: &'a TypeEnvironment,
    hooks: &'a dyn CompilerHooks,
    node_map: IndexMap<MirrorNodeId, NodeId>,
}

impl<'a> AstConverter<'a> {
    pub fn new(
        environment: &'a TypeEnvironment,
        hooks: &'a dyn CompilerHooks,
        level: AstLevel,
    ) -> Self {
        Self {
            ast: MirrorAst::new(level),
            environment,
            hooks,
            node_map: IndexMap::new(),
        }
    }

    pub fn ast(&self) -> &MirrorAst {
        &self.ast
    }

    pub fn ast_mut(&mut self) -> &mut MirrorAst {
        &mut self.ast
    }

    pub fn environment(&self) -> &'a TypeEnvironment {
        self.environment
    }

    /// Remember which primary node a tooling node came from
    pub(crate) fn record_nodes(&mut self, mirror: MirrorNodeId, origin: NodeId) {
        self.node_map.insert(mirror, origin);
    }

    pub fn origin_of(&self, mirror: MirrorNodeId) -> Option<NodeId> {
        self.node_map.get(&mirror).copied()
    }

    pub fn into_node_map(self) -> IndexMap<MirrorNodeId, NodeId> {
        self.node_map
    }

    pub fn convert_unit(&mut self, unit: &CompilationUnit) -> Result<MirrorUnit, MirrorError> {
        let mut types = Vec::new();

        for declaration in &unit.types {
            let mut name = self.ast.new_simple_name(&declaration.name.name)?;
            name.range = declaration.name.span.into();

            let methods = declaration
                .methods
                .iter()
                .map(|method| self.convert_method(method))
                .collect::<Result<Vec<_>, _>>()?;

            types.push(MirrorTypeDeclaration {
                id: self.ast.next_id(),
                name,
                methods,
            });
        }

        Ok(MirrorUnit { types })
    }

    fn convert_method(&mut self, method: &MethodDeclaration) -> Result<MirrorMethod, MirrorError> {
        let mut name = self.ast.new_simple_name(&method.name.name)?;
        name.range = method.name.span.into();
        let body = method
            .body
            .as_ref()
            .map(|body| self.convert_statements(body))
            .transpose()?;

        let id = self.ast.next_id();
        self.record_nodes(id, method.id);
        Ok(MirrorMethod { id, name, body })
    }

    fn convert_statements(&mut self, block: &Block) -> Result<Vec<MirrorStatement>, MirrorError> {
        block
            .statements
            .iter()
            .map(|statement| self.convert_statement(statement))
            .collect()
    }

    fn convert_statement(&mut self, statement: &Statement) -> Result<MirrorStatement, MirrorError> {
        Ok(match &statement.kind {
            StatementKind::Local(declaration) => {
                MirrorStatement::VariableDeclaration(self.convert_local(declaration)?)
            }
            StatementKind::ForEach(foreach) => {
                MirrorStatement::EnhancedFor(self.convert_foreach(foreach)?)
            }
            StatementKind::Block(block) => MirrorStatement::Block {
                statements: self.convert_statements(block)?,
                range: block.span.into(),
            },
            StatementKind::Return(_) | StatementKind::Expression(_) | StatementKind::Empty => {
                MirrorStatement::Other {
                    range: statement.span.into(),
                }
            }
        })
    }

    fn convert_local(
        &mut self,
        declaration: &LocalDeclaration,
    ) -> Result<VariableDeclarationStatement, MirrorError> {
        let mut name = self.ast.new_simple_name(&declaration.name.name)?;
        name.range = declaration.name.span.into();

        let mut converted = VariableDeclarationStatement {
            id: self.ast.next_id(),
            modifiers: self.ast.level.supports_modifier_nodes().then(Vec::new),
            var_type: self.convert_type(&declaration.type_ref),
            name,
            initializer_range: declaration
                .initialization
                .as_ref()
                .map(|initialization| initialization.span.into()),
            range: declaration.span.into(),
        };
        self.record_nodes(converted.id, declaration.id);
        self.set_modifiers(&mut converted, declaration)?;

        Ok(converted)
    }

    fn convert_foreach(
        &mut self,
        foreach: &ForeachStatement,
    ) -> Result<EnhancedForStatement, MirrorError> {
        let variable = &foreach.element_variable;
        let mut name = self.ast.new_simple_name(&variable.name.name)?;
        name.range = variable.name.span.into();

        let mut parameter = SingleVariableDeclaration {
            id: self.ast.next_id(),
            modifiers: self.ast.level.supports_modifier_nodes().then(Vec::new),
            var_type: self.convert_type(&variable.type_ref),
            name,
            range: variable.span.into(),
        };
        self.record_nodes(parameter.id, variable.id);
        self.set_modifiers(&mut parameter, variable)?;

        let body = self.convert_statement(&foreach.body)?;
        let id = self.ast.next_id();
        self.record_nodes(id, foreach.id);

        Ok(EnhancedForStatement {
            id,
            parameter,
            expression_range: foreach
                .collection
                .as_ref()
                .map(|collection| collection.span.into()),
            body: Box::new(body),
            range: foreach.span.into(),
        })
    }

    /// Convert the modifiers written in source, then let the hooks adjust the result
    fn set_modifiers(
        &mut self,
        target: &mut dyn MirrorModifiers,
        declaration: &LocalDeclaration,
    ) -> Result<(), MirrorError> {
        if target.modifiers().is_some() {
            for modifier in &declaration.source_modifiers {
                let converted = match modifier {
                    SourceModifier::Final(span) => {
                        let mut node = self.ast.new_modifier(ModifierKeyword::Final)?;
                        node.range = (*span).into();
                        ExtendedModifier::Modifier(node)
                    }
                    SourceModifier::Annotation(id) => {
                        let Some(annotation) = declaration.annotation(*id) else {
                            continue;
                        };
                        let mut type_name = self.ast.new_name(&annotation.type_ref.tokens())?;
                        type_name.set_range(annotation.type_ref.span.into());
                        let mut node = self.ast.new_marker_annotation(type_name)?;
                        node.range = annotation.span.into();
                        self.record_nodes(node.id, annotation.id);
                        ExtendedModifier::Annotation(node)
                    }
                };

                if let Some(modifiers) = target.modifiers_mut() {
                    modifiers.push(converted);
                }
            }
        }

        let hooks = self.hooks;
        hooks.after_set_modifiers(self, target, declaration)
    }

    fn convert_type(&mut self, reference: &TypeReference) -> MirrorType {
        let text = match &reference.kind {
            TypeReferenceKind::Resolved(binding) => self.environment.display(binding),
            _ => render_reference(reference),
        };
        self.ast.new_type(text, reference.span.into())
    }
}

/// Source text of an unresolved type reference
fn render_reference(reference: &TypeReference) -> String {
    let (base, arguments, dimensions) = match &reference.kind {
        TypeReferenceKind::Simple {
            token,
            arguments,
            dimensions,
        } => (token.clone(), arguments, *dimensions),
        TypeReferenceKind::Qualified {
            tokens,
            arguments,
            dimensions,
        } => (tokens.join("."), arguments, *dimensions),
        TypeReferenceKind::Resolved(_) => return String::new(),
    };

    let mut text = base;
    if !arguments.is_empty() {
        let rendered: Vec<_> = arguments.iter().map(render_reference).collect();
        text.push('<');
        text.push_str(&rendered.join(", "));
        text.push('>');
    }
    text.push_str(&"[]".repeat(dimensions));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoHooks;
    use crate::parser::SourceParser;
    use crate::profile::ParseMode;

    const SOURCE: &str = r#"
        class Sample {
            void run() {
                final @Deprecated java.util.List<String> names = null;
                for (final String name : names) { }
            }
        }
    "#;

    fn convert(level: AstLevel) -> MirrorUnit {
        let unit = SourceParser::new(ParseMode::Full, &NoHooks)
            .parse_unit(SOURCE, None)
            .unwrap();
        let env = TypeEnvironment::bootstrap();
        let mut converter = AstConverter::new(&env, &NoHooks, level);
        converter.convert_unit(&unit).unwrap()
    }

    #[test]
    fn test_source_modifiers_are_converted_in_order() {
        let unit = convert(AstLevel::Jls8);
        let names = unit.declaration("names").unwrap();
        let modifiers = names.modifiers().unwrap();

        assert_eq!(modifiers.len(), 2);
        assert!(matches!(
            &modifiers[0],
            ExtendedModifier::Modifier(Modifier {
                keyword: ModifierKeyword::Final,
                ..
            })
        ));
        match &modifiers[1] {
            ExtendedModifier::Annotation(annotation) => {
                assert_eq!(annotation.type_name.fully_qualified_name(), "Deprecated")
            }
            other => panic!("expected an annotation, got {other:?}"),
        }
        assert_eq!(names.var_type().text, "java.util.List<String>");
    }

    #[test]
    fn test_enhanced_for_parameter_is_a_declaration() {
        let unit = convert(AstLevel::Jls3);
        let name = unit.declaration("name").unwrap();
        assert_eq!(name.modifiers().map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_jls2_has_no_modifier_nodes() {
        let unit = convert(AstLevel::Jls2);
        assert!(unit.declaration("names").unwrap().modifiers().is_none());

        let mut ast = MirrorAst::new(AstLevel::Jls2);
        assert!(matches!(
            ast.new_modifier(ModifierKeyword::Final),
            Err(MirrorError::UnsupportedAtLevel { .. })
        ));
    }

    #[test]
    fn test_names_nest_to_the_left() {
        let mut ast = MirrorAst::new(AstLevel::Jls8);
        let name = ast.new_name(&["lombok", "val"]).unwrap();

        assert_eq!(name.fully_qualified_name(), "lombok.val");
        assert_eq!(name.node_ids().len(), 3);
        assert!(ast.new_name(&[]).is_err());
        assert!(ast.new_simple_name("not valid").is_err());
    }
}
