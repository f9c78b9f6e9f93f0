// valinfer host type system
// Type bindings, the class table and the supertype lattice

use crate::ast::{
    CompilationUnit, MethodDeclaration, Span, TypeDeclarationKind, TypeReference,
    TypeReferenceKind,
};
use crate::bootstrap;
use crate::error::ResolveError;
use indexmap::IndexMap;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashSet;

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const ITERABLE: &str = "java.lang.Iterable";

/// Identity of a declared class, interface or annotation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(NodeIndex);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(PrimitiveType::Boolean),
            "byte" => Some(PrimitiveType::Byte),
            "short" => Some(PrimitiveType::Short),
            "char" => Some(PrimitiveType::Char),
            "int" => Some(PrimitiveType::Int),
            "long" => Some(PrimitiveType::Long),
            "float" => Some(PrimitiveType::Float),
            "double" => Some(PrimitiveType::Double),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Qualified name of the wrapper class
    pub fn box_class(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }

    /// Widening primitive conversion (identity included)
    pub fn widens_to(&self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;

        if *self == target {
            return true;
        }

        matches!(
            (self, target),
            (Byte, Short | Int | Long | Float | Double)
                | (Short, Int | Long | Float | Double)
                | (Char, Int | Long | Float | Double)
                | (Int, Long | Float | Double)
                | (Long, Float | Double)
                | (Float, Double)
        )
    }

    /// Binary numeric promotion
    pub fn promote(left: PrimitiveType, right: PrimitiveType) -> Option<PrimitiveType> {
        use PrimitiveType::*;

        if !left.is_numeric() || !right.is_numeric() {
            return None;
        }

        Some(match (left, right) {
            (Double, _) | (_, Double) => Double,
            (Float, _) | (_, Float) => Float,
            (Long, _) | (_, Long) => Long,
            _ => Int,
        })
    }
}

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeBinding {
    Primitive(PrimitiveType),
    /// Type of the `null` literal
    Null,
    /// Non-generic class, or a raw use of a generic class
    Class(TypeId),
    /// A generic class seen from inside its own declaration, e.g. `this` in `Bag<T>`
    Generic(TypeId),
    Parameterized {
        ty: TypeId,
        arguments: Vec<TypeBinding>,
    },
    TypeVariable {
        declaring: TypeId,
        index: usize,
    },
    Array(Box<TypeBinding>),
    /// Local type introduced by an anonymous class body
    Anonymous {
        serial: u32,
        supertype: Box<TypeBinding>,
    },
}

impl TypeBinding {
    pub fn array_of(element: TypeBinding) -> Self {
        TypeBinding::Array(Box::new(element))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeBinding::Array(_))
    }

    /// Class, interface, type variable or anonymous type
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            TypeBinding::Class(_)
                | TypeBinding::Generic(_)
                | TypeBinding::Parameterized { .. }
                | TypeBinding::TypeVariable { .. }
                | TypeBinding::Anonymous { .. }
        )
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            TypeBinding::Class(id) | TypeBinding::Generic(id) => Some(*id),
            TypeBinding::Parameterized { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&TypeBinding> {
        match self {
            TypeBinding::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Replace the type variables of `declaring` with `arguments`
    pub fn substitute(&self, declaring: TypeId, arguments: &[TypeBinding]) -> TypeBinding {
        match self {
            TypeBinding::TypeVariable {
                declaring: owner,
                index,
            } if *owner == declaring => arguments
                .get(*index)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeBinding::Parameterized {
                ty,
                arguments: inner,
            } => TypeBinding::Parameterized {
                ty: *ty,
                arguments: inner
                    .iter()
                    .map(|argument| argument.substitute(declaring, arguments))
                    .collect(),
            },
            TypeBinding::Array(element) => {
                TypeBinding::array_of(element.substitute(declaring, arguments))
            }
            other => other.clone(),
        }
    }
}

/// Class table entry
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub package: String,
    pub name: String,
    pub kind: TypeDeclarationKind,
    pub type_parameters: Vec<String>,
    pub methods: Vec<MethodSignature>,
}

impl ClassInfo {
    pub fn qualified_name(&self) -> String {
        qualify(&self.package, &self.name)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: String,
    pub parameters: Vec<TypeBinding>,
    /// `None` for `void`
    pub return_type: Option<TypeBinding>,
}

/// Method found by member lookup, with its return type seen through the receiver
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBinding {
    pub declaring: TypeId,
    pub return_type: Option<TypeBinding>,
}

/// Edge from a type to one of its direct supertypes
#[derive(Debug, Clone)]
struct SupertypeEdge {
    /// Declaration order: superclass first, then interfaces as written
    order: usize,
    /// Type arguments of the supertype, in terms of the subtype's type variables
    arguments: Vec<TypeBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLookupError {
    Unknown {
        name: String,
    },
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
}

impl TypeLookupError {
    pub fn into_resolve_error(self, span: Span) -> ResolveError {
        match self {
            TypeLookupError::Unknown { name } => ResolveError::UnknownType {
                name,
                span: span.into(),
            },
            TypeLookupError::ArgumentCount {
                name,
                expected,
                found,
            } => ResolveError::TypeArgumentCount {
                name,
                expected,
                found,
                span: span.into(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct ImportEntry {
    path: String,
    on_demand: bool,
}

/// Everything needed to bind a type name: package, imports, type variables in scope
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    package: String,
    imports: Vec<ImportEntry>,
    type_variables: Vec<(String, TypeBinding)>,
}

impl TypeContext {
    pub fn for_unit(unit: &CompilationUnit) -> Self {
        Self {
            package: unit.package_name(),
            imports: unit
                .imports
                .iter()
                .map(|import| ImportEntry {
                    path: import.name.to_dotted(),
                    on_demand: import.on_demand,
                })
                .collect(),
            type_variables: Vec::new(),
        }
    }

    pub fn with_type_variables(&self, declaring: TypeId, names: &[String]) -> Self {
        let mut context = self.clone();
        for (index, name) in names.iter().enumerate() {
            context
                .type_variables
                .push((name.clone(), TypeBinding::TypeVariable { declaring, index }));
        }
        context
    }

    pub fn package(&self) -> &str {
        &self.package
    }
}

pub(crate) fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

/// Class table plus the supertype lattice
#[derive(Debug, Clone, Default)]
pub(crate) struct ClassTable {
    graph: DiGraph<ClassInfo, SupertypeEdge>,
    by_name: IndexMap<String, TypeId>,
}

impl ClassTable {
    pub(crate) fn lookup(&self, qualified: &str) -> Option<TypeId> {
        self.by_name.get(qualified).copied()
    }

    fn class(&self, id: TypeId) -> &ClassInfo {
        &self.graph[id.0]
    }

    /// Declare every type of `units`, then bind their supertypes and method signatures
    pub(crate) fn declare_units(
        &mut self,
        units: &[&CompilationUnit],
    ) -> Result<(), Vec<ResolveError>> {
        let mut errors = Vec::new();
        let mut declared = Vec::new();

        // First pass: names only, so declarations can refer to each other in any order
        for unit in units {
            let package = unit.package_name();
            let context = TypeContext::for_unit(unit);

            for declaration in &unit.types {
                let qualified = qualify(&package, &declaration.name.name);
                if self.by_name.contains_key(&qualified) {
                    errors.push(ResolveError::DuplicateType {
                        name: qualified,
                        span: declaration.name.span.into(),
                    });
                    continue;
                }

                let node = self.graph.add_node(ClassInfo {
                    package: package.clone(),
                    name: declaration.name.name.clone(),
                    kind: declaration.kind,
                    type_parameters: declaration
                        .type_parameters
                        .iter()
                        .map(|parameter| parameter.name.clone())
                        .collect(),
                    methods: Vec::new(),
                });
                let id = TypeId(node);
                self.by_name.insert(qualified, id);
                declared.push((id, declaration, context.clone()));
            }
        }

        // Second pass: supertypes and members
        let object = self.lookup(OBJECT);
        for (id, declaration, unit_context) in declared {
            let parameters = self.class(id).type_parameters.clone();
            let context = unit_context.with_type_variables(id, &parameters);
            let mut order = 0;

            match &declaration.superclass {
                Some(superclass) => {
                    self.add_supertype(id, superclass, &context, &mut order, &mut errors)
                }
                None if declaration.kind == TypeDeclarationKind::Class => {
                    if let Some(object) = object.filter(|object| *object != id) {
                        self.graph.add_edge(
                            id.0,
                            object.0,
                            SupertypeEdge {
                                order,
                                arguments: Vec::new(),
                            },
                        );
                        order += 1;
                    }
                }
                None => {}
            }

            for interface in &declaration.interfaces {
                self.add_supertype(id, interface, &context, &mut order, &mut errors);
            }

            let methods = declaration
                .methods
                .iter()
                .map(|method| self.method_signature(method, &context, &mut errors))
                .collect();
            self.graph[id.0].methods = methods;
        }

        if let Err(cycle) = algo::toposort(&self.graph, None) {
            let class = &self.graph[cycle.node_id()];
            errors.push(ResolveError::CyclicInheritance {
                name: class.qualified_name(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn add_supertype(
        &mut self,
        id: TypeId,
        reference: &TypeReference,
        context: &TypeContext,
        order: &mut usize,
        errors: &mut Vec<ResolveError>,
    ) {
        let binding = match self.resolve_reference(reference, context) {
            Ok(binding) => binding,
            Err(error) => {
                errors.push(error.into_resolve_error(reference.span));
                return;
            }
        };

        let (target, arguments) = match binding {
            TypeBinding::Class(target) => (target, Vec::new()),
            TypeBinding::Parameterized { ty, arguments } => (ty, arguments),
            _ => {
                errors.push(ResolveError::InvalidSupertype {
                    name: reference.tokens().join("."),
                    span: reference.span.into(),
                });
                return;
            }
        };

        self.graph.add_edge(
            id.0,
            target.0,
            SupertypeEdge {
                order: *order,
                arguments,
            },
        );
        *order += 1;
    }

    fn method_signature(
        &self,
        method: &MethodDeclaration,
        context: &TypeContext,
        errors: &mut Vec<ResolveError>,
    ) -> MethodSignature {
        let mut bind = |reference: &TypeReference| match self.resolve_reference(reference, context)
        {
            Ok(binding) => Some(binding),
            Err(error) => {
                errors.push(error.into_resolve_error(reference.span));
                None
            }
        };

        let parameters = method
            .parameters
            .iter()
            .filter_map(|parameter| bind(&parameter.type_ref))
            .collect();
        let return_type = method.return_type.as_ref().and_then(&mut bind);

        MethodSignature {
            name: method.name.name.clone(),
            parameters,
            return_type,
        }
    }

    /// Supertype edges of `id` in declaration order
    fn supertypes(&self, id: TypeId) -> Vec<(TypeId, &SupertypeEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edges(id.0)
            .map(|edge| (TypeId(edge.target()), edge.weight()))
            .collect();
        edges.sort_by_key(|(_, edge)| edge.order);
        edges
    }

    pub(crate) fn resolve_reference(
        &self,
        reference: &TypeReference,
        context: &TypeContext,
    ) -> Result<TypeBinding, TypeLookupError> {
        let (base, name, arguments, dimensions) = match &reference.kind {
            TypeReferenceKind::Resolved(binding) => return Ok(binding.clone()),
            TypeReferenceKind::Simple {
                token,
                arguments,
                dimensions,
            } => {
                let base = match PrimitiveType::from_keyword(token) {
                    Some(primitive) => TypeBinding::Primitive(primitive),
                    None => self.lookup_simple(token, context).ok_or_else(|| {
                        TypeLookupError::Unknown {
                            name: token.clone(),
                        }
                    })?,
                };
                (base, token.clone(), arguments, *dimensions)
            }
            TypeReferenceKind::Qualified {
                tokens,
                arguments,
                dimensions,
            } => {
                let name = tokens.join(".");
                let id = self
                    .lookup(&name)
                    .ok_or_else(|| TypeLookupError::Unknown { name: name.clone() })?;
                (TypeBinding::Class(id), name, arguments, *dimensions)
            }
        };

        let mut binding = self.apply_arguments(base, &name, arguments, context)?;
        for _ in 0..dimensions {
            binding = TypeBinding::array_of(binding);
        }
        Ok(binding)
    }

    fn apply_arguments(
        &self,
        base: TypeBinding,
        name: &str,
        arguments: &[TypeReference],
        context: &TypeContext,
    ) -> Result<TypeBinding, TypeLookupError> {
        if arguments.is_empty() {
            return Ok(base);
        }

        let expected = match &base {
            TypeBinding::Class(id) => self.class(*id).type_parameters.len(),
            _ => 0,
        };
        let TypeBinding::Class(id) = base else {
            return Err(TypeLookupError::ArgumentCount {
                name: name.to_string(),
                expected,
                found: arguments.len(),
            });
        };
        if expected != arguments.len() {
            return Err(TypeLookupError::ArgumentCount {
                name: name.to_string(),
                expected,
                found: arguments.len(),
            });
        }

        let arguments = arguments
            .iter()
            .map(|argument| self.resolve_reference(argument, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeBinding::Parameterized { ty: id, arguments })
    }

    /// Type variables, single-type imports, the current package, then on-demand imports
    /// (`java.lang.*` implicitly last)
    fn lookup_simple(&self, name: &str, context: &TypeContext) -> Option<TypeBinding> {
        if let Some((_, binding)) = context
            .type_variables
            .iter()
            .rev()
            .find(|(variable, _)| variable == name)
        {
            return Some(binding.clone());
        }

        let single_import = context
            .imports
            .iter()
            .filter(|import| !import.on_demand)
            .find(|import| import.path.rsplit('.').next() == Some(name))
            .and_then(|import| self.lookup(&import.path));

        single_import
            .or_else(|| self.lookup(&qualify(&context.package, name)))
            .or_else(|| {
                context
                    .imports
                    .iter()
                    .filter(|import| import.on_demand)
                    .find_map(|import| self.lookup(&format!("{}.{name}", import.path)))
            })
            .or_else(|| self.lookup(&format!("java.lang.{name}")))
            .map(TypeBinding::Class)
    }
}

/// The class table of one compilation, seeded with the bootstrap library
#[derive(Debug, Clone)]
pub struct TypeEnvironment {
    table: ClassTable,
    object: TypeId,
    iterable: TypeId,
    string: TypeId,
}

impl TypeEnvironment {
    /// A fresh environment containing the bootstrap library
    pub fn bootstrap() -> Self {
        bootstrap::environment().clone()
    }

    pub(crate) fn from_table(table: ClassTable) -> Result<Self, TypeLookupError> {
        let require = |name: &str| {
            table.lookup(name).ok_or_else(|| TypeLookupError::Unknown {
                name: name.to_string(),
            })
        };
        let object = require(OBJECT)?;
        let iterable = require(ITERABLE)?;
        let string = require(STRING)?;

        Ok(Self {
            table,
            object,
            iterable,
            string,
        })
    }

    /// Add the types declared by a user compilation unit
    pub fn declare_unit(&mut self, unit: &CompilationUnit) -> Result<(), Vec<ResolveError>> {
        self.table.declare_units(&[unit])
    }

    pub fn lookup(&self, qualified: &str) -> Option<TypeId> {
        self.table.lookup(qualified)
    }

    pub fn class(&self, id: TypeId) -> &ClassInfo {
        self.table.class(id)
    }

    pub fn resolve_reference(
        &self,
        reference: &TypeReference,
        context: &TypeContext,
    ) -> Result<TypeBinding, TypeLookupError> {
        self.table.resolve_reference(reference, context)
    }

    pub fn object_type(&self) -> TypeBinding {
        TypeBinding::Class(self.object)
    }

    pub fn string_type(&self) -> TypeBinding {
        TypeBinding::Class(self.string)
    }

    pub fn iterable_id(&self) -> TypeId {
        self.iterable
    }

    /// `Generic(id)` for generic classes, `Class(id)` otherwise
    pub fn declared_type(&self, id: TypeId) -> TypeBinding {
        if self.class(id).is_generic() {
            TypeBinding::Generic(id)
        } else {
            TypeBinding::Class(id)
        }
    }

    /// Formal type variables of a class, in declaration order
    pub fn type_variables(&self, id: TypeId) -> Vec<TypeBinding> {
        (0..self.class(id).type_parameters.len())
            .map(|index| TypeBinding::TypeVariable {
                declaring: id,
                index,
            })
            .collect()
    }

    pub fn qualified_package_name(&self, binding: &TypeBinding) -> Option<&str> {
        binding
            .type_id()
            .map(|id| self.class(id).package.as_str())
    }

    pub fn source_name(&self, binding: &TypeBinding) -> Option<&str> {
        binding.type_id().map(|id| self.class(id).name.as_str())
    }

    pub fn erasure(&self, binding: &TypeBinding) -> TypeBinding {
        match binding {
            TypeBinding::Generic(id) | TypeBinding::Parameterized { ty: id, .. } => {
                TypeBinding::Class(*id)
            }
            TypeBinding::TypeVariable { .. } => self.object_type(),
            TypeBinding::Array(element) => TypeBinding::array_of(self.erasure(element)),
            TypeBinding::Anonymous { supertype, .. } => self.erasure(supertype),
            other => other.clone(),
        }
    }

    /// Walk the supertype lattice of `binding` depth-first, in declaration order, and return
    /// the first supertype whose declaration is `target`, instantiated as seen from `binding`.
    ///
    /// When several paths lead to `target` the first one found wins.
    pub fn find_super_type_originating_from(
        &self,
        binding: &TypeBinding,
        target: TypeId,
    ) -> Option<TypeBinding> {
        let mut visited = HashSet::new();
        self.search_supertypes(binding, target, &mut visited)
    }

    fn search_supertypes(
        &self,
        binding: &TypeBinding,
        target: TypeId,
        visited: &mut HashSet<TypeId>,
    ) -> Option<TypeBinding> {
        if let TypeBinding::Anonymous { supertype, .. } = binding {
            return self.search_supertypes(supertype, target, visited);
        }

        let id = binding.type_id()?;
        if id == target {
            return Some(binding.clone());
        }
        if !visited.insert(id) {
            return None;
        }

        for (supertype_id, edge) in self.table.supertypes(id) {
            let supertype = self.instantiate_supertype(binding, supertype_id, &edge.arguments);
            if let Some(found) = self.search_supertypes(&supertype, target, visited) {
                return Some(found);
            }
        }

        None
    }

    fn instantiate_supertype(
        &self,
        subtype: &TypeBinding,
        supertype: TypeId,
        arguments: &[TypeBinding],
    ) -> TypeBinding {
        if arguments.is_empty() {
            return TypeBinding::Class(supertype);
        }

        match subtype {
            // Raw use of a generic class: the supertypes are raw as well
            TypeBinding::Class(id) if self.class(*id).is_generic() => TypeBinding::Class(supertype),
            TypeBinding::Parameterized {
                ty,
                arguments: actual,
            } => TypeBinding::Parameterized {
                ty: supertype,
                arguments: arguments
                    .iter()
                    .map(|argument| argument.substitute(*ty, actual))
                    .collect(),
            },
            _ => TypeBinding::Parameterized {
                ty: supertype,
                arguments: arguments.to_vec(),
            },
        }
    }

    /// `binding` followed by all of its supertypes, depth-first in declaration order
    pub fn supertype_closure(&self, binding: &TypeBinding) -> Vec<TypeBinding> {
        let mut closure = Vec::new();
        let mut visited = HashSet::new();
        self.collect_supertypes(binding, &mut closure, &mut visited);
        closure
    }

    fn collect_supertypes(
        &self,
        binding: &TypeBinding,
        closure: &mut Vec<TypeBinding>,
        visited: &mut HashSet<TypeId>,
    ) {
        if let TypeBinding::Anonymous { supertype, .. } = binding {
            self.collect_supertypes(supertype, closure, visited);
            return;
        }

        let Some(id) = binding.type_id() else {
            return;
        };
        if !visited.insert(id) {
            return;
        }

        closure.push(binding.clone());
        for (supertype_id, edge) in self.table.supertypes(id) {
            let supertype = self.instantiate_supertype(binding, supertype_id, &edge.arguments);
            self.collect_supertypes(&supertype, closure, visited);
        }
    }

    /// Find a method by name and arity on `receiver` or its supertypes
    pub fn find_method(
        &self,
        receiver: &TypeBinding,
        name: &str,
        arity: usize,
    ) -> Option<MethodBinding> {
        let receiver = match receiver {
            TypeBinding::TypeVariable { .. } | TypeBinding::Array(_) => self.object_type(),
            TypeBinding::Primitive(_) | TypeBinding::Null => return None,
            other => other.clone(),
        };

        let mut closure = self.supertype_closure(&receiver);
        if !closure.iter().any(|ty| ty.type_id() == Some(self.object)) {
            // Interfaces still answer Object's methods
            closure.push(self.object_type());
        }

        closure.iter().find_map(|instantiation| {
            let id = instantiation.type_id()?;
            let method = self
                .class(id)
                .methods
                .iter()
                .find(|method| method.name == name && method.parameters.len() == arity)?;

            Some(MethodBinding {
                declaring: id,
                return_type: method
                    .return_type
                    .as_ref()
                    .map(|return_type| self.member_type(instantiation, return_type)),
            })
        })
    }

    /// Type of a member declared on `owner`'s class, seen through `owner`
    fn member_type(&self, owner: &TypeBinding, member: &TypeBinding) -> TypeBinding {
        match owner {
            TypeBinding::Parameterized { ty, arguments } => member.substitute(*ty, arguments),
            TypeBinding::Class(id) if self.class(*id).is_generic() => self.erasure(member),
            _ => member.clone(),
        }
    }

    /// Element type when iterating over `collection` in an enhanced for
    pub fn iteration_element(&self, collection: &TypeBinding) -> Option<TypeBinding> {
        if let TypeBinding::Array(element) = collection {
            return Some((**element).clone());
        }

        match self.find_super_type_originating_from(collection, self.iterable)? {
            TypeBinding::Parameterized { arguments, .. } => arguments.into_iter().next(),
            TypeBinding::Generic(id) => self.type_variables(id).into_iter().next(),
            _ => Some(self.object_type()),
        }
    }

    /// Assignment compatibility, including widening, boxing and unchecked raw conversion
    pub fn is_assignable(&self, from: &TypeBinding, to: &TypeBinding) -> bool {
        if from == to || *to == self.object_type() {
            return true;
        }

        match (from, to) {
            (TypeBinding::Null, to) => to.is_reference() || to.is_array(),
            (TypeBinding::Primitive(from), TypeBinding::Primitive(to)) => from.widens_to(*to),
            (TypeBinding::Primitive(primitive), to) => {
                to.type_id().is_some() && self.lookup(primitive.box_class()) == to.type_id()
            }
            (from, TypeBinding::Primitive(primitive)) => {
                from.type_id().is_some() && self.lookup(primitive.box_class()) == from.type_id()
            }
            (TypeBinding::Array(from), TypeBinding::Array(to)) => match (&**from, &**to) {
                (TypeBinding::Primitive(_), _) | (_, TypeBinding::Primitive(_)) => from == to,
                (from, to) => self.is_assignable(from, to),
            },
            (from, to) => {
                let Some(target) = to.type_id() else {
                    return false;
                };
                let Some(found) = self.find_super_type_originating_from(from, target) else {
                    return false;
                };

                match (to, found) {
                    (TypeBinding::Parameterized { arguments, .. }, TypeBinding::Parameterized {
                        arguments: found,
                        ..
                    }) => *arguments == found,
                    // Raw source, unchecked conversion
                    (TypeBinding::Parameterized { .. }, TypeBinding::Class(_)) => true,
                    (TypeBinding::Parameterized { .. }, _) => false,
                    _ => true,
                }
            }
        }
    }

    /// Human readable rendering with qualified names
    pub fn display(&self, binding: &TypeBinding) -> String {
        match binding {
            TypeBinding::Primitive(primitive) => primitive.keyword().to_string(),
            TypeBinding::Null => "null".to_string(),
            TypeBinding::Class(id) => self.class(*id).qualified_name(),
            TypeBinding::Generic(id) => {
                let class = self.class(*id);
                format!(
                    "{}<{}>",
                    class.qualified_name(),
                    class.type_parameters.join(", ")
                )
            }
            TypeBinding::Parameterized { ty, arguments } => format!(
                "{}<{}>",
                self.class(*ty).qualified_name(),
                arguments
                    .iter()
                    .map(|argument| self.display(argument))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            TypeBinding::TypeVariable { declaring, index } => self
                .class(*declaring)
                .type_parameters
                .get(*index)
                .cloned()
                .unwrap_or_else(|| format!("T{index}")),
            TypeBinding::Array(element) => format!("{}[]", self.display(element)),
            TypeBinding::Anonymous { serial, supertype } => {
                format!("<anonymous {} #{serial}>", self.display(supertype))
            }
        }
    }
}
