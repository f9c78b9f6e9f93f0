// valinfer host AST definitions
// Primary AST produced by the parser and mutated in place by resolution

use crate::types::TypeBinding;
use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

/// Source position information for AST nodes (byte offsets, end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both spans
    pub fn merge(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.start.into(), span.len())
    }
}

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a primary AST node, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Allocate a new node identity. Used by the parser and by anything that synthesizes nodes.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top-level compilation unit (one source file)
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub package: Option<QualifiedName>,
    pub imports: Vec<ImportDeclaration>,
    pub types: Vec<TypeDeclaration>,
    pub source_file: Option<String>,
    pub span: Span,
}

impl CompilationUnit {
    /// Dotted package name, empty for the default package
    pub fn package_name(&self) -> String {
        self.package
            .as_ref()
            .map(|name| name.to_dotted())
            .unwrap_or_default()
    }
}

/// Dotted name such as `java.util` or `lombok.val`
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub segments: Vec<Identifier>,
    pub span: Span,
}

impl QualifiedName {
    pub fn to_dotted(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn last(&self) -> Option<&Identifier> {
        self.segments.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub name: QualifiedName,
    /// `import a.b.*;`
    pub on_demand: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDeclarationKind {
    Class,
    Interface,
    Annotation,
}

/// Class, interface or annotation type declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub kind: TypeDeclarationKind,
    pub name: Identifier,
    pub type_parameters: Vec<Identifier>,
    /// `extends` of a class
    pub superclass: Option<TypeReference>,
    /// `implements` of a class, `extends` of an interface
    pub interfaces: Vec<TypeReference>,
    pub methods: Vec<MethodDeclaration>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDeclaration {
    pub id: NodeId,
    /// `None` for `void`
    pub return_type: Option<TypeReference>,
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    /// `None` for abstract and interface methods
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub type_ref: TypeReference,
    pub name: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Local(LocalDeclaration),
    ForEach(ForeachStatement),
    Block(Block),
    Return(Option<Arc<Expression>>),
    Expression(Arc<Expression>),
    Empty,
}

/// Modifier bit-set of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const FINAL: Modifiers = Modifiers(0x0010);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }
}

/// A modifier exactly as written in the source, in source order.
///
/// Resolution may add modifiers and annotations to a declaration; those never show up here.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceModifier {
    Final(Span),
    /// Refers to an entry of the declaration's annotation list
    Annotation(NodeId),
}

/// Marker annotation such as `@val` or `@lombok.val`
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: NodeId,
    pub type_ref: TypeReference,
    pub span: Span,
}

impl Annotation {
    pub fn marker(type_ref: TypeReference, span: Span) -> Self {
        Self {
            id: NodeId::fresh(),
            type_ref,
            span,
        }
    }
}

/// Fields appended onto a declaration node by an installed patch.
///
/// The storage exists on every node, but it is only reachable through a
/// [`FieldHandle`](crate::profile::FieldHandle), which the host hands out for fields
/// that were actually appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectedFields {
    pub(crate) values: IndexMap<&'static str, Arc<Expression>>,
}

/// Local variable declaration, also used for the element variable of an enhanced for
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDeclaration {
    pub id: NodeId,
    pub name: Identifier,
    pub type_ref: TypeReference,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub source_modifiers: Vec<SourceModifier>,
    pub initialization: Option<Arc<Expression>>,
    pub injected: InjectedFields,
    /// Type of the local once resolution declared it
    pub binding: Option<TypeBinding>,
    pub span: Span,
}

impl LocalDeclaration {
    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    pub fn annotation(&self, id: NodeId) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }
}

/// `for (T x : collection) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForeachStatement {
    pub id: NodeId,
    pub element_variable: LocalDeclaration,
    pub collection: Option<Arc<Expression>>,
    pub body: Box<Statement>,
    pub span: Span,
}

/// Reference to a type as written, or as substituted by resolution
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub id: NodeId,
    pub kind: TypeReferenceKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeReferenceKind {
    /// Single name token, e.g. `String`, `int`, `List<String>[]`
    Simple {
        token: String,
        arguments: Vec<TypeReference>,
        dimensions: usize,
    },
    /// Dotted name, e.g. `java.util.List<String>`
    Qualified {
        tokens: Vec<String>,
        arguments: Vec<TypeReference>,
        dimensions: usize,
    },
    /// Already bound to a concrete type
    Resolved(TypeBinding),
}

impl TypeReference {
    pub fn simple(token: impl Into<String>, span: Span) -> Self {
        Self {
            id: NodeId::fresh(),
            kind: TypeReferenceKind::Simple {
                token: token.into(),
                arguments: Vec::new(),
                dimensions: 0,
            },
            span,
        }
    }

    pub fn qualified(tokens: &[&str], span: Span) -> Self {
        Self {
            id: NodeId::fresh(),
            kind: TypeReferenceKind::Qualified {
                tokens: tokens.iter().map(|token| token.to_string()).collect(),
                arguments: Vec::new(),
                dimensions: 0,
            },
            span,
        }
    }

    pub fn resolved(binding: TypeBinding, span: Span) -> Self {
        Self {
            id: NodeId::fresh(),
            kind: TypeReferenceKind::Resolved(binding),
            span,
        }
    }

    pub fn binding(&self) -> Option<&TypeBinding> {
        match &self.kind {
            TypeReferenceKind::Resolved(binding) => Some(binding),
            _ => None,
        }
    }

    /// Name tokens of an unresolved reference
    pub fn tokens(&self) -> Vec<&str> {
        match &self.kind {
            TypeReferenceKind::Simple { token, .. } => vec![token.as_str()],
            TypeReferenceKind::Qualified { tokens, .. } => {
                tokens.iter().map(String::as_str).collect()
            }
            TypeReferenceKind::Resolved(_) => Vec::new(),
        }
    }
}

/// Simple identifiers (variables, methods, types)
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Expression node with its resolved-type slot
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub kind: ExpressionKind,
    pub span: Span,
    resolution: OnceLock<Option<TypeBinding>>,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
            span,
            resolution: OnceLock::new(),
        }
    }

    /// Outcome of the first resolution, if resolution has run.
    ///
    /// `Some(None)` means resolution ran and produced no type.
    pub fn resolution(&self) -> Option<&Option<TypeBinding>> {
        self.resolution.get()
    }

    pub fn resolved_type(&self) -> Option<&TypeBinding> {
        self.resolution.get().and_then(Option::as_ref)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.get().is_some()
    }

    /// Store the outcome of resolving this expression.
    ///
    /// The slot is written once; later outcomes are dropped and `false` is returned.
    pub fn record_resolution(&self, outcome: Option<TypeBinding>) -> bool {
        self.resolution.set(outcome).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    This,
    Name(Identifier),
    MethodCall {
        receiver: Option<Box<Expression>>,
        name: Identifier,
        arguments: Vec<Expression>,
    },
    ArrayAccess {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Add {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Parenthesized(Box<Expression>),
    NewInstance {
        type_ref: TypeReference,
        arguments: Vec<Expression>,
        anonymous_body: Option<AnonymousBody>,
    },
    NewArray {
        element_type: TypeReference,
        dimension_expressions: Vec<Expression>,
        dimensions: usize,
        initializer: Option<Vec<Expression>>,
    },
}

/// Methods of an anonymous class body.
///
/// The body sits inside a shared expression, so resolution works on a copy and stores it
/// once, next to the methods as parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousBody {
    pub methods: Vec<MethodDeclaration>,
    resolved: OnceLock<Vec<MethodDeclaration>>,
}

impl AnonymousBody {
    pub fn new(methods: Vec<MethodDeclaration>) -> Self {
        Self {
            methods,
            resolved: OnceLock::new(),
        }
    }

    /// Methods after resolution, or as parsed if the body was never resolved
    pub fn resolved_methods(&self) -> &[MethodDeclaration] {
        self.resolved.get().unwrap_or(&self.methods)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Store the resolved methods. Returns `false` if the body was already resolved.
    pub fn record_resolved(&self, methods: Vec<MethodDeclaration>) -> bool {
        self.resolved.set(methods).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Long(i64),
    Double(f64),
    Char(char),
    String(String),
}
