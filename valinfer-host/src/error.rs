// valinfer host error handling
// Parse, resolution, mirror and host capability errors with miette integration

use crate::ast::Span;
use crate::parser::Rule;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Main parse error type with miette integration
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("Parse error")]
    #[diagnostic(
        code(valinfer::parse::pest_error),
        help("Check the syntax near the highlighted location")
    )]
    PestError {
        #[source_code]
        src: String,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("Invalid literal")]
    #[diagnostic(
        code(valinfer::parse::invalid_literal),
        help("Numbers must fit in 64 bits and escapes must be one of \\n, \\t, \\r, \\b, \\f, \\0, \\\\, \\', \\\"")
    )]
    InvalidLiteral {
        #[source_code]
        src: String,
        #[label("invalid literal")]
        span: SourceSpan,
        found: String,
    },

    #[error("Unexpected grammar rule")]
    #[diagnostic(
        code(valinfer::parse::unexpected_rule),
        help("Expected rule: {expected}")
    )]
    UnexpectedRule {
        expected: String,
        found: Option<Rule>,
        span: Span,
    },
}

impl ParseError {
    /// Create a parse error from a Pest parsing error
    pub fn from_pest_error(error: pest::error::Error<Rule>, src: String) -> Self {
        let span = match error.location {
            pest::error::InputLocation::Pos(pos) => SourceSpan::new(pos.into(), 1),
            pest::error::InputLocation::Span((start, end)) => {
                SourceSpan::new(start.into(), end - start)
            }
        };

        let message = match &error.variant {
            pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
                let expected: Vec<_> = positives.iter().map(describe_rule).collect();
                format!("expected {}", expected.join(" or "))
            }
            pest::error::ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
            pest::error::ErrorVariant::CustomError { message } => message.clone(),
        };

        ParseError::PestError { src, span, message }
    }

    pub fn invalid_literal(src: &str, span: Span, found: impl Into<String>) -> Self {
        ParseError::InvalidLiteral {
            src: src.to_string(),
            span: span.into(),
            found: found.into(),
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

fn describe_rule(rule: &Rule) -> &'static str {
    match rule {
        Rule::identifier => "an identifier",
        Rule::qualified_name => "a qualified name",
        Rule::type_declaration => "a type declaration",
        Rule::type_kind => "`class`, `interface` or `@interface`",
        Rule::method_declaration => "a method declaration",
        Rule::type_ref => "a type",
        Rule::type_arguments => "type arguments",
        Rule::statement => "a statement",
        Rule::local_declaration => "a local variable declaration",
        Rule::foreach_header => "an enhanced for header",
        Rule::expression => "an expression",
        Rule::arguments => "an argument list",
        Rule::literal => "a literal",
        Rule::block => "a block",
        Rule::EOI => "end of input",
        _ => "valid syntax",
    }
}

/// Problems reported while binding types and resolving method bodies
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Unknown type: {name}")]
    #[diagnostic(
        code(valinfer::resolve::unknown_type),
        help("Check the spelling or add an import")
    )]
    UnknownType {
        name: String,
        #[label("not found")]
        span: SourceSpan,
    },

    #[error("Wrong number of type arguments for {name}: expected {expected}, found {found}")]
    #[diagnostic(code(valinfer::resolve::type_argument_count))]
    TypeArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Duplicate type: {name}")]
    #[diagnostic(code(valinfer::resolve::duplicate_type))]
    DuplicateType {
        name: String,
        #[label("declared again here")]
        span: SourceSpan,
    },

    #[error("Duplicate nested type {name}")]
    #[diagnostic(
        code(valinfer::resolve::duplicate_nested_type),
        help("An anonymous class body was resolved more than once")
    )]
    DuplicateNestedType {
        name: String,
        #[label("declared again here")]
        span: SourceSpan,
    },

    #[error("Cyclic inheritance involving {name}")]
    #[diagnostic(code(valinfer::resolve::cyclic_inheritance))]
    CyclicInheritance { name: String },

    #[error("{name} cannot be used as a supertype")]
    #[diagnostic(code(valinfer::resolve::invalid_supertype))]
    InvalidSupertype {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Unknown variable: {name}")]
    #[diagnostic(code(valinfer::resolve::unknown_variable))]
    UnknownVariable {
        name: String,
        #[label("not in scope")]
        span: SourceSpan,
    },

    #[error("No method {name} with {arity} argument(s) on {receiver}")]
    #[diagnostic(code(valinfer::resolve::unknown_method))]
    UnknownMethod {
        name: String,
        arity: usize,
        receiver: String,
        #[label("not found")]
        span: SourceSpan,
    },

    #[error("Type mismatch: cannot convert from {found} to {expected}")]
    #[diagnostic(code(valinfer::resolve::type_mismatch))]
    TypeMismatch {
        expected: String,
        found: String,
        #[label("found {found}")]
        span: SourceSpan,
    },

    #[error("Can only iterate over an array or an instance of java.lang.Iterable, found {found}")]
    #[diagnostic(code(valinfer::resolve::not_iterable))]
    NotIterable {
        found: String,
        #[label("not iterable")]
        span: SourceSpan,
    },

    #[error("The type of the expression must be an array type but it resolved to {found}")]
    #[diagnostic(code(valinfer::resolve::not_an_array))]
    NotAnArray {
        found: String,
        #[label("not an array")]
        span: SourceSpan,
    },

    #[error("The operator + is undefined for {left} and {right}")]
    #[diagnostic(code(valinfer::resolve::invalid_operands))]
    InvalidOperands {
        left: String,
        right: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Cannot use this outside of a type declaration")]
    #[diagnostic(code(valinfer::resolve::no_enclosing_type))]
    NoEnclosingType {
        #[label("here")]
        span: SourceSpan,
    },
}

impl ResolveError {
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            ResolveError::UnknownType { span, .. }
            | ResolveError::TypeArgumentCount { span, .. }
            | ResolveError::DuplicateType { span, .. }
            | ResolveError::DuplicateNestedType { span, .. }
            | ResolveError::InvalidSupertype { span, .. }
            | ResolveError::UnknownVariable { span, .. }
            | ResolveError::UnknownMethod { span, .. }
            | ResolveError::TypeMismatch { span, .. }
            | ResolveError::NotIterable { span, .. }
            | ResolveError::NotAnArray { span, .. }
            | ResolveError::InvalidOperands { span, .. }
            | ResolveError::NoEnclosingType { span } => Some(*span),
            ResolveError::CyclicInheritance { .. } => None,
        }
    }
}

/// Failures building the tooling (mirror) tree
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("This host does not build a tooling AST")]
    #[diagnostic(code(valinfer::mirror::unavailable))]
    Unavailable,

    #[error("{node} nodes cannot be created at AST level {level}")]
    #[diagnostic(
        code(valinfer::mirror::unsupported_at_level),
        help("Use AST level jls3 or later")
    )]
    UnsupportedAtLevel { node: &'static str, level: String },

    #[error("'{identifier}' is not a valid identifier")]
    #[diagnostic(code(valinfer::mirror::invalid_identifier))]
    InvalidIdentifier { identifier: String },

    #[error("Cannot build a name without segments")]
    #[diagnostic(code(valinfer::mirror::empty_name))]
    EmptyName,
}

/// Failures of the host's extension surface
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("The {variant} host cannot append fields to local declarations")]
    #[diagnostic(code(valinfer::host::field_injection_unsupported))]
    FieldInjectionUnsupported {
        variant: &'static str,
        field: &'static str,
    },

    #[error("No field {name} was appended to local declarations")]
    #[diagnostic(code(valinfer::host::no_such_field))]
    NoSuchField { name: String },

    #[error("The {variant} host has no tooling AST to register nodes with")]
    #[diagnostic(code(valinfer::host::mirror_unavailable))]
    MirrorUnavailable { variant: &'static str },
}

/// Anything that stops a compilation before resolution problems can be reported
#[derive(Error, Diagnostic, Debug)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("Type declarations could not be bound")]
    #[diagnostic(code(valinfer::compile::declarations))]
    Declarations {
        #[source_code]
        src: String,
        #[related]
        errors: Vec<ResolveError>,
    },
}
