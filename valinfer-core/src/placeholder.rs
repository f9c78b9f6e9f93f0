//! Recognizing the placeholder type
//!
//! A declared type is the placeholder when it is spelled `val` or `lombok.val` with no type
//! arguments and no array dimensions, and, when a scope is at hand, actually binds to the
//! marker type `lombok.val`. A user class that happens to be called `val` is not the
//! placeholder.

use valinfer_host::{Annotation, BlockScope, TypeReference, TypeReferenceKind};

pub const MARKER_PACKAGE: &str = "lombok";
pub const MARKER_NAME: &str = "val";

/// Shape test on the reference as written
pub fn could_be_placeholder(reference: &TypeReference) -> bool {
    match &reference.kind {
        TypeReferenceKind::Simple {
            token,
            arguments,
            dimensions,
        } => token == MARKER_NAME && arguments.is_empty() && *dimensions == 0,
        TypeReferenceKind::Qualified {
            tokens,
            arguments,
            dimensions,
        } => {
            arguments.is_empty()
                && *dimensions == 0
                && matches!(tokens.as_slice(), [package, name] if package == MARKER_PACKAGE && name == MARKER_NAME)
        }
        TypeReferenceKind::Resolved(_) => false,
    }
}

/// Shape test plus identity: the reference must bind to `lombok.val` in `scope`.
///
/// Binding is read-only; the reference is left as it was.
pub fn is_placeholder(reference: &TypeReference, scope: &BlockScope<'_>) -> bool {
    if !could_be_placeholder(reference) {
        return false;
    }

    let Ok(binding) = scope.resolve_type_reference(reference) else {
        return false;
    };
    let environment = scope.environment();
    environment.qualified_package_name(&binding) == Some(MARKER_PACKAGE)
        && environment.source_name(&binding) == Some(MARKER_NAME)
}

/// Identity test when a scope is available, shape test otherwise
pub fn recognize(reference: &TypeReference, scope: Option<&BlockScope<'_>>) -> bool {
    match scope {
        Some(scope) => is_placeholder(reference, scope),
        None => could_be_placeholder(reference),
    }
}

pub fn is_marker_annotation(annotation: &Annotation) -> bool {
    could_be_placeholder(&annotation.type_ref)
}
