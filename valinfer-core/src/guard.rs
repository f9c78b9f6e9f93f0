//! Resolving an expression at most once
//!
//! The host's expression resolution has side effects: an anonymous class body declares a local
//! type every time it is resolved, and the second declaration is a duplicate. Inference needs
//! the initializer's type before the host's own pass over the declaration reaches it, so both
//! go through here and whichever comes second reads the recorded outcome.

use valinfer_host::{BlockScope, Expression, LocalDeclaration, TypeBinding, TypeResolver};

/// Recorded outcome if `expression` was resolved before, otherwise one host resolution.
///
/// A failed resolution is recorded as well, and is not retried.
pub fn resolve_once(
    expression: &Expression,
    scope: &BlockScope<'_>,
    resolver: &dyn TypeResolver,
) -> Option<TypeBinding> {
    match expression.resolution() {
        Some(outcome) => {
            tracing::trace!(expression = %expression.id, "reusing recorded resolution");
            outcome.clone()
        }
        None => resolver.resolve_type(expression, scope),
    }
}

/// Stand-in for the host resolving a local's initializer
pub fn resolve_initializer_once(
    initialization: &Expression,
    scope: &BlockScope<'_>,
    declaration: &LocalDeclaration,
    resolver: &dyn TypeResolver,
) -> Option<TypeBinding> {
    if initialization.is_resolved() {
        tracing::trace!(local = %declaration.name.name, "initializer already resolved");
    }
    resolve_once(initialization, scope, resolver)
}
