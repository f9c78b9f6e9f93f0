//! Element type of an iterated collection

use crate::guard::resolve_once;
use valinfer_host::{BlockScope, Expression, TypeBinding, TypeEnvironment, TypeResolver};

/// Type a `val` loop variable gets when iterating `collection`.
///
/// `None` when the collection does not resolve or has no single element type; callers fall
/// back to `java.lang.Object`.
pub fn component_type(
    collection: &Expression,
    scope: &BlockScope<'_>,
    resolver: &dyn TypeResolver,
) -> Option<TypeBinding> {
    let collection_type = resolve_once(collection, scope, resolver)?;
    component_of(&collection_type, scope.environment())
}

/// Element type of an array, or the single type argument `collection_type` passes to
/// `java.lang.Iterable`. Raw iterables have none.
pub fn component_of(
    collection_type: &TypeBinding,
    environment: &TypeEnvironment,
) -> Option<TypeBinding> {
    if let TypeBinding::Array(element) = collection_type {
        return Some((**element).clone());
    }
    if !collection_type.is_reference() {
        return None;
    }

    match environment.find_super_type_originating_from(collection_type, environment.iterable_id())? {
        TypeBinding::Generic(iterable) => single(environment.type_variables(iterable)),
        TypeBinding::Parameterized { arguments, .. } => single(arguments),
        _ => None,
    }
}

fn single(mut bindings: Vec<TypeBinding>) -> Option<TypeBinding> {
    if bindings.len() == 1 {
        bindings.pop()
    } else {
        None
    }
}
