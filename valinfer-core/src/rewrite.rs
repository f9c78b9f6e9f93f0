//! Rewriting placeholder declarations during resolution
//!
//! A declaration moves through these states while the host resolves it:
//!
//! - unseen: the host is about to resolve it
//! - confirmed: the declared type binds to `lombok.val` in the current scope
//! - inferred or fallback: the initializer (or the collection's element type) was resolved,
//!   or could not be, in which case `java.lang.Object` is used
//! - rewritten: `final`, a marker annotation and the concrete type are in place
//!
//! The rewritten type reference is already bound, so the host skips binding it and a
//! declaration is never rewritten twice.

use crate::capability::Capabilities;
use crate::component::component_type;
use crate::guard::resolve_once;
use crate::placeholder::is_placeholder;
use valinfer_host::{
    Annotation, BlockScope, ForeachStatement, LocalDeclaration, Modifiers, ResolveFlow,
    TypeBinding, TypeEnvironment, TypeReference, TypeResolver,
};

/// Outcome of inferring a confirmed placeholder declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    Inferred(TypeBinding),
    /// Nothing to infer from, or it did not resolve
    Fallback,
}

impl From<Option<TypeBinding>> for Inference {
    fn from(binding: Option<TypeBinding>) -> Self {
        match binding {
            Some(binding) => Inference::Inferred(binding),
            None => Inference::Fallback,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RewriteEngine {
    capabilities: Capabilities,
}

impl RewriteEngine {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Entry of local declaration resolution
    pub fn handle_local_declaration(
        &self,
        declaration: &mut LocalDeclaration,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        if !is_placeholder(&declaration.type_ref, scope) {
            return ResolveFlow::Proceed;
        }

        let inference = self.infer_local(declaration, scope, resolver);
        rewrite(declaration, inference, scope.environment());
        ResolveFlow::TypeResolved
    }

    /// Entry of enhanced for resolution
    pub fn handle_foreach(
        &self,
        statement: &mut ForeachStatement,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        if !is_placeholder(&statement.element_variable.type_ref, scope) {
            return ResolveFlow::Proceed;
        }

        // Completion parsing dropped the collection. The host then resolves the element
        // variable as a plain local, where the captured collection is picked up.
        let Some(collection) = statement.collection.clone() else {
            tracing::trace!(
                local = %statement.element_variable.name.name,
                "collection discarded, deferring to local resolution"
            );
            return ResolveFlow::Proceed;
        };

        let inference = component_type(&collection, scope, resolver).into();
        rewrite(&mut statement.element_variable, inference, scope.environment());
        ResolveFlow::TypeResolved
    }

    fn infer_local(
        &self,
        declaration: &LocalDeclaration,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> Inference {
        let initialization = self
            .capabilities
            .captured_initializer(declaration)
            .or_else(|| declaration.initialization.clone());

        if let Some(initialization) = initialization {
            return resolve_once(&initialization, scope, resolver).into();
        }
        if let Some(collection) = self.capabilities.captured_iterable_source(declaration) {
            return component_type(&collection, scope, resolver).into();
        }

        tracing::debug!(local = %declaration.name.name, "nothing to infer from");
        Inference::Fallback
    }
}

/// Make `declaration` final, mark it with the placeholder it was written with and give it its
/// concrete type
pub fn rewrite(declaration: &mut LocalDeclaration, inference: Inference, environment: &TypeEnvironment) {
    let placeholder = declaration.type_ref.clone();
    let span = placeholder.span;

    let binding = match inference {
        Inference::Inferred(inferred) => denotable(inferred),
        Inference::Fallback => None,
    }
    .unwrap_or_else(|| environment.object_type());

    tracing::debug!(
        local = %declaration.name.name,
        inferred = %environment.display(&binding),
        "rewrote placeholder declaration"
    );

    declaration.modifiers.insert(Modifiers::FINAL);
    declaration.annotations.push(Annotation::marker(placeholder, span));
    declaration.type_ref = TypeReference::resolved(binding, span);
}

/// A type that can be written as a declared type. Anonymous classes stand for their
/// supertype; the null type has no denotation.
pub fn denotable(binding: TypeBinding) -> Option<TypeBinding> {
    match binding {
        TypeBinding::Anonymous { supertype, .. } => denotable(*supertype),
        TypeBinding::Null => None,
        TypeBinding::Array(element) => denotable(*element).map(TypeBinding::array_of),
        other => Some(other),
    }
}
