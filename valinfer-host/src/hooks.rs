// Interception points offered to installed patches
//
// The host calls these at fixed places in parsing, resolution and tooling AST conversion.
// Every method has a default that leaves host behavior unchanged.

use crate::ast::{Expression, ForeachStatement, LocalDeclaration};
use crate::error::MirrorError;
use crate::mirror::{AstConverter, MirrorModifiers};
use crate::resolve::TypeResolver;
use crate::scope::BlockScope;
use crate::types::TypeBinding;

/// What the host should do after an early-exit hook ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveFlow {
    /// Resolve normally
    #[default]
    Proceed,
    /// The declared type was already bound; continue with the rest of resolution
    TypeResolved,
    /// Return immediately. The declaration is left unbound and never enters scope; a skipped
    /// enhanced for also leaves its body unresolved.
    Skip,
}

pub trait CompilerHooks {
    /// Runs after the parser built a local declaration that has an initializer
    fn after_variable_with_initialization(&self, _declaration: &mut LocalDeclaration) {}

    /// Runs after the parser consumed an enhanced for header, before its body
    fn after_enhanced_for_header(&self, _statement: &mut ForeachStatement) {}

    /// Runs on entry to local declaration resolution
    fn intercept_local_resolve(
        &self,
        _declaration: &mut LocalDeclaration,
        _scope: &BlockScope<'_>,
        _resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        ResolveFlow::Proceed
    }

    /// Runs on entry to enhanced for resolution
    fn intercept_foreach_resolve(
        &self,
        _statement: &mut ForeachStatement,
        _scope: &BlockScope<'_>,
        _resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        ResolveFlow::Proceed
    }

    /// Stands in for the host resolving a local's initializer
    fn resolve_local_initializer(
        &self,
        initialization: &Expression,
        scope: &BlockScope<'_>,
        _declaration: &LocalDeclaration,
        resolver: &dyn TypeResolver,
    ) -> Option<TypeBinding> {
        resolver.resolve_type(initialization, scope)
    }

    /// Stands in for the host resolving an enhanced for's collection
    fn resolve_foreach_collection(
        &self,
        collection: &Expression,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> Option<TypeBinding> {
        resolver.resolve_type(collection, scope)
    }

    /// Runs after the converter set a mirror declaration's modifiers from source
    fn after_set_modifiers(
        &self,
        _converter: &mut AstConverter<'_>,
        _target: &mut dyn MirrorModifiers,
        _declaration: &LocalDeclaration,
    ) -> Result<(), MirrorError> {
        Ok(())
    }
}

/// Plain host behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl CompilerHooks for NoHooks {}
