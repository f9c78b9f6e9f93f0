//! The hook set installed into a host
//!
//! `ValPatch` wires capture, the resolution guard, the rewrite engine and the mirror
//! synchronizer into the host's interception points. Capabilities are detected once, when the
//! patch is installed, and never change afterwards.

use crate::capability::Capabilities;
use crate::capture::{capture_initializer, capture_iterable_source};
use crate::guard::{resolve_initializer_once, resolve_once};
use crate::mirror_sync::synchronize;
use crate::rewrite::RewriteEngine;
use valinfer_host::mirror::{AstConverter, MirrorModifiers};
use valinfer_host::{
    BlockScope, CompilerHooks, Expression, ForeachStatement, HostProfile, LocalDeclaration,
    MirrorError, ResolveFlow, TypeBinding, TypeResolver,
};

#[derive(Debug, Clone, Copy)]
pub struct ValPatch {
    engine: RewriteEngine,
}

impl ValPatch {
    /// Detect what `profile` offers and build the patch for it
    pub fn install(profile: &mut HostProfile) -> Self {
        let capabilities = Capabilities::detect(profile);
        tracing::debug!(host = %profile.variant, "installed val patch");
        Self::with_capabilities(capabilities)
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            engine: RewriteEngine::new(capabilities),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.engine.capabilities()
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }
}

impl CompilerHooks for ValPatch {
    fn after_variable_with_initialization(&self, declaration: &mut LocalDeclaration) {
        capture_initializer(self.capabilities(), declaration);
    }

    fn after_enhanced_for_header(&self, statement: &mut ForeachStatement) {
        capture_iterable_source(self.capabilities(), statement);
    }

    fn intercept_local_resolve(
        &self,
        declaration: &mut LocalDeclaration,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        self.engine
            .handle_local_declaration(declaration, scope, resolver)
    }

    fn intercept_foreach_resolve(
        &self,
        statement: &mut ForeachStatement,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        self.engine.handle_foreach(statement, scope, resolver)
    }

    fn resolve_local_initializer(
        &self,
        initialization: &Expression,
        scope: &BlockScope<'_>,
        declaration: &LocalDeclaration,
        resolver: &dyn TypeResolver,
    ) -> Option<TypeBinding> {
        resolve_initializer_once(initialization, scope, declaration, resolver)
    }

    fn resolve_foreach_collection(
        &self,
        collection: &Expression,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> Option<TypeBinding> {
        resolve_once(collection, scope, resolver)
    }

    fn after_set_modifiers(
        &self,
        converter: &mut AstConverter<'_>,
        target: &mut dyn MirrorModifiers,
        declaration: &LocalDeclaration,
    ) -> Result<(), MirrorError> {
        synchronize(self.capabilities(), converter, target, declaration)?;
        Ok(())
    }
}
