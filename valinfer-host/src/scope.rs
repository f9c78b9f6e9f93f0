// Block scopes for method body resolution

use crate::ast::TypeReference;
use crate::types::{TypeBinding, TypeContext, TypeEnvironment, TypeId, TypeLookupError};
use indexmap::IndexMap;

/// Lexical scope of a statement inside a method body.
///
/// Patches receive it by shared reference; only the host declares locals.
#[derive(Debug, Clone)]
pub struct BlockScope<'e> {
    environment: &'e TypeEnvironment,
    context: TypeContext,
    enclosing_type: Option<TypeId>,
    /// `this` inside an anonymous class body
    anonymous_this: Option<TypeBinding>,
    frames: Vec<IndexMap<String, TypeBinding>>,
}

impl<'e> BlockScope<'e> {
    pub fn new(
        environment: &'e TypeEnvironment,
        context: TypeContext,
        enclosing_type: Option<TypeId>,
    ) -> Self {
        Self {
            environment,
            context,
            enclosing_type,
            anonymous_this: None,
            frames: vec![IndexMap::new()],
        }
    }

    /// Scope for a method of an anonymous class declared in this scope. Locals of the
    /// enclosing scope stay visible and `this` is the anonymous type.
    pub fn for_anonymous_body(&self, anonymous: TypeBinding) -> Self {
        let mut scope = self.clone();
        scope.anonymous_this = Some(anonymous);
        scope.push_frame();
        scope
    }

    pub fn environment(&self) -> &'e TypeEnvironment {
        self.environment
    }

    pub fn context(&self) -> &TypeContext {
        &self.context
    }

    pub fn enclosing_type(&self) -> Option<TypeId> {
        self.enclosing_type
    }

    /// Type of `this`
    pub fn this_type(&self) -> Option<TypeBinding> {
        if let Some(anonymous) = &self.anonymous_this {
            return Some(anonymous.clone());
        }
        self.enclosing_type
            .map(|id| self.environment.declared_type(id))
    }

    /// Bind a type reference as written in this scope. Never mutates the reference.
    pub fn resolve_type_reference(
        &self,
        reference: &TypeReference,
    ) -> Result<TypeBinding, TypeLookupError> {
        self.environment.resolve_reference(reference, &self.context)
    }

    pub fn lookup_local(&self, name: &str) -> Option<&TypeBinding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn declare_local(&mut self, name: &str, binding: TypeBinding) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), binding);
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }
}
