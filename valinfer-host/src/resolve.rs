// Method body resolution
// Binds the types of locals, enhanced for variables and expressions, reporting problems

use crate::ast::*;
use crate::error::ResolveError;
use crate::hooks::{CompilerHooks, ResolveFlow};
use crate::scope::BlockScope;
use crate::types::{qualify, PrimitiveType, TypeBinding, TypeContext, TypeEnvironment, TypeId};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};

/// The host's expression type resolution, as seen by patches
pub trait TypeResolver {
    /// Resolve `expression` in `scope`. The outcome is recorded in the expression's slot the
    /// first time; every call still runs the host's resolution and its side effects.
    fn resolve_type(&self, expression: &Expression, scope: &BlockScope<'_>) -> Option<TypeBinding>;
}

/// What a finished resolution pass leaves behind
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    pub problems: Vec<ResolveError>,
    /// How many times each expression went through host resolution
    pub invocations: IndexMap<NodeId, usize>,
}

pub struct Resolver<'a> {
    environment: &'a TypeEnvironment,
    hooks: &'a dyn CompilerHooks,
    problems: RefCell<Vec<ResolveError>>,
    invocations: RefCell<IndexMap<NodeId, usize>>,
    /// Anonymous class bodies already declared as local types
    local_types: RefCell<IndexMap<NodeId, u32>>,
    next_local_type: Cell<u32>,
}

impl<'a> Resolver<'a> {
    pub fn new(environment: &'a TypeEnvironment, hooks: &'a dyn CompilerHooks) -> Self {
        Self {
            environment,
            hooks,
            problems: RefCell::new(Vec::new()),
            invocations: RefCell::new(IndexMap::new()),
            local_types: RefCell::new(IndexMap::new()),
            next_local_type: Cell::new(0),
        }
    }

    pub fn finish(self) -> ResolutionReport {
        ResolutionReport {
            problems: self.problems.into_inner(),
            invocations: self.invocations.into_inner(),
        }
    }

    pub fn invocation_count(&self, id: NodeId) -> usize {
        self.invocations.borrow().get(&id).copied().unwrap_or(0)
    }

    fn report(&self, problem: ResolveError) {
        tracing::debug!(%problem, "resolution problem");
        self.problems.borrow_mut().push(problem);
    }

    /// Resolve every method body of a compilation unit
    pub fn resolve_unit(&self, unit: &mut CompilationUnit) {
        let context = TypeContext::for_unit(unit);
        let package = unit.package_name();

        for declaration in &mut unit.types {
            let Some(type_id) = self
                .environment
                .lookup(&qualify(&package, &declaration.name.name))
            else {
                continue;
            };
            let parameters = self.environment.class(type_id).type_parameters.clone();
            let class_context = context.with_type_variables(type_id, &parameters);

            for method in &mut declaration.methods {
                self.resolve_method(method, type_id, &class_context);
            }
        }
    }

    fn resolve_method(&self, method: &mut MethodDeclaration, type_id: TypeId, context: &TypeContext) {
        let scope = BlockScope::new(self.environment, context.clone(), Some(type_id));
        self.resolve_method_in(method, scope);
    }

    fn resolve_method_in(&self, method: &mut MethodDeclaration, mut scope: BlockScope<'_>) {
        let Some(body) = method.body.as_mut() else {
            return;
        };
        tracing::trace!(method = %method.name.name, "resolving method body");

        for parameter in &method.parameters {
            if let Some(binding) = self.resolve_declared_type(&parameter.type_ref, &scope) {
                scope.declare_local(&parameter.name.name, binding);
            }
        }

        self.resolve_block(body, &mut scope);
    }

    pub fn resolve_block(&self, block: &mut Block, scope: &mut BlockScope<'_>) {
        scope.push_frame();
        for statement in &mut block.statements {
            self.resolve_statement(statement, scope);
        }
        scope.pop_frame();
    }

    pub fn resolve_statement(&self, statement: &mut Statement, scope: &mut BlockScope<'_>) {
        match &mut statement.kind {
            StatementKind::Local(declaration) => self.resolve_local(declaration, scope),
            StatementKind::ForEach(foreach) => self.resolve_foreach(foreach, scope),
            StatementKind::Block(block) => self.resolve_block(block, scope),
            StatementKind::Return(Some(expression)) | StatementKind::Expression(expression) => {
                self.resolve_type(expression, scope);
            }
            StatementKind::Return(None) | StatementKind::Empty => {}
        }
    }

    /// Local declaration resolution: declared type, initializer, compatibility, then the local
    /// becomes visible to the following statements
    pub fn resolve_local(&self, declaration: &mut LocalDeclaration, scope: &mut BlockScope<'_>) {
        let flow = self.hooks.intercept_local_resolve(declaration, scope, self);
        if flow == ResolveFlow::Skip {
            return;
        }

        let declared = self.declared_type(flow, &declaration.type_ref, scope);

        if let Some(initialization) = declaration.initialization.clone() {
            let actual =
                self.hooks
                    .resolve_local_initializer(&initialization, scope, declaration, self);
            if let (Some(declared), Some(actual)) = (&declared, &actual) {
                self.check_assignable(actual, declared, initialization.span);
            }
        }

        if let Some(binding) = &declared {
            scope.declare_local(&declaration.name.name, binding.clone());
        }
        declaration.binding = declared;
    }

    /// Enhanced for resolution. Without a collection the element variable resolves like a
    /// plain local declaration.
    pub fn resolve_foreach(&self, statement: &mut ForeachStatement, scope: &mut BlockScope<'_>) {
        let flow = self.hooks.intercept_foreach_resolve(statement, scope, self);
        if flow == ResolveFlow::Skip {
            return;
        }

        scope.push_frame();

        match statement.collection.clone() {
            Some(collection) => {
                let collection_type =
                    self.hooks
                        .resolve_foreach_collection(&collection, scope, self);
                let element = &mut statement.element_variable;
                let declared = self.declared_type(flow, &element.type_ref, scope);

                if let Some(collection_type) = &collection_type {
                    match self.environment.iteration_element(collection_type) {
                        Some(component) => {
                            if let Some(declared) = &declared {
                                self.check_assignable(&component, declared, element.span);
                            }
                        }
                        None => self.report(ResolveError::NotIterable {
                            found: self.environment.display(collection_type),
                            span: collection.span.into(),
                        }),
                    }
                }

                if let Some(binding) = &declared {
                    scope.declare_local(&element.name.name, binding.clone());
                }
                element.binding = declared;
            }
            None => self.resolve_local(&mut statement.element_variable, scope),
        }

        self.resolve_statement(&mut statement.body, scope);
        scope.pop_frame();
    }

    fn declared_type(
        &self,
        flow: ResolveFlow,
        reference: &TypeReference,
        scope: &BlockScope<'_>,
    ) -> Option<TypeBinding> {
        match (flow, reference.binding()) {
            (ResolveFlow::TypeResolved, Some(binding)) => Some(binding.clone()),
            _ => self.resolve_declared_type(reference, scope),
        }
    }

    fn resolve_declared_type(
        &self,
        reference: &TypeReference,
        scope: &BlockScope<'_>,
    ) -> Option<TypeBinding> {
        match scope.resolve_type_reference(reference) {
            Ok(binding) => Some(binding),
            Err(error) => {
                self.report(error.into_resolve_error(reference.span));
                None
            }
        }
    }

    fn check_assignable(&self, actual: &TypeBinding, declared: &TypeBinding, span: Span) {
        if !self.environment.is_assignable(actual, declared) {
            self.report(ResolveError::TypeMismatch {
                expected: self.environment.display(declared),
                found: self.environment.display(actual),
                span: span.into(),
            });
        }
    }

    fn compute_type(&self, expression: &Expression, scope: &BlockScope<'_>) -> Option<TypeBinding> {
        match &expression.kind {
            ExpressionKind::Literal(literal) => Some(self.literal_type(literal)),
            ExpressionKind::This => {
                let this = scope.this_type();
                if this.is_none() {
                    self.report(ResolveError::NoEnclosingType {
                        span: expression.span.into(),
                    });
                }
                this
            }
            ExpressionKind::Name(identifier) => {
                let local = scope.lookup_local(&identifier.name).cloned();
                if local.is_none() {
                    self.report(ResolveError::UnknownVariable {
                        name: identifier.name.clone(),
                        span: identifier.span.into(),
                    });
                }
                local
            }
            ExpressionKind::MethodCall {
                receiver,
                name,
                arguments,
            } => {
                let receiver_type = match receiver {
                    Some(receiver) => self.resolve_type(receiver, scope),
                    None => scope.this_type(),
                };
                for argument in arguments {
                    self.resolve_type(argument, scope);
                }

                let receiver_type = receiver_type?;
                match self
                    .environment
                    .find_method(&receiver_type, &name.name, arguments.len())
                {
                    Some(method) => method.return_type,
                    None => {
                        self.report(ResolveError::UnknownMethod {
                            name: name.name.clone(),
                            arity: arguments.len(),
                            receiver: self.environment.display(&receiver_type),
                            span: name.span.into(),
                        });
                        None
                    }
                }
            }
            ExpressionKind::ArrayAccess { array, index } => {
                let array_type = self.resolve_type(array, scope);
                self.resolve_type(index, scope);

                match array_type? {
                    TypeBinding::Array(element) => Some(*element),
                    other => {
                        self.report(ResolveError::NotAnArray {
                            found: self.environment.display(&other),
                            span: array.span.into(),
                        });
                        None
                    }
                }
            }
            ExpressionKind::Add { left, right } => {
                let left_type = self.resolve_type(left, scope);
                let right_type = self.resolve_type(right, scope);
                self.addition_type(left_type?, right_type?, expression.span)
            }
            ExpressionKind::Parenthesized(inner) => self.resolve_type(inner, scope),
            ExpressionKind::NewInstance {
                type_ref,
                arguments,
                anonymous_body,
            } => {
                for argument in arguments {
                    self.resolve_type(argument, scope);
                }
                let instantiated = self.resolve_declared_type(type_ref, scope)?;

                match anonymous_body {
                    Some(body) => {
                        Some(self.declare_anonymous_type(expression, body, instantiated, scope))
                    }
                    None => Some(instantiated),
                }
            }
            ExpressionKind::NewArray {
                element_type,
                dimension_expressions,
                dimensions,
                initializer,
            } => {
                for size in dimension_expressions {
                    self.resolve_type(size, scope);
                }
                for element in initializer.iter().flatten() {
                    self.resolve_type(element, scope);
                }

                let mut binding = self.resolve_declared_type(element_type, scope)?;
                for _ in 0..(dimension_expressions.len() + dimensions) {
                    binding = TypeBinding::array_of(binding);
                }
                Some(binding)
            }
        }
    }

    fn literal_type(&self, literal: &Literal) -> TypeBinding {
        match literal {
            Literal::Null => TypeBinding::Null,
            Literal::Boolean(_) => TypeBinding::Primitive(PrimitiveType::Boolean),
            Literal::Integer(_) => TypeBinding::Primitive(PrimitiveType::Int),
            Literal::Long(_) => TypeBinding::Primitive(PrimitiveType::Long),
            Literal::Double(_) => TypeBinding::Primitive(PrimitiveType::Double),
            Literal::Char(_) => TypeBinding::Primitive(PrimitiveType::Char),
            Literal::String(_) => self.environment.string_type(),
        }
    }

    fn addition_type(&self, left: TypeBinding, right: TypeBinding, span: Span) -> Option<TypeBinding> {
        let string = self.environment.string_type();
        if left == string || right == string {
            return Some(string);
        }

        if let (TypeBinding::Primitive(left), TypeBinding::Primitive(right)) = (&left, &right) {
            if let Some(promoted) = PrimitiveType::promote(*left, *right) {
                return Some(TypeBinding::Primitive(promoted));
            }
        }

        self.report(ResolveError::InvalidOperands {
            left: self.environment.display(&left),
            right: self.environment.display(&right),
            span: span.into(),
        });
        None
    }

    /// Declaring an anonymous class adds a local type to the enclosing type and resolves its
    /// methods. Doing it twice for the same expression is a duplicate declaration.
    fn declare_anonymous_type(
        &self,
        expression: &Expression,
        body: &AnonymousBody,
        supertype: TypeBinding,
        scope: &BlockScope<'_>,
    ) -> TypeBinding {
        let serial = self.next_local_type.get() + 1;
        self.next_local_type.set(serial);

        let first = self
            .local_types
            .borrow_mut()
            .insert(expression.id, serial)
            .is_none();
        let anonymous = TypeBinding::Anonymous {
            serial,
            supertype: Box::new(supertype),
        };

        if first {
            let mut methods = body.methods.clone();
            for method in &mut methods {
                self.resolve_method_in(method, scope.for_anonymous_body(anonymous.clone()));
            }
            body.record_resolved(methods);
        } else {
            let enclosing = scope
                .enclosing_type()
                .map(|id| self.environment.class(id).qualified_name())
                .unwrap_or_default();
            self.report(ResolveError::DuplicateNestedType {
                name: format!("{enclosing}${serial}"),
                span: expression.span.into(),
            });
        }

        anonymous
    }
}

impl TypeResolver for Resolver<'_> {
    fn resolve_type(&self, expression: &Expression, scope: &BlockScope<'_>) -> Option<TypeBinding> {
        *self
            .invocations
            .borrow_mut()
            .entry(expression.id)
            .or_insert(0) += 1;

        let outcome = self.compute_type(expression, scope);
        if !expression.record_resolution(outcome.clone()) {
            tracing::trace!(expression = %expression.id, "expression resolved again");
        }
        outcome
    }
}
