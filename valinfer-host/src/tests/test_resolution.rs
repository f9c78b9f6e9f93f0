// Resolution pass tests, including how the host honors its hooks

use crate::ast::*;
use crate::error::ResolveError;
use crate::hooks::{CompilerHooks, NoHooks, ResolveFlow};
use crate::parser::SourceParser;
use crate::profile::ParseMode;
use crate::resolve::{ResolutionReport, Resolver, TypeResolver};
use crate::scope::BlockScope;
use crate::types::{PrimitiveType, TypeBinding, TypeEnvironment};
use std::cell::Cell;

fn resolve_with(
    source: &str,
    mode: ParseMode,
    hooks: &dyn CompilerHooks,
) -> (CompilationUnit, TypeEnvironment, ResolutionReport) {
    let mut unit = SourceParser::new(mode, hooks).parse_unit(source, None).unwrap();
    let mut env = TypeEnvironment::bootstrap();
    env.declare_unit(&unit).unwrap();

    let report = {
        let resolver = Resolver::new(&env, hooks);
        resolver.resolve_unit(&mut unit);
        resolver.finish()
    };
    (unit, env, report)
}

fn locals(unit: &CompilationUnit) -> Vec<&LocalDeclaration> {
    fn collect<'u>(statement: &'u Statement, found: &mut Vec<&'u LocalDeclaration>) {
        match &statement.kind {
            StatementKind::Local(local) => found.push(local),
            StatementKind::ForEach(foreach) => {
                found.push(&foreach.element_variable);
                collect(&foreach.body, found);
            }
            StatementKind::Block(block) => {
                for statement in &block.statements {
                    collect(statement, found);
                }
            }
            _ => {}
        }
    }

    let mut found = Vec::new();
    for method in unit.types.iter().flat_map(|ty| &ty.methods) {
        for statement in method.body.iter().flat_map(|body| &body.statements) {
            collect(statement, &mut found);
        }
    }
    found
}

fn binding_of<'u>(unit: &'u CompilationUnit, name: &str) -> Option<&'u TypeBinding> {
    locals(unit)
        .into_iter()
        .find(|local| local.name.name == name)
        .and_then(|local| local.binding.as_ref())
}

#[test]
fn test_well_typed_method_has_no_problems() {
    let (unit, env, report) = resolve_with(
        r#"
        import java.util.*;

        class Names {
            int count(List<String> names) {
                int total = 0;
                for (String name : names) {
                    String trimmed = name.trim();
                    int length = trimmed.length() + total;
                }
                Map<String, Integer> index = new HashMap<String, Integer>();
                Set<String> keys = index.keySet();
                Object any = new Object() { };
                return total;
            }
        }
        "#,
        ParseMode::Full,
        &NoHooks,
    );

    assert!(report.problems.is_empty(), "{:?}", report.problems);
    assert_eq!(binding_of(&unit, "name"), Some(&env.string_type()));
    assert_eq!(
        binding_of(&unit, "length"),
        Some(&TypeBinding::Primitive(PrimitiveType::Int))
    );
}

#[test]
fn test_mismatches_are_reported() {
    let (_, _, report) = resolve_with(
        r#"
        class Bad {
            void run() {
                String text = 1;
                for (String each : text) { }
                int[] numbers = new int[2];
                for (String number : numbers) { }
                Object gone = missing;
            }
        }
        "#,
        ParseMode::Full,
        &NoHooks,
    );

    let kinds: Vec<_> = report
        .problems
        .iter()
        .map(|problem| match problem {
            ResolveError::TypeMismatch { .. } => "mismatch",
            ResolveError::NotIterable { .. } => "not iterable",
            ResolveError::UnknownVariable { .. } => "unknown variable",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["mismatch", "not iterable", "mismatch", "unknown variable"]
    );
}

#[test]
fn test_completion_parse_resolves_element_variable_as_a_local() {
    let (unit, env, report) = resolve_with(
        r#"
        class Loop {
            void run(java.util.List<String> names) {
                for (String name : names) { }
            }
        }
        "#,
        ParseMode::Completion,
        &NoHooks,
    );

    assert!(report.problems.is_empty(), "{:?}", report.problems);
    assert_eq!(binding_of(&unit, "name"), Some(&env.string_type()));
}

/// Binds every `auto` local to the type of its initializer
struct AutoHooks {
    intercepted: Cell<usize>,
}

impl CompilerHooks for AutoHooks {
    fn intercept_local_resolve(
        &self,
        declaration: &mut LocalDeclaration,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        self.intercepted.set(self.intercepted.get() + 1);
        if declaration.type_ref.tokens() != vec!["auto"] {
            return ResolveFlow::Proceed;
        }

        let Some(initialization) = declaration.initialization.clone() else {
            return ResolveFlow::Skip;
        };
        match resolver.resolve_type(&initialization, scope) {
            Some(binding) => {
                declaration.type_ref = TypeReference::resolved(binding, declaration.type_ref.span);
                ResolveFlow::TypeResolved
            }
            None => ResolveFlow::Skip,
        }
    }

    fn resolve_local_initializer(
        &self,
        initialization: &Expression,
        scope: &BlockScope<'_>,
        _declaration: &LocalDeclaration,
        resolver: &dyn TypeResolver,
    ) -> Option<TypeBinding> {
        match initialization.resolution() {
            Some(outcome) => outcome.clone(),
            None => resolver.resolve_type(initialization, scope),
        }
    }
}

#[test]
fn test_hooks_can_bind_declared_types() {
    let hooks = AutoHooks {
        intercepted: Cell::new(0),
    };
    let (unit, env, report) = resolve_with(
        r#"
        class Auto {
            void run() {
                auto text = "a" + 1;
                auto nothing;
                String copy = text;
            }
        }
        "#,
        ParseMode::Full,
        &hooks,
    );

    assert!(report.problems.is_empty(), "{:?}", report.problems);
    assert_eq!(hooks.intercepted.get(), 3);
    assert_eq!(binding_of(&unit, "text"), Some(&env.string_type()));
    // Skipped entirely: never declared
    assert_eq!(binding_of(&unit, "nothing"), None);

    // The initializer went through host resolution once
    let text = locals(&unit)[0];
    let initialization = text.initialization.as_ref().unwrap();
    assert_eq!(report.invocations.get(&initialization.id), Some(&1));
}
