// End-to-end inference through a patched host compiler

use pretty_assertions::assert_eq;
use valinfer_core::ValPatch;
use valinfer_host::types::PrimitiveType;
use valinfer_host::*;

fn compile_with(profile: HostProfile, source: &str) -> Compilation {
    let mut profile = profile;
    let patch = ValPatch::install(&mut profile);
    Compiler::new(profile, &patch)
        .compile(source, Some("Test.java".to_string()))
        .unwrap()
}

fn compile(source: &str) -> Compilation {
    compile_with(HostProfile::ide(), source)
}

/// Every local and enhanced for variable, in source order
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

fn local<'u>(compilation: &'u Compilation, name: &str) -> &'u LocalDeclaration {
    locals(&compilation.unit)
        .into_iter()
        .find(|local| local.name.name == name)
        .unwrap_or_else(|| panic!("no local {name}"))
}

fn declared(compilation: &Compilation, name: &str) -> String {
    let local = local(compilation, name);
    let binding = local
        .type_ref
        .binding()
        .unwrap_or_else(|| panic!("{name} was not rewritten"));
    compilation.environment.display(binding)
}

fn assert_inferred(compilation: &Compilation, name: &str, expected: &str) {
    assert!(
        compilation.problems().is_empty(),
        "{:?}",
        compilation.problems()
    );
    assert_eq!(declared(compilation, name), expected);

    let local = local(compilation, name);
    assert!(local.is_final(), "{name} is not final");
    let markers = local
        .annotations
        .iter()
        .filter(|annotation| valinfer_core::is_marker_annotation(annotation))
        .count();
    assert_eq!(markers, 1, "{name} should carry exactly one marker");
}

const LOCALS: &str = r#"
package demo;

import java.util.*;
import lombok.val;

class Sample {
    void run(List<String> names, Map<String, Integer> index) {
        val first = names.get(0);
        val length = first.length() + 1;
        val total = 2L + length;
        val keys = index.keySet();
        val copy = new ArrayList<String>();
        val matrix = new int[2][];
        val letters = new String[] { "a", "b" };
        val nothing = null;
        val unknown;
        String back = first;
        int sum = length + 3;
    }
}
"#;

#[test]
fn test_locals_take_their_initializer_type() {
    let compilation = compile(LOCALS);

    assert_inferred(&compilation, "first", "java.lang.String");
    assert_inferred(&compilation, "length", "int");
    assert_inferred(&compilation, "total", "long");
    assert_inferred(&compilation, "keys", "java.util.Set<java.lang.String>");
    assert_inferred(&compilation, "copy", "java.util.ArrayList<java.lang.String>");
    assert_inferred(&compilation, "matrix", "int[][]");
    assert_inferred(&compilation, "letters", "java.lang.String[]");
}

#[test]
fn test_missing_or_null_initializers_fall_back_to_object() {
    let compilation = compile(LOCALS);

    assert_inferred(&compilation, "nothing", "java.lang.Object");
    assert_inferred(&compilation, "unknown", "java.lang.Object");
}

#[test]
fn test_rewritten_locals_are_visible_to_later_statements() {
    let compilation = compile(LOCALS);

    assert_eq!(local(&compilation, "back").binding, Some(compilation.environment.string_type()));
    assert_eq!(
        local(&compilation, "sum").binding,
        Some(TypeBinding::Primitive(PrimitiveType::Int))
    );
}

#[test]
fn test_initializers_are_resolved_once() {
    let compilation = compile(LOCALS);

    for name in ["first", "length", "keys", "copy", "letters"] {
        let initialization = local(&compilation, name).initialization.as_ref().unwrap();
        assert_eq!(
            compilation.report.invocations.get(&initialization.id),
            Some(&1),
            "{name}"
        );
    }
}

const LOOPS: &str = r#"
package demo;

import java.util.*;
import lombok.val;

class Loops {
    void run(String[] words, ArrayList<String> names, ArrayList raw, List<List<Integer>> rows) {
        for (val word : words) {
            String copy = word;
        }
        for (val name : names) { }
        for (val item : raw) { }
        for (val row : rows) {
            for (val cell : row) { }
        }
        for (final val each : new HashSet<Integer>()) { }
    }
}
"#;

#[test]
fn test_enhanced_for_takes_the_element_type() {
    let compilation = compile(LOOPS);

    assert_inferred(&compilation, "word", "java.lang.String");
    assert_inferred(&compilation, "name", "java.lang.String");
    assert_inferred(&compilation, "row", "java.util.List<java.lang.Integer>");
    assert_inferred(&compilation, "cell", "java.lang.Integer");
    assert_inferred(&compilation, "each", "java.lang.Integer");
}

#[test]
fn test_raw_iterables_fall_back_to_object() {
    let compilation = compile(LOOPS);

    assert_inferred(&compilation, "item", "java.lang.Object");
}

#[test]
fn test_collections_are_resolved_once() {
    let compilation = compile(LOOPS);

    let collections: Vec<_> = compilation
        .unit
        .types
        .iter()
        .flat_map(|ty| &ty.methods)
        .flat_map(|method| method.body.iter().flat_map(|body| &body.statements))
        .filter_map(|statement| match &statement.kind {
            StatementKind::ForEach(foreach) => foreach.collection.as_ref(),
            _ => None,
        })
        .collect();

    assert_eq!(collections.len(), 5);
    for collection in collections {
        assert_eq!(
            compilation.report.invocations.get(&collection.id),
            Some(&1)
        );
    }
}

#[test]
fn test_iterating_this_in_a_generic_class() {
    let compilation = compile(
        r#"
        package demo;

        import lombok.val;

        class Bag<T> implements Iterable<T> {
            java.util.Iterator<T> iterator();

            void each() {
                for (val item : this) {
                    T copy = item;
                }
            }
        }
        "#,
    );

    assert_inferred(&compilation, "item", "T");
}

#[test]
fn test_user_type_named_val_is_left_alone() {
    let compilation = compile(
        r#"
        package demo;

        class val { }

        class Sample {
            void run() {
                val mine = new val();
            }
        }
        "#,
    );

    assert!(compilation.problems().is_empty(), "{:?}", compilation.problems());
    let mine = local(&compilation, "mine");
    assert!(!mine.is_final());
    assert!(mine.annotations.is_empty());
    assert_eq!(mine.type_ref.tokens(), vec!["val"]);
    assert_eq!(
        mine.binding.as_ref().map(|binding| compilation.environment.display(binding)),
        Some("demo.val".to_string())
    );
}

#[test]
fn test_qualified_spelling_needs_no_import() {
    let compilation = compile(
        r#"
        class Sample {
            void run() {
                lombok.val text = "text";
            }
        }
        "#,
    );

    assert_inferred(&compilation, "text", "java.lang.String");
    let marker = &local(&compilation, "text").annotations[0];
    assert_eq!(marker.type_ref.tokens(), vec!["lombok", "val"]);
}

#[test]
fn test_anonymous_class_initializer_is_declared_once() {
    let compilation = compile(
        r#"
        package demo;

        import lombok.val;

        class Tasks {
            void run() {
                val task = new Runnable() {
                    public void run() { }
                };
                Runnable same = task;
            }
        }
        "#,
    );

    assert_inferred(&compilation, "task", "java.lang.Runnable");
}

fn anonymous_body(expression: &Expression) -> &AnonymousBody {
    match &expression.kind {
        ExpressionKind::NewInstance {
            anonymous_body: Some(body),
            ..
        } => body,
        other => panic!("expected an anonymous class, got {other:?}"),
    }
}

#[test]
fn test_val_inside_an_anonymous_class_body() {
    let compilation = compile(
        r#"
        package demo;

        import lombok.val;

        class Tasks {
            void run(String prefix) {
                val task = new Runnable() {
                    public void run() {
                        val inner = "x";
                        val joined = prefix + inner;
                        val self = this;
                    }
                };
            }
        }
        "#,
    );
    assert!(compilation.problems().is_empty(), "{:?}", compilation.problems());
    assert_inferred(&compilation, "task", "java.lang.Runnable");

    let initialization = local(&compilation, "task").initialization.as_ref().unwrap();
    let body = anonymous_body(initialization);
    assert!(body.is_resolved());

    let nested: Vec<&LocalDeclaration> = body.resolved_methods()[0]
        .body
        .iter()
        .flat_map(|block| &block.statements)
        .filter_map(|statement| match &statement.kind {
            StatementKind::Local(local) => Some(local),
            _ => None,
        })
        .collect();
    let declared: Vec<String> = nested
        .iter()
        .map(|local| {
            assert!(local.is_final(), "{} is not final", local.name.name);
            assert!(local.annotations.iter().any(valinfer_core::is_marker_annotation));
            compilation
                .environment
                .display(local.type_ref.binding().unwrap())
        })
        .collect();
    assert_eq!(
        declared,
        vec!["java.lang.String", "java.lang.String", "java.lang.Runnable"]
    );

    // The enclosing initializer and the nested ones each went through the host once
    assert_eq!(compilation.report.invocations.get(&initialization.id), Some(&1));
    for local in nested {
        let nested_initialization = local.initialization.as_ref().unwrap();
        assert_eq!(
            compilation.report.invocations.get(&nested_initialization.id),
            Some(&1),
            "{}",
            local.name.name
        );
    }
}

/// Resolves placeholder initializers without going through the resolution guard
struct Unguarded;

impl CompilerHooks for Unguarded {
    fn intercept_local_resolve(
        &self,
        declaration: &mut LocalDeclaration,
        scope: &BlockScope<'_>,
        resolver: &dyn TypeResolver,
    ) -> ResolveFlow {
        if let Some(initialization) = declaration.initialization.clone() {
            resolver.resolve_type(&initialization, scope);
        }
        ResolveFlow::Proceed
    }
}

#[test]
fn test_unguarded_double_resolution_duplicates_the_anonymous_class() {
    let compilation = Compiler::new(HostProfile::ide(), &Unguarded)
        .compile(
            r#"
            class Tasks {
                void run() {
                    Runnable task = new Runnable() { public void run() { } };
                }
            }
            "#,
            None,
        )
        .unwrap();

    assert!(matches!(
        compilation.problems(),
        [ResolveError::DuplicateNestedType { name, .. }] if name == "Tasks$2"
    ));
}

#[test]
fn test_completion_parsing_infers_through_captured_expressions() {
    let compilation = compile_with(
        HostProfile::ide().with_parse_mode(ParseMode::Completion),
        r#"
        package demo;

        import java.util.*;
        import lombok.val;

        class Completion {
            void run(List<String> names) {
                val first = names.get(0);
                for (val name : names) { }
                for (val letter : new char[] { 'a' }) { }
            }
        }
        "#,
    );

    assert_inferred(&compilation, "first", "java.lang.String");
    assert_inferred(&compilation, "name", "java.lang.String");
    assert_inferred(&compilation, "letter", "char");
    assert!(local(&compilation, "first").initialization.is_none());
}

#[test]
fn test_batch_host_infers_without_capture() {
    let mut profile = HostProfile::batch();
    let patch = ValPatch::install(&mut profile);
    assert!(!patch.capabilities().can_capture());
    assert!(!patch.capabilities().can_synchronize_mirror());

    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(LOCALS, None).unwrap();
    assert_inferred(&compilation, "first", "java.lang.String");
    assert_inferred(&compilation, "keys", "java.util.Set<java.lang.String>");

    let compilation = compiler.compile(LOOPS, None).unwrap();
    assert_inferred(&compilation, "name", "java.lang.String");

    assert_eq!(
        compiler.convert(&compilation).unwrap_err(),
        MirrorError::Unavailable
    );
}

#[test]
fn test_batch_completion_parsing_degrades_to_object() {
    let compilation = compile_with(
        HostProfile::batch().with_parse_mode(ParseMode::Completion),
        r#"
        import lombok.val;

        class Degraded {
            void run() {
                val text = "text";
            }
        }
        "#,
    );

    assert_inferred(&compilation, "text", "java.lang.Object");
}

#[test]
fn test_non_iterable_collections_are_still_reported() {
    let compilation = compile(
        r#"
        import lombok.val;

        class Broken {
            void run(String text) {
                for (val letter : text) { }
            }
        }
        "#,
    );

    assert_eq!(declared(&compilation, "letter"), "java.lang.Object");
    assert!(matches!(
        compilation.problems(),
        [ResolveError::NotIterable { found, .. }] if found == "java.lang.String"
    ));
}

#[test]
fn test_independent_compilations_run_on_separate_threads() {
    let sources = [LOCALS, LOOPS];

    let declared_types: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .zip(["first", "name"])
            .map(|(source, name)| {
                scope.spawn(move || {
                    let compilation = compile(source);
                    declared(&compilation, name)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(declared_types, vec!["java.lang.String", "java.lang.String"]);
}
