use crate::capability::Capabilities;
use crate::mirror_sync::*;
use crate::patch::ValPatch;
use pretty_assertions::assert_eq;
use valinfer_host::mirror::*;
use valinfer_host::*;

const SOURCE: &str = r#"
    package demo;
    import lombok.val;

    class Sample {
        void run() {
            val greeting = "hello";
            final lombok.val count = 1;
            String plain = greeting;
        }
    }
"#;

fn local<'u>(unit: &'u CompilationUnit, name: &str) -> &'u LocalDeclaration {
    unit.types[0].methods[0]
        .body
        .as_ref()
        .unwrap()
        .statements
        .iter()
        .find_map(|statement| match &statement.kind {
            StatementKind::Local(local) if local.name.name == name => Some(local),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no local {name}"))
}

fn mirror_local(unit: &MirrorUnit, name: &str) -> VariableDeclarationStatement {
    unit.types[0].methods[0]
        .body
        .iter()
        .flatten()
        .find_map(|statement| match statement {
            MirrorStatement::VariableDeclaration(declaration)
                if declaration.name.identifier == name =>
            {
                Some(declaration.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("no tooling declaration {name}"))
}

fn marker_names(declaration: &dyn MirrorModifiers) -> Vec<String> {
    declaration
        .modifiers()
        .unwrap_or_default()
        .iter()
        .filter_map(|modifier| match modifier {
            ExtendedModifier::Annotation(annotation) => {
                Some(annotation.type_name.fully_qualified_name())
            }
            ExtendedModifier::Modifier(_) => None,
        })
        .collect()
}

fn final_count(declaration: &dyn MirrorModifiers) -> usize {
    declaration
        .modifiers()
        .unwrap_or_default()
        .iter()
        .filter(|modifier| matches!(modifier, ExtendedModifier::Modifier(_)))
        .count()
}

#[test]
fn test_conversion_carries_rewritten_modifiers() {
    let mut profile = HostProfile::ide();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(SOURCE, None).unwrap();
    let conversion = compiler.convert(&compilation).unwrap();

    let greeting = conversion.unit.declaration("greeting").unwrap();
    assert_eq!(final_count(greeting), 1);
    assert_eq!(marker_names(greeting), vec!["val"]);
    assert_eq!(greeting.var_type().text, "java.lang.String");

    // `final` was written, only the annotation is added, spelled like the source
    let count = conversion.unit.declaration("count").unwrap();
    assert_eq!(final_count(count), 1);
    assert_eq!(marker_names(count), vec!["lombok.val"]);

    let plain = conversion.unit.declaration("plain").unwrap();
    assert_eq!(plain.modifiers().map(<[_]>::len), Some(0));
}

#[test]
fn test_synthesized_nodes_are_registered_against_their_origin() {
    let mut profile = HostProfile::ide();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(SOURCE, None).unwrap();
    let conversion = compiler.convert(&compilation).unwrap();

    let primary = local(&compilation.unit, "count");
    let marker = &primary.annotations[0];
    let tooling = mirror_local(&conversion.unit, "count");
    let ExtendedModifier::Annotation(annotation) = tooling.modifiers.as_ref().unwrap().last().unwrap()
    else {
        panic!("expected the synthesized annotation last");
    };

    assert_eq!(conversion.node_map.get(&annotation.id), Some(&marker.id));
    for name in annotation.type_name.node_ids() {
        assert_eq!(conversion.node_map.get(&name), Some(&marker.type_ref.id));
    }
    assert_eq!(annotation.range, SourceRange::from(marker.span));
    assert_eq!(annotation.type_name.range(), SourceRange::from(marker.span));
}

#[test]
fn test_synchronizing_twice_adds_nothing() {
    let mut profile = HostProfile::ide();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(SOURCE, None).unwrap();
    let conversion = compiler.convert(&compilation).unwrap();

    let primary = local(&compilation.unit, "greeting");
    let mut tooling = mirror_local(&conversion.unit, "greeting");
    let before = tooling.clone();

    let mut converter = AstConverter::new(&compilation.environment, &patch, AstLevel::Jls8);
    let outcome = synchronize(patch.capabilities(), &mut converter, &mut tooling, primary).unwrap();

    assert_eq!(outcome, SyncOutcome::default());
    assert_eq!(tooling, before);
}

#[test]
fn test_fresh_declaration_is_synchronized_once() {
    let mut profile = HostProfile::ide();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(SOURCE, None).unwrap();
    let primary = local(&compilation.unit, "greeting");

    let mut converter = AstConverter::new(&compilation.environment, &NoHooks, AstLevel::Jls8);
    let name = converter.ast_mut().new_simple_name("greeting").unwrap();
    let var_type = converter
        .ast_mut()
        .new_type("java.lang.String".to_string(), SourceRange::default());
    let mut tooling = VariableDeclarationStatement {
        id: var_type.id,
        modifiers: Some(Vec::new()),
        var_type,
        name,
        initializer_range: None,
        range: SourceRange::default(),
    };

    let first = synchronize(patch.capabilities(), &mut converter, &mut tooling, primary).unwrap();
    let second = synchronize(patch.capabilities(), &mut converter, &mut tooling, primary).unwrap();

    assert_eq!(
        first,
        SyncOutcome {
            added_final: true,
            added_annotation: true,
        }
    );
    assert!(!second.changed());
    assert_eq!(final_count(&tooling), 1);
    assert_eq!(marker_names(&tooling), vec!["val"]);
}

#[test]
fn test_oldest_ast_level_has_nothing_to_synchronize() {
    let mut profile = HostProfile::ide().with_ast_level(AstLevel::Jls2);
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(SOURCE, None).unwrap();
    let conversion = compiler.convert(&compilation).unwrap();

    let greeting = conversion.unit.declaration("greeting").unwrap();
    assert!(greeting.modifiers().is_none());
    assert_eq!(greeting.var_type().text, "java.lang.String");
}

#[test]
fn test_without_registration_nothing_is_synthesized() {
    let mut profile = HostProfile::ide();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler.compile(SOURCE, None).unwrap();
    let primary = local(&compilation.unit, "greeting");

    let mut converter = AstConverter::new(&compilation.environment, &NoHooks, AstLevel::Jls8);
    let mut tooling = mirror_local(&compiler.convert(&compilation).unwrap().unit, "plain");
    let before = tooling.clone();

    let outcome = synchronize(&Capabilities::degraded(), &mut converter, &mut tooling, primary).unwrap();
    assert!(!outcome.changed());
    assert_eq!(tooling, before);
}

#[test]
fn test_enhanced_for_parameter_is_synchronized() {
    let mut profile = HostProfile::ide();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler
        .compile(
            r#"
            import lombok.val;

            class Loops {
                void run(String[] words) {
                    for (val word : words) { }
                }
            }
            "#,
            None,
        )
        .unwrap();
    let conversion = compiler.convert(&compilation).unwrap();

    let word = conversion.unit.declaration("word").unwrap();
    assert_eq!(final_count(word), 1);
    assert_eq!(marker_names(word), vec!["val"]);
    assert_eq!(word.var_type().text, "java.lang.String");
}
