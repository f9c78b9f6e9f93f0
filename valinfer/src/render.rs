// S-expression formatter for resolved declarations and the tooling tree
// One line per declaration, grouped by type and method

use valinfer_host::mirror::{ExtendedModifier, MirrorModifiers};
use valinfer_host::*;

pub fn format_locals(compilation: &Compilation) -> String {
    let unit = &compilation.unit;
    let types: Vec<String> = unit
        .types
        .iter()
        .map(|declaration| format_type_with_indent(compilation, declaration, 2))
        .collect();

    let package = unit.package_name();
    let header = if package.is_empty() {
        "(unit".to_string()
    } else {
        format!("(unit {package}")
    };

    if types.is_empty() {
        format!("{header})")
    } else {
        format!("{header}\n  {})", types.join("\n  "))
    }
}

fn format_type_with_indent(
    compilation: &Compilation,
    declaration: &TypeDeclaration,
    indent: usize,
) -> String {
    let methods: Vec<String> = declaration
        .methods
        .iter()
        .filter_map(|method| format_method_with_indent(compilation, method, indent + 2))
        .collect();

    if methods.is_empty() {
        format!("(type {})", declaration.name.name)
    } else {
        let padding = " ".repeat(indent + 2);
        format!(
            "(type {}\n{padding}{})",
            declaration.name.name,
            methods.join(&format!("\n{padding}"))
        )
    }
}

fn format_method_with_indent(
    compilation: &Compilation,
    method: &MethodDeclaration,
    indent: usize,
) -> Option<String> {
    let body = method.body.as_ref()?;
    let mut locals = Vec::new();
    for statement in &body.statements {
        collect_locals(statement, &mut locals);
    }

    let lines: Vec<String> = locals
        .iter()
        .map(|local| format_local(compilation, local))
        .collect();
    if lines.is_empty() {
        return Some(format!("(method {})", method.name.name));
    }

    let padding = " ".repeat(indent + 2);
    Some(format!(
        "(method {}\n{padding}{})",
        method.name.name,
        lines.join(&format!("\n{padding}"))
    ))
}

fn collect_locals<'u>(statement: &'u Statement, found: &mut Vec<&'u LocalDeclaration>) {
    match &statement.kind {
        StatementKind::Local(local) => found.push(local),
        StatementKind::ForEach(foreach) => {
            found.push(&foreach.element_variable);
            collect_locals(&foreach.body, found);
        }
        StatementKind::Block(block) => {
            for statement in &block.statements {
                collect_locals(statement, found);
            }
        }
        StatementKind::Return(_) | StatementKind::Expression(_) | StatementKind::Empty => {}
    }
}

fn format_local(compilation: &Compilation, local: &LocalDeclaration) -> String {
    let environment = &compilation.environment;
    let declared = match (&local.type_ref.kind, &local.binding) {
        (TypeReferenceKind::Resolved(binding), _) | (_, Some(binding)) => {
            environment.display(binding)
        }
        _ => format!("(unresolved {})", local.type_ref.tokens().join(".")),
    };

    let mut parts = vec![format!("(local {}", local.name.name), format!("(type {declared})")];
    if local.is_final() {
        parts.push("final".to_string());
    }
    if !local.annotations.is_empty() {
        let names: Vec<String> = local
            .annotations
            .iter()
            .map(|annotation| format!("@{}", annotation.type_ref.tokens().join(".")))
            .collect();
        parts.push(format!("(annotations {})", names.join(" ")));
    }

    format!("{})", parts.join(" "))
}

pub fn format_mirror(conversion: &MirrorConversion) -> String {
    let declarations: Vec<String> = conversion
        .unit
        .declarations()
        .into_iter()
        .map(format_mirror_declaration)
        .collect();
    let nodes: Vec<String> = conversion
        .node_map
        .iter()
        .map(|(mirror, origin)| format!("({} {origin})", mirror.as_u32()))
        .collect();

    let mut sections = vec!["(mirror".to_string()];
    for declaration in declarations {
        sections.push(format!("  {declaration}"));
    }
    if nodes.is_empty() {
        sections.push("  (nodes))".to_string());
    } else {
        sections.push(format!("  (nodes\n    {}))", nodes.join("\n    ")));
    }
    sections.join("\n")
}

fn format_mirror_declaration(declaration: &dyn MirrorModifiers) -> String {
    let modifiers = match declaration.modifiers() {
        Some([]) => "(modifiers)".to_string(),
        Some(modifiers) => {
            let rendered: Vec<String> = modifiers.iter().map(format_extended_modifier).collect();
            format!("(modifiers {})", rendered.join(" "))
        }
        None => "(modifiers unavailable)".to_string(),
    };

    format!(
        "(declaration {} {} (type {}) {modifiers})",
        declaration.id().as_u32(),
        declaration.name().identifier,
        declaration.var_type().text
    )
}

fn format_extended_modifier(modifier: &ExtendedModifier) -> String {
    match modifier {
        ExtendedModifier::Modifier(modifier) => modifier.keyword.keyword().to_string(),
        ExtendedModifier::Annotation(annotation) => {
            format!(
                "(@{} {})",
                annotation.type_name.fully_qualified_name(),
                annotation.id.as_u32()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valinfer_core::ValPatch;

    const SOURCE: &str = r#"
        package demo;
        import lombok.val;

        class Sample {
            void run() {
                val text = "text";
                int plain = 1;
            }
        }
    "#;

    #[test]
    fn test_locals_show_rewritten_declarations() {
        let mut profile = HostProfile::ide();
        let patch = ValPatch::install(&mut profile);
        let compilation = Compiler::new(profile, &patch).compile(SOURCE, None).unwrap();

        let rendered = format_locals(&compilation);
        assert!(rendered.starts_with("(unit demo"));
        assert!(rendered.contains("(local text (type java.lang.String) final (annotations @val))"));
        assert!(rendered.contains("(local plain (type int))"));
    }

    #[test]
    fn test_mirror_shows_synthesized_modifiers() {
        let mut profile = HostProfile::ide();
        let patch = ValPatch::install(&mut profile);
        let compiler = Compiler::new(profile, &patch);
        let compilation = compiler.compile(SOURCE, None).unwrap();
        let conversion = compiler.convert(&compilation).unwrap();

        let rendered = format_mirror(&conversion);
        assert!(rendered.starts_with("(mirror"));
        assert!(rendered.contains("text (type java.lang.String) (modifiers final (@val "));
        assert!(rendered.contains("plain (type int) (modifiers))"));
    }
}
