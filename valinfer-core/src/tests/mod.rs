//! Unit tests for placeholder inference
//!
//! Each module exercises one component against the real host environment. End-to-end
//! behavior through a patched compiler lives in the crate's `tests/` directory.

mod test_component;
mod test_mirror_sync;

use valinfer_host::parser::SourceParser;
use valinfer_host::*;

/// Environment and naming context of a compilation unit, without resolving its bodies
pub(crate) fn environment_for(source: &str) -> (TypeEnvironment, TypeContext) {
    let unit = SourceParser::new(ParseMode::Full, &NoHooks)
        .parse_unit(source, None)
        .unwrap();
    let mut environment = TypeEnvironment::bootstrap();
    environment.declare_unit(&unit).unwrap();
    let context = TypeContext::for_unit(&unit);
    (environment, context)
}

pub(crate) fn expression(source: &str) -> Expression {
    SourceParser::new(ParseMode::Full, &NoHooks)
        .parse_expression(source)
        .unwrap()
}

pub(crate) fn declaration(type_ref: TypeReference) -> LocalDeclaration {
    LocalDeclaration {
        id: NodeId::fresh(),
        name: Identifier::new("x", Span::default()),
        type_ref,
        modifiers: Modifiers::NONE,
        annotations: Vec::new(),
        source_modifiers: Vec::new(),
        initialization: None,
        injected: InjectedFields::default(),
        binding: None,
        span: Span::default(),
    }
}

pub(crate) fn val() -> TypeReference {
    TypeReference::simple("val", Span::new(4, 7))
}

pub(crate) const WITH_VAL_IMPORT: &str = r#"
    package demo;
    import java.util.*;
    import lombok.val;
    class Holder { }
"#;
