//! Replicating rewritten modifiers onto the tooling AST
//!
//! The converter only copies modifiers that were written in the source. A rewritten
//! declaration also carries `final` and the marker annotation, so tools would see a mutable
//! `val` without this step. A synthesized annotation is registered against the primary
//! annotation, and its name nodes against the annotation's type reference. Synthesized nodes
//! take the marker annotation's source range.

use crate::capability::Capabilities;
use crate::placeholder::{is_marker_annotation, MARKER_NAME, MARKER_PACKAGE};
use valinfer_host::mirror::{
    AstConverter, ExtendedModifier, MirrorModifiers, ModifierKeyword, SourceRange,
};
use valinfer_host::{LocalDeclaration, MirrorError};

/// What a synchronization added to the tooling node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub added_final: bool,
    pub added_annotation: bool,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.added_final || self.added_annotation
    }
}

/// Bring `target`'s modifier list in line with the rewritten `declaration`.
///
/// Does nothing unless the declaration is final and carries a marker annotation, the host
/// lets synthesized nodes be registered, and the tooling node has a modifier list. Running it
/// again on the same pair adds nothing.
pub fn synchronize(
    capabilities: &Capabilities,
    converter: &mut AstConverter<'_>,
    target: &mut dyn MirrorModifiers,
    declaration: &LocalDeclaration,
) -> Result<SyncOutcome, MirrorError> {
    let mut outcome = SyncOutcome::default();

    if !capabilities.can_synchronize_mirror() || !declaration.is_final() {
        return Ok(outcome);
    }
    let Some(annotation) = declaration
        .annotations
        .iter()
        .find(|candidate| is_marker_annotation(candidate))
    else {
        return Ok(outcome);
    };
    let Some(existing) = target.modifiers() else {
        return Ok(outcome);
    };

    let has_final = existing.iter().any(|modifier| {
        matches!(
            modifier,
            ExtendedModifier::Modifier(modifier) if modifier.keyword == ModifierKeyword::Final
        )
    });
    let has_annotation = existing.iter().any(|modifier| match modifier {
        ExtendedModifier::Annotation(marker) => {
            let name = marker.type_name.fully_qualified_name();
            name == MARKER_NAME || name == format!("{MARKER_PACKAGE}.{MARKER_NAME}")
        }
        ExtendedModifier::Modifier(_) => false,
    });

    let range = SourceRange::from(annotation.span);
    let mut synthesized = Vec::new();

    if !has_final {
        let mut modifier = converter.ast_mut().new_modifier(ModifierKeyword::Final)?;
        modifier.range = range;
        synthesized.push(ExtendedModifier::Modifier(modifier));
        outcome.added_final = true;
    }

    if !has_annotation {
        let ast = converter.ast_mut();
        let mut type_name = ast.new_name(&annotation.type_ref.tokens())?;
        type_name.set_range(range);
        let mut marker = ast.new_marker_annotation(type_name)?;
        marker.range = range;

        capabilities.register_mirror_node(converter, marker.id, annotation.id);
        for name in marker.type_name.node_ids() {
            capabilities.register_mirror_node(converter, name, annotation.type_ref.id);
        }
        synthesized.push(ExtendedModifier::Annotation(marker));
        outcome.added_annotation = true;
    }

    if let Some(modifiers) = target.modifiers_mut() {
        modifiers.extend(synthesized);
    }

    if outcome.changed() {
        tracing::debug!(
            local = %declaration.name.name,
            added_final = outcome.added_final,
            added_annotation = outcome.added_annotation,
            "synchronized tooling modifiers"
        );
    }
    Ok(outcome)
}
