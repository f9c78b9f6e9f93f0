//! Host capability detection
//!
//! The patch asks the host once, at install time, for everything it may use later: two
//! appended fields on local declarations and access to the tooling AST's node registry. A
//! host that refuses any of them keeps working with that feature switched off.

use crate::error::ValError;
use std::sync::Arc;
use valinfer_host::mirror::{AstConverter, MirrorNodeId};
use valinfer_host::{Expression, FieldHandle, HostProfile, LocalDeclaration, MirrorRegistration, NodeId};

/// Appended field holding a second reference to a placeholder declaration's initializer
pub const INIT_COPY_FIELD: &str = "$initCopy";

/// Appended field holding a second reference to an enhanced for's collection, stored on the
/// element variable
pub const ITERABLE_COPY_FIELD: &str = "$iterableCopy";

/// What the host agreed to provide. Immutable once detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    init_copy: Option<FieldHandle>,
    iterable_copy: Option<FieldHandle>,
    mirror: Option<MirrorRegistration>,
}

impl Capabilities {
    /// Ask `profile` what it offers, appending the capture fields where the host allows it
    pub fn detect(profile: &mut HostProfile) -> Self {
        let init_copy = enabled(
            "initializer capture",
            profile.append_local_field(INIT_COPY_FIELD),
        );
        let iterable_copy = enabled(
            "collection capture",
            profile.append_local_field(ITERABLE_COPY_FIELD),
        );
        let mirror = enabled("tooling AST registration", profile.mirror_registration());

        let capabilities = Self {
            init_copy,
            iterable_copy,
            mirror,
        };
        tracing::debug!(
            host = %profile.variant,
            capture = capabilities.can_capture(),
            mirror = capabilities.can_synchronize_mirror(),
            "detected host capabilities"
        );
        capabilities
    }

    /// No capture and no tooling AST
    pub fn degraded() -> Self {
        Self::default()
    }

    pub fn can_capture(&self) -> bool {
        self.init_copy.is_some() && self.iterable_copy.is_some()
    }

    pub fn can_synchronize_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    /// Keep a second reference to `initialization` on the declaration. Returns whether it was
    /// stored.
    pub fn try_capture_initializer(
        &self,
        declaration: &mut LocalDeclaration,
        initialization: Arc<Expression>,
    ) -> bool {
        match self.init_copy {
            Some(field) => {
                field.set(declaration, initialization);
                true
            }
            None => false,
        }
    }

    /// Keep a second reference to an enhanced for's collection on its element variable
    pub fn try_capture_iterable_source(
        &self,
        element_variable: &mut LocalDeclaration,
        collection: Arc<Expression>,
    ) -> bool {
        match self.iterable_copy {
            Some(field) => {
                field.set(element_variable, collection);
                true
            }
            None => false,
        }
    }

    pub fn captured_initializer(&self, declaration: &LocalDeclaration) -> Option<Arc<Expression>> {
        self.init_copy.and_then(|field| field.get(declaration))
    }

    pub fn captured_iterable_source(
        &self,
        declaration: &LocalDeclaration,
    ) -> Option<Arc<Expression>> {
        self.iterable_copy.and_then(|field| field.get(declaration))
    }

    /// Record a synthesized tooling node against the primary node it stands for. Returns
    /// whether the host accepted the registration.
    pub fn register_mirror_node(
        &self,
        converter: &mut AstConverter<'_>,
        mirror: MirrorNodeId,
        origin: NodeId,
    ) -> bool {
        match self.mirror {
            Some(registration) => {
                registration.record(converter, mirror, origin);
                true
            }
            None => false,
        }
    }
}

fn enabled<T>(capability: &'static str, outcome: Result<T, valinfer_host::HostError>) -> Option<T> {
    match outcome {
        Ok(granted) => Some(granted),
        Err(source) => {
            let error = ValError::CapabilityMissing { capability, source };
            tracing::debug!(?error, "capability disabled");
            None
        }
    }
}
