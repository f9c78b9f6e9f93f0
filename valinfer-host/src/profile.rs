// Host configuration and extension surface
// Which host variant is running, how it parses, and the fields patches may append

use crate::ast::{Expression, LocalDeclaration, NodeId};
use crate::error::HostError;
use crate::mirror::{AstConverter, MirrorNodeId};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

/// The two host variants a patch may find itself installed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostVariant {
    /// Interactive host: appendable declaration fields and a tooling AST
    #[default]
    Ide,
    /// Batch compiler: plain declarations, no tooling AST
    Batch,
}

impl HostVariant {
    pub fn name(&self) -> &'static str {
        match self {
            HostVariant::Ide => "ide",
            HostVariant::Batch => "batch",
        }
    }
}

impl fmt::Display for HostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    #[default]
    Full,
    /// Completion parsing: initializers and for-each collections are dropped once parsed
    Completion,
}

/// Language level of the tooling AST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AstLevel {
    /// No modifier or annotation nodes; modifiers are flags only
    Jls2,
    Jls3,
    #[default]
    Jls8,
}

impl AstLevel {
    pub fn supports_modifier_nodes(&self) -> bool {
        *self >= AstLevel::Jls3
    }
}

impl fmt::Display for AstLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstLevel::Jls2 => f.write_str("jls2"),
            AstLevel::Jls3 => f.write_str("jls3"),
            AstLevel::Jls8 => f.write_str("jls8"),
        }
    }
}

/// Host configuration, plus the fields patches appended to local declarations
#[derive(Debug, Clone, Default)]
pub struct HostProfile {
    pub variant: HostVariant,
    pub parse_mode: ParseMode,
    pub ast_level: AstLevel,
    appended_fields: IndexSet<&'static str>,
}

impl HostProfile {
    pub fn ide() -> Self {
        Self::default()
    }

    pub fn batch() -> Self {
        Self {
            variant: HostVariant::Batch,
            ..Self::default()
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn with_ast_level(mut self, ast_level: AstLevel) -> Self {
        self.ast_level = ast_level;
        self
    }

    pub fn has_mirror_ast(&self) -> bool {
        self.variant == HostVariant::Ide
    }

    /// Append a field to every local declaration node. Only the IDE host allows this.
    pub fn append_local_field(&mut self, name: &'static str) -> Result<FieldHandle, HostError> {
        match self.variant {
            HostVariant::Ide => {
                self.appended_fields.insert(name);
                Ok(FieldHandle { name })
            }
            HostVariant::Batch => Err(HostError::FieldInjectionUnsupported {
                variant: self.variant.name(),
                field: name,
            }),
        }
    }

    /// Look up a previously appended field by name
    pub fn local_field(&self, name: &str) -> Result<FieldHandle, HostError> {
        self.appended_fields
            .get(name)
            .map(|name| FieldHandle { name: *name })
            .ok_or_else(|| HostError::NoSuchField {
                name: name.to_string(),
            })
    }

    /// Access to the tooling AST's node registry
    pub fn mirror_registration(&self) -> Result<MirrorRegistration, HostError> {
        if self.has_mirror_ast() {
            Ok(MirrorRegistration { _private: () })
        } else {
            Err(HostError::MirrorUnavailable {
                variant: self.variant.name(),
            })
        }
    }
}

/// Handle to a field appended onto local declaration nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    name: &'static str,
}

impl FieldHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, declaration: &LocalDeclaration) -> Option<Arc<Expression>> {
        declaration.injected.values.get(self.name).cloned()
    }

    pub fn set(&self, declaration: &mut LocalDeclaration, value: Arc<Expression>) {
        declaration.injected.values.insert(self.name, value);
    }
}

/// Capability to record synthesized tooling nodes against their origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorRegistration {
    _private: (),
}

impl MirrorRegistration {
    pub fn record(&self, converter: &mut AstConverter<'_>, mirror: MirrorNodeId, origin: NodeId) {
        converter.record_nodes(mirror, origin);
    }
}
