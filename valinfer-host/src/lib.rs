// valinfer host compiler
// Parser, type environment, resolution pass and tooling AST, with hook points for patches

pub mod ast;
mod bootstrap;
pub mod error;
pub mod hooks;
pub mod mirror;
pub mod parser;
pub mod profile;
pub mod resolve;
pub mod scope;
pub mod types;

pub use ast::*;
pub use error::*;
pub use hooks::{CompilerHooks, NoHooks, ResolveFlow};
pub use profile::{AstLevel, FieldHandle, HostProfile, HostVariant, MirrorRegistration, ParseMode};
pub use resolve::{ResolutionReport, Resolver, TypeResolver};
pub use scope::BlockScope;
pub use types::{TypeBinding, TypeContext, TypeEnvironment, TypeId};

use indexmap::IndexMap;
use mirror::{AstConverter, MirrorNodeId, MirrorUnit};
use parser::SourceParser;

/// Result of parsing, binding and resolving one source
#[derive(Debug)]
pub struct Compilation {
    pub unit: CompilationUnit,
    pub environment: TypeEnvironment,
    pub report: ResolutionReport,
    pub source: String,
}

impl Compilation {
    pub fn problems(&self) -> &[ResolveError] {
        &self.report.problems
    }
}

/// Tooling tree for a compilation, with the primary node each tooling node came from
#[derive(Debug)]
pub struct MirrorConversion {
    pub unit: MirrorUnit,
    pub node_map: IndexMap<MirrorNodeId, NodeId>,
}

/// One host instance: a profile plus whatever hooks were installed into it
pub struct Compiler<'h> {
    profile: HostProfile,
    hooks: &'h dyn CompilerHooks,
}

impl<'h> Compiler<'h> {
    pub fn new(profile: HostProfile, hooks: &'h dyn CompilerHooks) -> Self {
        Self { profile, hooks }
    }

    pub fn profile(&self) -> &HostProfile {
        &self.profile
    }

    pub fn parse(&self, source: &str, source_file: Option<String>) -> ParseResult<CompilationUnit> {
        SourceParser::new(self.profile.parse_mode, self.hooks).parse_unit(source, source_file)
    }

    pub fn compile(
        &self,
        source: &str,
        source_file: Option<String>,
    ) -> Result<Compilation, CompileError> {
        let mut unit = self.parse(source, source_file)?;

        let mut environment = TypeEnvironment::bootstrap();
        environment
            .declare_unit(&unit)
            .map_err(|errors| CompileError::Declarations {
                src: source.to_string(),
                errors,
            })?;

        let report = {
            let resolver = Resolver::new(&environment, self.hooks);
            resolver.resolve_unit(&mut unit);
            resolver.finish()
        };
        tracing::debug!(
            problems = report.problems.len(),
            file = unit.source_file.as_deref().unwrap_or("<input>"),
            "compilation resolved"
        );

        Ok(Compilation {
            unit,
            environment,
            report,
            source: source.to_string(),
        })
    }

    /// Build the tooling tree. Only the IDE host has one.
    pub fn convert(&self, compilation: &Compilation) -> Result<MirrorConversion, MirrorError> {
        if !self.profile.has_mirror_ast() {
            return Err(MirrorError::Unavailable);
        }

        let mut converter =
            AstConverter::new(&compilation.environment, self.hooks, self.profile.ast_level);
        let unit = converter.convert_unit(&compilation.unit)?;

        Ok(MirrorConversion {
            unit,
            node_map: converter.into_node_map(),
        })
    }
}

// Version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests;
