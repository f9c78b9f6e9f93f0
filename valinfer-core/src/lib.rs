//! valinfer core
//!
//! Local type inference for declarations written with the `val` placeholder, installed into the
//! valinfer host as a set of compiler hooks.
//!
//! ## Architecture
//!
//! - **Capabilities**: what the host agreed to provide, detected once at install time
//! - **Capture**: parser events that keep initializers alive through completion parsing
//! - **Placeholder recognition**: shape of the declared type plus its binding in scope
//! - **Resolution guard**: every expression goes through host resolution at most once
//! - **Component types**: element type of arrays and `Iterable` implementations
//! - **Rewrite engine**: makes placeholder declarations final, marked and concretely typed
//! - **Mirror synchronization**: carries the rewrite over to the tooling AST
//!
//! ## Usage
//!
//! ```no_run
//! use valinfer_core::ValPatch;
//! use valinfer_host::{Compiler, HostProfile};
//!
//! let mut profile = HostProfile::ide();
//! let patch = ValPatch::install(&mut profile);
//! let compiler = Compiler::new(profile, &patch);
//! let compilation = compiler.compile("class A { void run() { } }", None)?;
//! # Ok::<(), valinfer_host::CompileError>(())
//! ```

pub mod capability;
pub mod capture;
pub mod component;
pub mod error;
pub mod guard;
pub mod mirror_sync;
pub mod patch;
pub mod placeholder;
pub mod rewrite;

// Re-export public API
pub use capability::{Capabilities, INIT_COPY_FIELD, ITERABLE_COPY_FIELD};
pub use component::{component_of, component_type};
pub use error::ValError;
pub use guard::{resolve_initializer_once, resolve_once};
pub use mirror_sync::{synchronize, SyncOutcome};
pub use patch::ValPatch;
pub use placeholder::{could_be_placeholder, is_marker_annotation, is_placeholder, recognize};
pub use rewrite::{Inference, RewriteEngine};

#[cfg(test)]
mod tests;
