//! Error types for placeholder inference
//!
//! Following the host's miette patterns. Most failures inside the core are not errors at all:
//! a type that cannot be inferred falls back to `java.lang.Object`, and a capability the host
//! lacks disables the feature that needs it. Failures building tooling nodes are the host's
//! `MirrorError` and pass through unchanged.

use miette::Diagnostic;
use thiserror::Error;
use valinfer_host::HostError;

#[derive(Error, Diagnostic, Debug, Clone)]
pub enum ValError {
    /// The host refused something a feature needs. The feature is switched off.
    #[error("Host does not provide {capability}")]
    #[diagnostic(
        code(valinfer::core::capability_missing),
        help("Inference still runs; {capability} is disabled for this host")
    )]
    CapabilityMissing {
        capability: &'static str,
        #[source]
        source: HostError,
    },
}
