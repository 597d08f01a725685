//! Proclint Core
//!
//! Core engine for linting packaged healthcare process plugins: input
//! materialization, project preparation, descriptor discovery, reference
//! resolution, BPMN/FHIR parsing, and the typed finding catalog.

pub mod bpmn;
pub mod classfile;
pub mod classpath;
pub mod code_systems;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod fhir;
pub mod findings;
pub mod input;
pub mod project;
pub mod report;
pub mod resolve;
pub mod result;

pub use classpath::{ClassEntry, ClassIndex, ClassIndexCache, ClassLookup, ClassOrigin};
pub use code_systems::CodeSystemCache;
pub use descriptor::{ApiVersion, DescriptorHandle};
pub use discovery::{DescriptorSource, StaticDescriptorSource, discover};
pub use error::{ErrorKind, ProclintError};
pub use findings::{ElementIssue, Extra, Finding, FindingGroup, FindingKind, Severity, Subsystem};
pub use input::{ResolvedInput, resolve as resolve_input};
pub use project::{BuildRunner, MavenBuildRunner, ProjectKind, ProjectSetup, prepare};
pub use report::{PluginReport, ProjectReport, SeverityCounts};
pub use resolve::{
    ReferenceResolver, ResolutionOutcome, ResolvedReferences, normalize_reference,
};
pub use result::Result;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("proclint=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
