//! Convention-based bootstrap core for the embark application framework.
//!
//! Wires independently-authored units (middlewares, route handlers,
//! initializers, models) into a running application: a name-keyed
//! dependency injector with greedy-prefix resolution and currying, a
//! blocking directory-to-object builder, and an ordered,
//! partially-asynchronous initializer pipeline with per-environment
//! variant selection and fail-fast error propagation.

pub mod bootstrap;
pub mod environment;
pub mod errors;
pub mod initializers;
pub mod inject;
pub mod registry;
pub mod tree;
pub mod unit;

// Re-export key types for convenience
pub use bootstrap::{BootSession, BootSessionBuilder};
pub use environment::Environment;
pub use errors::BootError;
pub use initializers::{
    run_initializers, InitializerDescriptor, InitializerPipeline, PipelineState, StepKind,
    COMPLETION_PARAM,
};
pub use inject::{BoundUnit, Injection, Injector, InvokePolicy};
pub use registry::{DependencyRegistry, RegistryBuilder, INTERNAL_SIGIL};
pub use tree::{build_directory_object, DataFileLoader, DirectoryObject, Node, StaticUnitSet, UnitLoader};
pub use unit::{arg, Completion, Context, Signature, Unit, UnitArg, UnitResult, UnitValue};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "embark";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Get framework name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
