//! Bootstrap session.
//!
//! One `BootSession` is created per bootstrap call, immediately after
//! the application context and root paths are known. It owns the
//! dependency registry and the injector bound to the session context,
//! and exposes the three bootstrap operations: injection, directory
//! object building, and the initializer pipeline. There is no hidden
//! process-global state; independent sessions can coexist (e.g. in
//! tests).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::environment::Environment;
use crate::errors::BootError;
use crate::initializers::InitializerPipeline;
use crate::inject::{Injection, Injector, InvokePolicy};
use crate::registry::{DependencyRegistry, RegistryBuilder};
use crate::tree::{self, DirectoryObject, UnitLoader};
use crate::unit::{arg, Context, Unit, UnitArg};

/// A single bootstrap session: registry, environment, and context,
/// created once and threaded through every component call.
pub struct BootSession {
    id: Uuid,
    environment: Environment,
    registry: Arc<DependencyRegistry>,
    injector: Injector,
    booted: AtomicBool,
}

impl BootSession {
    pub fn builder() -> BootSessionBuilder {
        BootSessionBuilder::new()
    }

    /// Session identity, surfaced in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The injector bound to this session's context and registry
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Inject a unit against this session's registry.
    pub fn inject(&self, unit: &Unit, policy: InvokePolicy) -> Result<Injection, BootError> {
        self.injector.inject(unit, policy)
    }

    /// Populate a declared internal slot (write-once).
    pub fn fill_internal(
        &self,
        name: impl AsRef<str>,
        value: UnitArg,
    ) -> Result<(), BootError> {
        self.registry.fill_internal(name, value)
    }

    /// Build the mirrored object for a startup directory. Blocking by
    /// design; must complete before anything depending on it is used.
    pub fn build_directory_object(
        &self,
        root: &Path,
        loader: &dyn UnitLoader,
    ) -> Result<DirectoryObject, BootError> {
        tree::build_directory_object(root, &self.injector, loader)
    }

    /// Run one initializer phase against this session.
    pub async fn run_initializers(
        &self,
        ordering: &Unit,
        base_path: &Path,
        loader: &dyn UnitLoader,
    ) -> Result<(), BootError> {
        InitializerPipeline::new(self.environment, base_path, &self.injector, loader)
            .run(ordering)
            .await
    }

    /// Run the initializer phase once and mark the session bootstrapped.
    /// A second call is a configuration error; a failed boot does not
    /// re-arm the session.
    pub async fn boot(
        &self,
        ordering: &Unit,
        base_path: &Path,
        loader: &dyn UnitLoader,
    ) -> Result<(), BootError> {
        if self.booted.swap(true, Ordering::SeqCst) {
            return Err(BootError::AlreadyBootstrapped);
        }
        tracing::info!(session = %self.id, environment = %self.environment, "bootstrap starting");
        let outcome = self.run_initializers(ordering, base_path, loader).await;
        match &outcome {
            Ok(()) => tracing::info!(session = %self.id, "bootstrap complete"),
            Err(err) => tracing::error!(session = %self.id, error = %err, "bootstrap failed"),
        }
        outcome
    }

    pub fn is_booted(&self) -> bool {
        self.booted.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for BootSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootSession")
            .field("id", &self.id)
            .field("environment", &self.environment)
            .field("booted", &self.is_booted())
            .finish()
    }
}

/// Builder assembling a session's context, environment, and registry.
pub struct BootSessionBuilder {
    environment: Environment,
    context: Option<Context>,
    registry: RegistryBuilder,
}

impl BootSessionBuilder {
    pub fn new() -> Self {
        Self {
            environment: Environment::default(),
            context: None,
            registry: DependencyRegistry::builder(),
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// The receiver all injected and curried invocations are bound to
    /// (typically the application handle).
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Register an external (user-supplied) component.
    pub fn external(mut self, name: impl Into<String>, value: UnitArg) -> Self {
        self.registry = self.registry.external(name, value);
        self
    }

    /// Declare an internal slot populated later in the bootstrap
    /// sequence (read before population fails).
    pub fn internal_slot(mut self, name: impl Into<String>) -> Self {
        self.registry = self.registry.internal_slot(name);
        self
    }

    /// Declare and immediately populate an internal slot.
    pub fn internal(mut self, name: impl Into<String>, value: UnitArg) -> Self {
        self.registry = self.registry.internal(name, value);
        self
    }

    pub fn build(self) -> BootSession {
        let registry = Arc::new(self.registry.build());
        let context = self.context.unwrap_or_else(|| arg(()));
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "bootstrap session created");
        BootSession {
            id,
            environment: self.environment,
            injector: Injector::new(context, registry.clone()),
            registry,
            booted: AtomicBool::new(false),
        }
    }
}

impl Default for BootSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
