//! Ordered initializer pipeline.
//!
//! Runs a declared, ordered list of initialization steps — some
//! synchronous, some asynchronous — strictly in sequence, stopping at
//! the first failure.
//!
//! ## Behavior
//! - The ordering producer is itself a callable unit; it is injected
//!   with forced invocation and must return the descriptor list.
//! - Each step's unit may be split per environment; the active
//!   environment selects the variant.
//! - A step whose last declared parameter is the reserved completion
//!   name (`done`) is asynchronous: it receives a [`Completion`] handle
//!   and the pipeline suspends until the handle fires. Only one step is
//!   ever in flight.
//! - Synchronous failures and completion-callback errors are normalized
//!   into the same per-step failure signal; the first failure becomes
//!   the pipeline's completion error and no further step runs. Already
//!   completed steps are not rolled back.

use std::path::Path;

use crate::environment::Environment;
use crate::errors::BootError;
use crate::inject::{Injection, Injector, InvokePolicy};
use crate::tree::UnitLoader;
use crate::unit::{arg, Completion, Signature, Unit, UnitArg, UnitValue};

/// Reserved parameter name marking an initializer as asynchronous when
/// declared in final position.
pub const COMPLETION_PARAM: &str = "done";

/// Variant key consulted when an environment-split unit has no entry for
/// the active environment.
const DEFAULT_VARIANT: &str = "default";

/// Extra positional arguments a descriptor hands to its initializer.
/// These are not registry dependencies; they complete the curry after
/// dependency resolution.
#[derive(Clone, Default)]
pub enum ExtraArgs {
    #[default]
    None,
    One(UnitArg),
    Many(Vec<UnitArg>),
}

impl ExtraArgs {
    fn to_vec(&self) -> Vec<UnitArg> {
        match self {
            Self::None => Vec::new(),
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }
}

impl std::fmt::Debug for ExtraArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExtraArgs({})", self.len())
    }
}

/// Declares which initializer unit to run and the extra arguments to
/// pass positionally.
#[derive(Debug, Clone)]
pub struct InitializerDescriptor {
    component: String,
    dependencies: ExtraArgs,
}

impl InitializerDescriptor {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            dependencies: ExtraArgs::None,
        }
    }

    /// Pass a single extra argument
    pub fn with_dependency(mut self, value: UnitArg) -> Self {
        self.dependencies = ExtraArgs::One(value);
        self
    }

    /// Pass a list of extra arguments
    pub fn with_dependencies(mut self, values: Vec<UnitArg>) -> Self {
        self.dependencies = ExtraArgs::Many(values);
        self
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

/// Synchronous-or-asynchronous classification of a step, by the
/// reserved-name convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Synchronous,
    Asynchronous,
}

/// Classify a signature by the completion-name convention. A reserved
/// name anywhere but the final position is a likely authoring mistake:
/// the unit is treated as synchronous and a warning is surfaced.
pub fn classify(signature: &Signature, component: &str) -> StepKind {
    if signature.last() == Some(COMPLETION_PARAM) {
        return StepKind::Asynchronous;
    }
    if signature.contains(COMPLETION_PARAM) {
        tracing::warn!(
            component,
            "reserved completion parameter '{}' is not in final position; treating initializer as synchronous",
            COMPLETION_PARAM
        );
    }
    StepKind::Synchronous
}

/// Pipeline progress, kept for diagnostics after completion or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ResolvingOrder,
    Running(usize),
    Done,
    Failed,
}

/// One initialization phase over a declared step sequence.
pub struct InitializerPipeline<'a> {
    environment: Environment,
    base_path: &'a Path,
    injector: &'a Injector,
    loader: &'a dyn UnitLoader,
    state: PipelineState,
    executed: Vec<String>,
}

impl<'a> InitializerPipeline<'a> {
    pub fn new(
        environment: Environment,
        base_path: &'a Path,
        injector: &'a Injector,
        loader: &'a dyn UnitLoader,
    ) -> Self {
        Self {
            environment,
            base_path,
            injector,
            loader,
            state: PipelineState::Idle,
            executed: Vec::new(),
        }
    }

    /// Current state; after [`run`](Self::run) this is `Done` or `Failed`.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Components that started, in execution order. On failure the last
    /// entry is the step that failed.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Run the whole phase. Completion is reported exactly once, as this
    /// future's output.
    pub async fn run(&mut self, ordering: &Unit) -> Result<(), BootError> {
        self.state = PipelineState::ResolvingOrder;
        let descriptors = match self.resolve_order(ordering) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                self.state = PipelineState::Failed;
                return Err(err);
            }
        };
        tracing::info!(
            steps = descriptors.len(),
            environment = %self.environment,
            "running initializers"
        );

        for (index, descriptor) in descriptors.iter().enumerate() {
            self.state = PipelineState::Running(index);
            self.executed.push(descriptor.component.clone());
            tracing::debug!(step = index, component = %descriptor.component, "initializer starting");
            if let Err(err) = self.run_step(descriptor).await {
                self.state = PipelineState::Failed;
                tracing::error!(component = %descriptor.component, error = %err, "initializer failed");
                return Err(err);
            }
        }

        self.state = PipelineState::Done;
        tracing::info!(steps = self.executed.len(), "initializers complete");
        Ok(())
    }

    fn resolve_order(&self, ordering: &Unit) -> Result<Vec<InitializerDescriptor>, BootError> {
        let injected = self.injector.inject(ordering, InvokePolicy::MustInvoke)?;
        let Injection::Value(value) = injected else {
            return Err(BootError::configuration(
                "initializer ordering unit did not produce a value",
            ));
        };
        value
            .downcast_ref::<Vec<InitializerDescriptor>>()
            .cloned()
            .ok_or_else(|| {
                BootError::configuration(
                    "initializer ordering unit must return a list of initializer descriptors",
                )
            })
    }

    async fn run_step(&self, descriptor: &InitializerDescriptor) -> Result<(), BootError> {
        let component = descriptor.component.as_str();
        let unit = self.load_step_unit(component)?;
        let extras = descriptor.dependencies.to_vec();

        match classify(unit.signature(), component) {
            StepKind::Synchronous => self.run_sync(component, &unit, &extras),
            StepKind::Asynchronous => self.run_async(component, &unit, extras).await,
        }
    }

    fn load_step_unit(&self, component: &str) -> Result<Unit, BootError> {
        let rel = Path::new(component);
        let full = self.base_path.join(component);
        let loaded = self
            .loader
            .load(rel, &full)
            .ok_or_else(|| {
                BootError::misconfigured(component, "no loadable initializer unit found")
            })??;

        match self.select_variant(component, loaded)? {
            UnitValue::Callable(unit) => Ok(unit),
            _ => Err(BootError::misconfigured(
                component,
                "selected initializer is not callable",
            )),
        }
    }

    fn select_variant(
        &self,
        component: &str,
        value: UnitValue,
    ) -> Result<UnitValue, BootError> {
        match value {
            UnitValue::PerEnvironment(mut variants) => {
                let key = self.environment.variant_key();
                if let Some(selected) = variants.remove(key) {
                    return Ok(selected);
                }
                variants.remove(DEFAULT_VARIANT).ok_or_else(|| {
                    BootError::misconfigured(
                        component,
                        format!("no '{}' or '{}' variant", key, DEFAULT_VARIANT),
                    )
                })
            }
            other => Ok(other),
        }
    }

    /// Invoke a synchronous step, with the extra arguments completing
    /// the curry. Failures never escape synchronously; they become the
    /// step's failure signal so sequencing is uniform for both kinds.
    fn run_sync(&self, component: &str, unit: &Unit, extras: &[UnitArg]) -> Result<(), BootError> {
        let injected = self
            .injector
            .inject(unit, InvokePolicy::AllowPartial)
            .map_err(|err| step_failure(component, err))?;

        match injected {
            Injection::Value(_) if extras.is_empty() => Ok(()),
            Injection::Value(_) => Err(BootError::misconfigured(
                component,
                "declares no parameters for its extra arguments",
            )),
            Injection::Partial(bound) => bound
                .call(extras)
                .map(|_| ())
                .map_err(|err| step_failure(component, err)),
        }
    }

    /// Invoke an asynchronous step and suspend until its completion
    /// signal fires. After dependency resolution the step must have one
    /// slot per extra argument plus the trailing completion callback.
    async fn run_async(
        &self,
        component: &str,
        unit: &Unit,
        mut extras: Vec<UnitArg>,
    ) -> Result<(), BootError> {
        let injected = self
            .injector
            .inject(unit, InvokePolicy::AllowPartial)
            .map_err(|err| step_failure(component, err))?;

        let Injection::Partial(bound) = injected else {
            return Err(BootError::AsyncInitializerArity {
                component: component.to_string(),
                residual: 0,
            });
        };
        if bound.residual() != extras.len() + 1 {
            return Err(BootError::AsyncInitializerArity {
                component: component.to_string(),
                residual: bound.residual(),
            });
        }

        let (done, signal) = Completion::channel();
        extras.push(arg(done));
        bound
            .call(&extras)
            .map_err(|err| step_failure(component, err))?;
        // Release our own handle so a step that dropped its copy without
        // firing closes the channel instead of stalling the await.
        drop(extras);

        match signal.await {
            Ok(None) => Ok(()),
            Ok(Some(err)) => Err(step_failure(component, err)),
            Err(_) => Err(step_failure(
                component,
                BootError::configuration("completion signal dropped without being resolved"),
            )),
        }
    }
}

impl std::fmt::Debug for InitializerPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializerPipeline")
            .field("environment", &self.environment)
            .field("state", &self.state)
            .field("executed", &self.executed)
            .finish()
    }
}

fn step_failure(component: &str, err: BootError) -> BootError {
    BootError::UnitExecution {
        component: component.to_string(),
        source: Box::new(err),
    }
}

/// Run one initialization phase: resolve the declared order, then
/// execute every step strictly in sequence, failing fast.
pub async fn run_initializers(
    environment: Environment,
    ordering: &Unit,
    base_path: &Path,
    injector: &Injector,
    loader: &dyn UnitLoader,
) -> Result<(), BootError> {
    InitializerPipeline::new(environment, base_path, injector, loader)
        .run(ordering)
        .await
}
