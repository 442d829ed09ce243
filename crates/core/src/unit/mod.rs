//! Callable units and the values loaders produce for them.
//!
//! A unit is an independently-authored piece of code (a middleware, a
//! route handler, an initializer) together with the explicit, ordered
//! declaration of the named dependencies it requires. Dependency values,
//! arguments, and return values are type-erased shared handles; a unit
//! body downcasts what it needs.

pub mod completion;
pub mod signature;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::BootError;

pub use completion::Completion;
pub use signature::Signature;

/// Type-erased value passed into and out of unit invocations
pub type UnitArg = Arc<dyn Any + Send + Sync>;

/// The receiver every injected and curried invocation is bound against
/// (typically an application/server handle)
pub type Context = Arc<dyn Any + Send + Sync>;

/// Result of invoking a unit body
pub type UnitResult = Result<UnitArg, BootError>;

type UnitBody = dyn Fn(&Context, &[UnitArg]) -> UnitResult + Send + Sync;

/// Wrap a concrete value as a type-erased unit argument.
pub fn arg<T: Send + Sync + 'static>(value: T) -> UnitArg {
    Arc::new(value)
}

/// A callable unit: an explicit dependency signature bound to a body.
#[derive(Clone)]
pub struct Unit {
    signature: Signature,
    body: Arc<UnitBody>,
}

impl Unit {
    /// Create a unit from an already-built signature.
    pub fn new<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&Context, &[UnitArg]) -> UnitResult + Send + Sync + 'static,
    {
        Self {
            signature,
            body: Arc::new(body),
        }
    }

    /// Create a unit, declaring its parameter names inline.
    pub fn with_params<I, S, F>(params: I, body: F) -> Result<Self, BootError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Context, &[UnitArg]) -> UnitResult + Send + Sync + 'static,
    {
        Ok(Self::new(Signature::parse(params)?, body))
    }

    /// Create a zero-parameter unit.
    pub fn nullary<F>(body: F) -> Self
    where
        F: Fn(&Context, &[UnitArg]) -> UnitResult + Send + Sync + 'static,
    {
        Self::new(Signature::empty(), body)
    }

    /// The unit's declared dependency signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invoke the body with the given receiver and positional arguments.
    pub fn call(&self, context: &Context, args: &[UnitArg]) -> UnitResult {
        (self.body)(context, args)
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("signature", &self.signature)
            .finish()
    }
}

/// What a loader yields for a loadable leaf.
#[derive(Clone)]
pub enum UnitValue {
    /// A callable unit, to be run through the injector
    Callable(Unit),
    /// A plain value, passed through unchanged
    Plain(UnitArg),
    /// An environment-split unit: variant key -> value. Only meaningful
    /// for initializers; the active environment selects the branch.
    PerEnvironment(HashMap<String, UnitValue>),
}

impl UnitValue {
    /// Build an environment-split value from (variant key, value) pairs.
    pub fn per_environment<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = (S, UnitValue)>,
        S: Into<String>,
    {
        Self::PerEnvironment(
            variants
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }
}

impl From<Unit> for UnitValue {
    fn from(unit: Unit) -> Self {
        Self::Callable(unit)
    }
}

impl std::fmt::Debug for UnitValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callable(unit) => f.debug_tuple("Callable").field(unit).finish(),
            Self::Plain(_) => f.write_str("Plain(..)"),
            Self::PerEnvironment(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                f.debug_tuple("PerEnvironment").field(&keys).finish()
            }
        }
    }
}
