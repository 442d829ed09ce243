//! Dependency injector.
//!
//! Matches a prefix of a unit's declared parameter names against the
//! session registry and either invokes the unit immediately or returns a
//! partially-applied wrapper for the remaining parameters.
//!
//! Resolution is a **greedy prefix match**: parameters are scanned left
//! to right and matching stops at the first name the registry does not
//! resolve. A dependency name appearing after that gap is never matched,
//! even if the registry contains it — position matters, by contract.

use std::sync::Arc;

use crate::errors::BootError;
use crate::registry::DependencyRegistry;
use crate::unit::{Context, Signature, Unit, UnitArg, UnitResult};

/// Whether an injection is required to fully invoke the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokePolicy {
    /// Unresolved trailing parameters are a hard error.
    MustInvoke,
    /// Unresolved trailing parameters produce a curried wrapper.
    AllowPartial,
}

/// Outcome of injecting a unit.
#[derive(Debug)]
pub enum Injection {
    /// Every declared parameter resolved; the unit was invoked and this
    /// is its return value.
    Value(UnitArg),
    /// Trailing parameters remain; the unit was not invoked.
    Partial(BoundUnit),
}

impl Injection {
    /// The invocation result, if the unit was fully invoked.
    pub fn into_value(self) -> Option<UnitArg> {
        match self {
            Self::Value(value) => Some(value),
            Self::Partial(_) => None,
        }
    }

    /// The curried wrapper, if parameters were left unresolved.
    pub fn into_partial(self) -> Option<BoundUnit> {
        match self {
            Self::Value(_) => None,
            Self::Partial(bound) => Some(bound),
        }
    }
}

/// A unit with its dependency prefix resolved and its receiver bound,
/// waiting for the trailing (non-dependency) arguments.
#[derive(Clone)]
pub struct BoundUnit {
    context: Context,
    unit: Unit,
    resolved: Vec<UnitArg>,
}

impl BoundUnit {
    /// How many trailing parameters remain unresolved.
    pub fn residual(&self) -> usize {
        self.unit.signature().len() - self.resolved.len()
    }

    /// The trailing unresolved parameter names.
    pub fn signature(&self) -> Signature {
        self.unit.signature().suffix(self.residual())
    }

    /// Complete the invocation: calls the original unit with the
    /// resolved dependencies followed by `extra`, bound to the same
    /// receiver the injector carried.
    pub fn call(&self, extra: &[UnitArg]) -> UnitResult {
        let mut args = Vec::with_capacity(self.resolved.len() + extra.len());
        args.extend_from_slice(&self.resolved);
        args.extend_from_slice(extra);
        self.unit.call(&self.context, &args)
    }
}

impl std::fmt::Debug for BoundUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundUnit")
            .field("resolved", &self.resolved.len())
            .field("residual", &self.residual())
            .finish()
    }
}

/// Injector bound to one bootstrap session's registry and receiver.
#[derive(Clone)]
pub struct Injector {
    context: Context,
    registry: Arc<DependencyRegistry>,
}

impl Injector {
    pub fn new(context: Context, registry: Arc<DependencyRegistry>) -> Self {
        Self { context, registry }
    }

    /// The registry this injector resolves against
    pub fn registry(&self) -> &Arc<DependencyRegistry> {
        &self.registry
    }

    /// The receiver invocations are bound against
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Resolve the unit's dependency prefix and invoke or curry.
    ///
    /// A `UsedTooEarly` failure from an internal registry slot
    /// propagates verbatim; the injector never catches it.
    pub fn inject(&self, unit: &Unit, policy: InvokePolicy) -> Result<Injection, BootError> {
        let params = unit.signature().params();
        let mut resolved = Vec::with_capacity(params.len());
        for name in params {
            match self.registry.lookup(name)? {
                Some(value) => resolved.push(value),
                None => break,
            }
        }

        let residual = params.len() - resolved.len();
        tracing::debug!(
            resolved = resolved.len(),
            residual,
            "dependency prefix resolved"
        );

        if residual == 0 {
            let value = unit.call(&self.context, &resolved)?;
            return Ok(Injection::Value(value));
        }
        if policy == InvokePolicy::MustInvoke {
            return Err(BootError::InjectionArity { residual });
        }
        Ok(Injection::Partial(BoundUnit {
            context: self.context.clone(),
            unit: unit.clone(),
            resolved,
        }))
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::arg;

    fn registry_ab() -> Arc<DependencyRegistry> {
        Arc::new(
            DependencyRegistry::builder()
                .external("a", arg(10i32))
                .external("b", arg(20i32))
                .build(),
        )
    }

    fn sum_unit(params: &[&str]) -> Unit {
        Unit::with_params(params.to_vec(), |_cx, args| {
            let total: i32 = args
                .iter()
                .map(|a| a.downcast_ref::<i32>().copied().unwrap_or(0))
                .sum();
            Ok(arg(total))
        })
        .unwrap()
    }

    #[test]
    fn full_resolution_invokes_immediately() {
        let injector = Injector::new(arg(()), registry_ab());
        let unit = sum_unit(&["a", "b"]);

        for policy in [InvokePolicy::MustInvoke, InvokePolicy::AllowPartial] {
            let value = injector
                .inject(&unit, policy)
                .unwrap()
                .into_value()
                .expect("no residual, must invoke");
            assert_eq!(value.downcast_ref::<i32>(), Some(&30));
        }
    }

    #[test]
    fn trailing_parameter_yields_wrapper() {
        let injector = Injector::new(arg(()), registry_ab());
        let unit = sum_unit(&["a", "b", "c"]);

        let bound = injector
            .inject(&unit, InvokePolicy::AllowPartial)
            .unwrap()
            .into_partial()
            .expect("one residual expected");
        assert_eq!(bound.residual(), 1);
        assert_eq!(bound.signature().params(), &["c"]);

        // Calling the wrapper behaves like calling the original with (a, b, x).
        let value = bound.call(&[arg(5i32)]).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&35));
    }

    #[test]
    fn must_invoke_with_residual_is_an_arity_error() {
        let injector = Injector::new(arg(()), registry_ab());
        let unit = sum_unit(&["a", "b", "c"]);

        let err = injector.inject(&unit, InvokePolicy::MustInvoke).unwrap_err();
        assert!(matches!(err, BootError::InjectionArity { residual: 1 }));
    }

    #[test]
    fn unknown_leading_name_leaves_all_params_residual() {
        let injector = Injector::new(arg(()), registry_ab());
        let unit = sum_unit(&["x", "y"]);

        let bound = injector
            .inject(&unit, InvokePolicy::AllowPartial)
            .unwrap()
            .into_partial()
            .expect("nothing resolvable");
        assert_eq!(bound.residual(), 2);
    }

    #[test]
    fn greedy_prefix_never_skips_a_gap() {
        // `b` is in the registry but sits behind the unresolvable `x`.
        let injector = Injector::new(arg(()), registry_ab());
        let unit = sum_unit(&["x", "b", "y"]);

        let bound = injector
            .inject(&unit, InvokePolicy::AllowPartial)
            .unwrap()
            .into_partial()
            .expect("prefix stops at x");
        assert_eq!(bound.residual(), 3);
        assert_eq!(bound.signature().params(), &["x", "b", "y"]);
    }

    #[test]
    fn used_too_early_propagates_verbatim() {
        let registry = Arc::new(
            DependencyRegistry::builder().internal_slot("server").build(),
        );
        let injector = Injector::new(arg(()), registry);
        let unit = sum_unit(&["$server"]);

        let err = injector
            .inject(&unit, InvokePolicy::AllowPartial)
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[test]
    fn invocation_is_bound_to_the_session_context() {
        let injector = Injector::new(arg("ctx".to_string()), registry_ab());
        let unit = Unit::with_params(["a"], |cx, _args| {
            Ok(arg(cx.downcast_ref::<String>().cloned().unwrap_or_default()))
        })
        .unwrap();

        let value = injector
            .inject(&unit, InvokePolicy::MustInvoke)
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("ctx"));
    }

    #[test]
    fn body_error_propagates_from_invocation() {
        let injector = Injector::new(arg(()), registry_ab());
        let unit = Unit::with_params(["a"], |_cx, _args| {
            Err(BootError::configuration("body exploded"))
        })
        .unwrap();

        let err = injector
            .inject(&unit, InvokePolicy::AllowPartial)
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
