//! Dependency registry: the name-keyed lookup backing injection.
//!
//! Built exactly once per bootstrap session and never reshaped
//! afterwards. Two tiers are merged at build time:
//!
//! - **external** entries: user-supplied components, enumerable, always
//!   resolvable by plain name.
//! - **internal** entries: framework-provided values (e.g. the active
//!   transport handle), exposed under the reserved `$` sigil. An
//!   internal slot may be declared empty at build time and populated
//!   exactly once later; reading it before population is a resolution
//!   error, never a silent `None`.
//!
//! External entries win on name collision; an external entry registered
//! under a sigil-prefixed name shadows the internal slot and is reported
//! as a non-fatal warning at build time.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::BootError;
use crate::unit::UnitArg;

/// Reserved prefix marking framework-internal dependency names.
pub const INTERNAL_SIGIL: char = '$';

#[derive(Default)]
struct InternalSlot {
    value: OnceLock<UnitArg>,
}

/// Read-only, name-keyed lookup of the values available for injection.
#[derive(Default)]
pub struct DependencyRegistry {
    external: HashMap<String, UnitArg>,
    internal: HashMap<String, InternalSlot>,
}

impl DependencyRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve a dependency name.
    ///
    /// `Ok(None)` means the name is simply not registered — the injector
    /// treats that as the end of the resolvable prefix. A sigil-prefixed
    /// name whose slot exists but has not been populated yet fails with
    /// [`BootError::UsedTooEarly`] instead.
    pub fn lookup(&self, name: &str) -> Result<Option<UnitArg>, BootError> {
        // External entries take priority, including shadowing `$` names.
        if let Some(value) = self.external.get(name) {
            return Ok(Some(value.clone()));
        }
        let Some(slot_name) = name.strip_prefix(INTERNAL_SIGIL) else {
            return Ok(None);
        };
        match self.internal.get(slot_name) {
            Some(slot) => match slot.value.get() {
                Some(value) => Ok(Some(value.clone())),
                None => Err(BootError::used_too_early(name)),
            },
            None => Ok(None),
        }
    }

    /// Populate a declared internal slot. Write-once: a second fill of
    /// the same slot is a configuration error, as is filling a slot that
    /// was never declared.
    pub fn fill_internal(
        &self,
        name: impl AsRef<str>,
        value: UnitArg,
    ) -> Result<(), BootError> {
        let name = name.as_ref().trim_start_matches(INTERNAL_SIGIL);
        let slot = self.internal.get(name).ok_or_else(|| {
            BootError::configuration(format!("unknown internal slot '{}'", name))
        })?;
        slot.value
            .set(value)
            .map_err(|_| BootError::DuplicateInternal {
                name: name.to_string(),
            })
    }

    /// Names of all external entries, in no particular order.
    pub fn external_names(&self) -> impl Iterator<Item = &str> {
        self.external.keys().map(String::as_str)
    }

    /// Whether an internal slot with this (sigil-free) name is declared.
    pub fn has_internal_slot(&self, name: &str) -> bool {
        self.internal
            .contains_key(name.trim_start_matches(INTERNAL_SIGIL))
    }
}

impl std::fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("external", &self.external.keys().collect::<Vec<_>>())
            .field("internal", &self.internal.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder assembling the registry's two tiers before the session starts.
#[derive(Default)]
pub struct RegistryBuilder {
    external: HashMap<String, UnitArg>,
    internal: HashMap<String, InternalSlot>,
}

impl RegistryBuilder {
    /// Register an external (user-supplied) component.
    pub fn external(mut self, name: impl Into<String>, value: UnitArg) -> Self {
        self.external.insert(name.into(), value);
        self
    }

    /// Declare an internal slot to be populated later in the bootstrap
    /// sequence.
    pub fn internal_slot(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim_start_matches(INTERNAL_SIGIL).to_string();
        self.internal.insert(name, InternalSlot::default());
        self
    }

    /// Declare and immediately populate an internal slot.
    pub fn internal(mut self, name: impl Into<String>, value: UnitArg) -> Self {
        let name = name.into();
        let name = name.trim_start_matches(INTERNAL_SIGIL).to_string();
        let slot = InternalSlot::default();
        // Fresh slot, cannot already be set.
        let _ = slot.value.set(value);
        self.internal.insert(name, slot);
        self
    }

    pub fn build(self) -> DependencyRegistry {
        for name in self.external.keys() {
            let bare = name.trim_start_matches(INTERNAL_SIGIL);
            if name.starts_with(INTERNAL_SIGIL) && self.internal.contains_key(bare) {
                tracing::warn!(
                    component = %name,
                    "external component shadows internal dependency '{}{}'",
                    INTERNAL_SIGIL,
                    bare
                );
            }
        }
        DependencyRegistry {
            external: self.external,
            internal: self.internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::arg;

    #[test]
    fn external_lookup_by_plain_name() {
        let registry = DependencyRegistry::builder()
            .external("db", arg("postgres"))
            .build();

        let value = registry.lookup("db").unwrap().unwrap();
        assert_eq!(value.downcast_ref::<&str>(), Some(&"postgres"));
        assert!(registry.lookup("cache").unwrap().is_none());
    }

    #[test]
    fn internal_slot_read_before_fill_fails() {
        let registry = DependencyRegistry::builder()
            .internal_slot("server")
            .build();

        let err = registry.lookup("$server").unwrap_err();
        assert!(matches!(err, BootError::UsedTooEarly { ref name } if name == "$server"));
    }

    #[test]
    fn internal_slot_resolves_after_fill() {
        let registry = DependencyRegistry::builder()
            .internal_slot("server")
            .build();

        registry.fill_internal("server", arg(8080u16)).unwrap();
        let value = registry.lookup("$server").unwrap().unwrap();
        assert_eq!(value.downcast_ref::<u16>(), Some(&8080));
    }

    #[test]
    fn second_fill_is_rejected() {
        let registry = DependencyRegistry::builder()
            .internal_slot("server")
            .build();

        registry.fill_internal("server", arg(1u8)).unwrap();
        let err = registry.fill_internal("server", arg(2u8)).unwrap_err();
        assert!(matches!(err, BootError::DuplicateInternal { ref name } if name == "server"));
    }

    #[test]
    fn fill_of_undeclared_slot_is_rejected() {
        let registry = DependencyRegistry::builder().build();
        let err = registry.fill_internal("server", arg(())).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn unknown_internal_name_is_absent_not_an_error() {
        let registry = DependencyRegistry::builder().build();
        assert!(registry.lookup("$server").unwrap().is_none());
    }

    #[test]
    fn external_shadows_internal_on_collision() {
        let registry = DependencyRegistry::builder()
            .internal_slot("server")
            .external("$server", arg("user supplied"))
            .build();

        // External wins even though the slot is unpopulated.
        let value = registry.lookup("$server").unwrap().unwrap();
        assert_eq!(value.downcast_ref::<&str>(), Some(&"user supplied"));
    }

    #[test]
    fn external_names_are_enumerable() {
        let registry = DependencyRegistry::builder()
            .external("db", arg(()))
            .external("logger", arg(()))
            .build();

        let mut names: Vec<_> = registry.external_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["db", "logger"]);
    }
}
