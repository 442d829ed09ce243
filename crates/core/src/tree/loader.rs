//! Loaders turning directory entries into unit values.
//!
//! The walk supplies structure; a [`UnitLoader`] supplies values. Code
//! units are registered programmatically against their relative path
//! ([`StaticUnitSet`]), while plain data files load through
//! [`DataFileLoader`]. Loaders compose via fallback chaining.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::BootError;
use crate::unit::{arg, UnitValue};

/// Source of values for loadable directory entries.
pub trait UnitLoader: Send + Sync {
    /// Load the entry at `rel` (relative to the walk root; `full` is the
    /// on-disk path). `None` means this loader does not recognize the
    /// entry; the walk skips it. `Some(Err(_))` aborts the entire build.
    fn load(&self, rel: &Path, full: &Path) -> Option<Result<UnitValue, BootError>>;
}

/// Extension-stripped, slash-separated key for a relative path.
pub(crate) fn stem_key(rel: &Path) -> String {
    rel.with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Programmatic unit registrations keyed by extension-stripped relative
/// path, e.g. `"admin/users"` for an on-disk `admin/users.unit`.
///
/// This is how applications hand their authored units to the walk: the
/// directory supplies the shape, the set supplies the code.
#[derive(Default)]
pub struct StaticUnitSet {
    units: HashMap<String, UnitValue>,
    fallback: Option<Box<dyn UnitLoader>>,
}

impl StaticUnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit value under an extension-free relative path.
    pub fn insert(&mut self, path: impl Into<String>, value: UnitValue) {
        self.units.insert(path.into(), value);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, value: UnitValue) -> Self {
        self.insert(path, value);
        self
    }

    /// Chain another loader for entries this set does not cover.
    pub fn with_fallback(mut self, loader: impl UnitLoader + 'static) -> Self {
        self.fallback = Some(Box::new(loader));
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl UnitLoader for StaticUnitSet {
    fn load(&self, rel: &Path, full: &Path) -> Option<Result<UnitValue, BootError>> {
        match self.units.get(&stem_key(rel)) {
            Some(value) => Some(Ok(value.clone())),
            None => self.fallback.as_ref().and_then(|f| f.load(rel, full)),
        }
    }
}

/// Loads `.json` / `.yaml` / `.yml` entries as plain values.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataFileLoader;

impl UnitLoader for DataFileLoader {
    fn load(&self, rel: &Path, full: &Path) -> Option<Result<UnitValue, BootError>> {
        let ext = rel.extension()?.to_str()?;
        match ext {
            "json" => Some(load_json(full)),
            "yaml" | "yml" => Some(load_yaml(full)),
            _ => None,
        }
    }
}

fn load_json(full: &Path) -> Result<UnitValue, BootError> {
    let text = std::fs::read_to_string(full)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(UnitValue::Plain(arg(value)))
}

fn load_yaml(full: &Path) -> Result<UnitValue, BootError> {
    let text = std::fs::read_to_string(full)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text)?;
    Ok(UnitValue::Plain(arg(value)))
}
