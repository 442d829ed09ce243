//! Directory object builder.
//!
//! Recursively walks a startup directory and mirrors it as a nested,
//! insertion-ordered mapping: sub-directories become branches, loadable
//! entries become leaves with injection applied to callable values.
//!
//! The walk is synchronous and blocking by design — it is startup-phase
//! work that must complete before anything depending on its result may
//! proceed. The first load or injection failure aborts the whole build;
//! no partial object is ever returned. Sibling order mirrors whatever
//! the underlying storage yields; consumers must not assume lexical
//! order.

pub mod loader;

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::errors::BootError;
use crate::inject::{BoundUnit, Injection, Injector, InvokePolicy};
use crate::unit::{UnitArg, UnitValue};

pub use loader::{DataFileLoader, StaticUnitSet, UnitLoader};

/// One mirrored entry.
pub enum Node {
    /// A sub-directory
    Branch(DirectoryObject),
    /// A plain loaded value, or the return value of a fully-injected unit
    Value(UnitArg),
    /// A callable leaf left curried, awaiting its trailing arguments
    Handler(BoundUnit),
}

impl Node {
    pub fn as_branch(&self) -> Option<&DirectoryObject> {
        match self {
            Self::Branch(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&UnitArg> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&BoundUnit> {
        match self {
            Self::Handler(bound) => Some(bound),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Branch(object) => f.debug_tuple("Branch").field(object).finish(),
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Handler(bound) => f.debug_tuple("Handler").field(bound).finish(),
        }
    }
}

/// Nested mapping mirroring a file-system subtree. Keys are directory
/// names and extension-stripped file stems; insertion order is the
/// enumeration order of the walk.
#[derive(Debug, Default)]
pub struct DirectoryObject {
    entries: IndexMap<String, Node>,
}

impl DirectoryObject {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Look up a nested entry by slash-separated path, e.g.
    /// `"admin/users"`.
    pub fn get_path(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut node = self.entries.get(first)?;
        for segment in segments {
            node = node.as_branch()?.get(segment)?;
        }
        Some(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the mirrored object for `root`, injecting each callable leaf
/// (currying allowed) and passing plain values through unchanged.
pub fn build_directory_object(
    root: &Path,
    injector: &Injector,
    loader: &dyn UnitLoader,
) -> Result<DirectoryObject, BootError> {
    tracing::debug!(root = %root.display(), "building directory object");
    walk(root, Path::new(""), injector, loader)
}

fn walk(
    dir: &Path,
    rel_base: &Path,
    injector: &Injector,
    loader: &dyn UnitLoader,
) -> Result<DirectoryObject, BootError> {
    let mut object = DirectoryObject::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = rel_base.join(&name);

        if entry.file_type()?.is_dir() {
            let child = walk(&entry.path(), &rel, injector, loader)?;
            object.entries.insert(name, Node::Branch(child));
            continue;
        }

        let Some(loaded) = loader.load(&rel, &entry.path()) else {
            continue;
        };
        let node = match loaded? {
            UnitValue::Callable(unit) => {
                match injector.inject(&unit, InvokePolicy::AllowPartial)? {
                    Injection::Value(value) => Node::Value(value),
                    Injection::Partial(bound) => Node::Handler(bound),
                }
            }
            UnitValue::Plain(value) => Node::Value(value),
            UnitValue::PerEnvironment(_) => {
                return Err(BootError::configuration(format!(
                    "'{}' is environment-split; variants are only selected for initializers",
                    rel.display()
                )));
            }
        };
        object.entries.insert(loader::stem_key(Path::new(&name)), node);
    }
    Ok(object)
}
