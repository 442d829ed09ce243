use crate::errors::BootError;

/// Declared dependency signature of a callable unit.
///
/// The ordered list of names a unit requires, declared explicitly by the
/// unit's author. Names are the sole signal used for dependency
/// resolution; there is no type or annotation metadata. Each name is
/// trimmed of surrounding whitespace at construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    params: Vec<String>,
}

impl Signature {
    /// Build a signature from declared parameter names, in order.
    ///
    /// A name that is blank after trimming is a validation error.
    pub fn parse<I, S>(names: I) -> Result<Self, BootError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut params = Vec::new();
        for name in names {
            let name = name.into();
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(BootError::validation(
                    "declared parameter name is blank",
                ));
            }
            params.push(trimmed.to_string());
        }
        Ok(Self { params })
    }

    /// Signature of a zero-parameter unit
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parameter names in declaration order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Last declared parameter name, if any
    pub fn last(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Whether the given name appears anywhere in the signature
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// The trailing `count` parameter names as a signature of their own.
    /// Used for the residual signature of a partially-applied wrapper.
    pub fn suffix(&self, count: usize) -> Self {
        let start = self.params.len().saturating_sub(count);
        Self {
            params: self.params[start..].to_vec(),
        }
    }
}
