/// Active-environment selector for variant resolution.
///
/// The `"production"` label selects the production branch of an
/// environment-split unit; every other label selects the development
/// (default) branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Map an environment label onto the two-way split. Never fails:
    /// anything that is not `"production"` is the development path.
    pub fn from_label(label: &str) -> Self {
        if label == "production" {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Key used when selecting a variant out of an environment-split unit
    pub fn variant_key(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.variant_key())
    }
}
