use thiserror::Error;

/// Core error type for the embark bootstrap layer.
///
/// Bootstrap either completes fully or fails with a single descriptive
/// error naming the offending component and phase; no partial state is
/// ever exposed as ready.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Misconfigured initializer '{component}': {reason}")]
    MisconfiguredInitializer { component: String, reason: String },

    #[error(
        "Async initializer '{component}' cannot take additional parameters except the completion callback ({residual} left unbound)"
    )]
    AsyncInitializerArity { component: String, residual: usize },

    #[error("Internal dependency '{name}' used before it was populated")]
    UsedTooEarly { name: String },

    #[error("Injection must invoke; {residual} additional parameter(s) not allowed")]
    InjectionArity { residual: usize },

    #[error("Initializer '{component}' failed: {source}")]
    UnitExecution {
        component: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Bootstrap has already run for this session")]
    AlreadyBootstrapped,

    #[error("Internal dependency '{name}' was populated twice")]
    DuplicateInternal { name: String },
}

impl BootError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new misconfigured-initializer error
    pub fn misconfigured(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MisconfiguredInitializer {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Create a new used-too-early resolution error
    pub fn used_too_early(name: impl Into<String>) -> Self {
        Self::UsedTooEarly { name: name.into() }
    }

    /// Create a new unit execution error
    pub fn unit_execution(
        component: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::UnitExecution {
            component: component.into(),
            source: Box::new(source),
        }
    }

    /// Check if the error is a configuration error (fatal, not retried)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::MisconfiguredInitializer { .. }
                | Self::AsyncInitializerArity { .. }
                | Self::AlreadyBootstrapped
                | Self::DuplicateInternal { .. }
        )
    }

    /// Check if the error is a resolution error
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::UsedTooEarly { .. })
    }

    /// Check if the error is a step execution failure
    pub fn is_unit_execution(&self) -> bool {
        matches!(self, Self::UnitExecution { .. })
    }
}
