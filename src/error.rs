//! Error types for the storage profile resolver
//!
//! Provides structured error types for profile resolution, backend
//! registration, configuration loading and the service surface.

use crate::domain::profile::Profile;
use thiserror::Error;

/// Unified error type for the resolver
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error("Unsupported backend: {backend}")]
    UnsupportedBackend { backend: String },

    #[error("Backend {backend} does not support profile {profile}")]
    UnsupportedProfile { backend: String, profile: Profile },

    #[error("Invalid profile name: {name:?} (expected gold, silver or bronze)")]
    InvalidProfileName { name: String },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Backend already registered: {backend}")]
    BackendAlreadyRegistered { backend: String },

    #[error("Capability ordering violated for backend {backend}: {higher} declares lower performance than {lower}")]
    CapabilityOrderingViolated {
        backend: String,
        higher: Profile,
        lower: Profile,
    },

    #[error("Backend registry already initialized")]
    RegistryAlreadyInitialized,

    #[error("Backend registry not initialized")]
    RegistryNotInitialized,

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Capacity parse error: {0}")]
    CapacityParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the provisioning path should do with a resolution error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Retry the request with the next cheaper profile
    RetryWithLowerProfile,
    /// Report the failure to the end user as-is
    Surface,
    /// Operator must fix configuration; retrying will not help
    FixConfiguration,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            Error::UnsupportedProfile { profile, .. } if profile.downgrade().is_some() => {
                ErrorAction::RetryWithLowerProfile
            }

            Error::UnsupportedProfile { .. }
            | Error::UnsupportedBackend { .. }
            | Error::InvalidProfileName { .. }
            | Error::CapacityParse(_)
            | Error::JsonParse(_) => ErrorAction::Surface,

            Error::Configuration(_)
            | Error::BackendAlreadyRegistered { .. }
            | Error::CapabilityOrderingViolated { .. }
            | Error::RegistryAlreadyInitialized
            | Error::RegistryNotInitialized
            | Error::YamlParse(_)
            | Error::Io(_)
            | Error::Internal(_) => ErrorAction::FixConfiguration,
        }
    }

    /// Check if retrying with a different profile could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.action(), ErrorAction::RetryWithLowerProfile)
    }

    /// Stable machine-readable code used in API responses and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedBackend { .. } => "unsupported_backend",
            Error::UnsupportedProfile { .. } => "unsupported_profile",
            Error::InvalidProfileName { .. } => "invalid_profile_name",
            Error::CapacityParse(_) => "invalid_capacity",
            Error::JsonParse(_) => "invalid_json",
            _ => "internal_error",
        }
    }
}

/// Result type alias for the resolver
pub type Result<T> = std::result::Result<T, Error>;
