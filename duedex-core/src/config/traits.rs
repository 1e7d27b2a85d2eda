//! Configuration traits for validation and environment overrides.

use crate::error::ConfigError;

/// Trait for types that can be validated.
pub trait Validatable {
    /// Validates the configuration.
    ///
    /// Returns `Ok(())` if the configuration is valid, or a `ConfigError`
    /// describing what is invalid.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Trait for types that support environment variable overrides.
pub trait Configurable: Sized {
    /// Applies environment variable overrides to the configuration.
    ///
    /// # Arguments
    ///
    /// * `prefix` - The environment variable prefix (e.g., "DUEDEX")
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError>;

    /// Returns the environment variable names that can override this configuration.
    fn env_var_names(prefix: &str) -> Vec<String>;
}
