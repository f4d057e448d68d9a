//! Enrollment configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder bcrypt hash of the well-known default credential
pub const DEFAULT_PASSWORD_HASH: &str =
    "$2b$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

/// Enrollment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrollmentConfig {
    /// Designation of the account type given to students
    pub student_account_type: String,
    /// Hash stored as the initial credential of provisioned accounts
    pub default_password_hash: String,
    /// Flag provisioned accounts for a mandatory credential change
    pub require_password_reset: bool,
    /// Upper bound on username candidates tried per enrollment
    pub max_username_attempts: u32,
    /// Total attempts of the whole transaction when a commit loses a race
    pub commit_attempts: u32,
}

impl EnrollmentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With student account-type designation
    #[inline]
    #[must_use]
    pub fn with_student_account_type(mut self, designation: impl Into<String>) -> Self {
        self.student_account_type = designation.into();
        self
    }

    /// With default credential hash
    #[inline]
    #[must_use]
    pub fn with_default_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.default_password_hash = hash.into();
        self
    }

    /// With password-reset flag
    #[inline]
    #[must_use]
    pub fn with_password_reset(mut self, required: bool) -> Self {
        self.require_password_reset = required;
        self
    }

    /// With username attempt bound
    #[inline]
    #[must_use]
    pub fn with_max_username_attempts(mut self, attempts: u32) -> Self {
        self.max_username_attempts = attempts;
        self
    }

    /// With commit attempt count
    #[inline]
    #[must_use]
    pub fn with_commit_attempts(mut self, attempts: u32) -> Self {
        self.commit_attempts = attempts;
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or unknown keys
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.student_account_type.trim().is_empty() {
            return Err(ConfigError::invalid("student_account_type", "must not be empty"));
        }
        if self.default_password_hash.is_empty() {
            return Err(ConfigError::invalid("default_password_hash", "must not be empty"));
        }
        if self.max_username_attempts == 0 {
            return Err(ConfigError::invalid("max_username_attempts", "must be at least 1"));
        }
        if self.commit_attempts == 0 {
            return Err(ConfigError::invalid("commit_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            student_account_type: "Student".to_string(),
            default_password_hash: DEFAULT_PASSWORD_HASH.to_string(),
            require_password_reset: true,
            max_username_attempts: 10_000,
            commit_attempts: 2,
        }
    }
}
