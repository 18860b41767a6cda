//! Registry settings.
//!
//! ```toml
//! error_log_capacity = 100
//! max_retries = 3
//! default_locale = "en"
//! disabled_modules = ["lipid-risk"]
//! ```

use std::path::Path;

use calc_model::Locale;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Default number of error records kept.
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 100;

/// Default retries before only a reset is offered.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySettings {
    /// Error records kept before the oldest is evicted.
    pub error_log_capacity: usize,
    /// Retries allowed per calculator.
    pub max_retries: u32,
    pub default_locale: Locale,
    /// Module ids skipped during initialization.
    pub disabled_modules: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            error_log_capacity: DEFAULT_ERROR_LOG_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
            default_locale: Locale::En,
            disabled_modules: Vec::new(),
        }
    }
}

impl RegistrySettings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
        let settings: Self = toml::from_str(&contents).map_err(|e| RegistryError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded registry settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.error_log_capacity == 0 {
            return Err(RegistryError::Invalid {
                message: "error_log_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled_modules.iter().any(|d| d == id)
    }
}
