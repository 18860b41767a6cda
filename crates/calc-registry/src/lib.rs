//! Calculator registry.
//!
//! - [`ModuleLoader`] builds modules from the static factory table and
//!   checks their structure
//! - [`CalculatorRegistry`] registers them, keeps category and tag indices,
//!   and runs calculations
//! - [`ErrorHandler`] keeps a bounded, classified error log
//! - [`RetryTracker`] enforces the per-calculator retry budget
//! - [`RegistryContext`] shares one registry across threads

pub mod context;
pub mod error;
pub mod error_handler;
pub mod loader;
pub mod registry;
pub mod retry;
pub mod search;
pub mod settings;

pub use context::RegistryContext;
pub use error::{RegistryError, Result};
pub use error_handler::{
    ErrorContext, ErrorHandler, ErrorRecord, ErrorStats, MonitoringSink, TracingSink,
    recovery_suggestions,
};
pub use loader::{ModuleLoader, validate_structure};
pub use registry::{CalculatorRegistry, InitSummary};
pub use retry::{RetryDecision, RetryTracker};
pub use search::{SearchQuery, StatusFilter};
pub use settings::RegistrySettings;
