//! Calculator module contract.
//!
//! This crate defines what every calculator shares:
//!
//! - **Configuration schema** ([`CalculatorConfig`], [`FieldSpec`]) parsed from
//!   embedded TOML manifests
//! - **Inputs and outcomes** ([`Inputs`], [`ValidationResult`], [`CalculationResult`])
//! - **Band tables** ([`BandTable`]) for contiguous score-to-category lookups
//! - **The module contract** ([`Calculator`], [`CalculatorModule`])
//! - **Typed errors** ([`CalcError`], [`ErrorKind`])
//!
//! # Example
//!
//! ```rust,ignore
//! use calc_model::{Inputs, Outcome};
//!
//! let inputs = Inputs::from_pairs(["weight=70", "height=170"])?;
//! match module.run(&inputs)? {
//!     Outcome::Computed(result) => println!("{}", result.primary.display()),
//!     Outcome::Invalid(validation) => println!("{} errors", validation.errors.len()),
//! }
//! ```

pub mod band;
pub mod config;
pub mod error;
pub mod input;
pub mod locale;
pub mod module;
pub mod result;
pub mod validation;

pub use band::{Band, BandTable, Bound, RiskLevel};
pub use config::{
    CalculatorConfig, ChangelogEntry, Difficulty, EvidenceLevel, FieldKind, FieldOption,
    FieldSpec, MedicalMetadata, ModuleManifest, ModuleMetadata, Reference, Status,
    VisibilityRule,
};
pub use error::{CalcError, ErrorKind, LifecycleHook, Result, message_is_recoverable};
pub use input::{InputValue, Inputs};
pub use locale::{Locale, LocalizedText};
pub use module::{Calculator, CalculatorModule, ModuleFactory};
pub use result::{BreakdownStep, CalculationResult, FormattedResult, Outcome, ResultValue};
pub use validation::{ValidationCode, ValidationError, ValidationResult};
