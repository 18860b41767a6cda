//! The calculator module contract.

use std::fmt;
use std::sync::Arc;

use crate::config::{CalculatorConfig, ModuleManifest, ModuleMetadata};
use crate::error::{CalcError, Result};
use crate::input::Inputs;
use crate::locale::Locale;
use crate::result::{CalculationResult, FormattedResult, Outcome};
use crate::validation::ValidationResult;

/// Behaviour every calculator provides.
///
/// `calculate` is only ever called after `validate` reported the inputs as
/// valid; it still returns a `Result` because an algorithm can fail in ways
/// validation cannot foresee.
pub trait Calculator: Send + Sync + fmt::Debug {
    /// Check `inputs` against the schema and calculator-specific rules.
    fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult;

    /// Compute the result for validated inputs.
    fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult>;

    /// Calculator-specific rendering; `None` uses the generic one.
    fn format_result(&self, _result: &CalculationResult, _locale: Locale) -> Option<FormattedResult> {
        None
    }

    fn on_load(&self) -> Result<()> {
        Ok(())
    }

    fn on_unload(&self) -> Result<()> {
        Ok(())
    }

    fn on_error(&self, _error: &CalcError) {}
}

/// Constructor for one entry of a static module table.
pub type ModuleFactory = fn() -> Result<CalculatorModule>;

/// A calculator bundled with its configuration and release metadata.
#[derive(Clone)]
pub struct CalculatorModule {
    pub id: String,
    pub config: CalculatorConfig,
    pub metadata: ModuleMetadata,
    calculator: Arc<dyn Calculator>,
}

impl CalculatorModule {
    pub fn new(
        id: impl Into<String>,
        config: CalculatorConfig,
        metadata: ModuleMetadata,
        calculator: impl Calculator + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            metadata,
            calculator: Arc::new(calculator),
        }
    }

    /// Build a module from an embedded TOML manifest.
    pub fn from_manifest(
        id: &str,
        manifest: &str,
        calculator: impl Calculator + 'static,
    ) -> Result<Self> {
        let ModuleManifest { config, metadata } = ModuleManifest::from_toml(id, manifest)?;
        Ok(Self::new(id, config, metadata, calculator))
    }

    pub fn calculator(&self) -> &dyn Calculator {
        self.calculator.as_ref()
    }

    pub fn is_published(&self) -> bool {
        self.config.is_published()
    }

    /// Validate inputs; declared defaults apply to absent fields.
    pub fn validate(&self, inputs: &Inputs) -> ValidationResult {
        let inputs = self.config.with_defaults(inputs);
        self.calculator.validate(&self.config, &inputs)
    }

    /// Calculate without validating first.
    ///
    /// A result containing NaN or an infinite value is reported as
    /// [`CalcError::NonFinite`].
    pub fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult> {
        let inputs = self.config.with_defaults(inputs);
        let result = self.calculator.calculate(&inputs)?;
        match result.first_non_finite() {
            Some(quantity) => Err(CalcError::NonFinite {
                calculator: self.id.clone(),
                quantity,
            }),
            None => Ok(result),
        }
    }

    /// Validate, then calculate only if the inputs are valid.
    pub fn run(&self, inputs: &Inputs) -> Result<Outcome> {
        let validation = self.validate(inputs);
        if !validation.is_valid {
            return Ok(Outcome::Invalid(validation));
        }
        self.calculate(inputs)
            .map(|result| Outcome::Computed(Box::new(result)))
    }

    /// Render a result, preferring the calculator's own formatter.
    pub fn format_result(&self, result: &CalculationResult, locale: Locale) -> FormattedResult {
        self.calculator
            .format_result(result, locale)
            .unwrap_or_else(|| result.format(locale))
    }
}

impl fmt::Debug for CalculatorModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatorModule")
            .field("id", &self.id)
            .field("status", &self.config.status)
            .field("version", &self.metadata.version)
            .field("calculator", &self.calculator)
            .finish()
    }
}
