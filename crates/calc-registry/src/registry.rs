//! The calculator registry.
//!
//! Holds every registered module in registration order plus derived
//! category and tag indices. Indices are rebuilt in full after each
//! registration batch and swapped in; they are never edited in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use calc_model::{CalcError, CalculatorModule, Inputs, LifecycleHook, Outcome, Result};
use serde::Serialize;

use crate::error_handler::{ErrorContext, ErrorHandler};
use crate::loader::{ModuleLoader, validate_structure};
use crate::retry::{RetryDecision, RetryTracker};
use crate::search::SearchQuery;
use crate::settings::RegistrySettings;

/// Outcome of one `initialize` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitSummary {
    /// Ids registered by this run, in order.
    pub registered: Vec<String>,
    /// Ids skipped because the settings disable them.
    pub disabled: Vec<String>,
    /// Messages of modules that failed to load or register.
    pub failed: Vec<String>,
}

#[derive(Debug, Default)]
struct CatalogIndex {
    by_id: BTreeMap<String, usize>,
    by_category: BTreeMap<String, Vec<usize>>,
    by_tag: BTreeMap<String, Vec<usize>>,
}

impl CatalogIndex {
    fn build(modules: &[CalculatorModule]) -> Self {
        let mut index = Self::default();
        for (pos, module) in modules.iter().enumerate() {
            index.by_id.insert(module.id.clone(), pos);
            index
                .by_category
                .entry(module.config.category.to_lowercase())
                .or_default()
                .push(pos);
            for tag in &module.config.tags {
                index.by_tag.entry(tag.to_lowercase()).or_default().push(pos);
            }
        }
        index
    }
}

/// Registry of calculator modules.
#[derive(Debug)]
pub struct CalculatorRegistry {
    settings: RegistrySettings,
    loader: ModuleLoader,
    modules: Vec<CalculatorModule>,
    index: CatalogIndex,
    initialized: bool,
    errors: Arc<ErrorHandler>,
    retries: RetryTracker,
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl CalculatorRegistry {
    /// Empty registry over the built-in modules.
    pub fn new(settings: RegistrySettings) -> Self {
        let errors = Arc::new(ErrorHandler::new(settings.error_log_capacity));
        let retries = RetryTracker::new(settings.max_retries);
        Self {
            settings,
            loader: ModuleLoader::builtin(),
            modules: Vec::new(),
            index: CatalogIndex::default(),
            initialized: false,
            errors,
            retries,
        }
    }

    /// Use a different module table.
    pub fn with_loader(mut self, loader: ModuleLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Share an existing error handler (e.g. one with a custom sink).
    pub fn with_error_handler(mut self, errors: Arc<ErrorHandler>) -> Self {
        self.errors = errors;
        self
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.errors
    }

    /// Load and register every module once.
    ///
    /// Later calls return an empty summary. A module that fails to load or
    /// register is logged and skipped; the others still register.
    pub fn initialize(&mut self) -> InitSummary {
        let mut summary = InitSummary::default();
        if self.initialized {
            tracing::debug!("registry already initialized");
            return summary;
        }

        for loaded in self.loader.load_all_modules() {
            let module = match loaded {
                Ok(module) => module,
                Err(err) => {
                    self.log(&err, module_of(&err));
                    summary.failed.push(err.to_string());
                    continue;
                }
            };
            if self.settings.is_disabled(&module.id) {
                tracing::debug!(module = %module.id, "module disabled by settings");
                summary.disabled.push(module.id);
                continue;
            }
            let id = module.id.clone();
            match self.insert(module) {
                Ok(()) => summary.registered.push(id),
                Err(err) => summary.failed.push(err.to_string()),
            }
        }
        self.rebuild_index();
        self.initialized = true;

        tracing::info!(
            registered = summary.registered.len(),
            disabled = summary.disabled.len(),
            failed = summary.failed.len(),
            "registry initialized"
        );
        summary
    }

    /// Register one module and rebuild the indices.
    pub fn register(&mut self, module: CalculatorModule) -> Result<()> {
        self.insert(module)?;
        self.rebuild_index();
        Ok(())
    }

    /// Checks, runs `on_load`, then appends. Indices are left stale.
    fn insert(&mut self, module: CalculatorModule) -> Result<()> {
        if self.modules.iter().any(|m| m.id == module.id) {
            let err = CalcError::DuplicateModule { id: module.id.clone() };
            tracing::warn!(module = %module.id, "rejected duplicate module");
            self.log(&err, Some(&module.id));
            return Err(err);
        }
        if let Err(err) = validate_structure(&module) {
            tracing::warn!(module = %module.id, error = %err, "rejected invalid module");
            self.log(&err, Some(&module.id));
            return Err(err);
        }
        if let Err(err) = module.calculator().on_load() {
            let err = hook_error(&module.id, LifecycleHook::Load, err);
            tracing::warn!(module = %module.id, error = %err, "on_load failed");
            module.calculator().on_error(&err);
            self.log(&err, Some(&module.id));
            return Err(err);
        }
        tracing::debug!(module = %module.id, "registered module");
        self.modules.push(module);
        Ok(())
    }

    /// Remove a module, running its `on_unload` hook.
    pub fn unregister(&mut self, id: &str) -> Option<CalculatorModule> {
        let pos = self.modules.iter().position(|m| m.id == id)?;
        let module = self.modules.remove(pos);
        self.unload(&module);
        self.retries.reset(id);
        self.rebuild_index();
        Some(module)
    }

    fn unload(&self, module: &CalculatorModule) {
        if let Err(err) = module.calculator().on_unload() {
            let err = hook_error(&module.id, LifecycleHook::Unload, err);
            tracing::warn!(module = %module.id, error = %err, "on_unload failed");
            self.log(&err, Some(&module.id));
        }
    }

    fn rebuild_index(&mut self) {
        self.index = CatalogIndex::build(&self.modules);
    }

    pub fn get(&self, id: &str) -> Option<&CalculatorModule> {
        self.index.by_id.get(id).map(|&pos| &self.modules[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.by_id.contains_key(id)
    }

    /// Every registered module in registration order.
    pub fn get_all(&self) -> &[CalculatorModule] {
        &self.modules
    }

    pub fn get_published(&self) -> Vec<&CalculatorModule> {
        self.modules.iter().filter(|m| m.is_published()).collect()
    }

    pub fn get_by_category(&self, category: &str) -> Vec<&CalculatorModule> {
        self.lookup(self.index.by_category.get(&category.to_lowercase()))
    }

    pub fn get_by_tag(&self, tag: &str) -> Vec<&CalculatorModule> {
        self.lookup(self.index.by_tag.get(&tag.to_lowercase()))
    }

    fn lookup(&self, positions: Option<&Vec<usize>>) -> Vec<&CalculatorModule> {
        positions
            .map(|p| p.iter().map(|&pos| &self.modules[pos]).collect())
            .unwrap_or_default()
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<&CalculatorModule> {
        query.apply(&self.modules)
    }

    /// Published modules per category.
    pub fn category_stats(&self) -> BTreeMap<String, usize> {
        self.published_counts(|module| vec![module.config.category.to_lowercase()])
    }

    /// Published modules per tag.
    pub fn tag_stats(&self) -> BTreeMap<String, usize> {
        self.published_counts(|module| {
            module.config.tags.iter().map(|t| t.to_lowercase()).collect()
        })
    }

    fn published_counts(
        &self,
        keys: impl Fn(&CalculatorModule) -> Vec<String>,
    ) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for module in self.modules.iter().filter(|m| m.is_published()) {
            for key in keys(module) {
                *counts.entry(key).or_default() += 1;
            }
        }
        counts
    }

    /// Unload every module and clear all state.
    pub fn teardown(&mut self) {
        let modules = std::mem::take(&mut self.modules);
        for module in &modules {
            self.unload(module);
        }
        self.index = CatalogIndex::default();
        self.retries.clear();
        self.initialized = false;
        tracing::debug!(unloaded = modules.len(), "registry torn down");
    }

    /// Unload everything, then initialize again.
    pub fn reload(&mut self) -> InitSummary {
        self.teardown();
        self.initialize()
    }

    /// Validate and calculate with a registered module.
    ///
    /// Failures are logged with the calculator id and passed to the
    /// module's `on_error` before being returned.
    pub fn execute(&self, id: &str, inputs: &Inputs) -> Result<Outcome> {
        let Some(module) = self.get(id) else {
            let err = CalcError::UnknownCalculator { id: id.to_string() };
            self.log(&err, Some(id));
            return Err(err);
        };
        module.run(inputs).inspect_err(|err| {
            let mut context = ErrorContext::new();
            context.insert(
                "inputs".to_string(),
                inputs.iter().map(|(field, _)| field).collect(),
            );
            context.insert("retries".to_string(), self.retries.count(id).into());
            self.errors.log_error(err, Some(id), context);
            module.calculator().on_error(err);
        })
    }

    /// Consume one retry for a failing calculator.
    pub fn request_retry(&mut self, id: &str) -> RetryDecision {
        let decision = self.retries.request(id);
        if decision == RetryDecision::ResetRequired {
            tracing::info!(module = id, "retries exhausted, reset required");
        }
        decision
    }

    pub fn retry_count(&self, id: &str) -> u32 {
        self.retries.count(id)
    }

    /// Re-run a module's unload and load hooks and clear its retries.
    ///
    /// A module whose `on_load` fails during the reset is unregistered.
    pub fn reset_module(&mut self, id: &str) -> Result<()> {
        let Some(module) = self.get(id).cloned() else {
            let err = CalcError::UnknownCalculator { id: id.to_string() };
            self.log(&err, Some(id));
            return Err(err);
        };
        self.unload(&module);
        self.retries.reset(id);
        if let Err(err) = module.calculator().on_load() {
            let err = hook_error(id, LifecycleHook::Load, err);
            module.calculator().on_error(&err);
            self.log(&err, Some(id));
            self.modules.retain(|m| m.id != id);
            self.rebuild_index();
            return Err(err);
        }
        tracing::debug!(module = id, "module reset");
        Ok(())
    }

    fn log(&self, err: &CalcError, calculator_id: Option<&str>) {
        self.errors.log_error(err, calculator_id, ErrorContext::new());
    }
}

fn hook_error(module: &str, hook: LifecycleHook, err: CalcError) -> CalcError {
    match err {
        CalcError::Hook { .. } => err,
        other => CalcError::Hook {
            module: module.to_string(),
            hook,
            message: other.to_string(),
        },
    }
}

fn module_of(err: &CalcError) -> Option<&str> {
    match err {
        CalcError::Config { module, .. }
        | CalcError::InvalidModule { module, .. }
        | CalcError::Hook { module, .. } => Some(module),
        CalcError::DuplicateModule { id } => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use calc_model::ErrorKind;

    use super::*;

    fn initialized() -> CalculatorRegistry {
        let mut registry = CalculatorRegistry::default();
        registry.initialize();
        registry
    }

    #[test]
    fn initializes_builtin_modules_once() {
        let mut registry = CalculatorRegistry::default();
        let summary = registry.initialize();
        assert_eq!(summary.registered.len(), 5);
        assert!(summary.failed.is_empty());
        assert!(registry.is_initialized());

        assert_eq!(registry.initialize(), InitSummary::default());
        assert_eq!(registry.get_all().len(), 5);
    }

    #[test]
    fn disabled_modules_are_skipped() {
        let settings = RegistrySettings {
            disabled_modules: vec!["lipid-risk".to_string()],
            ..RegistrySettings::default()
        };
        let mut registry = CalculatorRegistry::new(settings);
        let summary = registry.initialize();
        assert_eq!(summary.disabled, ["lipid-risk"]);
        assert!(registry.get("lipid-risk").is_none());
        assert!(registry.get("bmi").is_some());
    }

    #[test]
    fn lookups_use_indices() {
        let registry = initialized();
        let cardiology: Vec<_> = registry
            .get_by_category("Cardiology")
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(cardiology, ["cha2ds2-vasc", "lipid-risk"]);
        assert_eq!(registry.get_by_tag("CKD")[0].id, "egfr");
        assert!(registry.get_by_category("dermatology").is_empty());
        assert!(registry.get_by_tag("nope").is_empty());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn stats_count_published_modules() {
        let registry = initialized();
        let categories = registry.category_stats();
        assert_eq!(categories["cardiology"], 2);
        assert_eq!(categories.values().sum::<usize>(), 5);
        assert_eq!(registry.tag_stats()["ckd"], 1);
    }

    #[test]
    fn unknown_calculator_is_logged() {
        let registry = initialized();
        let err = registry.execute("nope", &Inputs::new()).expect_err("unknown");
        assert!(matches!(err, CalcError::UnknownCalculator { .. }));
        let logged = registry.error_handler().errors_for("nope");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].kind, ErrorKind::Unknown);
        assert!(logged[0].recoverable);
    }

    #[test]
    fn execute_returns_validation_as_data() {
        let registry = initialized();
        let outcome = registry
            .execute("bmi", &Inputs::new().with("weight", 70.0))
            .expect("run");
        assert!(outcome.validation().is_some_and(|v| v.has_error_for("height")));
        assert!(registry.error_handler().is_empty());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = initialized();
        let bmi = calc_modules::bmi::module().expect("bmi");
        let err = registry.register(bmi).expect_err("duplicate");
        assert!(matches!(err, CalcError::DuplicateModule { .. }));
        assert_eq!(registry.get_all().len(), 5);
    }

    #[test]
    fn unregister_and_reset() {
        let mut registry = initialized();
        assert!(registry.request_retry("egfr").is_retry());
        assert_eq!(registry.retry_count("egfr"), 1);
        registry.reset_module("egfr").expect("reset");
        assert_eq!(registry.retry_count("egfr"), 0);

        assert!(registry.unregister("egfr").is_some());
        assert!(registry.get_by_tag("ckd").is_empty());
        assert!(registry.unregister("egfr").is_none());
        assert!(registry.reset_module("egfr").is_err());
    }
}
