//! Resolves the static module table into validated modules.

use std::collections::BTreeSet;

use calc_model::{CalcError, CalculatorModule, FieldKind, ModuleFactory, Result};
use calc_modules::BUILTIN_MODULES;

/// Builds modules from a table of factories.
#[derive(Debug, Clone, Copy)]
pub struct ModuleLoader {
    factories: &'static [ModuleFactory],
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModuleLoader {
    /// Loader over the built-in calculators.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_MODULES)
    }

    pub fn new(factories: &'static [ModuleFactory]) -> Self {
        Self { factories }
    }

    /// Build and validate every module, one result per factory.
    ///
    /// A module whose id was already produced by an earlier factory is
    /// rejected, so ids are unique across the candidate set itself.
    pub fn load_all_modules(&self) -> Vec<Result<CalculatorModule>> {
        let mut seen = BTreeSet::new();
        self.factories
            .iter()
            .map(|factory| {
                let module = factory()?;
                validate_structure(&module)?;
                if !seen.insert(module.id.clone()) {
                    return Err(CalcError::DuplicateModule { id: module.id });
                }
                tracing::debug!(
                    module = %module.id,
                    version = %module.metadata.version,
                    "loaded module"
                );
                Ok(module)
            })
            .collect()
    }
}

/// Structural checks every module must pass before registration.
pub fn validate_structure(module: &CalculatorModule) -> Result<()> {
    let id = module.id.as_str();
    let config = &module.config;
    let fail = |property: &'static str, message: String| {
        Err(CalcError::invalid_module(id, property, message))
    };

    if id.trim().is_empty() {
        return fail("id", "must be a non-empty string".to_string());
    }
    if config.id != id {
        return fail("config.id", format!("'{}' does not match module id '{id}'", config.id));
    }
    if config.name.en.trim().is_empty() {
        return fail("config.name", "must have an English name".to_string());
    }
    if config.category.trim().is_empty() {
        return fail("config.category", "must not be empty".to_string());
    }
    if config.fields.is_empty() {
        return fail("config.fields", "must declare at least one field".to_string());
    }

    let mut field_ids = BTreeSet::new();
    for field in &config.fields {
        if field.id.trim().is_empty() {
            return fail("config.fields", "contains a field with an empty id".to_string());
        }
        if !field_ids.insert(field.id.as_str()) {
            return fail("config.fields", format!("duplicate field '{}'", field.id));
        }
        if let (Some(min), Some(max)) = (field.min, field.max)
            && min > max
        {
            return fail(
                "config.fields",
                format!("field '{}' has min {min} above max {max}", field.id),
            );
        }
        if field.kind.has_options() && field.options.is_empty() {
            return fail("config.fields", format!("field '{}' needs options", field.id));
        }
        if field.kind != FieldKind::Number && (field.min.is_some() || field.max.is_some()) {
            return fail(
                "config.fields",
                format!("field '{}' has bounds but is not numeric", field.id),
            );
        }
    }
    for field in &config.fields {
        if let Some(rule) = &field.visible_when
            && !field_ids.contains(rule.field.as_str())
        {
            return fail(
                "config.fields",
                format!("field '{}' depends on unknown field '{}'", field.id, rule.field),
            );
        }
    }

    if module.metadata.version.trim().is_empty() {
        return fail("metadata.version", "must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use calc_model::{Calculator, CalculationResult, CalculatorConfig, Inputs, ValidationResult};

    use super::*;

    #[derive(Debug)]
    struct Noop;

    impl Calculator for Noop {
        fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult {
            config.validate_inputs(inputs)
        }

        fn calculate(&self, _inputs: &Inputs) -> Result<CalculationResult> {
            Err(CalcError::calculation("noop", "not implemented"))
        }
    }

    fn manifest(id: &str, fields: &str) -> String {
        format!(
            r#"
[config]
id = "{id}"
category = "general"
name = {{ en = "Test" }}
description = {{ en = "Test" }}
{fields}

[config.medical]
evidence_level = "D"

[metadata]
version = "0.1.0"
author = "Test"
"#
        )
    }

    const ONE_FIELD: &str = r#"
[[config.fields]]
id = "x"
kind = "number"
label = { en = "X" }
"#;

    fn build(id: &str, manifest: &str) -> CalculatorModule {
        CalculatorModule::from_manifest(id, manifest, Noop).expect("build module")
    }

    fn first() -> Result<CalculatorModule> {
        Ok(build("first", &manifest("first", ONE_FIELD)))
    }

    fn second_with_first_id() -> Result<CalculatorModule> {
        Ok(build("first", &manifest("first", ONE_FIELD)))
    }

    fn broken() -> Result<CalculatorModule> {
        CalculatorModule::from_manifest("broken", "[config", Noop)
    }

    #[test]
    fn builtin_modules_all_load() {
        let results = ModuleLoader::builtin().load_all_modules();
        assert_eq!(results.len(), BUILTIN_MODULES.len());
        assert!(results.iter().all(std::result::Result::is_ok));
    }

    #[test]
    fn duplicate_ids_in_candidate_set_are_rejected() {
        static TABLE: [ModuleFactory; 3] = [first, second_with_first_id, broken];
        let results = ModuleLoader::new(&TABLE).load_all_modules();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CalcError::DuplicateModule { ref id }) if id == "first"));
        assert!(matches!(results[2], Err(CalcError::Config { .. })));
    }

    #[test]
    fn rejects_mismatched_config_id() {
        let module = build("alpha", &manifest("beta", ONE_FIELD));
        let err = validate_structure(&module).expect_err("mismatch");
        assert!(matches!(err, CalcError::InvalidModule { property: "config.id", .. }));
        assert_eq!(err.kind(), calc_model::ErrorKind::Load);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn rejects_empty_field_list_and_bad_bounds() {
        let module = build("empty", &manifest("empty", "fields = []"));
        assert!(validate_structure(&module).is_err());

        let inverted = r#"
[[config.fields]]
id = "x"
kind = "number"
label = { en = "X" }
min = 10.0
max = 1.0
"#;
        let module = build("inverted", &manifest("inverted", inverted));
        let err = validate_structure(&module).expect_err("min above max");
        assert!(err.to_string().contains("min 10 above max 1"));
    }

    #[test]
    fn rejects_dangling_visibility_rule() {
        let dangling = r#"
[[config.fields]]
id = "x"
kind = "number"
label = { en = "X" }
visible_when = { field = "y", equals = true }
"#;
        let module = build("dangling", &manifest("dangling", dangling));
        let err = validate_structure(&module).expect_err("unknown dependency");
        assert!(err.to_string().contains("unknown field 'y'"));
    }

    #[test]
    fn rejects_select_without_options() {
        let select = r#"
[[config.fields]]
id = "unit"
kind = "select"
label = { en = "Unit" }
"#;
        let module = build("select", &manifest("select", select));
        assert!(validate_structure(&module).is_err());
    }
}
