use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calc_cli::logging::redact_value;
use calc_cli::render::{
    bullet_section, calculation_json, count_table, error_stats_table, field_table,
    module_summary, module_table, result_notes, result_table, validation_json, validation_table,
};
use calc_model::{Inputs, Locale, Outcome};
use calc_registry::{CalculatorRegistry, RegistrySettings, SearchQuery, recovery_suggestions};
use tracing::{debug, info_span, trace};

use crate::cli::{CalcArgs, SearchArgs};

/// Build and initialize a registry from an optional settings file.
pub fn load_registry(config: Option<&Path>) -> Result<CalculatorRegistry> {
    let settings = match config {
        Some(path) => RegistrySettings::load(path)
            .with_context(|| format!("load settings {}", path.display()))?,
        None => RegistrySettings::default(),
    };
    let mut registry = CalculatorRegistry::new(settings);
    let summary = registry.initialize();
    for failure in &summary.failed {
        eprintln!("warning: {failure}");
    }
    Ok(registry)
}

pub fn run_list(registry: &CalculatorRegistry, all: bool, locale: Locale) {
    let modules: Vec<_> = if all {
        registry.get_all().iter().collect()
    } else {
        registry.get_published()
    };
    println!("{}", module_table(&modules, locale));
}

pub fn run_search(registry: &CalculatorRegistry, args: &SearchArgs, locale: Locale) {
    let query = SearchQuery {
        text: args.text.clone(),
        category: args.category.clone(),
        tags: args.tags.clone(),
        difficulty: args.difficulty,
        specialties: args.specialties.clone(),
        status: args.status,
    };
    let found = registry.search(&query);
    debug!(matches = found.len(), "search finished");
    if found.is_empty() {
        println!("No calculators match.");
    } else {
        println!("{}", module_table(&found, locale));
    }
}

pub fn run_show(registry: &CalculatorRegistry, id: &str, locale: Locale) -> Result<()> {
    let module = registry
        .get(id)
        .ok_or_else(|| anyhow!("unknown calculator: {id}"))?;
    println!("{}", module_summary(module, locale));
    println!("{}", field_table(module, locale));
    Ok(())
}

/// Run a calculation; `Ok(false)` when the inputs were invalid.
pub fn run_calc(registry: &CalculatorRegistry, args: &CalcArgs, locale: Locale) -> Result<bool> {
    let span = info_span!("calc", calculator = %args.id);
    let _guard = span.enter();

    let module = registry
        .get(&args.id)
        .ok_or_else(|| anyhow!("unknown calculator: {}", args.id))?;
    let inputs = Inputs::from_pairs(args.inputs.iter().map(String::as_str))?;
    for (field, value) in inputs.iter() {
        trace!(field, value = redact_value(&value.to_string()), "input");
    }

    let outcome = match registry.execute(&args.id, &inputs) {
        Ok(outcome) => outcome,
        Err(err) => {
            let suggestions: Vec<String> = recovery_suggestions(err.kind())
                .iter()
                .map(|s| (*s).to_string())
                .collect();
            for line in bullet_section("Suggestions", &suggestions) {
                eprintln!("{line}");
            }
            return Err(err.into());
        }
    };

    match outcome {
        Outcome::Computed(result) => {
            let formatted = module.format_result(&result, locale);
            if args.json {
                let json = calculation_json(module, &result, &formatted);
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{}", result_table(&formatted, result.risk_level));
                let notes = result_notes(&formatted);
                if !notes.is_empty() {
                    println!("{notes}");
                }
            }
            Ok(true)
        }
        Outcome::Invalid(validation) => {
            if args.json {
                let json = validation_json(module, &validation);
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                eprintln!("{}", validation_table(&validation, locale));
            }
            Ok(false)
        }
    }
}

pub fn run_stats(registry: &CalculatorRegistry) {
    println!("{}", count_table("Category", &registry.category_stats()));
    println!("{}", count_table("Tag", &registry.tag_stats()));
    let errors = registry.error_handler().stats();
    if errors.total > 0 {
        println!("{}", error_stats_table(&errors));
    }
}
