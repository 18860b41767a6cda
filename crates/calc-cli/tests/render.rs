//! Rendering of registry content for the terminal.

use calc_cli::render::{
    bullet_section, calculation_json, count_table, field_table, module_summary, module_table,
    result_notes, result_table, validation_json, validation_table,
};
use calc_model::{Inputs, Locale, Outcome};
use calc_registry::CalculatorRegistry;
use insta::assert_snapshot;

fn registry() -> CalculatorRegistry {
    let mut registry = CalculatorRegistry::default();
    registry.initialize();
    registry
}

fn run(registry: &CalculatorRegistry, id: &str, pairs: &[&str]) -> Outcome {
    let inputs = Inputs::from_pairs(pairs.iter().copied()).expect("parse inputs");
    registry.execute(id, &inputs).expect("execute")
}

#[test]
fn bmi_notes() {
    let registry = registry();
    let outcome = run(&registry, "bmi", &["weight=70", "height=170"]);
    let result = outcome.computed().expect("computed");
    let formatted = registry.get("bmi").expect("bmi").format_result(result, Locale::En);

    assert_snapshot!(result_notes(&formatted), @r"
    Recommendations:
      - Maintain current weight with balanced diet and regular activity.
    Breakdown:
      - Height: 170 cm ÷ 100 = 1.70 m
      - Height squared: 1.70² = 2.8900 m²
      - BMI: 70 kg ÷ 2.8900 m² = 24.2
    ");

    let mut table = result_table(&formatted, result.risk_level);
    let text = table.force_no_tty().to_string();
    assert!(text.contains("24.2 kg/m²"));
    assert!(text.contains("Normal weight"));
    assert!(text.contains("Low risk"));
    assert!(text.contains("53.5–72.0 kg"));
}

#[test]
fn calculation_json_carries_result_and_rendering() {
    let registry = registry();
    let outcome = run(&registry, "cha2ds2-vasc", &["age=70", "gender=male", "hypertension=true"]);
    let result = outcome.computed().expect("computed");
    let module = registry.get("cha2ds2-vasc").expect("module");
    let formatted = module.format_result(result, Locale::Ja);

    let json = calculation_json(module, result, &formatted);
    assert_eq!(json["id"], "cha2ds2-vasc");
    assert_eq!(json["result"]["primary"]["value"], 2.0);
    assert_eq!(json["result"]["risk_level"], "high");
    assert_eq!(json["formatted"]["locale"], "ja");
    assert_eq!(json["formatted"]["risk_label"], "高リスク");
}

#[test]
fn invalid_inputs_render_field_errors() {
    let registry = registry();
    let outcome = run(&registry, "egfr", &["creatinine=abc", "age=65"]);
    let validation = outcome.validation().expect("invalid");
    let module = registry.get("egfr").expect("module");

    let mut table = validation_table(validation, Locale::En);
    let text = table.force_no_tty().to_string();
    assert!(text.contains("creatinine"));
    assert!(text.contains("gender"));

    let json = validation_json(module, validation);
    assert_eq!(json["validation"]["is_valid"], false);
    assert_eq!(json["validation"]["errors"][0]["field"], "creatinine");
}

#[test]
fn catalog_tables() {
    let registry = registry();
    let mut table = module_table(&registry.get_published(), Locale::ZhTw);
    let text = table.force_no_tty().to_string();
    assert!(text.contains("身體質量指數 (BMI)"));
    assert!(text.contains("amoxicillin-clavulanate-dose"));

    let module = registry.get("amoxicillin-clavulanate-dose").expect("module");
    let mut fields = field_table(module, Locale::En);
    let text = fields.force_no_tty().to_string();
    assert!(text.contains("standard | high"));
    assert!(text.contains("3–50"));

    let summary = module_summary(module, Locale::En);
    assert!(summary.starts_with("Pediatric Amoxicillin/Clavulanate Dosing (amoxicillin-clavulanate-dose)"));
    assert!(summary.contains("Specialties: pediatrics, infectious-disease"));

    let mut counts = count_table("Category", &registry.category_stats());
    let text = counts.force_no_tty().to_string();
    assert!(text.contains("cardiology"));
}

#[test]
fn empty_sections_are_omitted() {
    assert!(bullet_section("Warnings", &[]).is_empty());
    assert_eq!(
        bullet_section("Warnings", &["check dose".to_string()]),
        ["Warnings:", "  - check dose"]
    );
}
