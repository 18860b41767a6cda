//! Terminal rendering of catalog entries and results.

use std::collections::BTreeMap;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use calc_model::{
    CalculationResult, CalculatorModule, FieldSpec, FormattedResult, Locale, RiskLevel,
    Status, ValidationResult,
};
use calc_registry::ErrorStats;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: Status) -> Cell {
    match status {
        Status::Published => Cell::new(status).fg(Color::Green),
        Status::Draft => Cell::new(status).fg(Color::Yellow),
        Status::Deprecated => dim_cell(status),
    }
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => Color::Green,
        RiskLevel::Moderate => Color::Yellow,
        RiskLevel::High => Color::DarkYellow,
        RiskLevel::VeryHigh => Color::Red,
        RiskLevel::Critical => Color::Magenta,
    }
}

/// One row per module.
pub fn module_table(modules: &[&CalculatorModule], locale: Locale) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Name"),
        header_cell("Category"),
        header_cell("Difficulty"),
        header_cell("Status"),
        header_cell("Version"),
    ]);
    apply_table_style(&mut table);
    for module in modules {
        let config = &module.config;
        table.add_row(vec![
            Cell::new(&module.id).add_attribute(Attribute::Bold),
            Cell::new(config.name.get(locale)),
            Cell::new(&config.category),
            Cell::new(config.difficulty),
            status_cell(config.status),
            dim_cell(&module.metadata.version),
        ]);
    }
    table
}

fn range_text(field: &FieldSpec) -> String {
    match (field.min, field.max) {
        (Some(min), Some(max)) => format!("{min}–{max}"),
        (Some(min), None) => format!("≥ {min}"),
        (None, Some(max)) => format!("≤ {max}"),
        (None, None) => String::new(),
    }
}

/// Input schema of a module.
pub fn field_table(module: &CalculatorModule, locale: Locale) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Kind"),
        header_cell("Unit"),
        header_cell("Range / options"),
        header_cell("Required"),
        header_cell("Default"),
    ]);
    apply_table_style(&mut table);
    for field in &module.config.fields {
        let domain = if field.options.is_empty() {
            range_text(field)
        } else {
            field
                .options
                .iter()
                .map(|o| o.value.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        };
        table.add_row(vec![
            Cell::new(&field.id).add_attribute(Attribute::Bold),
            Cell::new(field.label.get(locale)),
            Cell::new(format!("{:?}", field.kind).to_lowercase()),
            dim_cell(field.unit.as_deref().unwrap_or("-")),
            Cell::new(domain),
            if field.required {
                Cell::new("yes").fg(Color::Yellow)
            } else {
                dim_cell("no")
            },
            field
                .default
                .as_ref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    table
}

/// Catalog and clinical metadata of a module.
pub fn module_summary(module: &CalculatorModule, locale: Locale) -> String {
    let config = &module.config;
    let medical = &config.medical;
    let mut lines = vec![
        format!("{} ({})", config.name.get(locale), module.id),
        config.description.get(locale).to_string(),
        format!(
            "Category: {}  Difficulty: {}  Status: {}  Version: {}",
            config.category, config.difficulty, config.status, module.metadata.version
        ),
        format!("Evidence level: {:?}", medical.evidence_level),
    ];
    if !config.tags.is_empty() {
        lines.push(format!("Tags: {}", config.tags.join(", ")));
    }
    if !medical.specialties.is_empty() {
        lines.push(format!("Specialties: {}", medical.specialties.join(", ")));
    }
    let contraindications: Vec<String> = medical
        .contraindications
        .iter()
        .map(|c| c.get(locale).to_string())
        .collect();
    lines.extend(bullet_section("Contraindications", &contraindications));
    let references: Vec<String> = medical
        .references
        .iter()
        .map(|r| match r.year {
            Some(year) => format!("{} ({year})", r.title),
            None => r.title.clone(),
        })
        .collect();
    lines.extend(bullet_section("References", &references));
    lines.join("\n")
}

/// Primary, risk, interpretation and secondary values.
pub fn result_table(formatted: &FormattedResult, risk: Option<RiskLevel>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Result"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new(&formatted.primary_label).add_attribute(Attribute::Bold),
        Cell::new(&formatted.primary_value).add_attribute(Attribute::Bold),
    ]);
    if let (Some(label), Some(level)) = (&formatted.risk_label, risk) {
        table.add_row(vec![
            Cell::new("Risk"),
            Cell::new(label).fg(risk_color(level)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Interpretation"),
        Cell::new(&formatted.interpretation),
    ]);
    for (label, value) in &formatted.secondary {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

/// Field errors in the requested locale.
pub fn validation_table(validation: &ValidationResult, locale: Locale) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Problem"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for error in &validation.errors {
        table.add_row(vec![
            Cell::new(&error.field).add_attribute(Attribute::Bold),
            Cell::new(format!("{:?}", error.code)).fg(Color::Red),
            Cell::new(error.message.get(locale)),
        ]);
    }
    table
}

/// Key/count table, largest first.
pub fn count_table(title: &str, counts: &BTreeMap<String, usize>) -> Table {
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut table = Table::new();
    table.set_header(vec![header_cell(title), header_cell("Published")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (key, count) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(count)]);
    }
    table
}

pub fn error_stats_table(stats: &ErrorStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Error kind"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (kind, count) in &stats.by_kind {
        table.add_row(vec![Cell::new(kind), Cell::new(count).fg(Color::Red)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(stats.total).add_attribute(Attribute::Bold),
    ]);
    table
}

/// `Title:` followed by one `- item` line per entry; nothing when empty.
pub fn bullet_section(title: &str, items: &[String]) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(format!("{title}:"));
    lines.extend(items.iter().map(|item| format!("  - {item}")));
    lines
}

/// Recommendations, warnings and breakdown below the result table.
pub fn result_notes(formatted: &FormattedResult) -> String {
    let mut lines = bullet_section("Recommendations", &formatted.recommendations);
    lines.extend(bullet_section("Warnings", &formatted.warnings));
    lines.extend(bullet_section("Breakdown", &formatted.breakdown));
    lines.join("\n")
}

/// Machine-readable output of `calc --json`.
pub fn calculation_json(
    module: &CalculatorModule,
    result: &CalculationResult,
    formatted: &FormattedResult,
) -> serde_json::Value {
    serde_json::json!({
        "id": module.id,
        "version": module.metadata.version,
        "result": result,
        "formatted": formatted,
    })
}

/// Machine-readable output of `calc --json` for invalid inputs.
pub fn validation_json(module: &CalculatorModule, validation: &ValidationResult) -> serde_json::Value {
    serde_json::json!({
        "id": module.id,
        "validation": validation,
    })
}
