//! Declarative calculator configuration.
//!
//! Every calculator ships a manifest with a `[config]` table (field schema,
//! catalog metadata, medical metadata) and a `[metadata]` table (version,
//! author, changelog). The field schema drives generic input validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};
use crate::input::{InputValue, Inputs};
use crate::locale::LocalizedText;
use crate::validation::{ValidationError, ValidationResult};

/// Publication status of a calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Published,
    Draft,
    Deprecated,
}

impl Status {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
            Self::Deprecated => "deprecated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "published" => Some(Self::Published),
            "draft" => Some(Self::Draft),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much clinical context a calculator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input widget kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Select,
    Radio,
    Checkbox,
}

impl FieldKind {
    /// Whether the field takes one of a fixed set of options.
    pub const fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

/// One option of a select or radio field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: LocalizedText,
}

/// Show a field only when another field has a given value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityRule {
    pub field: String,
    pub equals: InputValue,
}

/// Schema for a single input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub kind: FieldKind,
    pub label: LocalizedText,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<InputValue>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub visible_when: Option<VisibilityRule>,
    #[serde(default)]
    pub help: Option<LocalizedText>,
}

impl FieldSpec {
    /// Whether the field is shown for the given inputs.
    pub fn is_visible(&self, inputs: &Inputs) -> bool {
        match &self.visible_when {
            None => true,
            Some(rule) => inputs
                .get(&rule.field)
                .map(InputValue::as_option_key)
                .is_some_and(|v| v == rule.equals.as_option_key()),
        }
    }

    /// Validate this field against `inputs`.
    ///
    /// Hidden fields are skipped entirely.
    pub fn check(&self, inputs: &Inputs) -> Option<ValidationError> {
        if !self.is_visible(inputs) {
            return None;
        }
        let Some(value) = inputs.get(&self.id) else {
            return self
                .required
                .then(|| ValidationError::required(&self.id, &self.label));
        };
        match self.kind {
            FieldKind::Number => {
                let Some(n) = value.as_number().filter(|n| n.is_finite()) else {
                    return Some(ValidationError::not_a_number(&self.id, &self.label));
                };
                let below = self.min.is_some_and(|min| n < min);
                let above = self.max.is_some_and(|max| n > max);
                (below || above).then(|| {
                    ValidationError::out_of_range(&self.id, &self.label, self.min, self.max)
                })
            }
            FieldKind::Select | FieldKind::Radio => {
                let key = value.as_option_key();
                (!self.options.iter().any(|o| o.value == key))
                    .then(|| ValidationError::invalid_option(&self.id, &self.label, &key))
            }
            FieldKind::Checkbox => value.as_bool().is_none().then(|| {
                ValidationError::invalid_option(&self.id, &self.label, &value.as_option_key())
            }),
        }
    }
}

/// Strength of the evidence behind a calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceLevel {
    A,
    B,
    C,
    D,
}

/// Literature reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Clinical metadata shown alongside a calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalMetadata {
    #[serde(default)]
    pub specialties: Vec<String>,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub contraindications: Vec<LocalizedText>,
}

/// Declarative configuration of one calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fields: Vec<FieldSpec>,
    pub medical: MedicalMetadata,
}

impl CalculatorConfig {
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Schema-level validation of every field, in declaration order.
    pub fn validate_inputs(&self, inputs: &Inputs) -> ValidationResult {
        ValidationResult::from_errors(
            self.fields
                .iter()
                .filter_map(|field| field.check(inputs))
                .collect(),
        )
    }

    /// Inputs with declared defaults filled in for absent fields.
    pub fn with_defaults(&self, inputs: &Inputs) -> Inputs {
        let mut merged = inputs.clone();
        for field in &self.fields {
            if let Some(default) = &field.default
                && !merged.contains(&field.id)
            {
                merged.insert(&field.id, default.clone());
            }
        }
        merged
    }
}

/// One changelog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub date: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Module release metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub version: String,
    pub author: String,
    #[serde(default)]
    pub changelog: Vec<ChangelogEntry>,
}

/// Contents of an embedded module manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub config: CalculatorConfig,
    pub metadata: ModuleMetadata,
}

impl ModuleManifest {
    /// Parse a TOML manifest for module `module_id`.
    pub fn from_toml(module_id: &str, source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| CalcError::Config {
            module: module_id.to_string(),
            message: e.to_string(),
        })
    }
}
