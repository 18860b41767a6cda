//! Calculation results and their localized rendering.

use serde::{Deserialize, Serialize};

use crate::band::RiskLevel;
use crate::locale::{Locale, LocalizedText};
use crate::validation::ValidationResult;

/// A labelled numeric value with its unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultValue {
    pub value: f64,
    pub unit: String,
    pub label: LocalizedText,
    /// Decimal places used when rendering.
    #[serde(default)]
    pub precision: u8,
}

impl ResultValue {
    pub fn new(value: f64, unit: impl Into<String>, label: LocalizedText, precision: u8) -> Self {
        Self {
            value,
            unit: unit.into(),
            label,
            precision,
        }
    }

    /// Value and unit as display text.
    pub fn display(&self) -> String {
        let number = format!("{:.*}", usize::from(self.precision), self.value);
        if self.unit.is_empty() {
            number
        } else {
            format!("{number} {}", self.unit)
        }
    }
}

/// One step of a computation, shown to explain the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownStep {
    pub label: LocalizedText,
    pub value: f64,
    /// Human-readable formula fragment.
    pub formula: String,
}

impl BreakdownStep {
    pub fn new(label: LocalizedText, value: f64, formula: impl Into<String>) -> Self {
        Self {
            label,
            value,
            formula: formula.into(),
        }
    }
}

/// Output of a successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub primary: ResultValue,
    #[serde(default)]
    pub secondary: Vec<ResultValue>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    pub interpretation: LocalizedText,
    #[serde(default)]
    pub recommendations: Vec<LocalizedText>,
    #[serde(default)]
    pub breakdown: Vec<BreakdownStep>,
    #[serde(default)]
    pub warnings: Vec<LocalizedText>,
    /// Calculator-specific payload for custom rendering.
    #[serde(default)]
    pub custom: Option<serde_json::Value>,
}

impl CalculationResult {
    pub fn new(primary: ResultValue, interpretation: LocalizedText) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
            risk_level: None,
            risk_score: None,
            interpretation,
            recommendations: Vec::new(),
            breakdown: Vec::new(),
            warnings: Vec::new(),
            custom: None,
        }
    }

    /// Label of the first non-finite number, if any.
    pub fn first_non_finite(&self) -> Option<String> {
        std::iter::once(&self.primary)
            .chain(self.secondary.iter())
            .find(|v| !v.value.is_finite())
            .map(|v| v.label.en.to_string())
            .or_else(|| {
                self.risk_score
                    .filter(|s| !s.is_finite())
                    .map(|_| "risk score".to_string())
            })
    }

    pub fn secondary_value(&self, en_label: &str) -> Option<f64> {
        self.secondary
            .iter()
            .find(|v| v.label.en == en_label)
            .map(|v| v.value)
    }

    /// Generic rendering used when a calculator has no formatter of its own.
    pub fn format(&self, locale: Locale) -> FormattedResult {
        FormattedResult {
            locale,
            primary_label: self.primary.label.get(locale).to_string(),
            primary_value: self.primary.display(),
            secondary: self
                .secondary
                .iter()
                .map(|v| (v.label.get(locale).to_string(), v.display()))
                .collect(),
            risk_label: self.risk_level.map(|r| r.label().get(locale).to_string()),
            risk_color: self.risk_level.map(|r| r.color().to_string()),
            interpretation: self.interpretation.get(locale).to_string(),
            recommendations: self
                .recommendations
                .iter()
                .map(|r| r.get(locale).to_string())
                .collect(),
            breakdown: self
                .breakdown
                .iter()
                .map(|s| format!("{}: {}", s.label.get(locale), s.formula))
                .collect(),
            warnings: self
                .warnings
                .iter()
                .map(|w| w.get(locale).to_string())
                .collect(),
        }
    }
}

/// A result rendered into display strings for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResult {
    pub locale: Locale,
    pub primary_label: String,
    pub primary_value: String,
    pub secondary: Vec<(String, String)>,
    pub risk_label: Option<String>,
    pub risk_color: Option<String>,
    pub interpretation: String,
    pub recommendations: Vec<String>,
    pub breakdown: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of running the validate-then-calculate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Validation failed; calculation did not run.
    Invalid(ValidationResult),
    Computed(Box<CalculationResult>),
}

impl Outcome {
    pub fn computed(&self) -> Option<&CalculationResult> {
        match self {
            Self::Computed(result) => Some(result.as_ref()),
            Self::Invalid(_) => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Invalid(validation) => Some(validation),
            Self::Computed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CalculationResult {
        let mut result = CalculationResult::new(
            ResultValue::new(24.2, "kg/m²", LocalizedText::new("BMI", "BMI", "BMI"), 1),
            LocalizedText::new("Normal weight", "正常體重", "普通体重"),
        );
        result.risk_level = Some(RiskLevel::Low);
        result.secondary.push(ResultValue::new(
            53.5,
            "kg",
            LocalizedText::new("Minimum healthy weight", "健康體重下限", "適正体重下限"),
            1,
        ));
        result.breakdown.push(BreakdownStep::new(
            LocalizedText::new("Height", "身高", "身長"),
            1.7,
            "170 cm ÷ 100 = 1.70 m",
        ));
        result
    }

    #[test]
    fn default_format_selects_locale() {
        let formatted = sample().format(Locale::ZhTw);
        assert_eq!(formatted.primary_value, "24.2 kg/m²");
        assert_eq!(formatted.interpretation, "正常體重");
        assert_eq!(formatted.risk_label.as_deref(), Some("低風險"));
        assert_eq!(
            formatted.secondary,
            vec![("健康體重下限".to_string(), "53.5 kg".to_string())]
        );
        assert_eq!(formatted.breakdown, vec!["身高: 170 cm ÷ 100 = 1.70 m"]);
    }

    #[test]
    fn detects_non_finite_values() {
        let mut result = sample();
        assert_eq!(result.first_non_finite(), None);
        result.secondary[0].value = f64::NAN;
        assert_eq!(
            result.first_non_finite().as_deref(),
            Some("Minimum healthy weight")
        );
    }

    #[test]
    fn precision_controls_display() {
        let value = ResultValue::new(67.4, "mL/min/1.73m²", LocalizedText::uniform("eGFR"), 0);
        assert_eq!(value.display(), "67 mL/min/1.73m²");
        let ratio = ResultValue::new(4.0, "", LocalizedText::uniform("Ratio"), 2);
        assert_eq!(ratio.display(), "4.00");
    }
}
