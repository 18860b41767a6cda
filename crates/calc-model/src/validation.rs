//! Validation outcomes.
//!
//! Validation failures are data, never errors: a calculator reports every
//! field problem it finds and the caller decides how to display them.

use serde::{Deserialize, Serialize};

use crate::locale::{Locale, LocalizedText};

/// Machine-readable reason a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    Required,
    NotANumber,
    OutOfRange,
    InvalidOption,
    Invalid,
}

/// A field-scoped validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationCode,
    pub message: LocalizedText,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: ValidationCode, message: LocalizedText) -> Self {
        Self {
            field: field.into(),
            code,
            message,
        }
    }

    pub fn required(field: &str, label: &LocalizedText) -> Self {
        Self::new(
            field,
            ValidationCode::Required,
            label.map(|locale, name| match locale {
                Locale::ZhTw => format!("{name}為必填欄位"),
                Locale::En => format!("{name} is required"),
                Locale::Ja => format!("{name}は必須項目です"),
            }),
        )
    }

    pub fn not_a_number(field: &str, label: &LocalizedText) -> Self {
        Self::new(
            field,
            ValidationCode::NotANumber,
            label.map(|locale, name| match locale {
                Locale::ZhTw => format!("{name}必須為數字"),
                Locale::En => format!("{name} must be a number"),
                Locale::Ja => format!("{name}は数値で入力してください"),
            }),
        )
    }

    pub fn out_of_range(
        field: &str,
        label: &LocalizedText,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        let range = match (min, max) {
            (Some(lo), Some(hi)) => format!("{lo}–{hi}"),
            (Some(lo), None) => format!("≥ {lo}"),
            (None, Some(hi)) => format!("≤ {hi}"),
            (None, None) => String::new(),
        };
        Self::new(
            field,
            ValidationCode::OutOfRange,
            label.map(|locale, name| match locale {
                Locale::ZhTw => format!("{name}必須介於 {range}"),
                Locale::En => format!("{name} must be within {range}"),
                Locale::Ja => format!("{name}は {range} の範囲で入力してください"),
            }),
        )
    }

    pub fn invalid_option(field: &str, label: &LocalizedText, value: &str) -> Self {
        Self::new(
            field,
            ValidationCode::InvalidOption,
            label.map(|locale, name| match locale {
                Locale::ZhTw => format!("{name}的選項無效：{value}"),
                Locale::En => format!("{name} has an invalid option: {value}"),
                Locale::Ja => format!("{name}の選択肢が無効です：{value}"),
            }),
        )
    }
}

/// Outcome of validating a set of inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Append an error, marking the result invalid.
    pub fn push(&mut self, error: ValidationError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Whether `field` already has an error.
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_invalidates() {
        let mut result = ValidationResult::valid();
        assert!(result.is_valid);
        let label = LocalizedText::new("Age", "年齡", "年齢");
        result.push(ValidationError::required("age", &label));
        assert!(!result.is_valid);
        assert!(result.has_error_for("age"));
        assert_eq!(result.errors[0].message.get(Locale::En), "Age is required");
        assert_eq!(result.errors[0].message.get(Locale::ZhTw), "年齡為必填欄位");
    }

    #[test]
    fn range_message_mentions_bounds() {
        let label = LocalizedText::new("Weight", "體重", "体重");
        let err = ValidationError::out_of_range("weight", &label, Some(1.0), Some(300.0));
        assert_eq!(err.code, ValidationCode::OutOfRange);
        assert_eq!(err.message.get(Locale::En), "Weight must be within 1–300");
    }

    #[test]
    fn from_errors_sets_validity() {
        assert!(ValidationResult::from_errors(Vec::new()).is_valid);
        let label = LocalizedText::new("Sex", "性別", "性別");
        let result =
            ValidationResult::from_errors(vec![ValidationError::invalid_option("gender", &label, "x")]);
        assert!(!result.is_valid);
        assert_eq!(result.errors_for("gender").count(), 1);
    }
}
