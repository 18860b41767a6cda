//! Calculator inputs keyed by field id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};

/// A single input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl InputValue {
    /// Parse a raw command-line or form string.
    ///
    /// `true`/`false` become booleans, anything that parses as a float
    /// becomes a number, everything else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" => return Self::Bool(true),
            "false" | "no" => return Self::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" | "" => Some(false),
                _ => None,
            },
        }
    }

    /// Option value as compared against select/radio options.
    pub fn as_option_key(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.trim().to_string(),
        }
    }

    /// Whether the value counts as "not provided".
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_option_key())
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Calculator inputs keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inputs {
    values: BTreeMap<String, InputValue>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<InputValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<InputValue>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Parse `field=value` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut inputs = Self::new();
        for pair in pairs {
            let (field, raw) = pair.split_once('=').ok_or_else(|| {
                CalcError::invalid_input(pair, "expected FIELD=VALUE")
            })?;
            let field = field.trim();
            if field.is_empty() {
                return Err(CalcError::invalid_input(pair, "field name is empty"));
            }
            inputs.insert(field, InputValue::parse(raw));
        }
        Ok(inputs)
    }

    pub fn get(&self, field: &str) -> Option<&InputValue> {
        self.values.get(field).filter(|v| !v.is_blank())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value of `field`, if present and numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(InputValue::as_number)
    }

    /// Numeric value of a required field.
    pub fn require_number(&self, field: &str) -> Result<f64> {
        match self.get(field) {
            None => Err(CalcError::invalid_input(field, "value is missing")),
            Some(value) => value
                .as_number()
                .filter(|n| n.is_finite())
                .ok_or_else(|| CalcError::invalid_input(field, "expected a finite number")),
        }
    }

    /// Boolean value of a checkbox field; absent means unchecked.
    pub fn flag(&self, field: &str) -> bool {
        self.get(field).and_then(InputValue::as_bool).unwrap_or(false)
    }

    /// Option key of a select/radio field.
    pub fn choice(&self, field: &str) -> Option<String> {
        self.get(field).map(InputValue::as_option_key)
    }

    /// Option key of a required select/radio field.
    pub fn require_choice(&self, field: &str) -> Result<String> {
        self.choice(field)
            .ok_or_else(|| CalcError::invalid_input(field, "value is missing"))
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<'a> FromIterator<(&'a str, InputValue)> for Inputs {
    fn from_iter<T: IntoIterator<Item = (&'a str, InputValue)>>(iter: T) -> Self {
        let mut inputs = Self::new();
        for (field, value) in iter {
            inputs.insert(field, value);
        }
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_into_typed_values() {
        let inputs = Inputs::from_pairs(["weight=70", "gender=female", "diabetes=true"])
            .expect("parse pairs");
        assert_eq!(inputs.number("weight"), Some(70.0));
        assert_eq!(inputs.choice("gender").as_deref(), Some("female"));
        assert!(inputs.flag("diabetes"));
        assert!(!inputs.flag("smoking"));
    }

    #[test]
    fn rejects_malformed_pairs() {
        let err = Inputs::from_pairs(["weight"]).expect_err("missing '='");
        assert!(matches!(err, CalcError::InvalidInput { .. }));
        assert!(Inputs::from_pairs(["=5"]).is_err());
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let inputs = Inputs::new().with("age", "  ");
        assert!(!inputs.contains("age"));
        assert!(inputs.require_number("age").is_err());
    }

    #[test]
    fn numeric_option_keys_drop_trailing_zero() {
        assert_eq!(InputValue::Number(45.0).as_option_key(), "45");
        assert_eq!(InputValue::Number(0.5).as_option_key(), "0.5");
    }

    #[test]
    fn deserializes_from_json_object() {
        let inputs: Inputs =
            serde_json::from_str(r#"{"weight": 70, "smoker": false, "gender": "male"}"#)
                .expect("deserialize inputs");
        assert_eq!(inputs.number("weight"), Some(70.0));
        assert!(!inputs.flag("smoker"));
        assert_eq!(inputs.choice("gender").as_deref(), Some("male"));
    }

    #[test]
    fn require_number_rejects_non_finite() {
        let inputs = Inputs::new().with("x", f64::NAN);
        assert!(inputs.require_number("x").is_err());
    }
}
