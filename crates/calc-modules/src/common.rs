//! Helpers shared by the built-in calculators.

use calc_model::{CalcError, Inputs, Result};

/// Biological sex as used by the scoring formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            _ => None,
        }
    }

    pub const fn is_female(&self) -> bool {
        matches!(self, Self::Female)
    }

    /// Required `gender` input.
    pub fn require(inputs: &Inputs) -> Result<Self> {
        let raw = inputs.require_choice("gender")?;
        Self::parse(&raw).ok_or_else(|| CalcError::invalid_input("gender", format!("unknown value {raw}")))
    }

    /// Optional `gender` input.
    pub fn optional(inputs: &Inputs) -> Option<Self> {
        inputs.choice("gender").as_deref().and_then(Self::parse)
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gender() {
        assert_eq!(Gender::parse("Female"), Some(Gender::Female));
        assert_eq!(Gender::parse(" m "), Some(Gender::Male));
        assert_eq!(Gender::parse("other"), None);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(24.22, 1), 24.2);
        assert_eq!(round_to(24.25, 1), 24.3);
        assert_eq!(round_to(67.5, 0), 68.0);
    }
}
