//! Static lookup tables mapping a score to a named band.
//!
//! A band is defined only by its upper bound; its lower bound is the upper
//! bound of the previous band. Tables are therefore contiguous and
//! non-overlapping over the whole real line as long as the bounds increase
//! and the last band is unbounded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locale::LocalizedText;

/// Upper bound of a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Values strictly below `x`.
    Below(f64),
    /// Values at most `x`.
    AtMost(f64),
    /// Every remaining value.
    Unbounded,
}

impl Bound {
    fn admits(&self, value: f64) -> bool {
        match *self {
            Self::Below(x) => value < x,
            Self::AtMost(x) => value <= x,
            Self::Unbounded => true,
        }
    }

    fn limit(&self) -> Option<f64> {
        match *self {
            Self::Below(x) | Self::AtMost(x) => Some(x),
            Self::Unbounded => None,
        }
    }
}

/// One band of a [`BandTable`].
#[derive(Debug, Clone)]
pub struct Band<T> {
    pub upper: Bound,
    pub value: T,
}

impl<T> Band<T> {
    pub const fn new(upper: Bound, value: T) -> Self {
        Self { upper, value }
    }
}

/// Ordered band table.
#[derive(Debug, Clone, Copy)]
pub struct BandTable<T: 'static> {
    bands: &'static [Band<T>],
}

impl<T: 'static> BandTable<T> {
    pub const fn new(bands: &'static [Band<T>]) -> Self {
        assert!(!bands.is_empty(), "band table must not be empty");
        Self { bands }
    }

    /// The band containing `value`.
    ///
    /// NaN falls through to the last band, so every input has exactly one band.
    pub fn classify(&self, value: f64) -> &'static T {
        &self.bands[self.position(value)].value
    }

    /// Index of the band containing `value`.
    pub fn position(&self, value: f64) -> usize {
        self.bands
            .iter()
            .position(|b| b.upper.admits(value))
            .unwrap_or(self.bands.len().saturating_sub(1))
    }

    pub fn bands(&self) -> &'static [Band<T>] {
        self.bands
    }

    /// Bounds strictly increase and only the last band is unbounded.
    pub fn is_well_formed(&self) -> bool {
        let Some((last, rest)) = self.bands.split_last() else {
            return false;
        };
        if last.upper != Bound::Unbounded {
            return false;
        }
        let mut previous: Option<f64> = None;
        for band in rest {
            let Some(limit) = band.upper.limit() else {
                return false;
            };
            if !limit.is_finite() || previous.is_some_and(|p| limit <= p) {
                return false;
            }
            previous = Some(limit);
        }
        true
    }
}

/// Severity band shared by every calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Critical,
}

impl RiskLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very_high",
            Self::Critical => "critical",
        }
    }

    /// Display color (hex).
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Low => "#16a34a",
            Self::Moderate => "#ca8a04",
            Self::High => "#ea580c",
            Self::VeryHigh => "#dc2626",
            Self::Critical => "#7f1d1d",
        }
    }

    pub const fn label(&self) -> LocalizedText {
        match self {
            Self::Low => LocalizedText::new("Low risk", "低風險", "低リスク"),
            Self::Moderate => LocalizedText::new("Moderate risk", "中度風險", "中等度リスク"),
            Self::High => LocalizedText::new("High risk", "高風險", "高リスク"),
            Self::VeryHigh => LocalizedText::new("Very high risk", "極高風險", "超高リスク"),
            Self::Critical => LocalizedText::new("Critical", "危急", "危険域"),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static GRADE_BANDS: [Band<&str>; 3] = [
        Band::new(Bound::Below(10.0), "low"),
        Band::new(Bound::AtMost(20.0), "mid"),
        Band::new(Bound::Unbounded, "high"),
    ];
    static GRADES: BandTable<&str> = BandTable::new(&GRADE_BANDS);

    #[test]
    fn classifies_on_boundaries() {
        assert_eq!(*GRADES.classify(-5.0), "low");
        assert_eq!(*GRADES.classify(9.99), "low");
        assert_eq!(*GRADES.classify(10.0), "mid");
        assert_eq!(*GRADES.classify(20.0), "mid");
        assert_eq!(*GRADES.classify(20.01), "high");
        assert_eq!(GRADES.position(15.0), 1);
    }

    #[test]
    fn nan_lands_in_last_band() {
        assert_eq!(*GRADES.classify(f64::NAN), "high");
    }

    #[test]
    fn detects_malformed_tables() {
        assert!(GRADES.is_well_formed());

        static UNORDERED: [Band<u8>; 3] = [
            Band::new(Bound::Below(10.0), 0),
            Band::new(Bound::Below(5.0), 1),
            Band::new(Bound::Unbounded, 2),
        ];
        assert!(!BandTable::new(&UNORDERED).is_well_formed());

        static OPEN_ENDED: [Band<u8>; 2] = [
            Band::new(Bound::Below(10.0), 0),
            Band::new(Bound::Below(20.0), 1),
        ];
        assert!(!BandTable::new(&OPEN_ENDED).is_well_formed());
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Critical);
        assert_eq!(RiskLevel::VeryHigh.as_str(), "very_high");
    }
}
