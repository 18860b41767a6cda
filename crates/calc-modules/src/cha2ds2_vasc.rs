//! CHA2DS2-VASc stroke risk score for atrial fibrillation.

use calc_model::{
    BreakdownStep, CalculationResult, Calculator, CalculatorConfig, CalculatorModule,
    FormattedResult, Inputs, Locale, LocalizedText, Result, ResultValue, RiskLevel,
    ValidationResult,
};
use serde_json::json;

use crate::common::Gender;
use crate::embedded::CHA2DS2_VASC_MANIFEST;

pub const ID: &str = "cha2ds2-vasc";

/// Highest attainable score.
pub const MAX_SCORE: u8 = 9;

/// A yes/no condition contributing fixed points.
#[derive(Debug)]
pub struct ScoreFactor {
    /// Input field holding the condition.
    pub field: &'static str,
    /// Letter in the acronym.
    pub letter: &'static str,
    pub label: LocalizedText,
    pub points: u8,
}

/// Condition factors; age and sex are scored separately.
pub static CONDITION_FACTORS: [ScoreFactor; 5] = [
    ScoreFactor {
        field: "chf",
        letter: "C",
        label: LocalizedText::new("Congestive heart failure", "鬱血性心衰竭", "うっ血性心不全"),
        points: 1,
    },
    ScoreFactor {
        field: "hypertension",
        letter: "H",
        label: LocalizedText::new("Hypertension", "高血壓", "高血圧"),
        points: 1,
    },
    ScoreFactor {
        field: "diabetes",
        letter: "D",
        label: LocalizedText::new("Diabetes mellitus", "糖尿病", "糖尿病"),
        points: 1,
    },
    ScoreFactor {
        field: "stroke_tia",
        letter: "S2",
        label: LocalizedText::new(
            "Prior stroke, TIA or thromboembolism",
            "曾中風、短暫性腦缺血或血栓栓塞",
            "脳卒中・TIA・血栓塞栓症の既往",
        ),
        points: 2,
    },
    ScoreFactor {
        field: "vascular_disease",
        letter: "V",
        label: LocalizedText::new(
            "Vascular disease (MI, PAD, aortic plaque)",
            "血管疾病（心肌梗塞、周邊動脈疾病、主動脈斑塊）",
            "血管疾患（心筋梗塞・末梢動脈疾患・大動脈プラーク）",
        ),
        points: 1,
    },
];

/// Adjusted annual stroke rate (%) by score; the last entry covers 6 and above.
pub const ANNUAL_STROKE_RISK: [f64; 7] = [0.2, 0.6, 2.2, 3.2, 4.8, 7.2, 13.6];

/// Points for age: < 65, 65–74, ≥ 75.
pub fn age_points(age: f64) -> u8 {
    if age >= 75.0 {
        2
    } else if age >= 65.0 {
        1
    } else {
        0
    }
}

pub fn annual_stroke_risk(score: u8) -> f64 {
    ANNUAL_STROKE_RISK[usize::from(score).min(ANNUAL_STROKE_RISK.len() - 1)]
}

/// Anticoagulation guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anticoagulation {
    NotRecommended,
    /// Score 1 from female sex alone.
    Reevaluate,
    Consider,
    Recommended,
    StronglyRecommended,
}

impl Anticoagulation {
    /// Guidance for a score, given whether the only point is the sex category.
    pub fn for_score(score: u8, sex_only: bool) -> Self {
        match score {
            0 => Self::NotRecommended,
            1 if sex_only => Self::Reevaluate,
            1 => Self::Consider,
            2 => Self::Recommended,
            _ => Self::StronglyRecommended,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotRecommended => "not_recommended",
            Self::Reevaluate => "reevaluate",
            Self::Consider => "consider",
            Self::Recommended => "recommended",
            Self::StronglyRecommended => "strongly_recommended",
        }
    }

    pub const fn advice(&self) -> LocalizedText {
        match self {
            Self::NotRecommended => LocalizedText::new(
                "Anticoagulation is not recommended.",
                "不建議抗凝血治療。",
                "抗凝固療法は推奨されません。",
            ),
            Self::Reevaluate => LocalizedText::new(
                "Female sex is the only risk factor: re-evaluate other stroke risk factors before anticoagulation.",
                "女性為唯一危險因子：抗凝血前請重新評估其他中風危險因子。",
                "女性であることが唯一のリスク因子です。抗凝固療法の前に他のリスク因子を再評価してください。",
            ),
            Self::Consider => LocalizedText::new(
                "Consider oral anticoagulation, weighing bleeding risk.",
                "考慮口服抗凝血劑，並評估出血風險。",
                "出血リスクを考慮の上、経口抗凝固薬を検討してください。",
            ),
            Self::Recommended => LocalizedText::new(
                "Oral anticoagulation is recommended.",
                "建議使用口服抗凝血劑。",
                "経口抗凝固療法が推奨されます。",
            ),
            Self::StronglyRecommended => LocalizedText::new(
                "Oral anticoagulation is strongly recommended.",
                "強烈建議使用口服抗凝血劑。",
                "経口抗凝固療法が強く推奨されます。",
            ),
        }
    }
}

pub fn risk_level(score: u8) -> RiskLevel {
    match score {
        0 => RiskLevel::Low,
        1 => RiskLevel::Moderate,
        _ => RiskLevel::High,
    }
}

/// Scored factors for the given inputs, including zero-point age and sex.
pub fn score_factors(inputs: &Inputs) -> Result<Vec<(LocalizedText, u8)>> {
    let age = inputs.require_number("age")?;
    let gender = Gender::require(inputs)?;

    let mut factors = vec![
        (
            LocalizedText::new("Age", "年齡", "年齢"),
            age_points(age),
        ),
        (
            LocalizedText::new("Sex category (female)", "性別（女性）", "性別（女性）"),
            u8::from(gender.is_female()),
        ),
    ];
    factors.extend(
        CONDITION_FACTORS
            .iter()
            .filter(|f| inputs.flag(f.field))
            .map(|f| (f.label.clone(), f.points)),
    );
    Ok(factors)
}

#[derive(Debug)]
pub struct Cha2ds2Vasc;

impl Calculator for Cha2ds2Vasc {
    fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult {
        config.validate_inputs(inputs)
    }

    fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult> {
        let factors = score_factors(inputs)?;
        let score: u8 = factors.iter().map(|(_, points)| points).sum();
        let sex_points = factors.get(1).map_or(0, |(_, points)| *points);
        let guidance = Anticoagulation::for_score(score, score == 1 && sex_points == 1);
        let level = risk_level(score);
        let stroke_risk = annual_stroke_risk(score);

        let mut result = CalculationResult::new(
            ResultValue::new(
                f64::from(score),
                "points",
                LocalizedText::new("CHA2DS2-VASc score", "CHA2DS2-VASc 分數", "CHA2DS2-VASc スコア"),
                0,
            ),
            level.label(),
        );
        result.risk_level = Some(level);
        result.risk_score = Some(f64::from(score));
        result.secondary.push(ResultValue::new(
            stroke_risk,
            "%/year",
            LocalizedText::new("Annual stroke risk", "年中風風險", "年間脳卒中リスク"),
            1,
        ));
        result.recommendations.push(guidance.advice());
        result.breakdown = factors
            .iter()
            .filter(|(_, points)| *points > 0)
            .map(|(label, points)| {
                BreakdownStep::new(label.clone(), f64::from(*points), format!("+{points}"))
            })
            .collect();
        result.breakdown.push(BreakdownStep::new(
            LocalizedText::new("Total", "總分", "合計"),
            f64::from(score),
            format!("= {score}"),
        ));
        result.custom = Some(json!({
            "score": score,
            "anticoagulation": guidance.as_str(),
        }));
        Ok(result)
    }

    fn format_result(&self, result: &CalculationResult, locale: Locale) -> Option<FormattedResult> {
        let mut formatted = result.format(locale);
        // The top of the table is an open-ended band.
        if result.primary.value >= 6.0
            && let Some((_, value)) = formatted.secondary.first_mut()
        {
            *value = format!("≥{value}");
        }
        Some(formatted)
    }
}

pub fn module() -> Result<CalculatorModule> {
    CalculatorModule::from_manifest(ID, CHA2DS2_VASC_MANIFEST, Cha2ds2Vasc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(inputs: &Inputs) -> (u8, CalculationResult) {
        let result = Cha2ds2Vasc.calculate(inputs).expect("calculate");
        (result.primary.value as u8, result)
    }

    fn anticoagulation(result: &CalculationResult) -> &str {
        result
            .custom
            .as_ref()
            .and_then(|c| c["anticoagulation"].as_str())
            .expect("anticoagulation in payload")
    }

    #[test]
    fn age_bands() {
        assert_eq!(age_points(64.9), 0);
        assert_eq!(age_points(65.0), 1);
        assert_eq!(age_points(74.0), 1);
        assert_eq!(age_points(75.0), 2);
    }

    #[test]
    fn young_male_without_factors_scores_zero() {
        let (value, result) = score(&Inputs::new().with("age", 50.0).with("gender", "male"));
        assert_eq!(value, 0);
        assert_eq!(result.risk_level, Some(RiskLevel::Low));
        assert_eq!(anticoagulation(&result), "not_recommended");
        assert_eq!(result.secondary_value("Annual stroke risk"), Some(0.2));
    }

    #[test]
    fn female_sex_alone_asks_for_reevaluation() {
        let (value, result) = score(&Inputs::new().with("age", 50.0).with("gender", "female"));
        assert_eq!(value, 1);
        assert_eq!(result.risk_level, Some(RiskLevel::Moderate));
        assert_eq!(anticoagulation(&result), "reevaluate");
    }

    #[test]
    fn one_point_male_is_consider() {
        let inputs = Inputs::new()
            .with("age", 50.0)
            .with("gender", "male")
            .with("diabetes", true);
        let (_, result) = score(&inputs);
        assert_eq!(anticoagulation(&result), "consider");
    }

    #[test]
    fn elderly_hypertensive_male_is_recommended() {
        let inputs = Inputs::new()
            .with("age", 70.0)
            .with("gender", "male")
            .with("hypertension", true);
        let (value, result) = score(&inputs);
        assert_eq!(value, 2);
        assert_eq!(result.risk_level, Some(RiskLevel::High));
        assert_eq!(anticoagulation(&result), "recommended");
        // age, hypertension, total
        assert_eq!(result.breakdown.len(), 3);
    }

    #[test]
    fn maximum_score_uses_open_ended_risk() {
        let inputs = Inputs::new()
            .with("age", 80.0)
            .with("gender", "female")
            .with("chf", true)
            .with("hypertension", true)
            .with("diabetes", true)
            .with("stroke_tia", true)
            .with("vascular_disease", true);
        let (value, result) = score(&inputs);
        assert_eq!(value, MAX_SCORE);
        assert_eq!(anticoagulation(&result), "strongly_recommended");

        let formatted = Cha2ds2Vasc
            .format_result(&result, Locale::En)
            .expect("custom format");
        assert_eq!(formatted.secondary[0].1, "≥13.6 %/year");
    }
}
