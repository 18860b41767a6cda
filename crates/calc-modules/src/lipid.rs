//! Lipid management and 10-year cardiovascular risk.
//!
//! An additive point score over age, sex, TC/HDL ratio, systolic blood
//! pressure and risk factors. Points map to a risk percentage as
//! `min(max(points × 2, 1), 40)`. This is a simplified proxy, not a validated
//! risk equation, and every result says so.

use calc_model::{
    Band, BandTable, Bound, BreakdownStep, CalculationResult, Calculator, CalculatorConfig,
    CalculatorModule, Inputs, LocalizedText, Result, ResultValue, RiskLevel, ValidationCode,
    ValidationError, ValidationResult,
};
use serde_json::json;

use crate::common::{Gender, round_to};
use crate::embedded::LIPID_MANIFEST;

pub const ID: &str = "lipid-risk";

/// Points assigned to established cardiovascular disease.
pub const PRIOR_CVD_POINTS: u32 = 25;

const MIN_RISK_PCT: u32 = 1;
const MAX_RISK_PCT: u32 = 40;

static MALE_AGE_BANDS: [Band<u32>; 5] = [
    Band::new(Bound::Below(40.0), 0),
    Band::new(Bound::Below(50.0), 2),
    Band::new(Bound::Below(60.0), 4),
    Band::new(Bound::Below(70.0), 6),
    Band::new(Bound::Unbounded, 8),
];
pub static MALE_AGE_POINTS: BandTable<u32> = BandTable::new(&MALE_AGE_BANDS);

static FEMALE_AGE_BANDS: [Band<u32>; 5] = [
    Band::new(Bound::Below(40.0), 0),
    Band::new(Bound::Below(50.0), 1),
    Band::new(Bound::Below(60.0), 3),
    Band::new(Bound::Below(70.0), 5),
    Band::new(Bound::Unbounded, 7),
];
pub static FEMALE_AGE_POINTS: BandTable<u32> = BandTable::new(&FEMALE_AGE_BANDS);

static RATIO_BANDS: [Band<u32>; 4] = [
    Band::new(Bound::Below(3.5), 0),
    Band::new(Bound::Below(5.0), 1),
    Band::new(Bound::Below(6.0), 2),
    Band::new(Bound::Unbounded, 3),
];
/// Total/HDL cholesterol ratio points.
pub static RATIO_POINTS: BandTable<u32> = BandTable::new(&RATIO_BANDS);

static SYSTOLIC_BANDS: [Band<u32>; 5] = [
    Band::new(Bound::Below(120.0), 0),
    Band::new(Bound::Below(130.0), 1),
    Band::new(Bound::Below(140.0), 2),
    Band::new(Bound::Below(160.0), 3),
    Band::new(Bound::Unbounded, 4),
];
/// Systolic blood pressure points.
pub static SYSTOLIC_POINTS: BandTable<u32> = BandTable::new(&SYSTOLIC_BANDS);

/// Boolean risk factors and their points.
static RISK_FACTORS: [(&str, u32, LocalizedText); 4] = [
    ("diabetes", 3, LocalizedText::new("Diabetes", "糖尿病", "糖尿病")),
    ("smoking", 2, LocalizedText::new("Smoking", "吸菸", "喫煙")),
    (
        "family_history",
        1,
        LocalizedText::new("Family history", "家族史", "家族歴"),
    ),
    (
        "ckd",
        2,
        LocalizedText::new("Chronic kidney disease", "慢性腎臟病", "慢性腎臓病"),
    ),
];

/// A 10-year risk category with its treatment goal.
#[derive(Debug)]
pub struct LipidRiskCategory {
    pub key: &'static str,
    pub risk: RiskLevel,
    pub label: LocalizedText,
    /// LDL target in mg/dL.
    pub ldl_target: f64,
}

static RISK_BANDS: [Band<LipidRiskCategory>; 4] = [
    Band::new(
        Bound::Below(5.0),
        LipidRiskCategory {
            key: "low",
            risk: RiskLevel::Low,
            label: LocalizedText::new("Low cardiovascular risk", "低心血管風險", "低心血管リスク"),
            ldl_target: 130.0,
        },
    ),
    Band::new(
        Bound::Below(10.0),
        LipidRiskCategory {
            key: "moderate",
            risk: RiskLevel::Moderate,
            label: LocalizedText::new(
                "Moderate cardiovascular risk",
                "中度心血管風險",
                "中等度心血管リスク",
            ),
            ldl_target: 100.0,
        },
    ),
    Band::new(
        Bound::AtMost(20.0),
        LipidRiskCategory {
            key: "high",
            risk: RiskLevel::High,
            label: LocalizedText::new("High cardiovascular risk", "高心血管風險", "高心血管リスク"),
            ldl_target: 70.0,
        },
    ),
    Band::new(
        Bound::Unbounded,
        LipidRiskCategory {
            key: "very_high",
            risk: RiskLevel::VeryHigh,
            label: LocalizedText::new(
                "Very high cardiovascular risk",
                "極高心血管風險",
                "超高心血管リスク",
            ),
            ldl_target: 55.0,
        },
    ),
];

/// Risk categories keyed on the 10-year percentage.
pub static RISK_CATEGORIES: BandTable<LipidRiskCategory> = BandTable::new(&RISK_BANDS);

/// Statin intensity needed for a given LDL reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatinIntensity {
    None,
    Low,
    Moderate,
    High,
}

static STATIN_BANDS: [Band<StatinIntensity>; 4] = [
    Band::new(Bound::AtMost(0.0), StatinIntensity::None),
    Band::new(Bound::Below(30.0), StatinIntensity::Low),
    Band::new(Bound::Below(50.0), StatinIntensity::Moderate),
    Band::new(Bound::Unbounded, StatinIntensity::High),
];
static STATIN_INTENSITY: BandTable<StatinIntensity> = BandTable::new(&STATIN_BANDS);

impl StatinIntensity {
    /// Intensity for a required LDL reduction in percent.
    pub fn for_reduction(reduction_pct: f64) -> Self {
        *STATIN_INTENSITY.classify(reduction_pct)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    pub const fn advice(&self) -> LocalizedText {
        match self {
            Self::None => LocalizedText::new(
                "LDL is at target; continue lifestyle measures.",
                "LDL 已達標，持續生活型態調整。",
                "LDLは目標値に達しています。生活習慣の改善を継続してください。",
            ),
            Self::Low => LocalizedText::new(
                "Low-intensity statin (e.g. simvastatin 10 mg) or lifestyle therapy.",
                "低強度 statin（如 simvastatin 10 mg）或生活型態治療。",
                "低強度スタチン（例：シンバスタチン10 mg）または生活習慣療法。",
            ),
            Self::Moderate => LocalizedText::new(
                "Moderate-intensity statin (e.g. atorvastatin 10–20 mg).",
                "中強度 statin（如 atorvastatin 10–20 mg）。",
                "中強度スタチン（例：アトルバスタチン10〜20 mg）。",
            ),
            Self::High => LocalizedText::new(
                "High-intensity statin (e.g. atorvastatin 40–80 mg); add ezetimibe if target is not reached.",
                "高強度 statin（如 atorvastatin 40–80 mg），未達標時加上 ezetimibe。",
                "高強度スタチン（例：アトルバスタチン40〜80 mg）。目標未達ならエゼチミブを追加。",
            ),
        }
    }
}

const NOT_VALIDATED: LocalizedText = LocalizedText::new(
    "Simplified point score, not a clinically validated risk equation; confirm with Framingham or PCE.",
    "此為簡化積分，並非經臨床驗證的風險公式；請以 Framingham 或 PCE 確認。",
    "簡易ポイント法であり、臨床的に検証されたリスク式ではありません。Framingham や PCE で確認してください。",
);

/// 10-year risk percentage for a raw point total.
pub fn risk_percent(points: u32) -> u32 {
    points.saturating_mul(2).clamp(MIN_RISK_PCT, MAX_RISK_PCT)
}

/// LDL reduction in percent needed to reach `target`.
pub fn needed_reduction(ldl: f64, target: f64) -> f64 {
    ((ldl - target) / ldl * 100.0).max(0.0)
}

/// Point contributions in breakdown order.
#[derive(Debug, Clone, PartialEq)]
pub struct PointScore {
    pub steps: Vec<(LocalizedText, u32, String)>,
    pub total: u32,
    pub prior_cvd: bool,
}

pub fn score(inputs: &Inputs) -> Result<PointScore> {
    let age = inputs.require_number("age")?;
    let gender = Gender::require(inputs)?;
    let total_cholesterol = inputs.require_number("total_cholesterol")?;
    let hdl = inputs.require_number("hdl")?;
    let systolic = inputs.require_number("systolic_bp")?;
    let ratio = total_cholesterol / hdl;

    if inputs.flag("prior_cvd") {
        return Ok(PointScore {
            steps: vec![(
                LocalizedText::new(
                    "Established cardiovascular disease",
                    "已確診心血管疾病",
                    "既存の心血管疾患",
                ),
                PRIOR_CVD_POINTS,
                format!("= {PRIOR_CVD_POINTS}"),
            )],
            total: PRIOR_CVD_POINTS,
            prior_cvd: true,
        });
    }

    let age_table = match gender {
        Gender::Male => &MALE_AGE_POINTS,
        Gender::Female => &FEMALE_AGE_POINTS,
    };
    let mut steps = vec![
        (
            LocalizedText::new("Age", "年齡", "年齢"),
            *age_table.classify(age),
            format!("{age} years"),
        ),
        (
            LocalizedText::new("TC/HDL ratio", "總膽固醇/HDL 比值", "TC/HDL比"),
            *RATIO_POINTS.classify(ratio),
            format!("{total_cholesterol} ÷ {hdl} = {ratio:.2}"),
        ),
        (
            LocalizedText::new("Systolic blood pressure", "收縮壓", "収縮期血圧"),
            *SYSTOLIC_POINTS.classify(systolic),
            format!("{systolic} mmHg"),
        ),
    ];
    steps.extend(
        RISK_FACTORS
            .iter()
            .filter(|(field, _, _)| inputs.flag(field))
            .map(|(_, points, label)| (label.clone(), *points, format!("+{points}"))),
    );
    let total = steps.iter().map(|(_, points, _)| points).sum();
    Ok(PointScore {
        steps,
        total,
        prior_cvd: false,
    })
}

#[derive(Debug)]
pub struct LipidRisk;

impl Calculator for LipidRisk {
    fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult {
        let mut result = config.validate_inputs(inputs);
        if let (Some(total), Some(hdl)) = (inputs.number("total_cholesterol"), inputs.number("hdl"))
            && !result.has_error_for("hdl")
            && hdl >= total
        {
            result.push(ValidationError::new(
                "hdl",
                ValidationCode::Invalid,
                LocalizedText::new(
                    "HDL cholesterol must be lower than total cholesterol",
                    "HDL 膽固醇必須低於總膽固醇",
                    "HDLコレステロールは総コレステロールより低くなければなりません",
                ),
            ));
        }
        result
    }

    fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult> {
        let points = score(inputs)?;
        let total_cholesterol = inputs.require_number("total_cholesterol")?;
        let hdl = inputs.require_number("hdl")?;
        let ldl = inputs.require_number("ldl")?;

        let risk_pct = risk_percent(points.total);
        let category = RISK_CATEGORIES.classify(f64::from(risk_pct));
        let reduction = needed_reduction(ldl, category.ldl_target);
        let statin = StatinIntensity::for_reduction(reduction);

        let mut result = CalculationResult::new(
            ResultValue::new(
                f64::from(risk_pct),
                "%",
                LocalizedText::new("10-year cardiovascular risk", "十年心血管風險", "10年心血管リスク"),
                0,
            ),
            category.label.clone(),
        );
        result.risk_level = Some(category.risk);
        result.risk_score = Some(f64::from(points.total));
        result.secondary = vec![
            ResultValue::new(
                round_to(total_cholesterol / hdl, 1),
                "",
                LocalizedText::new("TC/HDL ratio", "總膽固醇/HDL 比值", "TC/HDL比"),
                1,
            ),
            ResultValue::new(
                total_cholesterol - hdl,
                "mg/dL",
                LocalizedText::new("Non-HDL cholesterol", "非 HDL 膽固醇", "non-HDLコレステロール"),
                0,
            ),
            ResultValue::new(
                category.ldl_target,
                "mg/dL",
                LocalizedText::new("LDL target", "LDL 目標值", "LDL目標値"),
                0,
            ),
            ResultValue::new(
                round_to(reduction, 1),
                "%",
                LocalizedText::new("LDL reduction needed", "LDL 需降低幅度", "必要なLDL低下率"),
                0,
            ),
        ];
        result.recommendations.push(statin.advice());
        if points.prior_cvd {
            result.recommendations.push(LocalizedText::new(
                "Secondary prevention: treat regardless of calculated risk.",
                "次級預防：無論計算風險皆應治療。",
                "二次予防：算出リスクにかかわらず治療してください。",
            ));
        }
        result.breakdown = points
            .steps
            .iter()
            .map(|(label, value, formula)| {
                BreakdownStep::new(label.clone(), f64::from(*value), format!("{formula} → {value}"))
            })
            .collect();
        result.breakdown.push(BreakdownStep::new(
            LocalizedText::new("Risk estimate", "風險估計", "リスク推定"),
            f64::from(risk_pct),
            format!("min(max({} × 2, 1), 40) = {risk_pct}%", points.total),
        ));
        result.warnings.push(NOT_VALIDATED);
        result.custom = Some(json!({
            "points": points.total,
            "category": category.key,
            "statin_intensity": statin.as_str(),
        }));
        Ok(result)
    }
}

pub fn module() -> Result<CalculatorModule> {
    CalculatorModule::from_manifest(ID, LIPID_MANIFEST, LipidRisk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Inputs {
        Inputs::new()
            .with("age", 55.0)
            .with("gender", "male")
            .with("total_cholesterol", 220.0)
            .with("hdl", 45.0)
            .with("ldl", 140.0)
            .with("systolic_bp", 135.0)
    }

    #[test]
    fn tables_are_well_formed() {
        assert!(MALE_AGE_POINTS.is_well_formed());
        assert!(FEMALE_AGE_POINTS.is_well_formed());
        assert!(RATIO_POINTS.is_well_formed());
        assert!(SYSTOLIC_POINTS.is_well_formed());
        assert!(RISK_CATEGORIES.is_well_formed());
    }

    #[test]
    fn risk_band_edges() {
        assert_eq!(RISK_CATEGORIES.classify(4.0).key, "low");
        assert_eq!(RISK_CATEGORIES.classify(5.0).key, "moderate");
        assert_eq!(RISK_CATEGORIES.classify(10.0).key, "high");
        assert_eq!(RISK_CATEGORIES.classify(20.0).key, "high");
        assert_eq!(RISK_CATEGORIES.classify(22.0).key, "very_high");
    }

    #[test]
    fn risk_percent_is_clamped() {
        assert_eq!(risk_percent(0), 1);
        assert_eq!(risk_percent(3), 6);
        assert_eq!(risk_percent(20), 40);
        assert_eq!(risk_percent(PRIOR_CVD_POINTS), 40);
    }

    #[test]
    fn statin_intensity_bands() {
        assert_eq!(StatinIntensity::for_reduction(0.0), StatinIntensity::None);
        assert_eq!(StatinIntensity::for_reduction(29.9), StatinIntensity::Low);
        assert_eq!(StatinIntensity::for_reduction(30.0), StatinIntensity::Moderate);
        assert_eq!(StatinIntensity::for_reduction(50.0), StatinIntensity::High);
    }

    #[test]
    fn sums_points() {
        // age 55 male: 4, ratio 4.89: 1, SBP 135: 2, smoking: 2
        let points = score(&base().with("smoking", true)).expect("score");
        assert_eq!(points.total, 9);
        assert!(!points.prior_cvd);

        let result = LipidRisk
            .calculate(&base().with("smoking", true))
            .expect("calculate");
        assert_eq!(result.primary.value, 18.0);
        assert_eq!(result.risk_level, Some(RiskLevel::High));
        assert_eq!(result.secondary_value("LDL target"), Some(70.0));
        // (140 - 70) / 140 = 50%
        assert_eq!(result.secondary_value("LDL reduction needed"), Some(50.0));
        assert_eq!(result.warnings, vec![NOT_VALIDATED]);
    }

    #[test]
    fn prior_cvd_overrides_everything() {
        let points = score(&base().with("prior_cvd", true).with("diabetes", true)).expect("score");
        assert_eq!(points.total, PRIOR_CVD_POINTS);
        assert_eq!(points.steps.len(), 1);

        let result = LipidRisk
            .calculate(&base().with("prior_cvd", true))
            .expect("calculate");
        assert_eq!(result.primary.value, 40.0);
        assert_eq!(result.risk_level, Some(RiskLevel::VeryHigh));
        assert_eq!(result.recommendations.len(), 2);
    }

    #[test]
    fn female_age_points_are_lower() {
        let points = score(&base().with("gender", "female")).expect("score");
        // age 3, ratio 1, SBP 2
        assert_eq!(points.total, 6);
    }

    #[test]
    fn rejects_hdl_above_total() {
        let module = module().expect("build module");
        let validation = module.validate(&base().with("total_cholesterol", 120.0).with("hdl", 130.0));
        let error = validation.errors_for("hdl").next().expect("hdl error");
        assert_eq!(error.code, ValidationCode::Invalid);
        let equal = module.validate(&base().with("total_cholesterol", 120.0).with("hdl", 120.0));
        assert!(equal.has_error_for("hdl"));
        assert!(module.validate(&base()).is_valid);
    }
}
