//! eGFR by the race-free CKD-EPI 2021 creatinine equation.
//!
//! ```text
//! eGFR = 142 × min(Scr/κ, 1)^α × max(Scr/κ, 1)^-1.200 × 0.9938^age × 1.012 [female]
//! ```
//!
//! with κ = 0.7 (female) or 0.9 (male) and α = -0.241 (female) or -0.302 (male).
//! Serum creatinine is in mg/dL; µmol/L input is converted first.

use calc_model::{
    Band, BandTable, Bound, BreakdownStep, CalculationResult, Calculator, CalculatorConfig,
    CalculatorModule, CalcError, FormattedResult, Inputs, Locale, LocalizedText, Result,
    ResultValue, RiskLevel, ValidationError, ValidationResult,
};
use serde_json::json;

use crate::common::{Gender, round_to};
use crate::embedded::EGFR_MANIFEST;

pub const ID: &str = "egfr";

/// µmol/L per mg/dL of creatinine.
pub const UMOL_PER_MG_DL: f64 = 88.4;

/// Creatinine domain in mg/dL.
const SCR_MIN: f64 = 0.1;
const SCR_MAX: f64 = 20.0;

/// A KDIGO GFR category.
#[derive(Debug)]
pub struct CkdStage {
    pub code: &'static str,
    pub risk: RiskLevel,
    pub description: LocalizedText,
    /// Recommended monitoring interval.
    pub follow_up_months: u8,
    pub recommendations: &'static [LocalizedText],
}

static CKD_BANDS: [Band<CkdStage>; 6] = [
    Band {
        upper: Bound::Below(15.0),
        value: CkdStage {
            code: "G5",
            risk: RiskLevel::Critical,
            description: LocalizedText::new("Kidney failure", "腎衰竭", "腎不全"),
            follow_up_months: 1,
            recommendations: &[
                LocalizedText::new(
                    "Urgent nephrology referral; plan for kidney replacement therapy.",
                    "緊急轉介腎臟科，規劃腎臟替代治療。",
                    "腎臓内科へ至急紹介し、腎代替療法を計画してください。",
                ),
                LocalizedText::new(
                    "Review every renally cleared medication.",
                    "檢視所有經腎臟排除的藥物。",
                    "腎排泄型の薬剤をすべて見直してください。",
                ),
            ],
        },
    },
    Band {
        upper: Bound::Below(30.0),
        value: CkdStage {
            code: "G4",
            risk: RiskLevel::VeryHigh,
            description: LocalizedText::new("Severely decreased", "重度下降", "高度低下"),
            follow_up_months: 3,
            recommendations: &[
                LocalizedText::new(
                    "Refer to nephrology and prepare for possible kidney replacement therapy.",
                    "轉介腎臟科並預備可能的腎臟替代治療。",
                    "腎臓内科へ紹介し、腎代替療法の準備を検討してください。",
                ),
                LocalizedText::new(
                    "Monitor potassium, bicarbonate, haemoglobin and bone mineral markers.",
                    "監測血鉀、碳酸氫鹽、血紅素及骨礦物質指標。",
                    "カリウム・重炭酸・ヘモグロビン・骨ミネラル指標をモニターしてください。",
                ),
            ],
        },
    },
    Band {
        upper: Bound::Below(45.0),
        value: CkdStage {
            code: "G3b",
            risk: RiskLevel::High,
            description: LocalizedText::new(
                "Moderately to severely decreased",
                "中重度下降",
                "中等度〜高度低下",
            ),
            follow_up_months: 3,
            recommendations: &[
                LocalizedText::new(
                    "Consider nephrology referral; control blood pressure and albuminuria.",
                    "考慮轉介腎臟科，控制血壓與白蛋白尿。",
                    "腎臓内科への紹介を検討し、血圧とアルブミン尿を管理してください。",
                ),
                LocalizedText::new(
                    "Adjust doses of renally cleared drugs.",
                    "調整經腎臟排除藥物的劑量。",
                    "腎排泄型薬剤の用量を調整してください。",
                ),
            ],
        },
    },
    Band {
        upper: Bound::Below(60.0),
        value: CkdStage {
            code: "G3a",
            risk: RiskLevel::Moderate,
            description: LocalizedText::new(
                "Mildly to moderately decreased",
                "輕中度下降",
                "軽度〜中等度低下",
            ),
            follow_up_months: 6,
            recommendations: &[LocalizedText::new(
                "Check urine albumin-to-creatinine ratio and manage cardiovascular risk.",
                "檢查尿液白蛋白/肌酸酐比值並控制心血管風險。",
                "尿アルブミン/クレアチニン比を確認し、心血管リスクを管理してください。",
            )],
        },
    },
    Band {
        upper: Bound::Below(90.0),
        value: CkdStage {
            code: "G2",
            risk: RiskLevel::Low,
            description: LocalizedText::new("Mildly decreased", "輕度下降", "軽度低下"),
            follow_up_months: 12,
            recommendations: &[LocalizedText::new(
                "Annual kidney function check if risk factors are present.",
                "若有危險因子，每年追蹤腎功能。",
                "危険因子があれば年1回腎機能を確認してください。",
            )],
        },
    },
    Band {
        upper: Bound::Unbounded,
        value: CkdStage {
            code: "G1",
            risk: RiskLevel::Low,
            description: LocalizedText::new("Normal or high", "正常或偏高", "正常または高値"),
            follow_up_months: 12,
            recommendations: &[LocalizedText::new(
                "No action for kidney function alone; CKD requires markers of kidney damage.",
                "僅就腎功能無需處置；診斷慢性腎臟病需有腎損傷指標。",
                "腎機能のみでは対応不要です。CKD の診断には腎障害マーカーが必要です。",
            )],
        },
    },
];

/// GFR categories G1–G5.
pub static CKD_STAGES: BandTable<CkdStage> = BandTable::new(&CKD_BANDS);

const MEDICATION_REVIEW: LocalizedText = LocalizedText::new(
    "Age 65 or over with reduced GFR: review medication doses.",
    "65 歲以上且腎功能下降：請檢視用藥劑量。",
    "65歳以上で腎機能低下があります。薬剤用量を見直してください。",
);

/// Unrounded CKD-EPI 2021 eGFR for creatinine in mg/dL.
pub fn ckd_epi_2021(scr_mg_dl: f64, age: f64, gender: Gender) -> f64 {
    let (kappa, alpha, sex_factor) = match gender {
        Gender::Female => (0.7, -0.241, 1.012),
        Gender::Male => (0.9, -0.302, 1.0),
    };
    let ratio = scr_mg_dl / kappa;
    142.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.200)
        * 0.9938_f64.powf(age)
        * sex_factor
}

/// eGFR rounded to the nearest integer.
pub fn egfr(scr_mg_dl: f64, age: f64, gender: Gender) -> f64 {
    ckd_epi_2021(scr_mg_dl, age, gender).round()
}

pub fn stage(egfr: f64) -> &'static CkdStage {
    CKD_STAGES.classify(egfr)
}

/// Creatinine unit selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreatinineUnit {
    MgDl,
    UmolL,
}

impl CreatinineUnit {
    fn from_inputs(inputs: &Inputs) -> Option<Self> {
        match inputs.choice("creatinine_unit").as_deref() {
            None | Some("mg_dl") => Some(Self::MgDl),
            Some("umol_l") => Some(Self::UmolL),
            Some(_) => None,
        }
    }

    fn to_mg_dl(self, value: f64) -> f64 {
        match self {
            Self::MgDl => value,
            Self::UmolL => value / UMOL_PER_MG_DL,
        }
    }

    fn in_unit(self, value: f64) -> f64 {
        match self {
            Self::MgDl => value,
            Self::UmolL => round_to(value * UMOL_PER_MG_DL, 2),
        }
    }
}

fn creatinine_mg_dl(inputs: &Inputs) -> Result<f64> {
    let raw = inputs.require_number("creatinine")?;
    let unit = CreatinineUnit::from_inputs(inputs)
        .ok_or_else(|| CalcError::invalid_input("creatinine_unit", "unknown unit"))?;
    Ok(unit.to_mg_dl(raw))
}

#[derive(Debug)]
pub struct Egfr;

impl Calculator for Egfr {
    fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult {
        let mut result = config.validate_inputs(inputs);
        if result.has_error_for("creatinine") || result.has_error_for("creatinine_unit") {
            return result;
        }
        // The schema bounds cover both units; the clinical domain is in mg/dL.
        if let (Some(raw), Some(unit)) = (
            inputs.number("creatinine"),
            CreatinineUnit::from_inputs(inputs),
        ) {
            let scr = unit.to_mg_dl(raw);
            if !(SCR_MIN..=SCR_MAX).contains(&scr) {
                let label = config
                    .field("creatinine")
                    .map(|f| f.label.clone())
                    .unwrap_or_else(|| LocalizedText::uniform("creatinine"));
                result.push(ValidationError::out_of_range(
                    "creatinine",
                    &label,
                    Some(unit.in_unit(SCR_MIN)),
                    Some(unit.in_unit(SCR_MAX)),
                ));
            }
        }
        result
    }

    fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult> {
        let scr = creatinine_mg_dl(inputs)?;
        let age = inputs.require_number("age")?;
        let gender = Gender::require(inputs)?;

        let value = egfr(scr, age, gender);
        let stage = stage(value);

        let mut result = CalculationResult::new(
            ResultValue::new(
                value,
                "mL/min/1.73m²",
                LocalizedText::new("eGFR", "腎絲球過濾率", "eGFR"),
                0,
            ),
            stage.description.clone(),
        );
        result.risk_level = Some(stage.risk);
        result.secondary.push(ResultValue::new(
            f64::from(stage.follow_up_months),
            "months",
            LocalizedText::new("Follow-up interval", "追蹤間隔", "フォローアップ間隔"),
            0,
        ));
        result.recommendations = stage.recommendations.to_vec();
        if age >= 65.0 && value < 90.0 {
            result.recommendations.push(MEDICATION_REVIEW);
        }

        let (kappa, alpha) = match gender {
            Gender::Female => (0.7, -0.241),
            Gender::Male => (0.9, -0.302),
        };
        result.breakdown = vec![
            BreakdownStep::new(
                LocalizedText::new("Creatinine", "肌酸酐", "クレアチニン"),
                scr,
                format!("Scr = {scr:.2} mg/dL"),
            ),
            BreakdownStep::new(
                LocalizedText::new("Sex constants", "性別常數", "性別定数"),
                kappa,
                format!("κ = {kappa}, α = {alpha}"),
            ),
            BreakdownStep::new(
                LocalizedText::new("Age factor", "年齡因子", "年齢係数"),
                0.9938_f64.powf(age),
                format!("0.9938^{age} = {:.4}", 0.9938_f64.powf(age)),
            ),
            BreakdownStep::new(
                LocalizedText::new("eGFR", "腎絲球過濾率", "eGFR"),
                value,
                format!("CKD-EPI 2021 = {value:.0} mL/min/1.73m²"),
            ),
        ];
        result.custom = Some(json!({
            "stage": stage.code,
            "follow_up_months": stage.follow_up_months,
        }));
        Ok(result)
    }

    fn format_result(&self, result: &CalculationResult, locale: Locale) -> Option<FormattedResult> {
        let mut formatted = result.format(locale);
        let code = result
            .custom
            .as_ref()
            .and_then(|c| c.get("stage"))
            .and_then(serde_json::Value::as_str)?;
        formatted.interpretation = format!("{code}: {}", formatted.interpretation);
        Some(formatted)
    }
}

pub fn module() -> Result<CalculatorModule> {
    CalculatorModule::from_manifest(ID, EGFR_MANIFEST, Egfr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_model::ValidationCode;

    fn inputs(scr: f64, age: f64, gender: &str) -> Inputs {
        Inputs::new()
            .with("creatinine", scr)
            .with("age", age)
            .with("gender", gender)
    }

    #[test]
    fn stage_table_is_contiguous() {
        assert!(CKD_STAGES.is_well_formed());
        assert_eq!(stage(14.0).code, "G5");
        assert_eq!(stage(15.0).code, "G4");
        assert_eq!(stage(29.0).code, "G4");
        assert_eq!(stage(30.0).code, "G3b");
        assert_eq!(stage(45.0).code, "G3a");
        assert_eq!(stage(59.0).code, "G3a");
        assert_eq!(stage(60.0).code, "G2");
        assert_eq!(stage(89.0).code, "G2");
        assert_eq!(stage(90.0).code, "G1");
    }

    #[test]
    fn matches_reference_values() {
        assert_eq!(egfr(1.2, 65.0, Gender::Male), 67.0);
        assert_eq!(egfr(1.2, 65.0, Gender::Female), 50.0);
        assert_eq!(egfr(1.0, 50.0, Gender::Male), 92.0);
        assert_eq!(egfr(0.6, 30.0, Gender::Female), 124.0);
        assert_eq!(egfr(5.0, 70.0, Gender::Male), 12.0);
    }

    #[test]
    fn older_patients_get_medication_review() {
        let result = Egfr
            .calculate(&inputs(1.2, 65.0, "male"))
            .expect("calculate");
        assert_eq!(result.primary.value, 67.0);
        assert_eq!(result.risk_level, Some(RiskLevel::Low));
        assert_eq!(result.recommendations.last(), Some(&MEDICATION_REVIEW));
        assert_eq!(result.secondary_value("Follow-up interval"), Some(12.0));
    }

    #[test]
    fn converts_micromoles() {
        let mg = Egfr.calculate(&inputs(1.2, 65.0, "male")).expect("mg/dL");
        let umol = Egfr
            .calculate(&inputs(1.2 * UMOL_PER_MG_DL, 65.0, "male").with("creatinine_unit", "umol_l"))
            .expect("µmol/L");
        assert_eq!(mg.primary.value, umol.primary.value);
    }

    #[test]
    fn rejects_creatinine_outside_clinical_domain() {
        let module = module().expect("build module");
        let validation = module.validate(&inputs(25.0, 50.0, "male"));
        assert!(validation.has_error_for("creatinine"));

        let validation = module.validate(&inputs(5.0, 50.0, "male").with("creatinine_unit", "umol_l"));
        let error = validation.errors_for("creatinine").next().expect("range error");
        assert_eq!(error.code, ValidationCode::OutOfRange);
        assert_eq!(
            error.message.get(Locale::En),
            "Serum creatinine must be within 8.84–1768"
        );

        assert!(module.validate(&inputs(1.0, 50.0, "female")).is_valid);
    }

    #[test]
    fn format_prefixes_stage_code() {
        let result = Egfr.calculate(&inputs(1.2, 65.0, "male")).expect("calculate");
        let formatted = Egfr.format_result(&result, Locale::En).expect("custom format");
        assert_eq!(formatted.interpretation, "G2: Mildly decreased");
        assert_eq!(formatted.primary_value, "67 mL/min/1.73m²");
    }
}
