//! Body Mass Index.
//!
//! `bmi = weight_kg / height_m²`, rounded to one decimal and classified
//! against the WHO adult bands.

use calc_model::{
    Band, BandTable, Bound, BreakdownStep, CalculationResult, Calculator, CalculatorConfig,
    CalculatorModule, FormattedResult, Inputs, Locale, LocalizedText, Result, ResultValue,
    RiskLevel, ValidationResult,
};
use serde_json::json;

use crate::common::{Gender, round_to};
use crate::embedded::BMI_MANIFEST;

pub const ID: &str = "bmi";

/// Lower edge of the healthy range.
const HEALTHY_MIN: f64 = 18.5;
/// Upper edge of the healthy range.
const HEALTHY_MAX: f64 = 24.9;

/// One WHO weight category.
#[derive(Debug)]
pub struct BmiCategory {
    pub key: &'static str,
    pub risk: RiskLevel,
    pub label: LocalizedText,
    pub recommendation: LocalizedText,
}

static BMI_BANDS: [Band<BmiCategory>; 7] = [
    Band::new(
        Bound::Below(16.0),
        BmiCategory {
            key: "severe_thinness",
            risk: RiskLevel::High,
            label: LocalizedText::new("Severe thinness", "重度體重過輕", "重度の低体重"),
            recommendation: LocalizedText::new(
                "Refer for nutritional assessment and screen for underlying disease.",
                "建議轉介營養評估並篩檢潛在疾病。",
                "栄養評価を依頼し、基礎疾患をスクリーニングしてください。",
            ),
        },
    ),
    Band::new(
        Bound::Below(18.5),
        BmiCategory {
            key: "underweight",
            risk: RiskLevel::Moderate,
            label: LocalizedText::new("Underweight", "體重過輕", "低体重"),
            recommendation: LocalizedText::new(
                "Increase energy and protein intake; review diet with a dietitian.",
                "增加熱量與蛋白質攝取，並與營養師檢視飲食。",
                "エネルギーとたんぱく質の摂取を増やし、栄養士と食事を見直してください。",
            ),
        },
    ),
    Band::new(
        Bound::Below(25.0),
        BmiCategory {
            key: "normal",
            risk: RiskLevel::Low,
            label: LocalizedText::new("Normal weight", "正常體重", "普通体重"),
            recommendation: LocalizedText::new(
                "Maintain current weight with balanced diet and regular activity.",
                "維持均衡飲食與規律運動以保持體重。",
                "バランスの良い食事と定期的な運動で現在の体重を維持してください。",
            ),
        },
    ),
    Band::new(
        Bound::Below(30.0),
        BmiCategory {
            key: "overweight",
            risk: RiskLevel::Moderate,
            label: LocalizedText::new("Overweight", "過重", "過体重"),
            recommendation: LocalizedText::new(
                "Aim for 5–10% weight loss through diet and at least 150 minutes of weekly exercise.",
                "透過飲食與每週至少 150 分鐘運動減重 5–10%。",
                "食事と週150分以上の運動で5〜10%の減量を目指してください。",
            ),
        },
    ),
    Band::new(
        Bound::Below(35.0),
        BmiCategory {
            key: "obese_class_1",
            risk: RiskLevel::High,
            label: LocalizedText::new("Obesity class I", "輕度肥胖", "肥満（1度）"),
            recommendation: LocalizedText::new(
                "Structured weight management programme; screen for diabetes, hypertension and dyslipidaemia.",
                "參加體重管理計畫，並篩檢糖尿病、高血壓與血脂異常。",
                "体重管理プログラムを行い、糖尿病・高血圧・脂質異常症をスクリーニングしてください。",
            ),
        },
    ),
    Band::new(
        Bound::Below(40.0),
        BmiCategory {
            key: "obese_class_2",
            risk: RiskLevel::VeryHigh,
            label: LocalizedText::new("Obesity class II", "中度肥胖", "肥満（2度）"),
            recommendation: LocalizedText::new(
                "Consider pharmacotherapy alongside lifestyle intervention.",
                "在生活型態介入外考慮藥物治療。",
                "生活習慣介入に加えて薬物療法を検討してください。",
            ),
        },
    ),
    Band::new(
        Bound::Unbounded,
        BmiCategory {
            key: "obese_class_3",
            risk: RiskLevel::Critical,
            label: LocalizedText::new("Obesity class III", "重度肥胖", "肥満（3度以上）"),
            recommendation: LocalizedText::new(
                "Refer to a specialist obesity service; bariatric surgery may be indicated.",
                "轉介肥胖專科，可能需評估減重手術。",
                "肥満専門外来へ紹介してください。減量手術の適応となる場合があります。",
            ),
        },
    ),
];

/// WHO adult BMI categories.
pub static BMI_CATEGORIES: BandTable<BmiCategory> = BandTable::new(&BMI_BANDS);

const OLDER_ADULT_ADVICE: LocalizedText = LocalizedText::new(
    "In adults aged 65 or over a BMI of 25–27 may be protective; prioritise muscle mass and function.",
    "65 歲以上長者 BMI 25–27 可能具保護作用，應著重肌肉量與功能。",
    "65歳以上ではBMI 25〜27が望ましい場合があります。筋肉量と身体機能を重視してください。",
);

const FEMALE_ADVICE: LocalizedText = LocalizedText::new(
    "For women, also assess waist circumference (risk rises above 80 cm) and pregnancy status.",
    "女性請同時評估腰圍（超過 80 公分風險增加）及是否懷孕。",
    "女性では腹囲（80 cm超でリスク上昇）と妊娠の有無も評価してください。",
);

const PEDIATRIC_WARNING: LocalizedText = LocalizedText::new(
    "Adult BMI cut-offs do not apply under 18; use age- and sex-specific percentiles.",
    "18 歲以下不適用成人 BMI 切點，請使用依年齡與性別的百分位。",
    "18歳未満には成人のBMI基準は適用されません。年齢・性別別パーセンタイルを使用してください。",
);

#[derive(Debug)]
pub struct Bmi;

/// BMI rounded to one decimal.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_to(weight_kg / (height_m * height_m), 1)
}

/// Category of an already-rounded BMI value.
pub fn classify(bmi: f64) -> &'static BmiCategory {
    BMI_CATEGORIES.classify(bmi)
}

impl Calculator for Bmi {
    fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult {
        config.validate_inputs(inputs)
    }

    fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult> {
        let weight = inputs.require_number("weight")?;
        let height_cm = inputs.require_number("height")?;
        let height_m = height_cm / 100.0;
        let height_sq = height_m * height_m;
        let value = bmi(weight, height_cm);
        let category = classify(value);

        let mut result = CalculationResult::new(
            ResultValue::new(value, "kg/m²", LocalizedText::new("BMI", "BMI", "BMI"), 1),
            category.label.clone(),
        );
        result.risk_level = Some(category.risk);
        result.secondary = vec![
            ResultValue::new(
                round_to(HEALTHY_MIN * height_sq, 1),
                "kg",
                LocalizedText::new("Minimum healthy weight", "健康體重下限", "適正体重の下限"),
                1,
            ),
            ResultValue::new(
                round_to(HEALTHY_MAX * height_sq, 1),
                "kg",
                LocalizedText::new("Maximum healthy weight", "健康體重上限", "適正体重の上限"),
                1,
            ),
        ];
        result.recommendations.push(category.recommendation.clone());

        let age = inputs.number("age");
        if age.is_some_and(|a| a >= 65.0) {
            result.recommendations.push(OLDER_ADULT_ADVICE);
        }
        if Gender::optional(inputs).is_some_and(|g| g.is_female()) {
            result.recommendations.push(FEMALE_ADVICE);
        }
        if age.is_some_and(|a| a < 18.0) {
            result.warnings.push(PEDIATRIC_WARNING);
        }

        result.breakdown = vec![
            BreakdownStep::new(
                LocalizedText::new("Height", "身高", "身長"),
                height_m,
                format!("{height_cm} cm ÷ 100 = {height_m:.2} m"),
            ),
            BreakdownStep::new(
                LocalizedText::new("Height squared", "身高平方", "身長の二乗"),
                height_sq,
                format!("{height_m:.2}² = {height_sq:.4} m²"),
            ),
            BreakdownStep::new(
                LocalizedText::new("BMI", "BMI", "BMI"),
                value,
                format!("{weight} kg ÷ {height_sq:.4} m² = {value:.1}"),
            ),
        ];
        result.custom = Some(json!({ "category": category.key }));
        Ok(result)
    }

    fn format_result(&self, result: &CalculationResult, locale: Locale) -> Option<FormattedResult> {
        let mut formatted = result.format(locale);
        // Show the healthy range on one line.
        if let [low, high] = result.secondary.as_slice() {
            let label = match locale {
                Locale::ZhTw => "健康體重範圍",
                Locale::En => "Healthy weight range",
                Locale::Ja => "適正体重の範囲",
            };
            formatted.secondary = vec![(
                label.to_string(),
                format!("{:.1}–{:.1} kg", low.value, high.value),
            )];
        }
        Some(formatted)
    }
}

pub fn module() -> Result<CalculatorModule> {
    CalculatorModule::from_manifest(ID, BMI_MANIFEST, Bmi)
}
