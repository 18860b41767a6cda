//! Pediatric amoxicillin/clavulanate dose optimizer.
//!
//! Picks the tablet combination whose amoxicillin content is closest to the
//! weight-based per-dose target while keeping the amoxicillin:clavulanate
//! ratio within 7:1–14:1. A combination with an invalid ratio is scored with a
//! fixed penalty, so any valid combination beats every invalid one unless
//! none exists.

use calc_model::{
    BreakdownStep, CalcError, CalculationResult, Calculator, CalculatorConfig, CalculatorModule,
    FormattedResult, Inputs, Locale, LocalizedText, Result, ResultValue, ValidationResult,
};
use serde::{Deserialize, Serialize};

use crate::common::round_to;
use crate::embedded::AMOXICILLIN_MANIFEST;

pub const ID: &str = "amoxicillin-clavulanate-dose";

/// Score added to a combination whose ratio is out of range.
pub const INVALID_RATIO_PENALTY: f64 = 1000.0;

/// Inclusive amoxicillin:clavulanate ratio range.
pub const RATIO_RANGE: (f64, f64) = (7.0, 14.0);

/// Highest count tried for each tablet type.
pub const MAX_TABLETS: u32 = 4;

/// Daily clavulanate above this (mg/kg/day) raises a warning.
pub const CLAVULANATE_LIMIT_MG_KG_DAY: f64 = 10.0;

/// Weight from which adult dosing applies.
pub const ADULT_WEIGHT_KG: f64 = 40.0;

/// Doses per day (every 8 hours).
pub const DOSES_PER_DAY: f64 = 3.0;

/// A tablet formulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrugSpec {
    pub name: &'static str,
    pub amoxicillin_mg: f64,
    pub clavulanate_mg: f64,
}

pub const COMBINATION_TABLET: DrugSpec = DrugSpec {
    name: "Amoxicillin/clavulanate 500/125 mg",
    amoxicillin_mg: 500.0,
    clavulanate_mg: 125.0,
};

pub const AMOXICILLIN_500: DrugSpec = DrugSpec {
    name: "Amoxicillin 500 mg",
    amoxicillin_mg: 500.0,
    clavulanate_mg: 0.0,
};

pub const AMOXICILLIN_250: DrugSpec = DrugSpec {
    name: "Amoxicillin 250 mg",
    amoxicillin_mg: 250.0,
    clavulanate_mg: 0.0,
};

/// Pure amoxicillin tablets, in search order.
pub static PURE_TABLETS: [DrugSpec; 2] = [AMOXICILLIN_500, AMOXICILLIN_250];

/// Daily amoxicillin target tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseTarget {
    Standard,
    High,
}

impl DoseTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Amoxicillin mg/kg/day.
    pub const fn mg_per_kg_day(&self) -> f64 {
        match self {
            Self::Standard => 45.0,
            Self::High => 85.0,
        }
    }
}

/// One evaluated tablet combination per dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetails {
    pub combination_tablets: u32,
    pub pure_tablets: u32,
    pub pure_tablet_mg: f64,
    pub amoxicillin_mg: f64,
    pub clavulanate_mg: f64,
    /// `None` when the combination carries no clavulanate.
    pub ratio: Option<f64>,
    pub is_ratio_valid: bool,
    pub deviation_mg: f64,
    pub score: f64,
}

impl CalculationDetails {
    pub fn evaluate(
        combination_tablets: u32,
        pure: &DrugSpec,
        pure_tablets: u32,
        target_mg: f64,
    ) -> Self {
        let combo = f64::from(combination_tablets);
        let count = f64::from(pure_tablets);
        let amoxicillin_mg = combo * COMBINATION_TABLET.amoxicillin_mg + count * pure.amoxicillin_mg;
        let clavulanate_mg = combo * COMBINATION_TABLET.clavulanate_mg + count * pure.clavulanate_mg;
        let ratio = (clavulanate_mg > 0.0).then(|| amoxicillin_mg / clavulanate_mg);
        let is_ratio_valid = ratio.is_some_and(|r| (RATIO_RANGE.0..=RATIO_RANGE.1).contains(&r));
        let deviation_mg = (amoxicillin_mg - target_mg).abs();
        let score = if is_ratio_valid {
            deviation_mg
        } else {
            deviation_mg + INVALID_RATIO_PENALTY
        };
        Self {
            combination_tablets,
            pure_tablets,
            pure_tablet_mg: pure.amoxicillin_mg,
            amoxicillin_mg,
            clavulanate_mg,
            ratio,
            is_ratio_valid,
            deviation_mg,
            score,
        }
    }
}

/// Every candidate combination, in search order.
pub fn candidates(target_mg: f64) -> impl Iterator<Item = CalculationDetails> {
    (0..=MAX_TABLETS).flat_map(move |combo| {
        PURE_TABLETS.iter().flat_map(move |pure| {
            (0..=MAX_TABLETS)
                .map(move |count| CalculationDetails::evaluate(combo, pure, count, target_mg))
        })
    })
}

/// Lowest-scoring combination; the first one found wins ties.
pub fn optimize(target_mg: f64) -> CalculationDetails {
    let mut best = CalculationDetails::evaluate(0, &AMOXICILLIN_500, 0, target_mg);
    for candidate in candidates(target_mg) {
        if candidate.score < best.score {
            best = candidate;
        }
    }
    best
}

#[derive(Debug)]
pub struct AmoxicillinClavulanate;

impl AmoxicillinClavulanate {
    fn regimen(details: &CalculationDetails) -> LocalizedText {
        let mut en = Vec::new();
        let mut zh = Vec::new();
        let mut ja = Vec::new();
        if details.combination_tablets > 0 {
            let n = details.combination_tablets;
            en.push(format!("{n} × 500/125 mg"));
            zh.push(format!("500/125 mg {n} 錠"));
            ja.push(format!("500/125 mg を {n} 錠"));
        }
        if details.pure_tablets > 0 {
            let (n, mg) = (details.pure_tablets, details.pure_tablet_mg);
            en.push(format!("{n} × amoxicillin {mg} mg"));
            zh.push(format!("amoxicillin {mg} mg {n} 錠"));
            ja.push(format!("アモキシシリン {mg} mg を {n} 錠"));
        }
        LocalizedText::owned(
            format!("Give {} every 8 hours", en.join(" + ")),
            format!("每 8 小時給予 {}", zh.join(" + ")),
            format!("8時間ごとに {} を投与", ja.join("・")),
        )
    }
}

impl Calculator for AmoxicillinClavulanate {
    fn validate(&self, config: &CalculatorConfig, inputs: &Inputs) -> ValidationResult {
        config.validate_inputs(inputs)
    }

    fn calculate(&self, inputs: &Inputs) -> Result<CalculationResult> {
        let weight = inputs.require_number("weight")?;
        let raw_target = inputs.require_choice("dose_target")?;
        let target = DoseTarget::parse(&raw_target).ok_or_else(|| {
            CalcError::invalid_input("dose_target", format!("unknown dose target {raw_target}"))
        })?;

        let daily_mg = weight * target.mg_per_kg_day();
        let per_dose_mg = daily_mg / DOSES_PER_DAY;
        let best = optimize(per_dose_mg);
        let clavulanate_mg_kg_day = best.clavulanate_mg * DOSES_PER_DAY / weight;

        tracing::debug!(
            weight,
            per_dose_mg,
            amoxicillin_mg = best.amoxicillin_mg,
            clavulanate_mg = best.clavulanate_mg,
            valid = best.is_ratio_valid,
            "selected tablet combination"
        );

        let mut result = CalculationResult::new(
            ResultValue::new(
                best.amoxicillin_mg,
                "mg",
                LocalizedText::new("Amoxicillin per dose", "每劑 amoxicillin", "1回あたりアモキシシリン"),
                0,
            ),
            Self::regimen(&best),
        );
        result.secondary = vec![
            ResultValue::new(
                round_to(daily_mg, 1),
                "mg/day",
                LocalizedText::new("Target daily amoxicillin", "每日目標劑量", "1日目標量"),
                0,
            ),
            ResultValue::new(
                round_to(per_dose_mg, 1),
                "mg",
                LocalizedText::new("Target per dose", "每劑目標劑量", "1回目標量"),
                1,
            ),
            ResultValue::new(
                best.clavulanate_mg,
                "mg",
                LocalizedText::new("Clavulanate per dose", "每劑 clavulanate", "1回あたりクラブラン酸"),
                0,
            ),
            ResultValue::new(
                round_to(clavulanate_mg_kg_day, 1),
                "mg/kg/day",
                LocalizedText::new("Daily clavulanate", "每日 clavulanate", "1日クラブラン酸量"),
                1,
            ),
        ];
        if let Some(ratio) = best.ratio {
            result.secondary.push(ResultValue::new(
                round_to(ratio, 1),
                "",
                LocalizedText::new(
                    "Amoxicillin:clavulanate ratio",
                    "amoxicillin:clavulanate 比例",
                    "アモキシシリン:クラブラン酸比",
                ),
                1,
            ));
        }

        if !best.is_ratio_valid {
            result.warnings.push(LocalizedText::new(
                "No tablet combination reaches a 7:1–14:1 ratio; consider the oral suspension.",
                "沒有錠劑組合可達 7:1–14:1 比例，請考慮口服懸液劑。",
                "7:1〜14:1 の比率を満たす錠剤の組み合わせがありません。懸濁液を検討してください。",
            ));
        }
        if clavulanate_mg_kg_day > CLAVULANATE_LIMIT_MG_KG_DAY {
            result.warnings.push(LocalizedText::new(
                "Clavulanate exceeds 10 mg/kg/day; risk of diarrhoea increases.",
                "clavulanate 超過 10 mg/kg/天，腹瀉風險增加。",
                "クラブラン酸が 10 mg/kg/日 を超えています。下痢のリスクが高まります。",
            ));
        }
        if weight >= ADULT_WEIGHT_KG {
            result.warnings.push(LocalizedText::new(
                "Weight 40 kg or more: use adult dosing.",
                "體重 40 公斤以上：請使用成人劑量。",
                "体重 40 kg 以上：成人用量を使用してください。",
            ));
        }

        result.breakdown = vec![
            BreakdownStep::new(
                LocalizedText::new("Daily target", "每日目標", "1日目標"),
                daily_mg,
                format!("{weight} kg × {} mg/kg/day = {daily_mg:.0} mg", target.mg_per_kg_day()),
            ),
            BreakdownStep::new(
                LocalizedText::new("Per-dose target", "每劑目標", "1回目標"),
                per_dose_mg,
                format!("{daily_mg:.0} mg ÷ 3 = {per_dose_mg:.1} mg"),
            ),
            BreakdownStep::new(
                LocalizedText::new("Deviation", "差距", "差"),
                best.deviation_mg,
                format!("|{} − {per_dose_mg:.1}| = {:.1} mg", best.amoxicillin_mg, best.deviation_mg),
            ),
        ];
        result.custom = Some(
            serde_json::to_value(&best).map_err(|e| CalcError::calculation(ID, e.to_string()))?,
        );
        Ok(result)
    }

    fn format_result(&self, result: &CalculationResult, locale: Locale) -> Option<FormattedResult> {
        let details: CalculationDetails = serde_json::from_value(result.custom.clone()?).ok()?;
        let mut formatted = result.format(locale);
        let label = match locale {
            Locale::ZhTw => "錠劑組合",
            Locale::En => "Tablets per dose",
            Locale::Ja => "1回あたりの錠剤",
        };
        formatted.secondary.insert(
            0,
            (
                label.to_string(),
                format!(
                    "{} × 500/125 + {} × {}",
                    details.combination_tablets, details.pure_tablets, details.pure_tablet_mg
                ),
            ),
        );
        Some(formatted)
    }
}

pub fn module() -> Result<CalculatorModule> {
    CalculatorModule::from_manifest(ID, AMOXICILLIN_MANIFEST, AmoxicillinClavulanate)
}
