//! Property tests for the built-in calculators.

use calc_model::{Bound, Calculator, Inputs};
use calc_modules::amoxicillin::{self, CalculationDetails, DOSES_PER_DAY, DoseTarget, RATIO_RANGE};
use calc_modules::bmi::{self, BMI_CATEGORIES};
use calc_modules::cha2ds2_vasc::{Cha2ds2Vasc, MAX_SCORE};
use calc_modules::common::Gender;
use calc_modules::egfr::{self, CKD_STAGES};
use proptest::prelude::*;

fn dose_target() -> impl Strategy<Value = DoseTarget> {
    prop_oneof![Just(DoseTarget::Standard), Just(DoseTarget::High)]
}

proptest! {
    #[test]
    fn bmi_lands_in_exactly_one_band(weight in 1.0f64..=300.0, height in 50.0f64..=250.0) {
        let value = bmi::bmi(weight, height);
        let position = BMI_CATEGORIES.position(value);
        prop_assert!(position < BMI_CATEGORIES.bands().len());
        // Bands below the chosen one end at or under the value.
        for band in &BMI_CATEGORIES.bands()[..position] {
            let limit = match band.upper {
                Bound::Below(x) | Bound::AtMost(x) => x,
                Bound::Unbounded => f64::INFINITY,
            };
            prop_assert!(value >= limit);
        }
        prop_assert_eq!(bmi::classify(value).key, bmi::classify(bmi::bmi(weight, height)).key);
    }

    #[test]
    fn egfr_is_positive_and_staged(scr in 0.1f64..=20.0, age in 18.0f64..=120.0, female: bool) {
        let gender = if female { Gender::Female } else { Gender::Male };
        let value = egfr::egfr(scr, age, gender);
        prop_assert!(value.is_finite());
        prop_assert!(value >= 0.0);
        let stage = egfr::stage(value);
        prop_assert!(CKD_STAGES.bands().iter().any(|b| std::ptr::eq(&b.value, stage)));
    }

    #[test]
    fn egfr_falls_as_creatinine_rises(scr in 0.1f64..=19.0, age in 18.0f64..=120.0, female: bool) {
        let gender = if female { Gender::Female } else { Gender::Male };
        prop_assert!(
            egfr::ckd_epi_2021(scr + 1.0, age, gender) < egfr::ckd_epi_2021(scr, age, gender)
        );
    }

    #[test]
    fn cha2ds2_vasc_score_is_bounded(
        age in 18.0f64..=120.0,
        female: bool,
        chf: bool,
        hypertension: bool,
        diabetes: bool,
        stroke_tia: bool,
        vascular_disease: bool,
    ) {
        let inputs = Inputs::new()
            .with("age", age)
            .with("gender", if female { "female" } else { "male" })
            .with("chf", chf)
            .with("hypertension", hypertension)
            .with("diabetes", diabetes)
            .with("stroke_tia", stroke_tia)
            .with("vascular_disease", vascular_disease);
        let score = Cha2ds2Vasc.calculate(&inputs).expect("calculate").primary.value;
        prop_assert!((0.0..=f64::from(MAX_SCORE)).contains(&score));

        let all_clear = !female
            && age < 65.0
            && !(chf || hypertension || diabetes || stroke_tia || vascular_disease);
        prop_assert_eq!(score == 0.0, all_clear);
    }

    #[test]
    fn optimizer_picks_the_best_scoring_combination(weight in 3.0f64..=50.0, target in dose_target()) {
        let per_dose = weight * target.mg_per_kg_day() / DOSES_PER_DAY;
        let best = amoxicillin::optimize(per_dose);
        let all: Vec<CalculationDetails> = amoxicillin::candidates(per_dose).collect();

        prop_assert!(all.iter().all(|c| best.score <= c.score));

        // A valid ratio is found whenever one exists, at the smallest valid deviation.
        let best_valid = all
            .iter()
            .filter(|c| c.is_ratio_valid)
            .map(|c| c.deviation_mg)
            .fold(f64::INFINITY, f64::min);
        if best_valid.is_finite() {
            prop_assert!(best.is_ratio_valid);
            prop_assert_eq!(best.deviation_mg, best_valid);
        }

        // The first minimal combination wins ties.
        let first = all.iter().find(|c| c.score == best.score).expect("best is a candidate");
        prop_assert_eq!(first, &best);
    }

    #[test]
    fn ratio_validity_matches_range(combo in 0u32..=4, count in 0u32..=4, use_250: bool) {
        let pure = if use_250 { &amoxicillin::AMOXICILLIN_250 } else { &amoxicillin::AMOXICILLIN_500 };
        let details = CalculationDetails::evaluate(combo, pure, count, 0.0);
        if details.clavulanate_mg > 0.0 {
            let ratio = details.amoxicillin_mg / details.clavulanate_mg;
            prop_assert_eq!(details.is_ratio_valid, (RATIO_RANGE.0..=RATIO_RANGE.1).contains(&ratio));
        } else {
            prop_assert!(!details.is_ratio_valid);
        }
    }
}
