//! Built-in clinical calculators.
//!
//! Each module pairs an embedded TOML manifest with a [`Calculator`]
//! implementation:
//!
//! - [`bmi`]: Body Mass Index with WHO bands
//! - [`egfr`]: CKD-EPI 2021 eGFR with KDIGO staging
//! - [`cha2ds2_vasc`]: stroke risk in atrial fibrillation
//! - [`lipid`]: point-based cardiovascular risk and statin guidance
//! - [`amoxicillin`]: pediatric amoxicillin/clavulanate tablet optimizer
//!
//! [`BUILTIN_MODULES`] is the static registration table the loader reads.
//!
//! [`Calculator`]: calc_model::Calculator

pub mod amoxicillin;
pub mod bmi;
pub mod cha2ds2_vasc;
pub mod common;
pub mod egfr;
pub mod embedded;
pub mod lipid;

use calc_model::ModuleFactory;

/// Factories for every built-in module, in registration order.
pub static BUILTIN_MODULES: &[ModuleFactory] = &[
    bmi::module,
    egfr::module,
    cha2ds2_vasc::module,
    lipid::module,
    amoxicillin::module,
];
