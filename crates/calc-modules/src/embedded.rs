//! Embedded module manifests.
//!
//! Every built-in calculator's configuration is compiled in with
//! `include_str!()`, so loading a module never touches the filesystem.

// =============================================================================
// General
// =============================================================================

/// Body Mass Index
pub const BMI_MANIFEST: &str = include_str!("manifests/bmi.toml");

// =============================================================================
// Nephrology
// =============================================================================

/// eGFR, CKD-EPI 2021
pub const EGFR_MANIFEST: &str = include_str!("manifests/egfr.toml");

// =============================================================================
// Cardiology
// =============================================================================

/// CHA2DS2-VASc stroke risk
pub const CHA2DS2_VASC_MANIFEST: &str = include_str!("manifests/cha2ds2_vasc.toml");

/// Lipid management and cardiovascular risk
pub const LIPID_MANIFEST: &str = include_str!("manifests/lipid.toml");

// =============================================================================
// Pediatrics
// =============================================================================

/// Amoxicillin/clavulanate dose optimizer
pub const AMOXICILLIN_MANIFEST: &str = include_str!("manifests/amoxicillin.toml");
