//! Library components of the `clinical-calc` CLI.

pub mod logging;
pub mod render;
