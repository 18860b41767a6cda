//! Error types shared by every stage of the calculator pipeline.
//!
//! Each failure is constructed at the site that raises it, so the error kind
//! is known without inspecting the message. The keyword heuristics are kept
//! only for messages that arrive from outside the core as plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised while loading, validating, calculating or rendering a calculator.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum CalcError {
    /// Embedded module manifest could not be parsed.
    #[error("failed to load module {module}: invalid manifest: {message}")]
    Config { module: String, message: String },

    /// Module failed structural validation.
    #[error("invalid module {module}: {property} {message}")]
    InvalidModule {
        module: String,
        property: &'static str,
        message: String,
    },

    /// Another module already claimed this id.
    #[error("duplicate module id: {id}")]
    DuplicateModule { id: String },

    /// A lifecycle hook failed.
    #[error("module {module} {hook} hook failed: {message}")]
    Hook {
        module: String,
        hook: LifecycleHook,
        message: String,
    },

    /// An input could not be read while calculating.
    #[error("invalid input value for {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// The calculation itself failed.
    #[error("calculation failed for {calculator}: {message}")]
    Calculation { calculator: String, message: String },

    /// The calculation produced NaN or an infinite value.
    #[error("calculation for {calculator} produced a non-finite {quantity}")]
    NonFinite {
        calculator: String,
        quantity: String,
    },

    /// No calculator with this id is registered.
    #[error("unknown calculator: {id}")]
    UnknownCalculator { id: String },

    /// Rendering a result failed.
    #[error("failed to render component for {calculator}: {message}")]
    Render { calculator: String, message: String },

    /// Anything that does not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl CalcError {
    pub fn calculation(calculator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Calculation {
            calculator: calculator.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_module(
        module: impl Into<String>,
        property: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidModule {
            module: module.into(),
            property,
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. }
            | Self::InvalidModule { .. }
            | Self::DuplicateModule { .. } => ErrorKind::Load,
            Self::UnknownCalculator { .. } => ErrorKind::Unknown,
            Self::Hook { hook, .. } => match hook {
                LifecycleHook::Load => ErrorKind::Load,
                LifecycleHook::Unload => ErrorKind::Unknown,
            },
            Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::Calculation { .. } | Self::NonFinite { .. } => ErrorKind::Calculation,
            Self::Render { .. } => ErrorKind::Render,
            Self::Other(message) => ErrorKind::classify_message(message),
        }
    }

    /// Whether retrying (after correcting input) can succeed.
    ///
    /// Structural problems with a module are never recoverable; a non-finite
    /// result means the algorithm itself misbehaved. An unknown calculator id
    /// is a caller mistake and can be retried with a corrected id.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config { .. }
            | Self::InvalidModule { .. }
            | Self::DuplicateModule { .. }
            | Self::NonFinite { .. } => false,
            Self::UnknownCalculator { .. } => true,
            Self::Hook { hook, .. } => *hook == LifecycleHook::Unload,
            Self::InvalidInput { .. } | Self::Calculation { .. } | Self::Render { .. } => true,
            Self::Other(message) => message_is_recoverable(message),
        }
    }
}

/// Lifecycle hook names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleHook {
    Load,
    Unload,
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("on_load"),
            Self::Unload => f.write_str("on_unload"),
        }
    }
}

/// Error taxonomy used by the error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "LOAD_ERROR")]
    Load,
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "CALCULATION_ERROR")]
    Calculation,
    #[serde(rename = "RENDER_ERROR")]
    Render,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorKind {
    pub const fn all() -> &'static [Self] {
        &[
            Self::Load,
            Self::Validation,
            Self::Calculation,
            Self::Render,
            Self::Unknown,
        ]
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "LOAD_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Calculation => "CALCULATION_ERROR",
            Self::Render => "RENDER_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Classify a free-form error message by keyword.
    ///
    /// Checked in order: load/import, validation/validate,
    /// calculation/calculate, render/component.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if has(&["load", "import"]) {
            Self::Load
        } else if has(&["validation", "validate"]) {
            Self::Validation
        } else if has(&["calculation", "calculate"]) {
            Self::Calculation
        } else if has(&["render", "component"]) {
            Self::Render
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const UNRECOVERABLE_KEYWORDS: &[&str] = &["module", "import", "syntax", "reference", "undefined"];
const RECOVERABLE_KEYWORDS: &[&str] = &["validation", "input", "parameter", "value", "range"];

/// Recoverability of a free-form error message.
///
/// Unrecoverable keywords win when both sets match; messages matching
/// neither set are treated as recoverable.
pub fn message_is_recoverable(message: &str) -> bool {
    let lower = message.to_lowercase();
    if UNRECOVERABLE_KEYWORDS.iter().any(|w| lower.contains(w)) {
        return false;
    }
    if RECOVERABLE_KEYWORDS.iter().any(|w| lower.contains(w)) {
        return true;
    }
    true
}

/// Result type for calculator operations.
pub type Result<T> = std::result::Result<T, CalcError>;
