//! Central error triage.
//!
//! Every failure raised while loading, validating, calculating or rendering
//! a calculator is normalized into an [`ErrorRecord`] and kept in a bounded
//! ring buffer. Unrecoverable errors are also sent to a [`MonitoringSink`].

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use calc_model::{CalcError, ErrorKind, message_is_recoverable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::DEFAULT_ERROR_LOG_CAPACITY;

/// Extra key/value context attached to an error.
pub type ErrorContext = BTreeMap<String, serde_json::Value>;

/// A normalized error entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Increases with every logged error.
    pub id: u64,
    pub kind: ErrorKind,
    pub message: String,
    pub calculator_id: Option<String>,
    #[serde(default)]
    pub context: ErrorContext,
    pub recoverable: bool,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counts over the current buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorStats {
    pub total: usize,
    pub by_kind: BTreeMap<ErrorKind, usize>,
    pub by_calculator: BTreeMap<String, usize>,
    pub recoverable: usize,
    pub unrecoverable: usize,
}

/// Receives unrecoverable errors.
pub trait MonitoringSink: Send + Sync + fmt::Debug {
    fn report(&self, record: &ErrorRecord);
}

/// Default sink: emits an `error` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MonitoringSink for TracingSink {
    fn report(&self, record: &ErrorRecord) {
        tracing::error!(
            id = record.id,
            kind = %record.kind,
            calculator = record.calculator_id.as_deref().unwrap_or("-"),
            "unrecoverable error: {}",
            record.message
        );
    }
}

/// Human-readable recovery hints per error kind.
pub fn recovery_suggestions(kind: ErrorKind) -> &'static [&'static str] {
    match kind {
        ErrorKind::Load => &[
            "Reload the calculator list.",
            "Check that the calculator is enabled in the registry settings.",
            "Report the problem if it persists after a reload.",
        ],
        ErrorKind::Validation => &[
            "Check that every required field is filled in.",
            "Make sure numeric values are within the allowed range.",
            "Verify the selected units.",
        ],
        ErrorKind::Calculation => &[
            "Review the entered values for plausibility.",
            "Retry the calculation.",
            "Reset the calculator if retries keep failing.",
        ],
        ErrorKind::Render => &[
            "Retry displaying the result.",
            "Switch to another locale and back.",
        ],
        ErrorKind::Unknown => &[
            "Retry the operation.",
            "Reset the calculator.",
        ],
    }
}

/// Bounded error log with classification and escalation.
#[derive(Debug)]
pub struct ErrorHandler {
    capacity: usize,
    next_id: AtomicU64,
    records: Mutex<VecDeque<ErrorRecord>>,
    sink: Arc<dyn MonitoringSink>,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_CAPACITY)
    }
}

impl ErrorHandler {
    /// Handler keeping at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self::with_sink(capacity, Arc::new(TracingSink))
    }

    pub fn with_sink(capacity: usize, sink: Arc<dyn MonitoringSink>) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_id: AtomicU64::new(1),
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            sink,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a typed error.
    pub fn log_error(
        &self,
        error: &CalcError,
        calculator_id: Option<&str>,
        context: ErrorContext,
    ) -> ErrorRecord {
        self.push(
            error.kind(),
            error.to_string(),
            error.is_recoverable(),
            calculator_id,
            context,
        )
    }

    /// Record an untyped message, classified by keyword.
    pub fn log_message(
        &self,
        message: &str,
        calculator_id: Option<&str>,
        context: ErrorContext,
    ) -> ErrorRecord {
        self.push(
            ErrorKind::classify_message(message),
            message.to_string(),
            message_is_recoverable(message),
            calculator_id,
            context,
        )
    }

    fn push(
        &self,
        kind: ErrorKind,
        message: String,
        recoverable: bool,
        calculator_id: Option<&str>,
        context: ErrorContext,
    ) -> ErrorRecord {
        let record = ErrorRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            message,
            calculator_id: calculator_id.map(str::to_string),
            context,
            recoverable,
            timestamp: Utc::now(),
        };
        tracing::warn!(
            id = record.id,
            kind = %record.kind,
            recoverable,
            calculator = record.calculator_id.as_deref().unwrap_or("-"),
            "{}",
            record.message
        );
        {
            let mut records = self.lock();
            while records.len() >= self.capacity {
                records.pop_front();
            }
            records.push_back(record.clone());
        }
        if !recoverable {
            self.sink.report(&record);
        }
        record
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ErrorRecord>> {
        // Records are plain data; a panic mid-push leaves them usable.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every buffered record, oldest first.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn errors_for(&self, calculator_id: &str) -> Vec<ErrorRecord> {
        self.lock()
            .iter()
            .filter(|r| r.calculator_id.as_deref() == Some(calculator_id))
            .cloned()
            .collect()
    }

    pub fn errors_of_kind(&self, kind: ErrorKind) -> Vec<ErrorRecord> {
        self.lock()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> ErrorStats {
        let records = self.lock();
        let mut stats = ErrorStats {
            total: records.len(),
            ..ErrorStats::default()
        };
        for record in records.iter() {
            *stats.by_kind.entry(record.kind).or_default() += 1;
            if let Some(id) = &record.calculator_id {
                *stats.by_calculator.entry(id.clone()).or_default() += 1;
            }
            if record.recoverable {
                stats.recoverable += 1;
            } else {
                stats.unrecoverable += 1;
            }
        }
        stats
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn recovery_suggestions(&self, kind: ErrorKind) -> &'static [&'static str] {
        recovery_suggestions(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct CountingSink(Mutex<Vec<u64>>);

    impl MonitoringSink for CountingSink {
        fn report(&self, record: &ErrorRecord) {
            self.0.lock().expect("sink lock").push(record.id);
        }
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let handler = ErrorHandler::default();
        for i in 0..101 {
            handler.log_message(&format!("input {i} out of range"), None, ErrorContext::new());
        }
        let errors = handler.errors();
        assert_eq!(errors.len(), 100);
        assert_eq!(errors[0].message, "input 1 out of range");
        assert_eq!(errors[99].id, 101);
    }

    #[test]
    fn classifies_untyped_messages() {
        let handler = ErrorHandler::new(10);
        let record = handler.log_message("Failed to import module", Some("bmi"), ErrorContext::new());
        assert_eq!(record.kind, ErrorKind::Load);
        assert!(!record.recoverable);

        let record = handler.log_message("validation: value too high", None, ErrorContext::new());
        assert_eq!(record.kind, ErrorKind::Validation);
        assert!(record.recoverable);
    }

    #[test]
    fn typed_errors_keep_their_kind() {
        let handler = ErrorHandler::new(10);
        // the message mentions "module" but the variant decides
        let err = CalcError::calculation("bmi", "module produced garbage");
        let record = handler.log_error(&err, Some("bmi"), ErrorContext::new());
        assert_eq!(record.kind, ErrorKind::Calculation);
        assert!(record.recoverable);
    }

    #[test]
    fn unrecoverable_errors_reach_the_sink() {
        let sink = Arc::new(CountingSink::default());
        let handler = ErrorHandler::with_sink(10, sink.clone());
        handler.log_error(
            &CalcError::DuplicateModule { id: "bmi".to_string() },
            None,
            ErrorContext::new(),
        );
        handler.log_message("value out of range", None, ErrorContext::new());
        assert_eq!(*sink.0.lock().expect("sink lock"), vec![1]);
    }

    #[test]
    fn queries_and_stats() {
        let handler = ErrorHandler::new(10);
        let mut context = ErrorContext::new();
        context.insert("field".to_string(), serde_json::json!("weight"));
        handler.log_error(&CalcError::invalid_input("weight", "missing"), Some("bmi"), context);
        handler.log_error(&CalcError::calculation("egfr", "overflow"), Some("egfr"), ErrorContext::new());
        handler.log_message("syntax error in template", Some("egfr"), ErrorContext::new());

        assert_eq!(handler.errors_for("egfr").len(), 2);
        assert_eq!(handler.errors_of_kind(ErrorKind::Validation).len(), 1);
        assert_eq!(handler.errors_for("bmi")[0].context["field"], "weight");

        let stats = handler.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_calculator["egfr"], 2);
        assert_eq!(stats.by_kind[&ErrorKind::Calculation], 1);
        assert_eq!(stats.by_kind[&ErrorKind::Unknown], 1);
        assert_eq!(stats.recoverable, 2);
        assert_eq!(stats.unrecoverable, 1);

        handler.clear();
        assert!(handler.is_empty());
    }

    #[test]
    fn every_kind_has_suggestions() {
        for kind in ErrorKind::all() {
            assert!(!recovery_suggestions(*kind).is_empty());
        }
    }
}
