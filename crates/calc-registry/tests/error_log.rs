//! Properties of the bounded error log.

use calc_model::CalcError;
use calc_registry::{ErrorContext, ErrorHandler};
use proptest::prelude::*;

proptest! {
    #[test]
    fn keeps_the_newest_records(capacity in 1usize..=20, logged in 0usize..=60) {
        let handler = ErrorHandler::new(capacity);
        for i in 0..logged {
            handler.log_error(
                &CalcError::invalid_input("x", format!("entry {i}")),
                Some("fixture"),
                ErrorContext::new(),
            );
        }

        let records = handler.errors();
        prop_assert_eq!(handler.len(), logged.min(capacity));
        prop_assert_eq!(records.len(), logged.min(capacity));

        // Oldest first, with ids continuing past every eviction.
        let first = logged.saturating_sub(capacity);
        for (offset, record) in records.iter().enumerate() {
            prop_assert_eq!(record.id, (first + offset + 1) as u64);
            let expected = format!("entry {}", first + offset);
            prop_assert!(record.message.ends_with(&expected));
        }
    }

    #[test]
    fn stats_agree_with_the_retained_records(
        capacity in 1usize..=10,
        kinds in prop::collection::vec(any::<bool>(), 0..30),
    ) {
        let handler = ErrorHandler::new(capacity);
        for &recoverable in &kinds {
            let err = if recoverable {
                CalcError::calculation("fixture", "overflow")
            } else {
                CalcError::DuplicateModule { id: "fixture".to_string() }
            };
            handler.log_error(&err, Some("fixture"), ErrorContext::new());
        }

        let stats = handler.stats();
        let retained = &kinds[kinds.len().saturating_sub(capacity)..];
        prop_assert_eq!(stats.total, retained.len());
        prop_assert_eq!(stats.recoverable, retained.iter().filter(|&&r| r).count());
        prop_assert_eq!(stats.recoverable + stats.unrecoverable, stats.total);
    }
}
