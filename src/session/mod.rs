//! Stream processing session.
//!
//! A session drives one pass of a [`ReadingSource`] through a [`Dispatcher`]:
//! `NotStarted -> Processing -> Completed`. Running a completed session again
//! is a no-op that returns the stored summary; [`TriageSession::reset`] clears
//! the queues and goes back to `NotStarted`.

pub mod summary;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::source::ReadingSource;
use crate::triage::Dispatcher;

pub use self::summary::{format_queue, format_summary, BatchSummary, Rejection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Processing,
    Completed,
}

pub struct TriageSession {
    dispatcher: Dispatcher,
    state: SessionState,
    summary: Option<BatchSummary>,
}

impl TriageSession {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            state: SessionState::NotStarted,
            summary: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Summary of the last completed run.
    pub fn summary(&self) -> Option<&BatchSummary> {
        self.summary.as_ref()
    }

    /// Dispatch every record of `source`, in order.
    ///
    /// Malformed records are counted and skipped. `cancel` is checked between
    /// records only, so each record is either fully dispatched (alarm
    /// included) or not started.
    pub fn run(&mut self, source: &dyn ReadingSource, cancel: &CancellationToken) -> BatchSummary {
        if self.state == SessionState::Completed {
            info!("session already completed; returning previous summary");
            return self.summary.clone().unwrap_or_default();
        }

        self.state = SessionState::Processing;
        info!("processing sensor readings");

        let mut summary = BatchSummary::default();
        for item in source.records() {
            if cancel.is_cancelled() {
                warn!(processed = summary.processed(), "run cancelled; stopping between readings");
                summary.interrupted = true;
                break;
            }

            let line = item.as_ref().ok().and_then(|r| r.line);
            match item.and_then(|record| self.dispatcher.dispatch_record(&record)) {
                Ok(result) => summary.record_dispatch(&result),
                Err(e) => {
                    warn!(?line, error = %e, "skipping malformed reading");
                    summary.record_rejection(line, &e);
                }
            }
        }

        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            edge = summary.edge,
            cloud = summary.cloud,
            alarms = summary.alarms_raised,
            "processing complete"
        );

        self.state = SessionState::Completed;
        self.summary = Some(summary.clone());
        summary
    }

    /// Empty both queues and forget the last summary.
    pub fn reset(&mut self) {
        self.dispatcher.store().clear();
        self.summary = None;
        self.state = SessionState::NotStarted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageConfig;
    use crate::queue::{QueueId, QueueStore};
    use crate::source::{MemorySource, RawRecord};
    use crate::triage::AlertLog;
    use std::sync::Arc;

    fn session() -> (TriageSession, Arc<QueueStore>, Arc<AlertLog>) {
        let store = Arc::new(QueueStore::new());
        let log = Arc::new(AlertLog::new());
        let d = Dispatcher::new(&TriageConfig::default(), store.clone(), log.clone()).unwrap();
        (TriageSession::new(d), store, log)
    }

    fn source() -> MemorySource {
        vec![
            RawRecord::new("P1", "60", "90", "70").at_line(2),
            RawRecord::new("P2", "180", "200", "300").at_line(3),
            RawRecord::new("PX", "fast", "120", "95").at_line(4),
            RawRecord::new("P3", "80", "105", "105").at_line(5),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_state_machine() {
        let (mut session, store, log) = session();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.summary().is_none());

        let summary = session.run(&source(), &CancellationToken::new());
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.rejections[0].line, Some(4));
        assert_eq!(summary.alarms_raised, 1);
        assert_eq!(store.total(), 3);
        assert_eq!(log.len(), 1);
        assert_eq!(session.summary(), Some(&summary));
    }

    #[test]
    fn test_rerun_after_completion_is_noop() {
        let (mut session, store, log) = session();
        let first = session.run(&source(), &CancellationToken::new());
        let second = session.run(&source(), &CancellationToken::new());

        assert_eq!(first, second);
        assert_eq!(store.total(), 3);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_reset_allows_fresh_run() {
        let (mut session, store, _) = session();
        session.run(&source(), &CancellationToken::new());

        session.reset();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert_eq!(store.total(), 0);
        assert!(session.summary().is_none());

        let summary = session.run(&source(), &CancellationToken::new());
        assert_eq!(summary.accepted, 3);
        assert_eq!(store.size(QueueId::Edge), 2);
        assert_eq!(store.size(QueueId::Cloud), 1);
    }

    #[test]
    fn test_cancelled_before_start_dispatches_nothing() {
        let (mut session, store, _) = session();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = session.run(&source(), &cancel);
        assert!(summary.interrupted);
        assert_eq!(summary.processed(), 0);
        assert_eq!(store.total(), 0);
        assert_eq!(session.state(), SessionState::Completed);
    }
}
