//! vitalroute -- edge/cloud triage of streamed patient vital signs.
//!
//! Readings are scored against normal clinical ranges, routed to a
//! low-latency edge queue or a deferred cloud queue, and critical readings
//! raise an alarm.

pub mod config;
pub mod queue;
pub mod session;
pub mod source;
pub mod triage;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::TriageConfig;
use crate::queue::QueueStore;
use crate::session::{BatchSummary, TriageSession};
use crate::source::CsvSource;
use crate::triage::{Alert, AlertLog, Dispatcher, ScoredTask};

/// Everything a batch run produced.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub edge: Vec<ScoredTask>,
    pub cloud: Vec<ScoredTask>,
    pub alarms: Vec<Alert>,
}

/// Triage every reading in a CSV file.
///
/// The batch runs on a blocking thread; Ctrl-C stops it between readings
/// and the report covers what was dispatched up to that point.
pub async fn run_batch(input: &Path, config: &TriageConfig) -> Result<BatchReport> {
    tracing::info!(input = %input.display(), "Starting triage batch");
    let source = CsvSource::open(input)
        .with_context(|| format!("failed to load readings from {}", input.display()))?;

    let store = Arc::new(QueueStore::new());
    let alerts = Arc::new(AlertLog::new());
    let dispatcher = Dispatcher::new(config, store.clone(), alerts.clone())?;
    let mut session = TriageSession::new(dispatcher);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current reading");
            on_signal.cancel();
        }
    });

    let summary = tokio::task::spawn_blocking(move || session.run(&source, &cancel))
        .await
        .context("triage batch panicked")?;
    signal_task.abort();

    Ok(BatchReport {
        summary,
        edge: store.edge_tasks(),
        cloud: store.cloud_tasks(),
        alarms: alerts.alerts(),
    })
}
