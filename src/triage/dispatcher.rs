use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ConfigError, Thresholds, TriageConfig};
use crate::queue::{QueueId, QueueStore};
use crate::source::RawRecord;
use crate::triage::{AlertError, AlertSink, PriorityScorer, ReadingError, ScoredTask, VitalReading};

/// What happened on the alarm path for one dispatched reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum AlarmOutcome {
    /// Priority did not exceed the alarm threshold.
    NotTriggered,
    /// The sink accepted the alarm.
    Raised,
    /// The sink failed. The task stays enqueued.
    SinkFailed(#[serde(serialize_with = "serialize_display")] AlertError),
}

fn serialize_display<S: serde::Serializer>(err: &AlertError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub patient_id: String,
    pub priority: f64,
    pub destination: QueueId,
    pub alarm: AlarmOutcome,
}

impl DispatchResult {
    pub fn alarm_raised(&self) -> bool {
        matches!(self.alarm, AlarmOutcome::Raised)
    }

    /// Priority crossed the alarm threshold, whether or not the sink delivered.
    pub fn alarm_triggered(&self) -> bool {
        !matches!(self.alarm, AlarmOutcome::NotTriggered)
    }
}

/// Scores readings and routes them to the edge or cloud queue.
pub struct Dispatcher {
    scorer: PriorityScorer,
    thresholds: Thresholds,
    store: Arc<QueueStore>,
    alerts: Arc<dyn AlertSink>,
}

impl Dispatcher {
    pub fn new(
        config: &TriageConfig,
        store: Arc<QueueStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, ConfigError> {
        let scorer = PriorityScorer::new(config)?;
        Ok(Self {
            scorer,
            thresholds: config.thresholds,
            store,
            alerts,
        })
    }

    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    /// Edge at or above the edge threshold, cloud below it.
    pub fn route(&self, priority: f64) -> QueueId {
        if priority >= self.thresholds.edge {
            QueueId::Edge
        } else {
            QueueId::Cloud
        }
    }

    /// Score, enqueue, then alarm if the priority is critical.
    ///
    /// The enqueue happens before the sink is called, so the task is already
    /// visible in the queue when the alarm goes out. A sink failure does not
    /// undo the enqueue.
    pub fn dispatch(&self, reading: VitalReading) -> DispatchResult {
        let task = self.scorer.score_task(reading);
        let priority = task.priority();
        let patient_id = task.patient_id().to_string();
        let destination = self.route(priority);

        debug!(
            %patient_id,
            priority = format!("{:.2}", priority),
            dominant = %task.dominant_vital(),
            %destination,
            "dispatching reading"
        );
        self.store.enqueue(destination, task);

        let alarm = if destination == QueueId::Edge && priority > self.thresholds.alarm {
            match self.alerts.raise(&patient_id, priority) {
                Ok(()) => AlarmOutcome::Raised,
                Err(e) => {
                    warn!(%patient_id, error = %e, "alert sink failed; task remains queued");
                    AlarmOutcome::SinkFailed(e)
                }
            }
        } else {
            AlarmOutcome::NotTriggered
        };

        DispatchResult {
            patient_id,
            priority,
            destination,
            alarm,
        }
    }

    /// Parse a raw record and dispatch it. A malformed record is rejected
    /// without touching the queues.
    pub fn dispatch_record(&self, record: &RawRecord) -> Result<DispatchResult, ReadingError> {
        let reading = record.parse()?;
        Ok(self.dispatch(reading))
    }

    pub fn edge_tasks(&self) -> Vec<ScoredTask> {
        self.store.edge_tasks()
    }

    pub fn cloud_tasks(&self) -> Vec<ScoredTask> {
        self.store.cloud_tasks()
    }
}
