//! Batch summary accounting and human-readable formatting.

use serde::Serialize;

use crate::queue::QueueId;
use crate::triage::{AlarmOutcome, DispatchResult, ReadingError, ScoredTask};

/// A record the session skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub line: Option<u64>,
    pub reason: String,
}

/// Outcome of one pass over a reading source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub edge: usize,
    pub cloud: usize,
    pub alarms_raised: usize,
    pub alert_failures: usize,
    /// Stopped by cancellation before the source was exhausted.
    pub interrupted: bool,
    pub mean_edge_priority: Option<f64>,
    pub mean_cloud_priority: Option<f64>,
    pub rejections: Vec<Rejection>,
    #[serde(skip)]
    edge_priority_sum: f64,
    #[serde(skip)]
    cloud_priority_sum: f64,
}

impl BatchSummary {
    pub(crate) fn record_dispatch(&mut self, result: &DispatchResult) {
        self.accepted += 1;
        match result.destination {
            QueueId::Edge => {
                self.edge += 1;
                self.edge_priority_sum += result.priority;
                self.mean_edge_priority = Some(self.edge_priority_sum / self.edge as f64);
            }
            QueueId::Cloud => {
                self.cloud += 1;
                self.cloud_priority_sum += result.priority;
                self.mean_cloud_priority = Some(self.cloud_priority_sum / self.cloud as f64);
            }
        }
        match result.alarm {
            AlarmOutcome::NotTriggered => {}
            AlarmOutcome::Raised => self.alarms_raised += 1,
            AlarmOutcome::SinkFailed(_) => self.alert_failures += 1,
        }
    }

    pub(crate) fn record_rejection(&mut self, line: Option<u64>, err: &ReadingError) {
        self.rejected += 1;
        self.rejections.push(Rejection {
            line,
            reason: err.to_string(),
        });
    }

    /// Records pulled from the source, good or bad.
    pub fn processed(&self) -> usize {
        self.accepted + self.rejected
    }

    /// Fraction of accepted readings routed to the edge, if any were accepted.
    pub fn edge_share(&self) -> Option<f64> {
        (self.accepted > 0).then(|| self.edge as f64 / self.accepted as f64)
    }
}

/// Format a batch summary as a short multi-line report.
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut out = format!(
        "Processed {} record{}: {} accepted, {} rejected",
        summary.processed(),
        if summary.processed() == 1 { "" } else { "s" },
        summary.accepted,
        summary.rejected,
    );
    if summary.interrupted {
        out.push_str(" (interrupted)");
    }

    out.push_str(&format!("\n  edge:  {}", summary.edge));
    if let Some(mean) = summary.mean_edge_priority {
        out.push_str(&format!(" (mean priority {:.2})", mean));
    }
    out.push_str(&format!("\n  cloud: {}", summary.cloud));
    if let Some(mean) = summary.mean_cloud_priority {
        out.push_str(&format!(" (mean priority {:.2})", mean));
    }
    if let Some(share) = summary.edge_share() {
        out.push_str(&format!("\n  edge share: {:.1}%", share * 100.0));
    }

    out.push_str(&format!("\n  alarms: {}", summary.alarms_raised));
    if summary.alert_failures > 0 {
        out.push_str(&format!(" ({} failed to deliver)", summary.alert_failures));
    }

    for r in &summary.rejections {
        match r.line {
            Some(line) => out.push_str(&format!("\n  rejected line {}: {}", line, r.reason)),
            None => out.push_str(&format!("\n  rejected: {}", r.reason)),
        }
    }

    out
}

/// Format a queue snapshot as a table, highest priority first.
pub fn format_queue(id: QueueId, tasks: &[ScoredTask]) -> String {
    let mut out = format!("{} queue ({} task{})\n", id, tasks.len(), if tasks.len() == 1 { "" } else { "s" });
    out.push_str(&format!(
        "{:<12} | {:>8} | {:>10} | {:>8} | {:>8} | {:<14}\n",
        "Patient", "Priority", "HeartRate", "BP", "Glucose", "Dominant"
    ));
    out.push_str(&format!(
        "{:-<12}-|-{:->8}-|-{:->10}-|-{:->8}-|-{:->8}-|-{:-<14}\n",
        "", "", "", "", "", ""
    ));
    for task in tasks {
        let r = task.reading();
        out.push_str(&format!(
            "{:<12} | {:>8.2} | {:>10.1} | {:>8.1} | {:>8.1} | {:<14}\n",
            r.patient_id(),
            task.priority(),
            r.heart_rate(),
            r.blood_pressure(),
            r.glucose_level(),
            task.dominant_vital().to_string(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::{AlertError, Vital, VitalReading};

    fn result(dest: QueueId, priority: f64, alarm: AlarmOutcome) -> DispatchResult {
        DispatchResult {
            patient_id: "P".to_string(),
            priority,
            destination: dest,
            alarm,
        }
    }

    #[test]
    fn test_counts_and_means() {
        let mut s = BatchSummary::default();
        s.record_dispatch(&result(QueueId::Edge, 2.0, AlarmOutcome::Raised));
        s.record_dispatch(&result(QueueId::Edge, 1.0, AlarmOutcome::NotTriggered));
        s.record_dispatch(&result(
            QueueId::Edge,
            1.8,
            AlarmOutcome::SinkFailed(AlertError::Unavailable("down".into())),
        ));
        s.record_dispatch(&result(QueueId::Cloud, 0.5, AlarmOutcome::NotTriggered));
        s.record_rejection(Some(7), &ReadingError::MissingField { field: "heart_rate" });

        assert_eq!(s.accepted, 4);
        assert_eq!(s.rejected, 1);
        assert_eq!(s.processed(), 5);
        assert_eq!(s.edge, 3);
        assert_eq!(s.cloud, 1);
        assert_eq!(s.alarms_raised, 1);
        assert_eq!(s.alert_failures, 1);
        assert!((s.mean_edge_priority.unwrap() - 1.6).abs() < 1e-9);
        assert_eq!(s.mean_cloud_priority, Some(0.5));
        assert_eq!(s.edge_share(), Some(0.75));
        assert_eq!(s.rejections[0].line, Some(7));
    }

    #[test]
    fn test_empty_summary() {
        let s = BatchSummary::default();
        assert_eq!(s.edge_share(), None);
        assert_eq!(s.mean_edge_priority, None);
        let text = format_summary(&s);
        assert!(text.starts_with("Processed 0 records: 0 accepted, 0 rejected"));
    }

    #[test]
    fn test_format_summary() {
        let mut s = BatchSummary::default();
        s.record_dispatch(&result(QueueId::Edge, 2.0, AlarmOutcome::Raised));
        s.record_rejection(Some(3), &ReadingError::EmptyPatientId);
        s.interrupted = true;

        let text = format_summary(&s);
        assert!(text.contains("2 records: 1 accepted, 1 rejected (interrupted)"));
        assert!(text.contains("edge:  1 (mean priority 2.00)"));
        assert!(text.contains("edge share: 100.0%"));
        assert!(text.contains("alarms: 1"));
        assert!(text.contains("rejected line 3: patient id is empty"));
    }

    #[test]
    fn test_format_queue() {
        let reading = VitalReading::new("P2", 180.0, 200.0, 300.0).unwrap();
        let task = ScoredTask::new(reading, 2.0, Vital::HeartRate);
        let text = format_queue(QueueId::Edge, &[task]);
        assert!(text.starts_with("edge queue (1 task)"));
        assert!(text.contains("P2"));
        assert!(text.contains("2.00"));
        assert!(text.contains("heart_rate"));
    }

    #[test]
    fn test_summary_json_omits_running_sums() {
        let mut s = BatchSummary::default();
        s.record_dispatch(&result(QueueId::Cloud, 0.25, AlarmOutcome::NotTriggered));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["cloud"], 1);
        assert_eq!(json["mean_cloud_priority"], 0.25);
        assert!(json.get("cloud_priority_sum").is_none());
    }
}
