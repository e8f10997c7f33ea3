//! Alarm delivery for critical readings.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlertError {
    #[error("alert sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives alarms raised by the dispatcher.
///
/// Fire-and-forget from the dispatcher's side: a failure is reported back
/// to the caller but is never retried.
pub trait AlertSink: Send + Sync {
    fn raise(&self, patient_id: &str, priority: f64) -> Result<(), AlertError>;
}

/// A raised alarm, as kept by [`AlertLog`].
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub patient_id: String,
    pub priority: f64,
    pub raised_at: DateTime<Utc>,
}

/// In-memory record of every alarm raised, in arrival order.
#[derive(Debug, Default)]
pub struct AlertLog {
    alerts: Mutex<Vec<Alert>>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AlertSink for AlertLog {
    fn raise(&self, patient_id: &str, priority: f64) -> Result<(), AlertError> {
        let alert = Alert {
            id: Uuid::new_v4(),
            patient_id: patient_id.to_string(),
            priority,
            raised_at: Utc::now(),
        };
        warn!(
            alert_id = %alert.id,
            %patient_id,
            priority = format!("{:.2}", priority),
            "ALARM: patient needs immediate attention"
        );
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_log_records_in_order() {
        let log = AlertLog::new();
        assert!(log.is_empty());

        log.raise("P2", 2.0).unwrap();
        log.raise("P9", 1.75).unwrap();

        let alerts = log.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].patient_id, "P2");
        assert_eq!(alerts[0].priority, 2.0);
        assert_eq!(alerts[1].patient_id, "P9");
        assert_ne!(alerts[0].id, alerts[1].id);
        assert!(alerts[0].raised_at <= alerts[1].raised_at);

        log.clear();
        assert!(log.is_empty());
    }
}
