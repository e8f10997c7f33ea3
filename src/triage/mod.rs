//! Vital-sign triage: reading model, priority scoring, edge/cloud dispatch
//! and alarm signalling.

pub mod alert;
pub mod dispatcher;
pub mod scorer;

use serde::Serialize;
use thiserror::Error;

pub use self::alert::{Alert, AlertError, AlertLog, AlertSink};
pub use self::dispatcher::{AlarmOutcome, DispatchResult, Dispatcher};
pub use self::scorer::PriorityScorer;

/// A single record that could not be turned into a [`VitalReading`].
///
/// Always scoped to one record: the stream carries on after it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingError {
    #[error("patient id is empty")]
    EmptyPatientId,

    #[error("missing field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field `{field}` is not a finite number ({value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("unreadable record: {0}")]
    Unreadable(String),
}

/// The monitored vital signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    HeartRate,
    BloodPressure,
    GlucoseLevel,
}

impl Vital {
    /// Scoring order. Also the tie-break order when picking the dominant vital.
    pub const ALL: [Vital; 3] = [Vital::HeartRate, Vital::BloodPressure, Vital::GlucoseLevel];

    /// Field name used in records and configuration.
    pub fn field(self) -> &'static str {
        match self {
            Vital::HeartRate => "heart_rate",
            Vital::BloodPressure => "blood_pressure",
            Vital::GlucoseLevel => "glucose_level",
        }
    }

    /// Clinical urgency weight of the vital (heart rate outranks blood
    /// pressure, which outranks glucose).
    pub fn urgency_weight(self) -> f64 {
        match self {
            Vital::HeartRate => 3.0,
            Vital::BloodPressure => 2.0,
            Vital::GlucoseLevel => 1.0,
        }
    }
}

impl std::fmt::Display for Vital {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// One validated vital-sign reading for a patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalReading {
    patient_id: String,
    heart_rate: f64,
    blood_pressure: f64,
    glucose_level: f64,
}

impl VitalReading {
    /// Build a reading, rejecting empty ids and non-finite values.
    pub fn new(
        patient_id: impl Into<String>,
        heart_rate: f64,
        blood_pressure: f64,
        glucose_level: f64,
    ) -> Result<Self, ReadingError> {
        let patient_id = patient_id.into();
        if patient_id.trim().is_empty() {
            return Err(ReadingError::EmptyPatientId);
        }

        for (vital, value) in Vital::ALL
            .into_iter()
            .zip([heart_rate, blood_pressure, glucose_level])
        {
            if !value.is_finite() {
                return Err(ReadingError::NonFinite {
                    field: vital.field(),
                    value,
                });
            }
        }

        Ok(Self {
            patient_id,
            heart_rate,
            blood_pressure,
            glucose_level,
        })
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    pub fn blood_pressure(&self) -> f64 {
        self.blood_pressure
    }

    pub fn glucose_level(&self) -> f64 {
        self.glucose_level
    }

    pub fn value(&self, vital: Vital) -> f64 {
        match vital {
            Vital::HeartRate => self.heart_rate,
            Vital::BloodPressure => self.blood_pressure,
            Vital::GlucoseLevel => self.glucose_level,
        }
    }
}

/// A reading with its priority attached. Produced by [`PriorityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    reading: VitalReading,
    priority: f64,
    dominant_vital: Vital,
}

impl ScoredTask {
    pub(crate) fn new(reading: VitalReading, priority: f64, dominant_vital: Vital) -> Self {
        Self {
            reading,
            priority,
            dominant_vital,
        }
    }

    pub fn reading(&self) -> &VitalReading {
        &self.reading
    }

    pub fn patient_id(&self) -> &str {
        self.reading.patient_id()
    }

    /// Priority in the configured clamp range (default `[0, 2]`).
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// The vital whose deviation produced the priority.
    pub fn dominant_vital(&self) -> Vital {
        self.dominant_vital
    }

    pub fn urgency_weight(&self) -> f64 {
        self.dominant_vital.urgency_weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_accepts_finite_values() {
        let r = VitalReading::new("P1", 72.0, 110.0, 95.5).unwrap();
        assert_eq!(r.patient_id(), "P1");
        assert_eq!(r.value(Vital::HeartRate), 72.0);
        assert_eq!(r.value(Vital::BloodPressure), 110.0);
        assert_eq!(r.value(Vital::GlucoseLevel), 95.5);
    }

    #[test]
    fn test_reading_rejects_empty_patient() {
        assert_eq!(
            VitalReading::new("  ", 72.0, 110.0, 95.0),
            Err(ReadingError::EmptyPatientId)
        );
    }

    #[test]
    fn test_reading_rejects_non_finite() {
        let err = VitalReading::new("P1", 72.0, f64::NAN, 95.0).unwrap_err();
        assert!(matches!(
            err,
            ReadingError::NonFinite { field: "blood_pressure", .. }
        ));

        let err = VitalReading::new("P1", 72.0, 110.0, f64::INFINITY).unwrap_err();
        assert!(matches!(
            err,
            ReadingError::NonFinite { field: "glucose_level", .. }
        ));
    }

    #[test]
    fn test_urgency_weights_follow_clinical_order() {
        assert!(Vital::HeartRate.urgency_weight() > Vital::BloodPressure.urgency_weight());
        assert!(Vital::BloodPressure.urgency_weight() > Vital::GlucoseLevel.urgency_weight());
    }

    #[test]
    fn test_scored_task_serializes_flat() {
        let reading = VitalReading::new("P7", 80.0, 105.0, 105.0).unwrap();
        let task = ScoredTask::new(reading, 0.0, Vital::HeartRate);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["patient_id"], "P7");
        assert_eq!(json["heart_rate"], 80.0);
        assert_eq!(json["priority"], 0.0);
        assert_eq!(json["dominant_vital"], "heart_rate");
    }
}
