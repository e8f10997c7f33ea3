//! Reading sources: finite, replayable streams of raw vital-sign records.

pub mod csv_file;

use thiserror::Error;

use crate::triage::{ReadingError, Vital, VitalReading};

pub use self::csv_file::CsvSource;

/// Failure to open a source as a whole. Per-record problems are
/// [`ReadingError`]s and never abort the stream.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV header is missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// One record as it arrives, before any parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Position in the underlying input, when it has one.
    pub line: Option<u64>,
    pub patient_id: Option<String>,
    pub heart_rate: Option<String>,
    pub blood_pressure: Option<String>,
    pub glucose_level: Option<String>,
}

impl RawRecord {
    pub fn new(patient_id: &str, heart_rate: &str, blood_pressure: &str, glucose_level: &str) -> Self {
        Self {
            line: None,
            patient_id: Some(patient_id.to_string()),
            heart_rate: Some(heart_rate.to_string()),
            blood_pressure: Some(blood_pressure.to_string()),
            glucose_level: Some(glucose_level.to_string()),
        }
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Validate and convert into a [`VitalReading`].
    pub fn parse(&self) -> Result<VitalReading, ReadingError> {
        let patient_id = self
            .patient_id
            .as_deref()
            .map(str::trim)
            .ok_or(ReadingError::MissingField { field: "patient_id" })?;

        VitalReading::new(
            patient_id,
            parse_value(Vital::HeartRate, self.heart_rate.as_deref())?,
            parse_value(Vital::BloodPressure, self.blood_pressure.as_deref())?,
            parse_value(Vital::GlucoseLevel, self.glucose_level.as_deref())?,
        )
    }
}

fn parse_value(vital: Vital, raw: Option<&str>) -> Result<f64, ReadingError> {
    let field = vital.field();
    let text = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ReadingError::MissingField { field })?;
    text.parse::<f64>().map_err(|_| ReadingError::NotNumeric {
        field,
        value: text.to_string(),
    })
}

/// A sequential producer of raw records.
///
/// `records` may be called any number of times; each call replays the same
/// records in the same order.
pub trait ReadingSource {
    fn records(&self) -> Box<dyn Iterator<Item = Result<RawRecord, ReadingError>> + '_>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<RawRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: RawRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<RawRecord> for MemorySource {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl ReadingSource for MemorySource {
    fn records(&self) -> Box<dyn Iterator<Item = Result<RawRecord, ReadingError>> + '_> {
        Box::new(self.records.iter().cloned().map(Ok))
    }
}
