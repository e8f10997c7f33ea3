use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::{RawRecord, ReadingSource, SourceError};
use crate::triage::{ReadingError, Vital};

/// Vital-sign records loaded from CSV.
///
/// Columns are located by header name (`patient_id`, `heart_rate`,
/// `blood_pressure`, `glucose_level`, case-insensitive); any other columns
/// are ignored. The input is read once at open time, so the source can be
/// replayed without touching the file again.
#[derive(Debug, Clone)]
pub struct CsvSource {
    rows: Vec<Result<RawRecord, ReadingError>>,
}

struct Columns {
    patient_id: usize,
    heart_rate: usize,
    blood_pressure: usize,
    glucose_level: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, SourceError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(SourceError::MissingColumn(name))
        };
        Ok(Self {
            patient_id: find("patient_id")?,
            heart_rate: find(Vital::HeartRate.field())?,
            blood_pressure: find(Vital::BloodPressure.field())?,
            glucose_level: find(Vital::GlucoseLevel.field())?,
        })
    }
}

impl CsvSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        let source = Self::from_reader(file)?;
        info!(path = %path.display(), records = source.len(), "loaded sensor readings");
        Ok(source)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::locate(reader.headers()?)?;

        let rows = reader
            .records()
            .map(|result| match result {
                Ok(record) => {
                    let field = |idx: usize| record.get(idx).map(str::to_string);
                    Ok(RawRecord {
                        line: record.position().map(|p| p.line()),
                        patient_id: field(columns.patient_id),
                        heart_rate: field(columns.heart_rate),
                        blood_pressure: field(columns.blood_pressure),
                        glucose_level: field(columns.glucose_level),
                    })
                }
                Err(e) => {
                    debug!(error = %e, "unreadable CSV row");
                    Err(ReadingError::Unreadable(e.to_string()))
                }
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ReadingSource for CsvSource {
    fn records(&self) -> Box<dyn Iterator<Item = Result<RawRecord, ReadingError>> + '_> {
        Box::new(self.rows.iter().cloned())
    }
}
