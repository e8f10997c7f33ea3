use crate::config::{ConfigError, NormalRanges, TriageConfig, VitalRange};
use crate::triage::{ScoredTask, Vital, VitalReading};

/// Maps a vital-sign reading to a normalized urgency score.
///
/// Pure and `Sync`: one scorer may be shared by any number of threads.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    ranges: NormalRanges,
    clamp_min: f64,
    clamp_max: f64,
}

impl PriorityScorer {
    /// Build a scorer. Fails on any range with `max <= min`, so scoring
    /// itself can never divide by zero.
    pub fn new(config: &TriageConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ranges: config.ranges.clone(),
            clamp_min: config.thresholds.clamp_min,
            clamp_max: config.thresholds.clamp_max,
        })
    }

    /// Urgency of a single value against its normal range:
    ///
    /// `|(max - v)^2 - (min - v)^2| / (max - min)^2`
    ///
    /// Evaluated as the equivalent `|max + min - 2v| / (max - min)` so very
    /// large inputs saturate to infinity instead of producing `inf - inf`.
    /// Zero at the midpoint, one at either bound, unbounded beyond.
    pub fn parameter_priority(value: f64, range: &VitalRange) -> f64 {
        (range.max + range.min - 2.0 * value).abs() / (range.max - range.min)
    }

    /// Overall priority of a reading, clamped to the configured range.
    pub fn score(&self, reading: &VitalReading) -> f64 {
        self.assess(reading).0
    }

    /// Score a reading and attach the result.
    pub fn score_task(&self, reading: VitalReading) -> ScoredTask {
        let (priority, dominant) = self.assess(&reading);
        ScoredTask::new(reading, priority, dominant)
    }

    pub fn ranges(&self) -> &NormalRanges {
        &self.ranges
    }

    // Max over the vitals; ties keep the earlier vital in `Vital::ALL`.
    fn assess(&self, reading: &VitalReading) -> (f64, Vital) {
        let mut dominant = Vital::HeartRate;
        let mut worst = f64::NEG_INFINITY;
        for vital in Vital::ALL {
            let p = Self::parameter_priority(reading.value(vital), self.ranges.get(vital));
            if p > worst {
                worst = p;
                dominant = vital;
            }
        }
        (worst.clamp(self.clamp_min, self.clamp_max), dominant)
    }
}
