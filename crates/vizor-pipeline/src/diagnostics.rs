//! Pipeline diagnostics: per-stage timing and skip reporting.
//!
//! [`crate::apply_with_diagnostics`] collects these alongside the
//! processed image. The pipeline never reads a clock itself; callers
//! supply one through the [`Clock`] trait, so this crate stays free of
//! platform time APIs and tests can use a fixed clock.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Stage;
use crate::types::Dimensions;

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
pub mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    ///
    /// # Errors
    ///
    /// Fails on negative, non-finite, or out-of-range values.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Dimensions of the input image.
    pub input: Dimensions,
    /// Dimensions of the final image (rotation may swap them).
    pub output: Dimensions,
    /// One entry per stage, in execution order, including skipped stages.
    pub stages: Vec<StageDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    pub stage: Stage,
    /// `false` when the stage's parameters were neutral and it was skipped.
    pub applied: bool,
    /// Wall-clock duration of this stage (seconds); zero when skipped.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Image dimensions after this stage.
    pub output: Dimensions,
}

impl PipelineDiagnostics {
    /// Number of stages that actually ran.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.stages.iter().filter(|s| s.applied).count()
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} -> {}x{} ({} pixels)",
            self.input.width,
            self.input.height,
            self.output.width,
            self.output.height,
            self.input.pixel_count(),
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for diag in &self.stages {
            let name = diag.stage.name();
            if !diag.applied {
                lines.push(format!("{name:<24} {:>10} {:>10}  skipped", "-", "-"));
                continue;
            }
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format!("{}x{}", diag.output.width, diag.output.height);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Stages applied: {} of {}",
            self.applied_count(),
            self.stages.len(),
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> PipelineDiagnostics {
        PipelineDiagnostics {
            input: Dimensions::new(100, 50),
            output: Dimensions::new(50, 100),
            stages: vec![
                StageDiagnostics {
                    stage: Stage::Brightness,
                    applied: true,
                    duration: Duration::from_millis(250),
                    output: Dimensions::new(100, 50),
                },
                StageDiagnostics {
                    stage: Stage::Blur,
                    applied: false,
                    duration: Duration::ZERO,
                    output: Dimensions::new(100, 50),
                },
                StageDiagnostics {
                    stage: Stage::Rotation,
                    applied: true,
                    duration: Duration::from_millis(500),
                    output: Dimensions::new(50, 100),
                },
            ],
            total_duration: Duration::from_millis(750),
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn report_lists_applied_and_skipped_stages() {
        let report = sample().report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("100x50 -> 50x100"));
        assert!(report.contains("Brightness"));
        assert!(report.contains("skipped"));
        assert!(report.contains("Stages applied: 2 of 3"));
    }

    #[test]
    fn json_round_trip_uses_fractional_seconds() {
        let diag = sample();
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["total_duration"], serde_json::json!(0.75));
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back, diag);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<PipelineDiagnostics>(json).is_err());
    }
}
