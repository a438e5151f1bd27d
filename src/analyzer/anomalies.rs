//! Anomaly model and aggregation
//!
//! Three independent detectors feed one report: silent windows, windows
//! with high spectral flux, and energy cliffs. This module folds them into
//! a single list of [`Anomaly`] records sorted by non-decreasing time, the
//! one ordering guarantee the report makes.
//!
//! Anomaly kinds are a closed enum carrying their evidence as payload, so
//! the merge step is exhaustive and the JSON detail strings are generated
//! in exactly one place.

use super::cliffs::Cliff;
use super::windows::WindowMetrics;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Windows whose spectral flux exceeds this are flagged as discontinuities.
/// Heuristic default; not calibrated against any ground truth.
pub const DEFAULT_FLUX_THRESHOLD: f64 = 0.8;

/// Cliffs dropping more than this are critical rather than warnings.
/// Heuristic default; not calibrated against any ground truth.
pub const DEFAULT_CRITICAL_DROP_DB: f64 = 40.0;

/// How bad an anomaly is: `warning` is notable, `critical` is a likely
/// render defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// What was detected, with the evidence that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub enum AnomalyKind {
    Silence { window: usize, rms_db: f64 },
    SpectralDiscontinuity { flux: f64 },
    SpectralCliff { drop_db: f64 },
}

impl AnomalyKind {
    /// Stable type tag used in the JSON report.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::Silence { .. } => "silence",
            AnomalyKind::SpectralDiscontinuity { .. } => "spectral_discontinuity",
            AnomalyKind::SpectralCliff { .. } => "spectral_cliff",
        }
    }

    /// Human-readable description for the report.
    pub fn detail(&self) -> String {
        match self {
            AnomalyKind::Silence { window, rms_db } => {
                format!("Window {} is silent (RMS {:.1} dB)", window, rms_db)
            }
            AnomalyKind::SpectralDiscontinuity { flux } => {
                format!("High spectral flux ({:.3}) - possible hard cut", flux)
            }
            AnomalyKind::SpectralCliff { drop_db } => {
                format!("Energy drop of {:.1} dB", drop_db)
            }
        }
    }
}

/// One timestamped finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub time: f64,
    pub severity: Severity,
    pub kind: AnomalyKind,
}

// Serialized flat as {time, type, severity, detail} for the report schema.
impl Serialize for Anomaly {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Anomaly", 4)?;
        s.serialize_field("time", &self.time)?;
        s.serialize_field("type", self.kind.label())?;
        s.serialize_field("severity", &self.severity)?;
        s.serialize_field("detail", &self.kind.detail())?;
        s.end()
    }
}

/// Merge window findings and cliffs into one time-ordered anomaly list.
///
/// The sort is stable over insertion order, so anomalies sharing a
/// timestamp keep a fixed relative order: window-derived findings (in
/// window order, silence before discontinuity within a window) ahead of
/// cliffs.
pub fn aggregate(
    windows: &[WindowMetrics],
    cliffs: &[Cliff],
    flux_threshold: f64,
    critical_drop_db: f64,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for w in windows {
        if w.silent {
            anomalies.push(Anomaly {
                time: w.time_start,
                severity: Severity::Critical,
                kind: AnomalyKind::Silence {
                    window: w.window,
                    rms_db: w.rms_db,
                },
            });
        }
        if w.spectral_flux > flux_threshold {
            anomalies.push(Anomaly {
                time: w.time_start,
                severity: Severity::Warning,
                kind: AnomalyKind::SpectralDiscontinuity {
                    flux: w.spectral_flux,
                },
            });
        }
    }

    for cliff in cliffs {
        let severity = if cliff.drop_db > critical_drop_db {
            Severity::Critical
        } else {
            Severity::Warning
        };
        anomalies.push(Anomaly {
            time: cliff.time,
            severity,
            kind: AnomalyKind::SpectralCliff {
                drop_db: cliff.drop_db,
            },
        });
    }

    anomalies.sort_by(|a, b| a.time.total_cmp(&b.time));
    anomalies
}
