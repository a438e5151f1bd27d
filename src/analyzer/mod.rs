//! Core analysis engine
//!
//! Orchestrates one diagnostic run over a decoded track:
//!
//! 1. [`windows`] tiles the buffer into fixed-size windows and computes
//!    per-window metrics via [`metrics`]
//! 2. [`cliffs`] independently scans the same buffer at 100 ms resolution
//!    for sudden energy drops
//! 3. [`anomalies`] merges both into one time-sorted anomaly list
//! 4. [`crate::report`] folds everything into the final report
//!
//! Data flows strictly one way; the scans share nothing but read-only
//! access to the buffer. A run either fails at the decode boundary or
//! produces a complete report, even a boring one.

pub mod anomalies;
pub mod cliffs;
pub mod metrics;
pub mod windows;

use crate::decode::{self, AudioBuffer, DecodeError};
use crate::report::{self, RenderReport};
use std::path::Path;
use thiserror::Error;

/// Errors from a full analysis run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid window size: {seconds}s (must be a positive number)")]
    InvalidWindowSize { seconds: f64 },
}

/// Configured analysis engine.
///
/// All knobs are independent; the thresholds are plain dB deltas with no
/// cross-validation. Two runs with the same configuration over the same
/// buffer produce identical reports.
///
/// # Example
///
/// ```no_run
/// use renderlint::Analyzer;
///
/// let analyzer = Analyzer::new().with_window_sec(1.5);
/// let report = analyzer.analyze("render.wav")?;
/// println!("{} anomalies", report.summary.anomaly_count);
/// # Ok::<(), renderlint::AnalyzeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    /// Analysis window size in seconds.
    pub window_sec: f64,
    /// Windows with RMS below this are silent.
    pub silence_threshold_db: f64,
    /// Minimum sub-window RMS drop reported as a cliff.
    pub cliff_threshold_db: f64,
    /// Flux above this flags a spectral discontinuity.
    pub flux_threshold: f64,
    /// Cliff drops above this are critical instead of warnings.
    pub critical_drop_db: f64,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            window_sec: 3.0,
            silence_threshold_db: -50.0,
            cliff_threshold_db: 20.0,
            flux_threshold: anomalies::DEFAULT_FLUX_THRESHOLD,
            critical_drop_db: anomalies::DEFAULT_CRITICAL_DROP_DB,
        }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_sec(mut self, seconds: f64) -> Self {
        self.window_sec = seconds;
        self
    }

    pub fn with_silence_threshold_db(mut self, db: f64) -> Self {
        self.silence_threshold_db = db;
        self
    }

    pub fn with_cliff_threshold_db(mut self, db: f64) -> Self {
        self.cliff_threshold_db = db;
        self
    }

    /// Decode a file via ffmpeg and analyze it.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<RenderReport, AnalyzeError> {
        self.validate()?;

        let path = path.as_ref();
        let buffer = decode::decode(path)?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(self.analyze_buffer(&buffer, &file))
    }

    /// Analyze an already-decoded buffer.
    ///
    /// Never fails: degenerate inputs (empty buffer, buffer shorter than a
    /// window or sub-window) produce a well-formed report with zero
    /// windows, cliffs, and anomalies.
    pub fn analyze_buffer(&self, buffer: &AudioBuffer, file: &str) -> RenderReport {
        let partition = windows::partition(buffer, self.window_sec, self.silence_threshold_db);
        let cliffs = cliffs::detect(buffer, self.cliff_threshold_db);
        let anomalies = anomalies::aggregate(
            &partition.windows,
            &cliffs,
            self.flux_threshold,
            self.critical_drop_db,
        );

        report::build(file, buffer, self.window_sec, partition, cliffs.len(), anomalies)
    }

    fn validate(&self) -> Result<(), AnalyzeError> {
        if !self.window_sec.is_finite() || self.window_sec <= 0.0 {
            return Err(AnalyzeError::InvalidWindowSize {
                seconds: self.window_sec,
            });
        }
        Ok(())
    }
}

/// Round to a fixed number of decimal places for reporting.
pub(crate) fn round_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
