//! Renderlint - Post-render audio diagnostics
//!
//! Renderlint analyzes rendered audio tracks and flags quality defects a
//! rendering pipeline cares about: stretches of silence, sudden energy
//! collapses ("cliffs"), and spectral discontinuities that usually mean a
//! hard cut or a dropped voice.
//!
//! # Overview
//!
//! Headless render farms produce audio nobody listens to before it ships.
//! A render can complete "successfully" and still be broken: a synth voice
//! that crashed halfway through, a bus that was muted during the bounce, a
//! buffer underrun that left a gap. Renderlint decodes the track to mono
//! PCM (via ffmpeg), walks it with fixed-size analysis windows, and emits
//! a machine-readable JSON report with per-window metrics and a
//! time-sorted anomaly list, so the pipeline gets a triage signal without
//! human ears.
//!
//! # Detection Methods
//!
//! 1. **Silence**: per-window RMS against a configurable threshold
//!    (default -50 dB). Silent windows are critical anomalies.
//!
//! 2. **Energy cliffs**: an independent 100 ms scan flags RMS drops above
//!    a threshold (default 20 dB) between adjacent sub-windows. A collapse
//!    all the way to digital zero reports a fixed 100 dB drop.
//!
//! 3. **Spectral discontinuities**: frame-to-frame spectral flux between
//!    windows; high flux (> 0.8) usually means a hard cut.
//!
//! # Quick Start
//!
//! ```no_run
//! use renderlint::Analyzer;
//!
//! let report = Analyzer::new().analyze("render.wav")?;
//!
//! println!("{}: {} anomalies in {:.1}s",
//!     report.file,
//!     report.summary.anomaly_count,
//!     report.duration_sec);
//!
//! for anomaly in &report.anomalies {
//!     println!("  {:>6.1}s  [{}] {}",
//!         anomaly.time,
//!         anomaly.kind.label(),
//!         anomaly.kind.detail());
//! }
//! # Ok::<(), renderlint::AnalyzeError>(())
//! ```
//!
//! # Report Contents
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `summary.integrated_lufs_proxy` | Approximate loudness over non-silent windows (NOT BS.1770) |
//! | `summary.total_silence_sec` | Seconds of silent windows |
//! | `summary.cliff_count` | Sudden energy drops detected |
//! | `anomalies` | Time-sorted findings with type, severity, detail |
//! | `windows` | Per-window RMS, loudness proxy, centroid, flux |
//!
//! # Modules
//!
//! - [`analyzer`]: Windowed metrics, cliff scan, anomaly aggregation
//! - [`decode`]: External ffmpeg decode boundary
//! - [`report`]: Report assembly and JSON output

pub mod analyzer;
pub mod decode;
pub mod report;

pub use analyzer::anomalies::{Anomaly, AnomalyKind, Severity};
pub use analyzer::cliffs::Cliff;
pub use analyzer::windows::WindowMetrics;
pub use analyzer::{AnalyzeError, Analyzer};
pub use decode::{AudioBuffer, DecodeError};
pub use report::{RenderReport, Summary};
