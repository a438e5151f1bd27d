//! Report assembly and serialization
//!
//! The last stage of a run: fold the window list, cliff count, and anomaly
//! list into a single [`RenderReport`] with summary aggregates, and write
//! it out as JSON for the rendering pipeline to consume.
//!
//! A report is built once per run and read-only afterwards. A successful
//! run always yields a complete, internally consistent report, even when
//! the track is empty or nothing was flagged.

use crate::analyzer::anomalies::Anomaly;
use crate::analyzer::metrics::{RMS_EPSILON, RMS_FLOOR_DB};
use crate::analyzer::round_places;
use crate::analyzer::windows::{Partition, WindowMetrics};
use crate::decode::AudioBuffer;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Summary aggregates over one analyzed track.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Approximate integrated loudness over non-silent windows. A proxy,
    /// not broadcast-standard metering.
    pub integrated_lufs_proxy: f64,
    pub total_silence_sec: f64,
    pub silence_pct: f64,
    pub cliff_count: usize,
    pub anomaly_count: usize,
    pub window_count: usize,
    pub window_sec: f64,
}

/// The full diagnostic report for one rendered track.
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub file: String,
    pub duration_sec: f64,
    pub sample_rate: u32,
    pub summary: Summary,
    pub anomalies: Vec<Anomaly>,
    pub windows: Vec<WindowMetrics>,
}

/// Assemble the final report from the analysis outputs.
pub fn build(
    file: &str,
    buffer: &AudioBuffer,
    window_sec: f64,
    partition: Partition,
    cliff_count: usize,
    anomalies: Vec<Anomaly>,
) -> RenderReport {
    let duration = buffer.duration_sec();
    let silence_pct = if duration > 0.0 {
        round_places(100.0 * partition.total_silence_sec / duration, 1)
    } else {
        0.0
    };

    RenderReport {
        file: file.to_string(),
        duration_sec: round_places(duration, 2),
        sample_rate: buffer.sample_rate,
        summary: Summary {
            integrated_lufs_proxy: integrated_lufs_proxy(&partition.windows),
            total_silence_sec: round_places(partition.total_silence_sec, 2),
            silence_pct,
            cliff_count,
            anomaly_count: anomalies.len(),
            window_count: partition.windows.len(),
            window_sec,
        },
        anomalies,
        windows: partition.windows,
    }
}

/// Integrated loudness proxy over all non-silent windows.
///
/// Window RMS levels go back to linear amplitude, get RMS-averaged, and
/// return to dB with the same -0.5 dB proxy offset. With no non-silent
/// windows (all-silent track, empty buffer) this is the -100 dB floor.
fn integrated_lufs_proxy(windows: &[WindowMetrics]) -> f64 {
    let linear: Vec<f64> = windows
        .iter()
        .filter(|w| !w.silent)
        .map(|w| 10f64.powf(w.rms_db / 20.0))
        .collect();

    if linear.is_empty() {
        return RMS_FLOOR_DB;
    }

    let mean_sq = linear.iter().map(|r| r * r).sum::<f64>() / linear.len() as f64;
    let integrated_rms = mean_sq.sqrt();

    if integrated_rms < RMS_EPSILON {
        return RMS_FLOOR_DB;
    }
    round_places(20.0 * integrated_rms.log10() - 0.5, 1)
}

/// Write reports as pretty JSON: a single object for one track, an array
/// for a batch.
pub fn generate<P: AsRef<Path>>(path: P, reports: &[RenderReport]) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    match reports {
        [single] => serde_json::to_writer_pretty(file, single)?,
        many => serde_json::to_writer_pretty(file, many)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(index: usize, rms_db: f64, silent: bool) -> WindowMetrics {
        WindowMetrics {
            window: index,
            time_start: index as f64 * 3.0,
            time_end: (index + 1) as f64 * 3.0,
            rms_db,
            lufs_proxy: rms_db - 0.5,
            centroid_hz: 1000.0,
            spectral_flux: 0.0,
            silent,
        }
    }

    fn partition_of(windows: Vec<WindowMetrics>, total_silence_sec: f64) -> Partition {
        Partition {
            windows,
            total_silence_sec,
        }
    }

    // ==========================================================================
    // INTEGRATED LOUDNESS PROXY TESTS
    // ==========================================================================
    //
    // The proxy RMS-averages the linear amplitudes of non-silent windows
    // and converts back to dB with the -0.5 offset. Silent windows are
    // excluded so a half-silent track is not reported as quiet overall.
    // ==========================================================================

    #[test]
    fn test_integrated_uniform_windows() {
        // All windows at -6.0 dB: integrated is -6.0 - 0.5
        let windows = vec![window(0, -6.0, false), window(1, -6.0, false)];
        assert_eq!(integrated_lufs_proxy(&windows), -6.5);
    }

    #[test]
    fn test_integrated_ignores_silent_windows() {
        let windows = vec![
            window(0, -6.0, false),
            window(1, -100.0, true),
            window(2, -6.0, false),
        ];
        assert_eq!(integrated_lufs_proxy(&windows), -6.5);
    }

    #[test]
    fn test_integrated_no_windows_is_floor() {
        assert_eq!(integrated_lufs_proxy(&[]), -100.0);
    }

    #[test]
    fn test_integrated_all_silent_is_floor() {
        let windows = vec![window(0, -100.0, true), window(1, -100.0, true)];
        assert_eq!(integrated_lufs_proxy(&windows), -100.0);
    }

    #[test]
    fn test_integrated_mixed_levels_between_extremes() {
        let windows = vec![window(0, -6.0, false), window(1, -20.0, false)];
        let proxy = integrated_lufs_proxy(&windows);
        // RMS averaging sits between the quiet and loud windows, closer to
        // the loud one
        assert!(proxy > -20.5 && proxy < -6.5, "got {}", proxy);
        assert!(proxy < -8.0, "RMS average should not equal the loud window");
    }

    // ==========================================================================
    // REPORT ASSEMBLY TESTS
    // ==========================================================================

    const SR: u32 = 44100;

    #[test]
    fn test_build_summary_counts() {
        let buffer = AudioBuffer::new(vec![0.5f32; 6 * SR as usize], SR);
        let partition = partition_of(vec![window(0, -6.0, false), window(1, -6.0, false)], 0.0);

        let report = build("track.wav", &buffer, 3.0, partition, 2, Vec::new());

        assert_eq!(report.file, "track.wav");
        assert_eq!(report.duration_sec, 6.0);
        assert_eq!(report.sample_rate, SR);
        assert_eq!(report.summary.window_count, 2);
        assert_eq!(report.summary.cliff_count, 2);
        assert_eq!(report.summary.anomaly_count, 0);
        assert_eq!(report.summary.window_sec, 3.0);
    }

    #[test]
    fn test_build_silence_percentage() {
        let buffer = AudioBuffer::new(vec![0.0f32; 10 * SR as usize], SR);
        let partition = partition_of(vec![window(0, -100.0, true)], 2.5);

        let report = build("track.wav", &buffer, 3.0, partition, 0, Vec::new());
        assert_eq!(report.summary.total_silence_sec, 2.5);
        assert_eq!(report.summary.silence_pct, 25.0);
    }

    #[test]
    fn test_build_zero_duration_has_zero_pct() {
        let buffer = AudioBuffer::new(vec![], SR);
        let partition = partition_of(Vec::new(), 0.0);

        let report = build("empty.wav", &buffer, 3.0, partition, 0, Vec::new());
        assert_eq!(report.summary.silence_pct, 0.0);
        assert_eq!(report.duration_sec, 0.0);
    }

    // ==========================================================================
    // JSON SCHEMA TESTS
    // ==========================================================================

    #[test]
    fn test_report_serializes_expected_shape() {
        let buffer = AudioBuffer::new(vec![0.5f32; 3 * SR as usize], SR);
        let partition = partition_of(vec![window(0, -6.0, false)], 0.0);
        let report = build("track.wav", &buffer, 3.0, partition, 0, Vec::new());

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["file"], "track.wav");
        assert_eq!(json["sample_rate"], 44100);
        assert!(json["summary"]["integrated_lufs_proxy"].is_number());
        assert!(json["summary"]["window_count"].is_number());
        assert!(json["anomalies"].is_array());
        assert!(json["windows"].is_array());

        let w = &json["windows"][0];
        for key in [
            "window",
            "time_start",
            "time_end",
            "rms_db",
            "lufs_proxy",
            "centroid_hz",
            "spectral_flux",
            "silent",
        ] {
            assert!(!w[key].is_null(), "missing window field {}", key);
        }
    }

    #[test]
    fn test_generate_single_report_writes_object() {
        let buffer = AudioBuffer::new(vec![0.5f32; 3 * SR as usize], SR);
        let partition = partition_of(vec![window(0, -6.0, false)], 0.0);
        let report = build("track.wav", &buffer, 3.0, partition, 0, Vec::new());

        let dir = std::env::temp_dir().join("renderlint-test-single");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");
        generate(&path, std::slice::from_ref(&report)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.is_object());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_generate_batch_writes_array() {
        let buffer = AudioBuffer::new(vec![0.5f32; 3 * SR as usize], SR);
        let reports: Vec<RenderReport> = (0..2)
            .map(|i| {
                build(
                    &format!("track{}.wav", i),
                    &buffer,
                    3.0,
                    partition_of(vec![window(0, -6.0, false)], 0.0),
                    0,
                    Vec::new(),
                )
            })
            .collect();

        let dir = std::env::temp_dir().join("renderlint-test-batch");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");
        generate(&path, &reports).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
        std::fs::remove_dir_all(&dir).ok();
    }
}
