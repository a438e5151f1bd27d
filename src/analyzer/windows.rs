//! Windowed partitioning of a decoded track
//!
//! Tiles the buffer into consecutive equal-length analysis windows and runs
//! the metric kernel over each one. The window grid is deterministic:
//! `ceil(total_samples / window_samples)` windows, the final one zero-padded
//! to full length so every chunk the FFT sees has the same size. Reported
//! times are clamped to the real end of the track, and silence accounting
//! uses the unpadded sample counts.
//!
//! The only state carried across windows is the previous window's
//! peak-normalized spectrum, threaded explicitly through the loop for the
//! flux computation. Each window's metrics are otherwise independent.

use super::metrics::{self, SpectrumAnalyzer};
use super::round_places;
use crate::decode::AudioBuffer;
use serde::Serialize;

/// Raw windows shorter than this are a degenerate tail and are skipped.
const MIN_WINDOW_SAMPLES: usize = 256;

/// Metrics for one analysis window. Created once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct WindowMetrics {
    /// 0-based position in the window grid.
    pub window: usize,
    pub time_start: f64,
    /// Clamped to the actual end of the track for the padded final window.
    pub time_end: f64,
    pub rms_db: f64,
    pub lufs_proxy: f64,
    pub centroid_hz: f64,
    pub spectral_flux: f64,
    pub silent: bool,
}

/// Output of one partition pass.
#[derive(Debug, Clone)]
pub struct Partition {
    pub windows: Vec<WindowMetrics>,
    pub total_silence_sec: f64,
}

/// Tile the buffer into windows and compute per-window metrics.
pub fn partition(buffer: &AudioBuffer, window_sec: f64, silence_threshold_db: f64) -> Partition {
    let sr = buffer.sample_rate as f64;
    let total = buffer.samples.len();
    if total == 0 {
        return Partition {
            windows: Vec::new(),
            total_silence_sec: 0.0,
        };
    }

    let window_samples = ((window_sec * sr).round() as usize).max(1);
    let num_windows = (total - 1) / window_samples + 1;

    let analyzer = SpectrumAnalyzer::new(window_samples);
    let mut prev_spectrum: Option<Vec<f64>> = None;
    let mut windows = Vec::with_capacity(num_windows);
    let mut total_silence_sec = 0.0;

    for w in 0..num_windows {
        let start = w * window_samples;
        let end = (start + window_samples).min(total);
        let raw = &buffer.samples[start..end];

        if raw.len() < MIN_WINDOW_SAMPLES {
            continue;
        }

        // Pad the short final window; metrics see the padded chunk
        let padded;
        let chunk: &[f32] = if raw.len() < window_samples {
            padded = {
                let mut v = raw.to_vec();
                v.resize(window_samples, 0.0);
                v
            };
            &padded
        } else {
            raw
        };

        let rms_db = metrics::rms_db(chunk);
        let lufs = metrics::lufs_proxy_db(chunk);

        let magnitudes = analyzer.magnitudes(chunk);
        let centroid = metrics::spectral_centroid(&magnitudes, chunk.len(), buffer.sample_rate);
        let normalized = metrics::normalize_spectrum(&magnitudes);
        let flux = metrics::spectral_flux(prev_spectrum.as_deref(), &normalized);
        prev_spectrum = Some(normalized);

        let silent = rms_db < silence_threshold_db;
        if silent {
            // Actual length, not the padded length
            total_silence_sec += raw.len() as f64 / sr;
        }

        windows.push(WindowMetrics {
            window: w,
            time_start: round_places(start as f64 / sr, 2),
            time_end: round_places(end as f64 / sr, 2),
            rms_db: round_places(rms_db, 1),
            lufs_proxy: round_places(lufs, 1),
            centroid_hz: round_places(centroid, 1),
            spectral_flux: round_places(flux, 4),
            silent,
        });
    }

    Partition {
        windows,
        total_silence_sec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn buffer_of(seconds: f64, amplitude: f32) -> AudioBuffer {
        let len = (seconds * SR as f64).round() as usize;
        AudioBuffer::new(vec![amplitude; len], SR)
    }

    // ==========================================================================
    // WINDOW GRID TESTS
    // ==========================================================================
    //
    // For a buffer of duration D and window size W there are ceil(D / W)
    // windows, and their time ranges tile [0, D] with no gaps or overlaps.
    // Only the final window may be short (and is zero-padded internally).
    // ==========================================================================

    #[test]
    fn test_exact_tiling() {
        let result = partition(&buffer_of(9.0, 0.5), 3.0, -50.0);
        assert_eq!(result.windows.len(), 3);

        let expected = [(0.0, 3.0), (3.0, 6.0), (6.0, 9.0)];
        for (w, &(start, end)) in result.windows.iter().zip(expected.iter()) {
            assert_eq!(w.time_start, start);
            assert_eq!(w.time_end, end);
        }
    }

    #[test]
    fn test_windows_tile_without_gaps() {
        let result = partition(&buffer_of(10.0, 0.5), 3.0, -50.0);
        assert_eq!(result.windows.len(), 4); // ceil(10 / 3)

        for pair in result.windows.windows(2) {
            assert_eq!(pair[0].time_end, pair[1].time_start);
        }
    }

    #[test]
    fn test_final_window_time_end_clamped() {
        // 7s track, 3s windows: final window covers [6.0, 7.0], not [6.0, 9.0]
        let result = partition(&buffer_of(7.0, 0.5), 3.0, -50.0);
        let last = result.windows.last().unwrap();
        assert_eq!(last.time_end, 7.0);
    }

    #[test]
    fn test_degenerate_tail_skipped() {
        // 3s plus 100 samples: the 100-sample tail is below the 256 minimum
        let mut samples = vec![0.5f32; 3 * SR as usize];
        samples.extend(vec![0.5f32; 100]);
        let result = partition(&AudioBuffer::new(samples, SR), 3.0, -50.0);
        assert_eq!(result.windows.len(), 1);
    }

    #[test]
    fn test_empty_buffer_yields_no_windows() {
        let result = partition(&AudioBuffer::new(vec![], SR), 3.0, -50.0);
        assert!(result.windows.is_empty());
        assert_eq!(result.total_silence_sec, 0.0);
    }

    #[test]
    fn test_window_indices_are_grid_positions() {
        let result = partition(&buffer_of(9.0, 0.5), 3.0, -50.0);
        let indices: Vec<usize> = result.windows.iter().map(|w| w.window).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    // ==========================================================================
    // SILENCE ACCOUNTING TESTS
    // ==========================================================================
    //
    // A window is silent iff its (unrounded) RMS dB falls below the
    // configured threshold. Silence seconds accumulate from the actual
    // unpadded sample counts, so a short silent tail contributes its real
    // duration, not a full window.
    // ==========================================================================

    #[test]
    fn test_all_silence() {
        let result = partition(&buffer_of(9.0, 0.0), 3.0, -50.0);
        assert_eq!(result.windows.len(), 3);
        assert!(result.windows.iter().all(|w| w.silent));
        assert!((result.total_silence_sec - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_loud_track_has_no_silence() {
        let result = partition(&buffer_of(9.0, 0.5), 3.0, -50.0);
        assert!(result.windows.iter().all(|w| !w.silent));
        assert_eq!(result.total_silence_sec, 0.0);
    }

    #[test]
    fn test_silent_tail_counts_unpadded_duration() {
        // 4.5s of silence, 3s windows: 3.0 + 1.5, not 3.0 + 3.0
        let result = partition(&buffer_of(4.5, 0.0), 3.0, -50.0);
        assert_eq!(result.windows.len(), 2);
        assert!((result.total_silence_sec - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_below_floor_never_silent() {
        // The RMS floor is -100 dB; a threshold below it can never trigger
        let result = partition(&buffer_of(6.0, 0.0), 3.0, -101.0);
        assert!(result.windows.iter().all(|w| !w.silent));
        assert_eq!(result.total_silence_sec, 0.0);
    }

    #[test]
    fn test_threshold_above_all_levels_always_silent() {
        let result = partition(&buffer_of(6.0, 0.9), 3.0, 10.0);
        assert!(result.windows.iter().all(|w| w.silent));
        assert!((result.total_silence_sec - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_silence_never_exceeds_duration() {
        let buf = buffer_of(7.0, 0.0);
        let result = partition(&buf, 3.0, -50.0);
        assert!(result.total_silence_sec <= buf.duration_sec() + 1e-9);
    }

    // ==========================================================================
    // METRIC WIRING TESTS
    // ==========================================================================

    #[test]
    fn test_first_window_flux_is_zero() {
        let result = partition(&buffer_of(9.0, 0.5), 3.0, -50.0);
        assert_eq!(result.windows[0].spectral_flux, 0.0);
    }

    #[test]
    fn test_flux_is_never_negative() {
        let mut samples = vec![0.0f32; 3 * SR as usize];
        samples.extend(vec![0.8f32; 3 * SR as usize]);
        let result = partition(&AudioBuffer::new(samples, SR), 3.0, -50.0);
        assert!(result.windows.iter().all(|w| w.spectral_flux >= 0.0));
    }

    #[test]
    fn test_silent_window_reports_floor_levels() {
        let result = partition(&buffer_of(3.0, 0.0), 3.0, -50.0);
        let w = &result.windows[0];
        assert_eq!(w.rms_db, -100.0);
        assert_eq!(w.lufs_proxy, -100.0);
        assert_eq!(w.centroid_hz, 0.0);
    }

    #[test]
    fn test_constant_level_reported_per_window() {
        let result = partition(&buffer_of(6.0, 0.5), 3.0, -50.0);
        for w in &result.windows {
            assert!((w.rms_db - (-6.0)).abs() < 0.1);
            assert!((w.lufs_proxy - (-6.5)).abs() < 0.1);
        }
    }
}
