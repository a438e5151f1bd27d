//! Per-chunk signal metrics
//!
//! Pure measurement primitives over a single fixed-length chunk of mono
//! samples. Everything here is stateless; the windowing and scanning
//! policies live in [`super::windows`] and [`super::cliffs`].
//!
//! # Metrics
//!
//! - **RMS level (dB)**: `20·log10(sqrt(mean(x²)))`, floored at -100 dB so
//!   digital silence never produces -infinity.
//! - **Loudness proxy (dB)**: RMS level with a fixed -0.5 dB offset standing
//!   in for perceptual K-weighting. This is NOT ITU BS.1770 loudness
//!   metering; real LUFS needs a two-stage K-weighting filter. It is a
//!   diagnostic heuristic, close enough to triage renders.
//! - **Spectral centroid (Hz)**: energy-weighted mean frequency of the
//!   Hann-windowed magnitude spectrum; a brightness indicator.
//! - **Spectral flux**: sum of positive bin-to-bin differences between two
//!   peak-normalized spectra; a novelty indicator that spikes on hard cuts.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Below this linear RMS a chunk is treated as digital silence.
pub const RMS_EPSILON: f64 = 1e-10;

/// Floor returned instead of -infinity for silent chunks.
pub const RMS_FLOOR_DB: f64 = -100.0;

/// Fixed offset approximating K-weighting for typical content.
const LUFS_PROXY_OFFSET_DB: f64 = 0.5;

/// Chunks shorter than this have too little resolution for a centroid.
const MIN_CENTROID_SAMPLES: usize = 512;

/// Linear RMS of a chunk; 0.0 for empty input.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// RMS in dB relative to full scale, floored at -100 dB.
pub fn rms_db(samples: &[f32]) -> f64 {
    let rms = rms(samples);
    if rms < RMS_EPSILON {
        return RMS_FLOOR_DB;
    }
    20.0 * rms.log10()
}

/// Approximate loudness in dB, floored at -100 dB.
///
/// Same RMS computation as [`rms_db`] with a fixed -0.5 dB offset. See the
/// module docs for why this is a proxy and not real loudness metering.
pub fn lufs_proxy_db(samples: &[f32]) -> f64 {
    let rms = rms(samples);
    if rms < RMS_EPSILON {
        return RMS_FLOOR_DB;
    }
    20.0 * rms.log10() - LUFS_PROXY_OFFSET_DB
}

/// Hann window coefficients.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Planned FFT plus precomputed Hann window for one chunk length.
///
/// Planning an FFT is not free, and the partitioner feeds every window of a
/// track through the same transform, so the plan is built once per run.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    chunk_len: usize,
}

impl SpectrumAnalyzer {
    pub fn new(chunk_len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(chunk_len),
            window: hann_window(chunk_len),
            chunk_len,
        }
    }

    /// Magnitude spectrum of a Hann-windowed chunk.
    ///
    /// Returns `chunk_len / 2 + 1` bins (DC through Nyquist). The chunk
    /// must match the length this analyzer was planned for.
    pub fn magnitudes(&self, chunk: &[f32]) -> Vec<f64> {
        debug_assert_eq!(chunk.len(), self.chunk_len);

        let mut buffer: Vec<Complex<f64>> = chunk
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        buffer
            .iter()
            .take(self.chunk_len / 2 + 1)
            .map(|c| c.norm())
            .collect()
    }
}

/// Spectral centroid in Hz from a magnitude spectrum.
///
/// Returns 0.0 when the chunk was shorter than 512 samples or the spectrum
/// carries no measurable energy.
pub fn spectral_centroid(magnitudes: &[f64], chunk_len: usize, sample_rate: u32) -> f64 {
    if chunk_len < MIN_CENTROID_SAMPLES {
        return 0.0;
    }

    let total: f64 = magnitudes.iter().sum();
    if total < RMS_EPSILON {
        return 0.0;
    }

    let bin_hz = sample_rate as f64 / chunk_len as f64;
    let weighted: f64 = magnitudes
        .iter()
        .enumerate()
        .map(|(k, &mag)| k as f64 * bin_hz * mag)
        .sum();

    weighted / total
}

/// Normalize a magnitude spectrum by its own peak.
pub fn normalize_spectrum(magnitudes: &[f64]) -> Vec<f64> {
    let peak = magnitudes.iter().cloned().fold(0.0f64, f64::max);
    magnitudes.iter().map(|&m| m / (peak + RMS_EPSILON)).collect()
}

/// Spectral flux: sum of positive differences between normalized spectra.
///
/// Returns 0.0 when there is no previous spectrum (first window) or the
/// spectrum lengths do not match.
pub fn spectral_flux(prev: Option<&[f64]>, curr: &[f64]) -> f64 {
    let prev = match prev {
        Some(p) if p.len() == curr.len() => p,
        _ => return 0.0,
    };

    curr.iter()
        .zip(prev.iter())
        .map(|(&c, &p)| (c - p).max(0.0))
        .sum()
}
