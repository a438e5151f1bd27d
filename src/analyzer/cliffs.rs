//! Sudden energy-drop detection
//!
//! A render that loses its signal chain mid-track (a muted bus, a crashed
//! synth voice, a truncated bounce) shows up as an energy cliff: one moment
//! the track is playing, the next it has collapsed by tens of dB. The
//! 3-second analysis windows are far too coarse to localize that, so this
//! scan runs independently at 100 ms resolution.
//!
//! Sub-windows advance by half their length and each one's RMS is compared
//! against the previous sub-window's. The carried state is that single RMS
//! value, reset at scan start. A collapse all the way to digital silence is
//! reported as a fixed 100 dB drop; computing it through the log ratio
//! would produce a near-infinite number that says nothing more.

use super::metrics;
use super::round_places;
use crate::decode::AudioBuffer;

/// Sub-window length in milliseconds.
const SUB_WINDOW_MS: usize = 100;

/// Previous sub-windows quieter than this cannot be a cliff's leading edge.
const PREV_RMS_FLOOR: f64 = 1e-8;

/// Current-RMS level treated as total collapse.
const COLLAPSE_RMS: f64 = 1e-10;

/// Reported drop for a total collapse, and the cap for computed drops.
const DROP_CAP_DB: f64 = 100.0;

/// A detected energy cliff.
#[derive(Debug, Clone, PartialEq)]
pub struct Cliff {
    /// Start of the earlier sub-window of the pair, in seconds.
    pub time: f64,
    /// Drop magnitude in dB, capped at 100.
    pub drop_db: f64,
}

/// Scan the buffer for RMS drops exceeding `threshold_db` between adjacent
/// sub-windows.
pub fn detect(buffer: &AudioBuffer, threshold_db: f64) -> Vec<Cliff> {
    let sub_samples = buffer.sample_rate as usize * SUB_WINDOW_MS / 1000;
    let hop = sub_samples / 2;
    if hop == 0 {
        return Vec::new();
    }

    let sr = buffer.sample_rate as f64;
    let mut cliffs = Vec::new();
    let mut prev_rms: Option<f64> = None;

    let mut i = 0;
    while i + sub_samples < buffer.samples.len() {
        let curr_rms = metrics::rms(&buffer.samples[i..i + sub_samples]);

        if let Some(prev) = prev_rms {
            if prev > PREV_RMS_FLOOR {
                let drop = if curr_rms < COLLAPSE_RMS {
                    DROP_CAP_DB
                } else {
                    (20.0 * (prev / curr_rms).log10()).min(DROP_CAP_DB)
                };

                if drop > threshold_db {
                    cliffs.push(Cliff {
                        time: round_places((i - hop) as f64 / sr, 2),
                        drop_db: round_places(drop, 1),
                    });
                }
            }
        }

        prev_rms = Some(curr_rms);
        i += hop;
    }

    cliffs
}
