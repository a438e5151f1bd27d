//! Audio decoding via an external ffmpeg process
//!
//! Rendered tracks arrive in whatever container the render pipeline emits
//! (WAV, MP3, FLAC, OGG, ...). Rather than carrying a decoder for every
//! codec, we shell out to ffmpeg and ask it for the one thing the analysis
//! engine understands: mono 32-bit float PCM at a fixed sample rate.
//!
//! ```text
//! ffmpeg -hide_banner -i <input> -ac 1 -ar 44100 -f f32le -
//! ```
//!
//! The decode step is the only part of a run that is allowed to fail. A
//! missing binary, a non-zero exit, or a hung process all abort the run
//! with a [`DecodeError`] carrying ffmpeg's own diagnostics (truncated to
//! a readable length). Nothing here is retried; an unreliable decoder is
//! the pipeline's problem, not ours.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Sample rate all inputs are resampled to before analysis.
pub const DECODE_SAMPLE_RATE: u32 = 44100;

/// Hard ceiling on how long a single ffmpeg invocation may run.
const DECODE_TIMEOUT: Duration = Duration::from_secs(60);

/// How much of ffmpeg's stderr is kept in an error message.
const STDERR_LIMIT: usize = 200;

/// Errors from the external decode boundary.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ffmpeg failed: {stderr}")]
    FfmpegFailed { stderr: String },

    #[error("ffmpeg timed out after {seconds}s decoding {path}")]
    Timeout { path: String, seconds: u64 },

    #[error("decoded no audio from {path}")]
    EmptyOutput { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully decoded mono track, immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Track length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode any audio file to mono f32 PCM via ffmpeg.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, DecodeError> {
    let path = path.as_ref();

    let mut child = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-i")
        .arg(path)
        .args(["-ac", "1"])
        .args(["-ar", &DECODE_SAMPLE_RATE.to_string()])
        .args(["-f", "f32le", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DecodeError::FfmpegNotFound
            } else {
                DecodeError::Io(e)
            }
        })?;

    // Drain both pipes on their own threads so ffmpeg can never block on a
    // full pipe while we wait for it to exit.
    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        DecodeError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "ffmpeg stdout unavailable",
        ))
    })?;
    let stdout_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).map(|_| buf)
    });

    let mut stderr_pipe = child.stderr.take();
    let stderr_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(ref mut pipe) = stderr_pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        buf
    });

    // Bounded synchronous wait: poll for exit, kill on deadline.
    let deadline = Instant::now() + DECODE_TIMEOUT;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if Instant::now() >= deadline {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(DecodeError::Timeout {
                        path: path.display().to_string(),
                        seconds: DECODE_TIMEOUT.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(25));
            }
        }
    };

    let stdout = stdout_thread
        .join()
        .ok()
        .and_then(|r| r.ok())
        .unwrap_or_default();
    let stderr = stderr_thread.join().ok().unwrap_or_default();

    if !status.success() {
        return Err(DecodeError::FfmpegFailed {
            stderr: truncate_diagnostic(&String::from_utf8_lossy(&stderr)),
        });
    }

    let samples: Vec<f32> = stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if samples.is_empty() {
        return Err(DecodeError::EmptyOutput {
            path: path.display().to_string(),
        });
    }

    Ok(AudioBuffer::new(samples, DECODE_SAMPLE_RATE))
}

/// Keep error text readable: first `STDERR_LIMIT` characters, no newlines.
fn truncate_diagnostic(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let trimmed = flat.trim();
    match trimmed.char_indices().nth(STDERR_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
