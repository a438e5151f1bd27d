use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use renderlint::{AnalyzeError, Analyzer, RenderReport, Severity};
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "renderlint")]
#[command(author, version, about = "Post-render audio diagnostics: silence, energy cliffs, spectral discontinuities")]
struct Args {
    /// Audio file or directory of renders to analyze
    path: PathBuf,

    /// Analysis window size in seconds
    #[arg(long, default_value = "3.0")]
    window: f64,

    /// Silence threshold in dB
    #[arg(long, default_value = "-50.0", allow_hyphen_values = true)]
    silence_threshold: f64,

    /// Cliff detection threshold in dB
    #[arg(long, default_value = "20.0", allow_hyphen_values = true)]
    cliff_threshold: f64,

    /// Print raw JSON to stdout instead of the human-readable report
    #[arg(long)]
    json: bool,

    /// Only show the summary lines
    #[arg(short, long)]
    quiet: bool,

    /// Output report file (.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "renderlint-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate a JSON report
    #[arg(long)]
    no_report: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() {
    let args = Args::parse();

    if !args.window.is_finite() || args.window <= 0.0 {
        eprintln!("Window size must be a positive number of seconds");
        std::process::exit(1);
    }

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    // Supported audio formats (anything ffmpeg can decode, in practice)
    let supported_extensions: std::collections::HashSet<&str> = [
        "flac", "wav", "wave", "aiff", "aif", "mp3", "m4a", "aac", "ogg", "opus",
    ]
    .iter()
    .cloned()
    .collect();

    // Collect audio files
    let files: Vec<PathBuf> = if args.path.is_dir() {
        WalkDir::new(&args.path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| supported_extensions.contains(ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!("No audio files found (supported: wav, flac, mp3, m4a, ogg, opus, aiff)");
        std::process::exit(1);
    }

    if !args.quiet && !args.json {
        eprintln!("\x1b[1mRenderlint - Post-Render Audio Diagnostics\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} audio file(s)\n", files.len());
    }

    // Set up progress bar
    let pb = if !args.quiet && !args.json && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Create analyzer
    let analyzer = Analyzer::new()
        .with_window_sec(args.window)
        .with_silence_threshold_db(args.silence_threshold)
        .with_cliff_threshold_db(args.cliff_threshold);

    // Analyze files in parallel
    let results: Vec<(PathBuf, Result<RenderReport, AnalyzeError>)> = files
        .par_iter()
        .map(|path| {
            let result = analyzer.analyze(path);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(path.display().to_string());
            }
            (path.clone(), result)
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let reports: Vec<&RenderReport> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
    let errors: Vec<(&PathBuf, &AnalyzeError)> = results
        .iter()
        .filter_map(|(p, r)| r.as_ref().err().map(|e| (p, e)))
        .collect();

    // Print results
    if args.json {
        let rendered = if reports.len() == 1 {
            serde_json::to_string_pretty(reports[0])
        } else {
            serde_json::to_string_pretty(&reports)
        };
        match rendered {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for report in &reports {
            print_report(report, args.quiet);
            println!();
        }
    }

    for (path, error) in &errors {
        eprintln!("\x1b[31m✗ {}\x1b[0m: {}", path.display(), error);
    }

    // Batch summary
    if !args.quiet && !args.json && files.len() > 1 {
        let clean = reports.iter().filter(|r| r.summary.anomaly_count == 0).count();
        let flagged = reports.len() - clean;

        eprintln!("{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Clean:\x1b[0m   {}", clean);
        eprintln!("  \x1b[33m! Flagged:\x1b[0m {}", flagged);
        if !errors.is_empty() {
            eprintln!("  \x1b[31m✗ Errors:\x1b[0m  {}", errors.len());
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report && !reports.is_empty() {
        // Auto-generate report
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("renderlint_report_{}.json", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        let owned: Vec<RenderReport> = reports.iter().map(|r| (*r).clone()).collect();
        if let Err(e) = renderlint::report::generate(output_path, &owned) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet && !args.json {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
    }

    if !errors.is_empty() {
        std::process::exit(1);
    }
}

fn print_report(report: &RenderReport, quiet: bool) {
    let s = &report.summary;

    println!("═══ Render Analysis: {} ═══", report.file);
    println!(
        "Duration: {}s | Windows: {} × {}s",
        report.duration_sec, s.window_count, s.window_sec
    );
    println!("Integrated LUFS (proxy): {}", s.integrated_lufs_proxy);
    println!("Silence: {}s ({}%)", s.total_silence_sec, s.silence_pct);
    println!("Spectral cliffs: {}", s.cliff_count);
    println!("Total anomalies: {}", s.anomaly_count);

    if !quiet && !report.anomalies.is_empty() {
        println!("\n─── Anomalies ───");
        for a in &report.anomalies {
            let color = match a.severity {
                Severity::Critical => "\x1b[31m", // Red
                Severity::Warning => "\x1b[33m",  // Yellow
            };
            println!(
                "  {}{:>6.1}s\x1b[0m  [{}] {}",
                color,
                a.time,
                a.kind.label(),
                a.kind.detail()
            );
        }
    }

    if !quiet && !report.windows.is_empty() {
        println!("\n─── Window Stats ───");
        for w in &report.windows {
            let bar = "█".repeat(((w.rms_db + 60.0) / 2.0).max(0.0) as usize);
            let silent_mark = if w.silent {
                "  \x1b[33mSILENT\x1b[0m"
            } else {
                ""
            };
            println!(
                "  {:>6.1}s  RMS:{:>7.1}dB  C:{:>6.0}Hz  F:{:.3}  {}{}",
                w.time_start, w.rms_db, w.centroid_hz, w.spectral_flux, bar, silent_mark
            );
        }
    }
}
