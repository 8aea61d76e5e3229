//! kukaku-bench: CLI tool for segmentation runs and diagnostics.
//!
//! Segments an image file (PGM or any raster format the `image` crate
//! decodes) with configurable parameters, printing per-stage
//! diagnostics. Useful for:
//!
//! - Tuning the scale parameter `k`, smoothing kernel, and sigma
//! - Comparing border policies (`truncate` vs `renormalize`)
//! - Measuring per-stage durations on large grids
//! - Writing colorized region maps for visual inspection
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kukaku-bench -- [OPTIONS] <INPUT_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use kukaku_pipeline::diagnostics::{Clock, SegmentDiagnostics, segment_with_diagnostics};
use kukaku_pipeline::{BorderPolicy, Grid, SegmentConfig};

/// Segmentation parameter experimentation and diagnostics for kukaku.
///
/// Runs the segmentation pipeline on a given image with configurable
/// parameters and prints detailed per-stage timing and count
/// diagnostics.
#[derive(Parser)]
#[command(name = "kukaku-bench", version)]
struct Cli {
    /// Path to the input image (PGM, PNG, JPEG, BMP, WebP).
    input_path: PathBuf,

    /// Scale parameter k. When omitted, picked from the grid size
    /// (150 / 300 / 500 by half-perimeter).
    #[arg(long)]
    k: Option<u32>,

    /// Gaussian kernel side length (odd).
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_KERNEL_SIZE)]
    kernel_size: usize,

    /// Gaussian sigma.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_SIGMA)]
    sigma: f64,

    /// Border policy for the smoothing convolution.
    #[arg(long, value_enum, default_value_t = Border::Truncate)]
    border: Border,

    /// Write a colorized region map (PNG) to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a colorized region map as P3 text to this path.
    #[arg(long)]
    p3_output: Option<PathBuf>,

    /// Two-tone rendering (background black, everything else white)
    /// instead of the spectrum colorization.
    #[arg(long)]
    dual: bool,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Full segmentation config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `SegmentConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Border policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Border {
    /// Skip out-of-bounds kernel taps without rescaling (darkens the rim).
    Truncate,
    /// Rescale by the in-bounds kernel mass.
    Renormalize,
}

impl From<Border> for BorderPolicy {
    fn from(border: Border) -> Self {
        match border {
            Border::Truncate => Self::Truncate,
            Border::Renormalize => Self::Renormalize,
        }
    }
}

/// Build a [`SegmentConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise a config is
/// assembled from the flags, with `k` auto-selected from the grid
/// dimensions when `--k` is omitted.
fn config_from_cli(cli: &Cli, grid: &Grid) -> Result<SegmentConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(SegmentConfig {
        k: cli
            .k
            .unwrap_or_else(|| SegmentConfig::auto_k(grid.width(), grid.height())),
        kernel_size: cli.kernel_size,
        sigma: cli.sigma,
        border: cli.border.into(),
    })
}

/// Load a grid from disk: PGM files go through the PGM parser,
/// everything else through the raster decoder.
fn load_grid(path: &Path) -> Result<Grid, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;

    let is_pgm = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pgm"));

    if is_pgm {
        kukaku_io::pgm::parse(&bytes).map_err(|e| format!("Error parsing {}: {e}", path.display()))
    } else {
        kukaku_io::decode_grid(&bytes)
            .map_err(|e| format!("Error decoding {}: {e}", path.display()))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let grid = match load_grid(&cli.input_path) {
        Ok(grid) => grid,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let config = match config_from_cli(&cli, &grid) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Input: {} ({}x{} grid)",
        cli.input_path.display(),
        grid.width(),
        grid.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match segment_with_diagnostics(&grid, &config, &StdClock) {
            Ok((result, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write region maps on the first run only.
                if run == 0 && let Err(msg) = write_outputs(&cli, &result) {
                    eprintln!("{msg}");
                    return ExitCode::FAILURE;
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Segmentation error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write the requested region maps for a finished run.
fn write_outputs(cli: &Cli, result: &kukaku_pipeline::Segmentation) -> Result<(), String> {
    if cli.output.is_none() && cli.p3_output.is_none() {
        return Ok(());
    }

    let rendered = if cli.dual {
        kukaku_export::dual_tone(&result.labels)
    } else {
        kukaku_export::colorize(result).map_err(|e| format!("Error colorizing output: {e}"))?
    };

    if let Some(ref path) = cli.output {
        rendered
            .save(path)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        eprintln!("Region map written to {}", path.display());
    }

    if let Some(ref path) = cli.p3_output {
        let text = kukaku_export::pgm::encode_p3(&rendered);
        std::fs::write(path, &text)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        eprintln!(
            "P3 region map written to {} ({} bytes)",
            path.display(),
            text.len(),
        );
    }

    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&SegmentDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SegmentDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<16} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(32));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Smooth", |d| d.smooth.duration),
        ("Build Edges", |d| d.build_edges.duration),
        ("Sort Edges", |d| d.sort_edges.duration),
        ("Merge", |d| d.merge.duration),
        ("Label", |d| d.label.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<16} {stage_mean:>10.3}ms");
    }
}
