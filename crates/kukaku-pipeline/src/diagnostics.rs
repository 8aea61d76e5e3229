//! Pipeline diagnostics: timing and counts for each segmentation stage.
//!
//! Permanent instrumentation intended for parameter experimentation
//! (how does `k` change the region count? where does the time go on
//! large grids?). Time is measured through the injectable [`Clock`]
//! trait so the core stays free of platform timing dependencies; the
//! CLI supplies a monotonic clock, tests supply a manual one.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::forest::ComponentForest;
use crate::types::{BorderPolicy, Grid, SegmentConfig, SegmentError, Segmentation};
use crate::{graph, run_merge, smooth};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps for stage timing.
///
/// Implementations live with the caller (`std::time::Instant` in the
/// CLI, a hand-cranked counter in tests) so this crate never touches a
/// platform clock itself.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single segmentation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDiagnostics {
    /// Stage 1: Gaussian smoothing.
    pub smooth: StageDiagnostics,
    /// Stage 2: edge construction over the 8-connected pixel graph.
    pub build_edges: StageDiagnostics,
    /// Stage 3: deterministic ascending-weight sort.
    pub sort_edges: StageDiagnostics,
    /// Stage 4: greedy merge pass.
    pub merge: StageDiagnostics,
    /// Stage 5: label extraction.
    pub label: StageDiagnostics,
    /// Total wall-clock duration of the entire run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SegmentSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Gaussian smoothing metrics.
    Smooth {
        /// Kernel side length.
        kernel_size: usize,
        /// Gaussian standard deviation.
        sigma: f64,
        /// Boundary treatment used.
        border: BorderPolicy,
    },
    /// Edge construction metrics.
    BuildEdges {
        /// Number of undirected edges emitted.
        edge_count: usize,
        /// Number of pixels in the grid.
        pixel_count: usize,
    },
    /// Edge sorting metrics.
    SortEdges {
        /// Number of edges sorted.
        edge_count: usize,
    },
    /// Greedy merge pass metrics.
    Merge {
        /// Scale parameter used.
        k: u32,
        /// Number of candidate edges examined.
        edge_count: usize,
        /// Number of merges performed.
        merge_count: usize,
        /// `merge_count / edge_count` (0 when there are no edges).
        acceptance_ratio: f64,
    },
    /// Label extraction metrics.
    Label {
        /// Number of distinct regions in the final partition.
        region_count: usize,
    },
}

/// High-level summary counts for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// Grid width in pixels.
    pub width: usize,
    /// Grid height in pixels.
    pub height: usize,
    /// Total pixel count.
    pub pixel_count: usize,
    /// Number of candidate edges.
    pub edge_count: usize,
    /// Number of merges performed.
    pub merge_count: usize,
    /// Number of distinct regions in the result.
    pub region_count: usize,
}

impl SegmentDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Segmentation Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Grid: {}x{} ({} pixels, {} edges)",
            self.summary.width, self.summary.height, self.summary.pixel_count,
            self.summary.edge_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages: [(&str, &StageDiagnostics); 5] = [
            ("Smooth", &self.smooth),
            ("Build Edges", &self.build_edges),
            ("Sort Edges", &self.sort_edges),
            ("Merge", &self.merge),
            ("Label", &self.label),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Regions: {}  |  Merges: {} of {} edges",
            self.summary.region_count, self.summary.merge_count, self.summary.edge_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Smooth {
            kernel_size,
            sigma,
            border,
        } => format!("kernel={kernel_size}x{kernel_size} sigma={sigma:.2} border={border:?}"),
        StageMetrics::BuildEdges {
            edge_count,
            pixel_count,
        } => format!("{pixel_count} px -> {edge_count} edges"),
        StageMetrics::SortEdges { edge_count } => format!("{edge_count} edges"),
        StageMetrics::Merge {
            k,
            edge_count,
            merge_count,
            acceptance_ratio,
        } => format!(
            "k={k} {merge_count}/{edge_count} merged ({:.1}%)",
            acceptance_ratio * 100.0,
        ),
        StageMetrics::Label { region_count } => format!("{region_count} regions"),
    }
}

/// Run the segmentation pipeline, collecting per-stage diagnostics.
///
/// Produces exactly the same [`Segmentation`] as
/// [`segment`](crate::segment) — the stages and their order are
/// identical — plus timing and count metrics for each stage.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidParameter`] if the configuration is
/// out of range, before any stage runs.
#[allow(clippy::cast_precision_loss)]
pub fn segment_with_diagnostics<C: Clock>(
    grid: &Grid,
    config: &SegmentConfig,
    clock: &C,
) -> Result<(Segmentation, SegmentDiagnostics), SegmentError> {
    config.validate()?;
    let run_start = clock.now();

    let stage_start = clock.now();
    let smoothed = smooth::smooth(grid, config.kernel_size, config.sigma, config.border);
    let smooth_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::Smooth {
            kernel_size: config.kernel_size,
            sigma: config.sigma,
            border: config.border,
        },
    };

    let stage_start = clock.now();
    let mut edges = graph::build_edges(&smoothed);
    let build_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::BuildEdges {
            edge_count: edges.len(),
            pixel_count: grid.len(),
        },
    };

    let stage_start = clock.now();
    graph::sort_edges(&mut edges);
    let sort_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::SortEdges {
            edge_count: edges.len(),
        },
    };

    let stage_start = clock.now();
    let mut forest = ComponentForest::new(grid.len());
    let merge_count = run_merge(&mut forest, &edges, config.k);
    let acceptance_ratio = if edges.is_empty() {
        0.0
    } else {
        merge_count as f64 / edges.len() as f64
    };
    let merge_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::Merge {
            k: config.k,
            edge_count: edges.len(),
            merge_count,
            acceptance_ratio,
        },
    };

    let stage_start = clock.now();
    let labels = forest.to_label_grid(grid.width(), grid.height());
    let region_count = forest.region_count();
    let label_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::Label { region_count },
    };

    let diagnostics = SegmentDiagnostics {
        smooth: smooth_stage,
        build_edges: build_stage,
        sort_edges: sort_stage,
        merge: merge_stage,
        label: label_stage,
        total_duration: clock.elapsed(&run_start),
        summary: SegmentSummary {
            width: grid.width(),
            height: grid.height(),
            pixel_count: grid.len(),
            edge_count: edges.len(),
            merge_count,
            region_count,
        },
    };

    Ok((
        Segmentation {
            labels,
            region_count,
        },
        diagnostics,
    ))
}
