//! kukaku-pipeline: graph-based image segmentation core (sans-IO).
//!
//! Partitions a rectangular grid of intensity samples into connected
//! regions of similar intensity using the Felzenszwalb–Huttenlocher
//! algorithm: smooth -> weighted 8-connected pixel graph -> ascending
//! weight sort -> greedy union-find merge with an adaptive,
//! size-sensitive threshold.
//!
//! This crate has **no I/O dependencies** — it operates on in-memory
//! grids and returns structured data. Grid loading lives in
//! `kukaku-io`, serialization of results in `kukaku-export`.
//!
//! Determinism is part of the contract: edges are ordered by
//! `(weight, v1, v2)` and the merge pass is strictly sequential, so the
//! same grid and configuration always produce bit-identical label
//! grids.

pub mod diagnostics;
pub mod forest;
pub mod graph;
pub mod smooth;
pub mod types;

pub use forest::ComponentForest;
pub use graph::Edge;
pub use types::{
    BorderPolicy, Grid, LabelGrid, SegmentConfig, SegmentError, Segmentation,
};

/// Run the full segmentation pipeline.
///
/// # Pipeline steps
///
/// 1. Validate configuration (fail before any computation)
/// 2. Gaussian smoothing (noise reduction, explicit border policy)
/// 3. Edge construction over the 8-connected pixel graph
/// 4. Deterministic ascending-weight sort
/// 5. Greedy merge pass over the component forest
/// 6. Label extraction
///
/// The merge pass admits an edge iff its endpoints lie in different
/// components and its weight does not exceed the smaller of the two
/// components' internal tolerances (`internal difference + k / size`).
/// Processing edges by non-decreasing weight makes every resulting
/// component internally connected by a minimum spanning subtree.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidParameter`] if the configuration is
/// out of range. Grid shape errors ([`SegmentError::InvalidGrid`]) are
/// raised earlier, at [`Grid`] construction.
pub fn segment(grid: &Grid, config: &SegmentConfig) -> Result<Segmentation, SegmentError> {
    // 1. Reject invalid parameters before any computation.
    config.validate()?;

    // 2. Gaussian smoothing.
    let smoothed = smooth::smooth(grid, config.kernel_size, config.sigma, config.border);

    // 3 + 4. Weighted pixel graph in pinned ascending order.
    let mut edges = graph::build_edges(&smoothed);
    graph::sort_edges(&mut edges);

    // 5. Greedy merge pass.
    let mut forest = ComponentForest::new(grid.len());
    run_merge(&mut forest, &edges, config.k);

    // 6. Freeze the partition.
    let labels = forest.to_label_grid(grid.width(), grid.height());
    let region_count = forest.region_count();
    Ok(Segmentation {
        labels,
        region_count,
    })
}

/// Single greedy pass over sorted edges. Returns the number of merges
/// performed.
///
/// `edges` must already be sorted ascending; each eligibility check
/// reads statistics the immediately preceding merges may have changed,
/// so the loop is strictly sequential.
pub(crate) fn run_merge(forest: &mut ComponentForest, edges: &[graph::Edge], k: u32) -> usize {
    let mut merges = 0;
    for &edge in edges {
        if forest.is_same_component(edge.v1, edge.v2) {
            continue;
        }
        if edge.weight <= forest.merge_eligibility(edge.v1, edge.v2, k) && forest.union(edge) {
            merges += 1;
        }
    }
    merges
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Config with smoothing disabled, so edge weights come straight
    /// from the input samples.
    fn raw_config(k: u32) -> SegmentConfig {
        SegmentConfig {
            k,
            kernel_size: 1,
            ..SegmentConfig::default()
        }
    }

    #[test]
    fn splits_one_row_grid_at_the_intensity_step() {
        // Edges: (0,1) w=0, (2,3) w=0 merge first; (1,2) w=100 is then
        // checked against min(0 + 50/2, 0 + 50/2) = 25 and rejected.
        let grid = Grid::from_rows(&[vec![0, 0, 100, 100]]).unwrap();
        let result = segment(&grid, &raw_config(50)).unwrap();

        assert_eq!(result.region_count, 2);
        let labels = &result.labels;
        assert_eq!(labels.get(0, 0), labels.get(0, 1));
        assert_eq!(labels.get(0, 2), labels.get(0, 3));
        assert_ne!(labels.get(0, 0), labels.get(0, 2));
    }

    #[test]
    fn large_k_bridges_the_intensity_step() {
        // Same grid as above; the step edge needs weight <= k/2, so
        // k = 200 merges everything and k = 199 does not.
        let grid = Grid::from_rows(&[vec![0, 0, 100, 100]]).unwrap();
        assert_eq!(segment(&grid, &raw_config(200)).unwrap().region_count, 1);
        assert_eq!(segment(&grid, &raw_config(199)).unwrap().region_count, 2);
    }

    #[test]
    fn uniform_grid_collapses_to_one_region() {
        let grid = Grid::from_fn(12, 9, |_, _| 77).unwrap();
        for k in [1, 50, 1000] {
            let result = segment(&grid, &raw_config(k)).unwrap();
            assert_eq!(
                result.region_count, 1,
                "uniform grid should be one region for k = {k}",
            );
            let first = result.labels.get(0, 0);
            assert!(result.labels.labels().iter().all(|&label| label == first));
        }
    }

    #[test]
    fn uniform_grid_survives_smoothing() {
        // Renormalized smoothing keeps a uniform grid uniform, so the
        // full default pipeline still yields one region.
        let grid = Grid::from_fn(10, 10, |_, _| 128).unwrap();
        let config = SegmentConfig {
            border: BorderPolicy::Renormalize,
            ..SegmentConfig::default()
        };
        assert_eq!(segment(&grid, &config).unwrap().region_count, 1);
    }

    #[test]
    fn single_pixel_grid_is_one_region() {
        let grid = Grid::from_rows(&[vec![42]]).unwrap();
        let result = segment(&grid, &raw_config(50)).unwrap();
        assert_eq!(result.region_count, 1);
        assert_eq!(result.labels.labels(), &[0]);
    }

    #[test]
    fn checkerboard_separates_into_two_regions() {
        // Diagonal adjacency connects all same-parity cells, while the
        // weight-255 cross-parity edges stay above eligibility.
        let grid = Grid::from_fn(4, 4, |row, col| {
            if (row + col) % 2 == 0 { 0 } else { 255 }
        })
        .unwrap();
        let result = segment(&grid, &raw_config(1)).unwrap();
        assert_eq!(result.region_count, 2);
        assert_eq!(result.labels.get(0, 0), result.labels.get(1, 1));
        assert_ne!(result.labels.get(0, 0), result.labels.get(0, 1));
    }

    #[test]
    fn segmentation_is_idempotent() {
        let grid = Grid::from_fn(16, 11, |row, col| {
            u8::try_from((row * 23 + col * 11) % 256).unwrap()
        })
        .unwrap();
        let config = SegmentConfig::default();
        let first = segment(&grid, &config).unwrap();
        let second = segment(&grid, &config).unwrap();
        assert_eq!(first.labels, second.labels, "label grids must match bit-for-bit");
        assert_eq!(first.region_count, second.region_count);
    }

    #[test]
    fn region_count_matches_distinct_labels() {
        let grid = Grid::from_fn(9, 7, |row, col| {
            u8::try_from((row * 40 + col * 13) % 256).unwrap()
        })
        .unwrap();
        let result = segment(&grid, &raw_config(30)).unwrap();
        let distinct: std::collections::HashSet<usize> =
            result.labels.labels().iter().copied().collect();
        assert_eq!(distinct.len(), result.region_count);
    }

    #[test]
    fn every_region_is_connected() {
        // Flood-fill each label over 8-adjacency; the cell count per
        // label must match the flood reach from any seed.
        let grid = Grid::from_fn(12, 12, |row, col| {
            u8::try_from((row * 19 + col * 7) % 256).unwrap()
        })
        .unwrap();
        let result = segment(&grid, &raw_config(80)).unwrap();
        let (width, height) = (grid.width(), grid.height());
        let labels = result.labels.labels();

        let mut visited = vec![false; labels.len()];
        for seed in 0..labels.len() {
            if visited[seed] {
                continue;
            }
            // Flood from the seed across same-label 8-neighbors.
            let mut stack = vec![seed];
            let mut reached = 0usize;
            visited[seed] = true;
            while let Some(v) = stack.pop() {
                reached += 1;
                let (row, col) = (v / width, v % width);
                for dr in -1i64..=1 {
                    for dc in -1i64..=1 {
                        let nrow = i64::try_from(row).unwrap() + dr;
                        let ncol = i64::try_from(col).unwrap() + dc;
                        if nrow < 0
                            || ncol < 0
                            || nrow >= i64::try_from(height).unwrap()
                            || ncol >= i64::try_from(width).unwrap()
                        {
                            continue;
                        }
                        let n = usize::try_from(nrow).unwrap() * width
                            + usize::try_from(ncol).unwrap();
                        if !visited[n] && labels[n] == labels[v] {
                            visited[n] = true;
                            stack.push(n);
                        }
                    }
                }
            }
            let total = labels.iter().filter(|&&l| l == labels[seed]).count();
            assert_eq!(
                reached, total,
                "label {} is split into disconnected parts",
                labels[seed],
            );
        }
    }

    #[test]
    fn merge_pass_never_merges_ineligible_edges() {
        // Replicate the driver loop step by step, asserting the merge
        // precondition as a loop invariant.
        let grid = Grid::from_fn(10, 8, |row, col| {
            u8::try_from((row * 29 + col * 17) % 256).unwrap()
        })
        .unwrap();
        let k = 60;
        let smoothed = smooth::smooth(&grid, 3, 0.8, BorderPolicy::Truncate);
        let mut edges = graph::build_edges(&smoothed);
        graph::sort_edges(&mut edges);

        let mut forest = ComponentForest::new(grid.len());
        let mut last_count = forest.region_count();
        for edge in &edges {
            let same = forest.is_same_component(edge.v1, edge.v2);
            let eligibility = forest.merge_eligibility(edge.v1, edge.v2, k);
            let merged = !same && edge.weight <= eligibility && forest.union(*edge);

            if merged {
                assert_eq!(forest.region_count(), last_count - 1);
            } else {
                assert!(
                    same || edge.weight > eligibility,
                    "edge {edge:?} skipped without cause",
                );
                assert_eq!(forest.region_count(), last_count);
            }
            last_count = forest.region_count();
        }

        // The replicated pass agrees with the driver.
        let driver = segment(
            &grid,
            &SegmentConfig {
                k,
                ..SegmentConfig::default()
            },
        )
        .unwrap();
        assert_eq!(driver.region_count, forest.region_count());
    }

    #[test]
    fn internal_difference_matches_merged_edges() {
        // For every component the forest's internal difference must
        // equal the heaviest edge actually merged into it.
        let grid = Grid::from_fn(7, 7, |row, col| {
            u8::try_from((row * 43 + col * 13) % 256).unwrap()
        })
        .unwrap();
        let k = 120;
        let mut edges = graph::build_edges(&grid);
        graph::sort_edges(&mut edges);

        let mut forest = ComponentForest::new(grid.len());
        let mut merged = Vec::new();
        for &edge in &edges {
            if !forest.is_same_component(edge.v1, edge.v2)
                && edge.weight <= forest.merge_eligibility(edge.v1, edge.v2, k)
                && forest.union(edge)
            {
                merged.push(edge);
            }
        }

        let mut max_by_root = std::collections::HashMap::new();
        for edge in &merged {
            let root = forest.find(edge.v1);
            let heaviest = max_by_root.entry(root).or_insert(0);
            *heaviest = (*heaviest).max(edge.weight);
        }
        for i in 0..grid.len() {
            let root = forest.find(i);
            let expected = max_by_root.get(&root).copied().unwrap_or(0);
            assert_eq!(
                forest.internal_difference(i),
                expected,
                "internal difference mismatch for pixel {i}",
            );
        }
    }

    #[test]
    fn invalid_parameters_are_rejected_before_processing() {
        let grid = Grid::from_rows(&[vec![1, 2]]).unwrap();
        for config in [
            SegmentConfig {
                k: 0,
                ..SegmentConfig::default()
            },
            SegmentConfig {
                kernel_size: 2,
                ..SegmentConfig::default()
            },
            SegmentConfig {
                sigma: -0.5,
                ..SegmentConfig::default()
            },
        ] {
            let result = segment(&grid, &config);
            assert!(
                matches!(result, Err(SegmentError::InvalidParameter(_))),
                "config {config:?} should be rejected",
            );
        }
    }

    #[test]
    fn ragged_input_never_reaches_the_pipeline() {
        // Raggedness is rejected at grid construction, before segment
        // can be called at all.
        let result = Grid::from_rows(&[vec![1, 2, 3], vec![4, 5]]);
        assert!(matches!(result, Err(SegmentError::InvalidGrid(_))));
    }
}
