//! Weighted pixel graph construction and deterministic edge ordering.
//!
//! Every pixel is connected to its 8 neighbors (diagonals included);
//! each undirected pair is emitted exactly once, in the canonical
//! direction where `v1` precedes `v2` in row-major order. Edge weight
//! is the absolute intensity difference of the (smoothed) endpoints.
//!
//! The sort order is load-bearing: the greedy merge consumes edges by
//! ascending weight, and the `(v1, v2)` tie-break is what makes the
//! whole partition reproducible. Tests pin this order exactly.

use crate::types::Grid;

/// An undirected edge between two 8-adjacent pixels.
///
/// `v1` and `v2` are row-major pixel indices with `v1 < v2`; `weight`
/// is the absolute intensity difference between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Earlier endpoint in row-major order.
    pub v1: usize,
    /// Later endpoint in row-major order.
    pub v2: usize,
    /// Absolute intensity difference between the endpoints.
    pub weight: u32,
}

/// Forward half of the 8-neighborhood: the neighbors that come later
/// in row-major order. Visiting only these emits each undirected pair
/// exactly once.
const FORWARD_NEIGHBORS: [(isize, isize); 4] = [(0, 1), (1, -1), (1, 0), (1, 1)];

/// Exact number of undirected 8-connected edges in a `width x height`
/// grid: `4wh - 3(w + h) + 2`.
#[must_use]
pub const fn edge_count(width: usize, height: usize) -> usize {
    (4 * width * height + 2).saturating_sub(3 * (width + height))
}

/// Derive the unsorted edge list of a grid.
///
/// Emits one [`Edge`] per 8-adjacent pixel pair, weight equal to the
/// absolute intensity difference. Grid validity (rectangular, at least
/// one pixel) is guaranteed by the [`Grid`] type, so this is a total
/// function.
#[must_use = "returns the edge list"]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn build_edges(grid: &Grid) -> Vec<Edge> {
    let (width, height) = (grid.width(), grid.height());
    let mut edges = Vec::with_capacity(edge_count(width, height));

    for row in 0..height {
        for col in 0..width {
            let v1 = grid.index(row, col);
            let intensity = grid.get(row, col);
            for (dr, dc) in FORWARD_NEIGHBORS {
                let nrow = row as isize + dr;
                let ncol = col as isize + dc;
                if nrow >= height as isize || ncol < 0 || ncol >= width as isize {
                    continue;
                }
                let (nrow, ncol) = (nrow as usize, ncol as usize);
                edges.push(Edge {
                    v1,
                    v2: grid.index(nrow, ncol),
                    weight: u32::from(intensity.abs_diff(grid.get(nrow, ncol))),
                });
            }
        }
    }

    edges
}

/// Sort edges ascending by weight, ties broken by `(v1, v2)`.
///
/// `(weight, v1, v2)` is a total order over the edge list (every
/// undirected pair appears once), so the result does not depend on the
/// input order and the greedy merge is fully reproducible.
pub fn sort_edges(edges: &mut [Edge]) {
    edges.sort_unstable_by_key(|e| (e.weight, e.v1, e.v2));
}
