//! Component forest: union-find augmented with per-component statistics.
//!
//! Beyond `parent`/`rank` connectivity, each component carries the
//! largest edge weight ever merged inside it (its *internal
//! difference*) and its pixel count. Because the merge loop feeds edges
//! in ascending weight order, every component is internally connected
//! by a minimum spanning subtree, which gives the internal difference
//! its MST meaning.
//!
//! Statistics live in arrays indexed by element id but are only valid
//! at the *current root* of a component. Path compression and unions
//! move roots around, so every statistic read or write refreshes the
//! root through [`ComponentForest::find`] first; nothing is eagerly
//! propagated.
//!
//! `find` mutates (path compression), so the whole API takes
//! `&mut self`; sharing a forest across threads would need external
//! mutual exclusion even for lookups.

use std::cmp::Ordering;

use crate::graph::Edge;
use crate::types::LabelGrid;

/// Array-backed union-find over `n` pixels with root-valid statistics.
#[derive(Debug, Clone)]
pub struct ComponentForest {
    parent: Vec<usize>,
    rank: Vec<u8>,
    /// Largest weight merged into the component; valid at roots only.
    max_weight: Vec<u32>,
    /// Component pixel count; valid at roots only.
    size: Vec<u32>,
    regions: usize,
}

impl ComponentForest {
    /// Create a forest of `n` singleton components, each with size 1
    /// and internal difference 0.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            max_weight: vec![0; n],
            size: vec![1; n],
            regions: n,
        }
    }

    /// Number of elements the forest was created with.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the forest has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of `x`'s component, with full path compression.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Second pass: point every node on the walked path at the root.
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Whether `x` and `y` currently share a component.
    pub fn is_same_component(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    /// Pixel count of `x`'s component.
    pub fn component_size(&mut self, x: usize) -> u32 {
        let root = self.find(x);
        self.size[root]
    }

    /// Largest edge weight merged inside `x`'s component, 0 for
    /// singletons.
    pub fn internal_difference(&mut self, x: usize) -> u32 {
        let root = self.find(x);
        self.max_weight[root]
    }

    /// Adaptive merge tolerance of `x`'s component: `k / size`.
    ///
    /// Integer division — larger components get a strictly tighter
    /// tolerance, reaching 0 once the size exceeds `k`.
    pub fn threshold(&mut self, x: usize, k: u32) -> u32 {
        k / self.component_size(x)
    }

    /// Largest edge weight allowed to merge the components of `a` and
    /// `b`: the smaller of the two components' internal tolerances.
    ///
    /// An edge may join two regions only if its dissimilarity does not
    /// exceed either side's internal difference plus that side's
    /// size-adaptive slack.
    pub fn merge_eligibility(&mut self, a: usize, b: usize, k: u32) -> u32 {
        let tolerance_a = self.internal_difference(a) + self.threshold(a, k);
        let tolerance_b = self.internal_difference(b) + self.threshold(b, k);
        tolerance_a.min(tolerance_b)
    }

    /// Merge the components containing `edge.v1` and `edge.v2`.
    ///
    /// Union by rank; the surviving root's internal difference becomes
    /// the maximum of both sides and the edge weight (so the value
    /// never depends on which root survived), and its size accumulates
    /// both components. Returns `false` — touching neither statistics
    /// nor the region count — when the endpoints already share a root.
    pub fn union(&mut self, edge: Edge) -> bool {
        let root_a = self.find(edge.v1);
        let root_b = self.find(edge.v2);
        if root_a == root_b {
            return false;
        }

        let merged_weight = self.max_weight[root_a]
            .max(self.max_weight[root_b])
            .max(edge.weight);
        let merged_size = self.size[root_a] + self.size[root_b];

        let survivor = match self.rank[root_a].cmp(&self.rank[root_b]) {
            Ordering::Greater => {
                self.parent[root_b] = root_a;
                root_a
            }
            Ordering::Less => {
                self.parent[root_a] = root_b;
                root_b
            }
            Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
                root_a
            }
        };

        self.max_weight[survivor] = merged_weight;
        self.size[survivor] = merged_size;
        self.regions -= 1;
        true
    }

    /// Number of distinct components; decremented exactly once per
    /// successful merge.
    #[must_use]
    pub const fn region_count(&self) -> usize {
        self.regions
    }

    /// Freeze the partition into a label grid mapping every pixel to
    /// its current root id.
    pub fn to_label_grid(&mut self, width: usize, height: usize) -> LabelGrid {
        debug_assert_eq!(width * height, self.len(), "label grid shape mismatch");
        let labels: Vec<usize> = (0..self.len()).map(|i| self.find(i)).collect();
        LabelGrid::new(width, height, labels)
    }
}
