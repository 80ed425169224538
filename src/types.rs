//! Shared result containers.

/// Dense per-node × per-curve value grid over a skeleton's interior nodes.
///
/// The first and last skeleton nodes never record crossings, so the map holds
/// `node_count − 2` rows; row `r` corresponds to skeleton node `r + 1`. A
/// value of 0 means "not observed" for that (node, curve) pair.
#[derive(Clone, Debug)]
pub struct NodeCurveMap {
    node_count: usize,
    curve_count: usize,
    data: Vec<f32>,
}

impl NodeCurveMap {
    /// Zero-filled map for a skeleton of `node_count` nodes (≥ 2).
    pub fn new(node_count: usize, curve_count: usize) -> Self {
        assert!(node_count >= 2, "a skeleton has at least 2 nodes");
        Self {
            node_count,
            curve_count,
            data: vec![0.0; (node_count - 2) * curve_count],
        }
    }

    /// Number of interior-node rows.
    pub fn rows(&self) -> usize {
        self.node_count - 2
    }

    /// Number of curve columns.
    pub fn curves(&self) -> usize {
        self.curve_count
    }

    /// Interior skeleton node indices covered by the map.
    pub fn interior_nodes(&self) -> std::ops::Range<usize> {
        1..self.node_count - 1
    }

    #[inline]
    fn row_index(&self, node: usize) -> usize {
        assert!(
            node >= 1 && node + 1 < self.node_count,
            "node {node} is not interior (count {})",
            self.node_count
        );
        node - 1
    }

    /// Value at an interior skeleton node for one curve.
    #[inline]
    pub fn get(&self, node: usize, curve: usize) -> f32 {
        self.data[self.row_index(node) * self.curve_count + curve]
    }

    /// Values of all curves at an interior skeleton node.
    pub fn row(&self, node: usize) -> &[f32] {
        let start = self.row_index(node) * self.curve_count;
        &self.data[start..start + self.curve_count]
    }

    /// Replace the row of an interior skeleton node.
    pub fn set_row(&mut self, node: usize, values: Vec<f32>) {
        assert_eq!(values.len(), self.curve_count);
        let start = self.row_index(node) * self.curve_count;
        self.data[start..start + self.curve_count].copy_from_slice(&values);
    }

    /// Per-curve values down all interior nodes.
    pub fn column(&self, curve: usize) -> impl Iterator<Item = f32> + '_ {
        self.interior_nodes().map(move |n| self.get(n, curve))
    }
}
