use std::ops::{Index, IndexMut};

use serde::Serialize;

/// This represents the information for a certain remaining depth.
/// - `visited` is the number of nodes that were reached with that much depth
///   left.
///   - `expanded` is the number of nodes (of the `visited` nodes) whose moves
///     were searched, rather than being evaluated statically.
/// - `cutoffs` is the number of expanded nodes that stopped early because
///   the alpha-beta window closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LayerInfo {
    pub visited: u64,
    pub expanded: u64,
    pub cutoffs: u64,
}

/// Per-layer node counts for one search, indexed by remaining depth. The root
/// is at index `depth` and the horizon at index 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BranchInfo(Vec<LayerInfo>);

impl Index<usize> for BranchInfo {
    type Output = LayerInfo;

    fn index(&self, index: usize) -> &Self::Output { &self.0[index] }
}

impl IndexMut<usize> for BranchInfo {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output { &mut self.0[index] }
}

impl BranchInfo {
    pub fn new(depth: u8) -> Self { BranchInfo(vec![LayerInfo::default(); depth as usize + 1]) }

    /// The depth the search was started with
    pub fn depth(&self) -> u8 { (self.0.len() - 1) as u8 }

    /// How many plies below the root the search actually went
    pub fn max_ply(&self) -> u8 {
        let deepest = (0..self.0.len())
            .find(|&remaining| self.0[remaining].visited > 0)
            .unwrap_or(self.0.len() - 1);
        self.depth() - deepest as u8
    }

    pub fn total_nodes(&self) -> u64 { self.0.iter().map(|layer| layer.visited).sum() }

    pub fn total_cutoffs(&self) -> u64 { self.0.iter().map(|layer| layer.cutoffs).sum() }

    pub fn statistics(&self) -> String {
        let mut s = String::new();

        s.push_str("Search statistics:\n");

        for remaining in (0..self.0.len()).rev() {
            let ply = self.0.len() - remaining - 1;

            let v = self.0[remaining].visited;
            let e = self.0[remaining].expanded;
            let c = self.0[remaining].cutoffs;

            if remaining == self.0.len() - 1 {
                s.push_str(&format!("\tPly {} (root) visited {} nodes:\n", ply, v));
            } else {
                s.push_str(&format!("\tPly {} visited {} nodes:\n", ply, v));
            }

            s.push_str(&format!(
                "\t\t{} ({}%) were evaluated statically\n",
                v - e,
                ((v - e) * 100).checked_div(v).unwrap_or(0)
            ));
            s.push_str(&format!(
                "\t\t{} ({}%) were expanded\n",
                e,
                (e * 100).checked_div(v).unwrap_or(0)
            ));
            s.push_str(&format!(
                "\t\t\tof these, {} ({}%) caused a cutoff\n",
                c,
                (c * 100).checked_div(e).unwrap_or(0)
            ));
        }

        s
    }
}
