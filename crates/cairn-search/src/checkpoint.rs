// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Node checkpointing.
//!
//! A [`NodeSnapshot`] captures everything needed to rebuild a node in an
//! equivalent state: the column list, the branch-constraint and cut
//! records, the raw LP rows, the node's bound (its frontier position),
//! and the enumeration payload if any. Snapshots serialize to JSON and
//! back the controller's node-out / node-in hooks.
//!
//! Restoring rebuilds the bucket graph as the complete graph minus the
//! edges excluded by rowless FORBID constraints, which is exactly the arc
//! state branching would have produced. Enumeration views are captured in
//! compacted form (deleted columns dropped), an equivalent state.

use crate::branch::constraint::{BranchConstraint, BranchDirection};
use crate::bucket::BucketGraph;
use crate::cut::{CapacityCut, RankOneCut};
use crate::node::{BbNode, EnumState, NodeIndexer};
use cairn_lp::model::{LpModel, RowSense};
use cairn_model::column::Column;
use cairn_model::index::VertexIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error raised while writing or reading a checkpoint.
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "checkpoint I/O failed: {}", err),
            CheckpointError::Serde(err) => write!(f, "checkpoint encoding failed: {}", err),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(err) => Some(err),
            CheckpointError::Serde(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<serde_json::Error> for CheckpointError {
    fn from(err: serde_json::Error) -> Self {
        CheckpointError::Serde(err)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnSnapshot {
    pub seq: Vec<usize>,
    pub cost: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BrcSnapshot {
    pub lo: usize,
    pub hi: usize,
    pub row: Option<usize>,
    pub direction: BranchDirection,
    pub three_way: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CapacityCutSnapshot {
    pub members: Vec<usize>,
    pub rhs: f64,
    pub row: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RankOneCutSnapshot {
    pub members: Vec<usize>,
    pub multipliers: Vec<u32>,
    pub denominator: u32,
    pub rhs: f64,
    pub row: usize,
}

/// One raw LP row; the sense is encoded as `'L'`, `'E'`, `'G'`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RowSnapshot {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    pub sense: char,
    pub rhs: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnumSnapshot {
    pub pool_indices: Vec<usize>,
    pub costs: Vec<f64>,
}

/// A serializable image of one branch-and-bound node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub idx: u64,
    pub value: f64,
    pub last_gap: f64,
    pub base_rows: usize,
    pub three_way_splits: u32,
    pub cols: Vec<ColumnSnapshot>,
    pub brcs: Vec<BrcSnapshot>,
    pub rccs: Vec<CapacityCutSnapshot>,
    pub r1cs: Vec<RankOneCutSnapshot>,
    pub lp_obj: Vec<f64>,
    pub lp_rows: Vec<RowSnapshot>,
    pub enumeration: Option<EnumSnapshot>,
}

impl NodeSnapshot {
    /// Captures a node.
    pub fn capture(node: &BbNode) -> Self {
        let cols = node
            .cols()
            .iter()
            .map(|col| ColumnSnapshot {
                seq: col.seq().iter().map(|v| v.get()).collect(),
                cost: col.cost(),
            })
            .collect();
        let brcs = node
            .brcs()
            .iter()
            .map(|brc| BrcSnapshot {
                lo: brc.edge().lo().get(),
                hi: brc.edge().hi().get(),
                row: brc.row(),
                direction: brc.direction(),
                three_way: brc.is_three_way(),
            })
            .collect();
        let rccs = node
            .rccs()
            .iter()
            .map(|cut| CapacityCutSnapshot {
                members: cut.members.iter().map(|v| v.get()).collect(),
                rhs: cut.rhs,
                row: cut.row,
            })
            .collect();
        let r1cs = node
            .r1cs()
            .iter()
            .map(|cut| RankOneCutSnapshot {
                members: cut.members.iter().map(|v| v.get()).collect(),
                multipliers: cut.multipliers.clone(),
                denominator: cut.denominator,
                rhs: cut.rhs,
                row: cut.row,
            })
            .collect();

        let lp = node.lp();
        let lp_obj = (0..lp.num_cols()).map(|j| lp.col_obj(j)).collect();
        let lp_rows = (0..lp.num_rows())
            .map(|i| {
                let row = lp.row(i);
                RowSnapshot {
                    indices: row.entries().iter().map(|&(j, _)| j).collect(),
                    values: row.entries().iter().map(|&(_, v)| v).collect(),
                    sense: match row.sense() {
                        RowSense::Le => 'L',
                        RowSense::Eq => 'E',
                        RowSense::Ge => 'G',
                    },
                    rhs: row.rhs(),
                }
            })
            .collect();

        // the enumeration view is captured compacted: deleted columns are
        // dropped, which restores to an equivalent node
        let enumeration = node.enum_state().map(|state| {
            let mut pool_indices = Vec::with_capacity(state.num_live());
            let mut costs = Vec::with_capacity(state.num_live());
            for (pos, &pool_idx) in state.pool_indices().iter().enumerate() {
                if !state.deleted().contains(pos) {
                    pool_indices.push(pool_idx);
                    costs.push(state.costs()[pos]);
                }
            }
            EnumSnapshot { pool_indices, costs }
        });

        Self {
            idx: node.idx(),
            value: node.value(),
            last_gap: node.last_gap(),
            base_rows: node.base_rows(),
            three_way_splits: node.three_way_splits(),
            cols,
            brcs,
            rccs,
            r1cs,
            lp_obj,
            lp_rows,
            enumeration,
        }
    }

    /// Rebuilds a node in an equivalent state. The node receives a fresh
    /// index from `indexer`; `bins_per_vertex` and `symmetry` shape the
    /// rebuilt bucket graph of pricing-state nodes.
    pub fn restore(
        &self,
        indexer: &NodeIndexer,
        dim: usize,
        bins_per_vertex: usize,
        symmetry: bool,
    ) -> BbNode {
        let cols: Vec<Column> = self
            .cols
            .iter()
            .map(|snapshot| {
                if snapshot.seq.is_empty() {
                    Column::dummy()
                } else {
                    Column::new(
                        snapshot.seq.iter().map(|&i| VertexIndex::new(i)).collect(),
                        snapshot.cost,
                    )
                }
            })
            .collect();

        let mut lp = LpModel::new();
        for &obj in &self.lp_obj {
            lp.add_col(obj, &[]);
        }
        for row in &self.lp_rows {
            let sense = match row.sense {
                'L' => RowSense::Le,
                'G' => RowSense::Ge,
                _ => RowSense::Eq,
            };
            lp.add_row(&row.indices, &row.values, sense, row.rhs);
        }

        let brcs: Vec<BranchConstraint> = self
            .brcs
            .iter()
            .map(|snapshot| {
                let edge = cairn_model::edge::Edge::new(
                    VertexIndex::new(snapshot.lo),
                    VertexIndex::new(snapshot.hi),
                );
                if snapshot.three_way {
                    BranchConstraint::three_way(edge, snapshot.row, snapshot.direction)
                } else {
                    BranchConstraint::two_way(edge, snapshot.row, snapshot.direction)
                }
            })
            .collect();
        let rccs = self
            .rccs
            .iter()
            .map(|snapshot| CapacityCut {
                members: snapshot.members.iter().map(|&i| VertexIndex::new(i)).collect(),
                rhs: snapshot.rhs,
                row: snapshot.row,
            })
            .collect();
        let r1cs = self
            .r1cs
            .iter()
            .map(|snapshot| RankOneCut {
                members: snapshot.members.iter().map(|&i| VertexIndex::new(i)).collect(),
                multipliers: snapshot.multipliers.clone(),
                denominator: snapshot.denominator,
                rhs: snapshot.rhs,
                row: snapshot.row,
            })
            .collect();

        let (buckets, enum_state) = match &self.enumeration {
            Some(snapshot) => (
                None,
                Some(EnumState::new(
                    snapshot.pool_indices.clone(),
                    snapshot.costs.clone(),
                )),
            ),
            None => {
                let mut graph = BucketGraph::complete(dim, bins_per_vertex, symmetry);
                for brc in &brcs {
                    // rowless FORBID constraints are the arc-pruned ones
                    if brc.direction() == BranchDirection::Forbid && brc.row().is_none() {
                        graph.delete_edge(brc.edge());
                    }
                }
                (Some(graph), None)
            }
        };

        BbNode::from_checkpoint(
            indexer,
            lp,
            cols,
            brcs,
            rccs,
            r1cs,
            self.value,
            self.last_gap,
            self.base_rows,
            buckets,
            enum_state,
            self.three_way_splits,
        )
    }

    /// Writes the snapshot as JSON.
    pub fn write(&self, path: &Path) -> Result<(), CheckpointError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Reads a snapshot back from JSON.
    pub fn read(path: &Path) -> Result<Self, CheckpointError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::operator::BranchingOperator;
    use cairn_model::edge::Edge;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    fn edge(a: usize, b: usize) -> Edge {
        Edge::new(v(a), v(b))
    }

    fn col(seq: &[usize], cost: f64) -> Column {
        Column::new(seq.iter().map(|&i| v(i)).collect(), cost)
    }

    fn test_node(indexer: &NodeIndexer) -> BbNode {
        let cols = vec![
            Column::dummy(),
            col(&[1, 2], 10.0),
            col(&[3], 6.0),
            col(&[1], 5.0),
        ];
        let mut lp = LpModel::new();
        for c in &cols {
            lp.add_col(c.cost(), &[]);
        }
        for customer in 1..=3usize {
            let mut indices = vec![0usize];
            let mut values = vec![1.0f64];
            for (j, c) in cols.iter().enumerate().skip(1) {
                if c.visits(v(customer)) {
                    indices.push(j);
                    values.push(1.0);
                }
            }
            lp.add_row(&indices, &values, RowSense::Eq, 1.0);
        }
        BbNode::root(indexer, lp, cols, BucketGraph::complete(4, 2, true))
    }

    #[test]
    fn test_round_trip_preserves_node_shape() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        // branch once so the snapshot carries a constraint and a pruned arc
        let children = BranchingOperator::default().impose(&indexer, node, edge(1, 2));
        let false_child = &children.output()[0];

        let snapshot = NodeSnapshot::capture(false_child);
        let restored = snapshot.restore(&indexer, 4, 2, true);

        assert_eq!(restored.cols().len(), false_child.cols().len());
        assert_eq!(restored.brcs(), false_child.brcs());
        assert_eq!(restored.value(), false_child.value());
        assert_eq!(restored.last_gap(), false_child.last_gap());
        assert_eq!(restored.base_rows(), false_child.base_rows());
        assert_eq!(restored.lp().num_rows(), false_child.lp().num_rows());
        assert_eq!(restored.lp().num_cols(), false_child.lp().num_cols());
        // the forbidden arc is gone from the rebuilt graph
        assert!(!restored.buckets().unwrap().contains_edge(edge(1, 2)));
        assert!(restored.buckets().unwrap().contains_edge(edge(1, 3)));
    }

    #[test]
    fn test_rows_round_trip_elementwise() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        let snapshot = NodeSnapshot::capture(&node);
        let restored = snapshot.restore(&indexer, 4, 2, true);

        for i in 0..node.lp().num_rows() {
            assert_eq!(restored.lp().row(i), node.lp().row(i), "row {}", i);
        }
        for j in 0..node.lp().num_cols() {
            assert_eq!(restored.lp().col_obj(j), node.lp().col_obj(j));
        }
    }

    #[test]
    fn test_enumeration_snapshot_restores_without_buckets() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.enter_enumeration(vec![4, 7, 9], vec![5.0, 6.0, 7.0]);

        let snapshot = NodeSnapshot::capture(&node);
        let restored = snapshot.restore(&indexer, 4, 2, true);

        assert!(restored.in_enum_state());
        assert!(restored.buckets().is_none());
        assert_eq!(
            restored.enum_state().unwrap().pool_indices(),
            &[4, 7, 9]
        );
    }

    #[test]
    fn test_json_file_round_trip() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        let snapshot = NodeSnapshot::capture(&node);

        let path = std::env::temp_dir().join("cairn_node_snapshot_test.json");
        snapshot.write(&path).expect("write should succeed");
        let loaded = NodeSnapshot::read(&path).expect("read should succeed");
        assert_eq!(snapshot, loaded);
        let _ = std::fs::remove_file(&path);
    }
}
