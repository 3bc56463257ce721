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

//! The arc bucket graph.
//!
//! Per node, a 2-D array `buckets[vertex][bin]` discretizes the time/load
//! resource into bins. Each bucket holds the heads reachable within the
//! same bin (`bucket_arcs`) and the heads reachable by jumping to a later
//! bin (`jump_arcs`, tagged with the resource value of the target bin).
//! The pricing engine only extends labels along arcs present in the graph,
//! so deleting an edge here is how a FORBID branch constrains pricing.
//!
//! The graph keeps a forward plane always and a backward plane only when
//! the resource is not symmetric (bidirectional labeling).

use cairn_model::edge::Edge;
use cairn_model::index::VertexIndex;
use smallvec::SmallVec;

/// One bucket: the arcs leaving a vertex within one resource bin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bucket {
    /// Heads reachable inside the same bin, in insertion order.
    pub bucket_arcs: SmallVec<[VertexIndex; 8]>,
    /// `(resource, head)` pairs reachable by jumping to a later bin.
    pub jump_arcs: SmallVec<[(f64, VertexIndex); 4]>,
}

impl Bucket {
    /// Removes every arc (bucket or jump) pointing at `head`.
    fn remove_head(&mut self, head: VertexIndex) {
        if let Some(pos) = self.bucket_arcs.iter().position(|&h| h == head) {
            self.bucket_arcs.remove(pos);
        } else if let Some(pos) = self.jump_arcs.iter().position(|&(_, h)| h == head) {
            self.jump_arcs.remove(pos);
        }
    }

    /// Returns `true` if any arc of this bucket points at `head`.
    #[inline]
    pub fn contains_head(&self, head: VertexIndex) -> bool {
        self.bucket_arcs.contains(&head) || self.jump_arcs.iter().any(|&(_, h)| h == head)
    }
}

/// The per-node bucket graph.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketGraph {
    dim: usize,
    bins_per_vertex: usize,
    forward: Vec<Bucket>,
    backward: Option<Vec<Bucket>>,
}

impl BucketGraph {
    /// Creates an empty graph with `bins_per_vertex` bins per vertex.
    /// A backward plane is allocated only when `symmetry` is false.
    pub fn new(dim: usize, bins_per_vertex: usize, symmetry: bool) -> Self {
        assert!(
            dim >= 2 && bins_per_vertex >= 1,
            "called `BucketGraph::new` with degenerate shape: dim {} bins {}",
            dim,
            bins_per_vertex
        );
        let plane = vec![Bucket::default(); dim * bins_per_vertex];
        Self {
            dim,
            bins_per_vertex,
            forward: plane.clone(),
            backward: if symmetry { None } else { Some(plane) },
        }
    }

    /// Creates a complete graph: every vertex pair connected by a bucket
    /// arc in every bin of both planes. The root node of a search starts
    /// from this and branching only ever removes arcs.
    pub fn complete(dim: usize, bins_per_vertex: usize, symmetry: bool) -> Self {
        let mut graph = Self::new(dim, bins_per_vertex, symmetry);
        for tail in 0..dim {
            for bin in 0..bins_per_vertex {
                for head in 0..dim {
                    if head == tail {
                        continue;
                    }
                    graph.forward[tail * bins_per_vertex + bin]
                        .bucket_arcs
                        .push(VertexIndex::new(head));
                }
            }
        }
        if let Some(backward) = &mut graph.backward {
            for tail in 0..dim {
                for bin in 0..bins_per_vertex {
                    for head in 0..dim {
                        if head == tail {
                            continue;
                        }
                        backward[tail * bins_per_vertex + bin]
                            .bucket_arcs
                            .push(VertexIndex::new(head));
                    }
                }
            }
        }
        graph
    }

    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    pub fn bins_per_vertex(&self) -> usize {
        self.bins_per_vertex
    }

    /// Returns `true` if the graph has a backward plane.
    #[inline(always)]
    pub fn has_backward(&self) -> bool {
        self.backward.is_some()
    }

    #[inline(always)]
    fn slot(&self, vertex: VertexIndex, bin: usize) -> usize {
        debug_assert!(
            vertex.get() < self.dim && bin < self.bins_per_vertex,
            "called `BucketGraph::slot` out of bounds: vertex {} bin {} in a {}x{} graph",
            vertex.get(),
            bin,
            self.dim,
            self.bins_per_vertex
        );
        vertex.get() * self.bins_per_vertex + bin
    }

    /// The forward bucket of `vertex` in `bin`.
    #[inline]
    pub fn forward_bucket(&self, vertex: VertexIndex, bin: usize) -> &Bucket {
        &self.forward[self.slot(vertex, bin)]
    }

    #[inline]
    pub fn forward_bucket_mut(&mut self, vertex: VertexIndex, bin: usize) -> &mut Bucket {
        let slot = self.slot(vertex, bin);
        &mut self.forward[slot]
    }

    /// The backward bucket of `vertex` in `bin`, if the plane exists.
    #[inline]
    pub fn backward_bucket(&self, vertex: VertexIndex, bin: usize) -> Option<&Bucket> {
        let slot = self.slot(vertex, bin);
        self.backward.as_ref().map(|plane| &plane[slot])
    }

    /// Adds a jump arc `(resource, head)` to the forward bucket of
    /// `vertex`/`bin`.
    pub fn add_forward_jump_arc(
        &mut self,
        vertex: VertexIndex,
        bin: usize,
        resource: f64,
        head: VertexIndex,
    ) {
        let slot = self.slot(vertex, bin);
        self.forward[slot].jump_arcs.push((resource, head));
    }

    /// Deletes the undirected edge from the graph: after this call no
    /// bucket of either endpoint, in either plane, contains the other
    /// endpoint. Deletions commute: the result only depends on the set of
    /// deleted edges.
    pub fn delete_edge(&mut self, edge: Edge) {
        let (i, j) = (edge.lo(), edge.hi());
        Self::delete_directed(&mut self.forward, self.bins_per_vertex, i, j);
        Self::delete_directed(&mut self.forward, self.bins_per_vertex, j, i);
        if let Some(backward) = &mut self.backward {
            Self::delete_directed(backward, self.bins_per_vertex, i, j);
            Self::delete_directed(backward, self.bins_per_vertex, j, i);
        }
    }

    fn delete_directed(
        plane: &mut [Bucket],
        bins_per_vertex: usize,
        tail: VertexIndex,
        head: VertexIndex,
    ) {
        for bin in 0..bins_per_vertex {
            plane[tail.get() * bins_per_vertex + bin].remove_head(head);
        }
    }

    /// Returns `true` if any forward bucket of `tail` still reaches `head`.
    pub fn contains_arc(&self, tail: VertexIndex, head: VertexIndex) -> bool {
        (0..self.bins_per_vertex)
            .any(|bin| self.forward[tail.get() * self.bins_per_vertex + bin].contains_head(head))
    }

    /// Returns `true` if the undirected edge survives in any plane, in
    /// either direction.
    pub fn contains_edge(&self, edge: Edge) -> bool {
        let (i, j) = (edge.lo(), edge.hi());
        if self.contains_arc(i, j) || self.contains_arc(j, i) {
            return true;
        }
        if let Some(backward) = &self.backward {
            for (tail, head) in [(i, j), (j, i)] {
                for bin in 0..self.bins_per_vertex {
                    if backward[tail.get() * self.bins_per_vertex + bin].contains_head(head) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Total number of forward bucket arcs, a cheap health metric.
    pub fn num_forward_bucket_arcs(&self) -> usize {
        self.forward.iter().map(|b| b.bucket_arcs.len()).sum()
    }

    /// Total number of forward jump arcs.
    pub fn num_forward_jump_arcs(&self) -> usize {
        self.forward.iter().map(|b| b.jump_arcs.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    #[test]
    fn test_complete_graph_contains_all_edges() {
        let graph = BucketGraph::complete(4, 2, true);
        assert!(!graph.has_backward());
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    assert!(graph.contains_arc(v(a), v(b)), "missing arc {}->{}", a, b);
                }
            }
        }
        assert_eq!(graph.num_forward_bucket_arcs(), 4 * 2 * 3);
    }

    #[test]
    fn test_delete_edge_removes_both_directions() {
        let mut graph = BucketGraph::complete(4, 2, true);
        graph.delete_edge(Edge::new(v(1), v(2)));

        assert!(!graph.contains_arc(v(1), v(2)));
        assert!(!graph.contains_arc(v(2), v(1)));
        assert!(!graph.contains_edge(Edge::new(v(1), v(2))));
        // unrelated arcs survive
        assert!(graph.contains_arc(v(1), v(3)));
        assert!(graph.contains_arc(v(0), v(2)));
    }

    #[test]
    fn test_delete_edge_touches_backward_plane() {
        let mut graph = BucketGraph::complete(3, 2, false);
        assert!(graph.has_backward());
        graph.delete_edge(Edge::new(v(0), v(1)));

        for bin in 0..2 {
            let b01 = graph.backward_bucket(v(0), bin).unwrap();
            let b10 = graph.backward_bucket(v(1), bin).unwrap();
            assert!(!b01.contains_head(v(1)));
            assert!(!b10.contains_head(v(0)));
        }
        assert!(!graph.contains_edge(Edge::new(v(0), v(1))));
    }

    #[test]
    fn test_delete_edge_removes_jump_arcs_too() {
        let mut graph = BucketGraph::new(3, 2, true);
        graph.add_forward_jump_arc(v(1), 0, 7.5, v(2));
        graph.add_forward_jump_arc(v(2), 1, 3.0, v(1));
        assert!(graph.contains_arc(v(1), v(2)));

        graph.delete_edge(Edge::new(v(1), v(2)));
        assert!(!graph.contains_arc(v(1), v(2)));
        assert!(!graph.contains_arc(v(2), v(1)));
        assert_eq!(graph.num_forward_jump_arcs(), 0);
    }

    #[test]
    fn test_deletions_commute() {
        let e1 = Edge::new(v(0), v(1));
        let e2 = Edge::new(v(2), v(3));

        let mut a = BucketGraph::complete(4, 3, false);
        a.delete_edge(e1);
        a.delete_edge(e2);

        let mut b = BucketGraph::complete(4, 3, false);
        b.delete_edge(e2);
        b.delete_edge(e1);

        assert_eq!(a, b);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let e = Edge::new(v(0), v(1));
        let mut a = BucketGraph::complete(3, 2, true);
        a.delete_edge(e);
        let snapshot = a.clone();
        a.delete_edge(e);
        assert_eq!(a, snapshot);
    }
}
