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

//! The immutable problem instance.
//!
//! The instance is built once (either programmatically through
//! [`InstanceBuilder`] or by the TSPLIB-like loader) and then shared
//! read-only by every search component. The problem class is a runtime
//! value: the same binary solves CVRP and VRPTW.

use crate::index::{DEPOT, VertexIndex};

/// The problem class of an instance.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum VrpKind {
    /// Capacitated VRP: capacity is the only resource.
    #[default]
    Cvrp,
    /// VRP with time windows: capacity plus per-vertex time windows and
    /// service times.
    Vrptw,
}

impl std::fmt::Display for VrpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VrpKind::Cvrp => write!(f, "CVRP"),
            VrpKind::Vrptw => write!(f, "VRPTW"),
        }
    }
}

/// A closed time window `[earliest, latest]` on service start.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TimeWindow {
    pub earliest: f64,
    pub latest: f64,
}

impl TimeWindow {
    /// The unconstrained window.
    #[inline]
    pub const fn open() -> Self {
        Self {
            earliest: 0.0,
            latest: f64::INFINITY,
        }
    }
}

/// An immutable CVRP/VRPTW instance.
///
/// Vertex 0 is the depot. The cost matrix is symmetric; it is precomputed by
/// the builder so that the hot paths of pricing and scoring never touch
/// coordinates.
#[derive(Clone, Debug)]
pub struct Instance {
    name: String,
    kind: VrpKind,
    dim: usize,
    capacity: f64,
    demands: Vec<f64>,
    costs: Vec<f64>,
    time_windows: Vec<TimeWindow>,
    service_times: Vec<f64>,
}

impl Instance {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn kind(&self) -> VrpKind {
        self.kind
    }

    /// Number of vertices including the depot.
    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of customers (dimension minus the depot).
    #[inline(always)]
    pub fn num_customers(&self) -> usize {
        self.dim - 1
    }

    #[inline(always)]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Demand of a vertex; the depot's demand is zero.
    ///
    /// # Panics
    ///
    /// Panics if `v` is out of bounds.
    #[inline]
    pub fn demand(&self, v: VertexIndex) -> f64 {
        self.demands[v.get()]
    }

    /// Travel cost between two vertices.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn cost(&self, a: VertexIndex, b: VertexIndex) -> f64 {
        self.costs[a.get() * self.dim + b.get()]
    }

    /// Time window of a vertex. For CVRP instances every window is open.
    #[inline]
    pub fn time_window(&self, v: VertexIndex) -> TimeWindow {
        self.time_windows[v.get()]
    }

    /// Service time at a vertex. Zero for CVRP instances.
    #[inline]
    pub fn service_time(&self, v: VertexIndex) -> f64 {
        self.service_times[v.get()]
    }

    /// Iterates over all customer vertices (`1..dim`).
    #[inline]
    pub fn customers(&self) -> impl Iterator<Item = VertexIndex> + '_ {
        (1..self.dim).map(VertexIndex::new)
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance({}, {}, dim: {}, capacity: {})",
            self.name, self.kind, self.dim, self.capacity
        )
    }
}

/// Mutable builder for [`Instance`], optimized for configuration.
///
/// The builder validates eagerly on `build`; the search engine assumes a
/// well-formed instance.
#[derive(Clone, Debug)]
pub struct InstanceBuilder {
    name: String,
    kind: VrpKind,
    dim: usize,
    capacity: f64,
    demands: Vec<f64>,
    coords: Vec<(f64, f64)>,
    explicit_costs: Option<Vec<f64>>,
    time_windows: Vec<TimeWindow>,
    service_times: Vec<f64>,
}

impl InstanceBuilder {
    /// Creates a builder for an instance with `dim` vertices (depot
    /// included).
    ///
    /// # Panics
    ///
    /// Panics if `dim < 2`: an instance needs at least one customer.
    pub fn new(dim: usize, kind: VrpKind) -> Self {
        assert!(
            dim >= 2,
            "called `InstanceBuilder::new` with dimension {}, need at least a depot and one customer",
            dim
        );
        Self {
            name: String::from("unnamed"),
            kind,
            dim,
            capacity: f64::INFINITY,
            demands: vec![0.0; dim],
            coords: vec![(0.0, 0.0); dim],
            explicit_costs: None,
            time_windows: vec![TimeWindow::open(); dim],
            service_times: vec![0.0; dim],
        }
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn capacity(&mut self, capacity: f64) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn demand(&mut self, v: VertexIndex, demand: f64) -> &mut Self {
        self.demands[v.get()] = demand;
        self
    }

    pub fn coord(&mut self, v: VertexIndex, x: f64, y: f64) -> &mut Self {
        self.coords[v.get()] = (x, y);
        self
    }

    pub fn time_window(&mut self, v: VertexIndex, earliest: f64, latest: f64) -> &mut Self {
        self.time_windows[v.get()] = TimeWindow { earliest, latest };
        self
    }

    pub fn service_time(&mut self, v: VertexIndex, service: f64) -> &mut Self {
        self.service_times[v.get()] = service;
        self
    }

    /// Installs an explicit symmetric cost matrix instead of computing one
    /// from coordinates. Row-major, `dim * dim` entries.
    pub fn costs(&mut self, costs: Vec<f64>) -> &mut Self {
        assert_eq!(
            costs.len(),
            self.dim * self.dim,
            "called `InstanceBuilder::costs` with {} entries, expected {}",
            costs.len(),
            self.dim * self.dim
        );
        self.explicit_costs = Some(costs);
        self
    }

    /// Freezes the builder into an [`Instance`].
    ///
    /// Costs are computed from coordinates unless an explicit matrix was
    /// installed: rounded Euclidean (TSPLIB `EUC_2D` convention) for CVRP,
    /// plain Euclidean for VRPTW.
    ///
    /// # Panics
    ///
    /// Panics if the depot carries demand, if any customer demand exceeds
    /// the capacity, or if any time window is inverted.
    pub fn build(&self) -> Instance {
        assert_eq!(
            self.demands[DEPOT.get()],
            0.0,
            "called `InstanceBuilder::build` with non-zero depot demand"
        );
        for (i, &d) in self.demands.iter().enumerate().skip(1) {
            assert!(
                d <= self.capacity,
                "called `InstanceBuilder::build` with customer {} demand {} exceeding capacity {}",
                i,
                d,
                self.capacity
            );
        }
        for (i, tw) in self.time_windows.iter().enumerate() {
            assert!(
                tw.earliest <= tw.latest,
                "called `InstanceBuilder::build` with inverted time window on vertex {}: [{}, {}]",
                i,
                tw.earliest,
                tw.latest
            );
        }

        let costs = match &self.explicit_costs {
            Some(c) => c.clone(),
            None => {
                let mut costs = vec![0.0; self.dim * self.dim];
                for i in 0..self.dim {
                    for j in 0..self.dim {
                        let (xi, yi) = self.coords[i];
                        let (xj, yj) = self.coords[j];
                        let d = ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt();
                        costs[i * self.dim + j] = match self.kind {
                            VrpKind::Cvrp => d.round(),
                            VrpKind::Vrptw => d,
                        };
                    }
                }
                costs
            }
        };

        Instance {
            name: self.name.clone(),
            kind: self.kind,
            dim: self.dim,
            capacity: self.capacity,
            demands: self.demands.clone(),
            costs,
            time_windows: self.time_windows.clone(),
            service_times: self.service_times.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    #[test]
    fn test_builder_round_trips_fields() {
        let mut b = InstanceBuilder::new(3, VrpKind::Cvrp);
        b.name("toy")
            .capacity(10.0)
            .demand(v(1), 4.0)
            .demand(v(2), 5.0)
            .coord(v(1), 3.0, 0.0)
            .coord(v(2), 0.0, 4.0);
        let inst = b.build();

        assert_eq!(inst.name(), "toy");
        assert_eq!(inst.kind(), VrpKind::Cvrp);
        assert_eq!(inst.dim(), 3);
        assert_eq!(inst.num_customers(), 2);
        assert_eq!(inst.capacity(), 10.0);
        assert_eq!(inst.demand(v(1)), 4.0);
        assert_eq!(inst.demand(v(0)), 0.0);
    }

    #[test]
    fn test_cvrp_costs_are_rounded_euclidean() {
        let mut b = InstanceBuilder::new(3, VrpKind::Cvrp);
        b.coord(v(1), 3.0, 0.0).coord(v(2), 0.0, 4.0);
        let inst = b.build();

        assert_eq!(inst.cost(v(0), v(1)), 3.0);
        assert_eq!(inst.cost(v(0), v(2)), 4.0);
        // dist((3,0),(0,4)) = 5
        assert_eq!(inst.cost(v(1), v(2)), 5.0);
        // symmetry
        assert_eq!(inst.cost(v(2), v(1)), 5.0);
    }

    #[test]
    fn test_vrptw_costs_are_unrounded() {
        let mut b = InstanceBuilder::new(2, VrpKind::Vrptw);
        b.coord(v(1), 1.0, 1.0);
        let inst = b.build();
        assert!((inst.cost(v(0), v(1)) - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_cost_matrix_wins_over_coords() {
        let mut b = InstanceBuilder::new(2, VrpKind::Cvrp);
        b.coord(v(1), 100.0, 100.0);
        b.costs(vec![0.0, 7.0, 7.0, 0.0]);
        let inst = b.build();
        assert_eq!(inst.cost(v(0), v(1)), 7.0);
    }

    #[test]
    fn test_default_windows_are_open() {
        let b = InstanceBuilder::new(2, VrpKind::Cvrp);
        let inst = b.build();
        let tw = inst.time_window(v(1));
        assert_eq!(tw.earliest, 0.0);
        assert!(tw.latest.is_infinite());
        assert_eq!(inst.service_time(v(1)), 0.0);
    }

    #[test]
    #[should_panic(expected = "exceeding capacity")]
    fn test_build_rejects_oversized_demand() {
        let mut b = InstanceBuilder::new(2, VrpKind::Cvrp);
        b.capacity(5.0).demand(v(1), 6.0);
        let _ = b.build();
    }

    #[test]
    #[should_panic(expected = "inverted time window")]
    fn test_build_rejects_inverted_window() {
        let mut b = InstanceBuilder::new(2, VrpKind::Vrptw);
        b.time_window(v(1), 10.0, 5.0);
        let _ = b.build();
    }

    #[test]
    fn test_customers_iterator_skips_depot() {
        let b = InstanceBuilder::new(4, VrpKind::Cvrp);
        let inst = b.build();
        let customers: Vec<usize> = inst.customers().map(|c| c.get()).collect();
        assert_eq!(customers, vec![1, 2, 3]);
    }
}
