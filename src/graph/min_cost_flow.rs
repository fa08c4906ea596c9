use crate::graph::matrix::{Capacity, Matrix, MatrixError, UNBOUNDED};
use log::{debug, trace};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors arising from invalid solver input or an ill-posed problem.
///
/// Networks produced by the builder never trigger these; seeing one means
/// the input was constructed by hand or the builder has a defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error(transparent)]
    Shape(#[from] MatrixError),
    #[error("capacity matrix is {capacity}x{capacity} but cost matrix is {cost}x{cost}")]
    DimensionMismatch { capacity: usize, cost: usize },
    #[error("node index {index} out of range for a {size}-node network")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("source and sink are the same node ({0})")]
    SourceIsSink(usize),
    #[error("negative capacity {value} on edge ({row}, {col})")]
    NegativeCapacity {
        row: usize,
        col: usize,
        value: Capacity,
    },
    #[error("residual graph contains a negative-cost cycle")]
    NegativeCycle,
    #[error("source reaches sink through unbounded edges only; max flow is infinite")]
    UnboundedFlow,
    #[error("flow or cost total overflowed")]
    Overflow,
}

/// Flow computed by [`MinCostMaxFlow::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSolution {
    flow: Matrix,
    total_flow: Capacity,
    total_cost: i64,
    augmentations: usize,
}

impl FlowSolution {
    /// Flow on each edge, indexed like the capacity matrix.
    pub fn flow(&self) -> &Matrix {
        &self.flow
    }

    /// Value of the flow: total leaving the source.
    pub fn total_flow(&self) -> Capacity {
        self.total_flow
    }

    /// Sum of `flow * cost` over all edges.
    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }

    /// Number of augmenting paths used.
    pub fn augmentations(&self) -> usize {
        self.augmentations
    }
}

/// One direction of a residual edge pair.
#[derive(Debug, Clone, Copy)]
struct Arc {
    residual: Capacity,
    cost: i64,
    twin: EdgeIndex,
    /// Forward arc whose capacity is the [`UNBOUNDED`] sentinel.
    unbounded: bool,
}

/// Residual graph with paired forward / reverse arcs.
struct ResidualGraph {
    graph: DiGraph<(), Arc>,
    /// `(row, col, forward arc)` for every input edge.
    forward: Vec<(usize, usize, EdgeIndex)>,
}

struct AugmentingPath {
    /// Arcs from sink back to source.
    arcs: Vec<EdgeIndex>,
    cost: i64,
}

impl ResidualGraph {
    fn new(capacity: &Matrix, cost: &Matrix) -> Self {
        let n = capacity.size();
        let mut graph = DiGraph::with_capacity(n, 0);
        for _ in 0..n {
            graph.add_node(());
        }
        let mut forward = Vec::new();
        for (row, col, cap) in capacity.entries() {
            if cap <= 0 || row == col {
                continue;
            }
            let edge_cost = cost.get(row, col);
            let (u, v) = (NodeIndex::new(row), NodeIndex::new(col));
            let fwd = graph.add_edge(
                u,
                v,
                Arc {
                    residual: cap,
                    cost: edge_cost,
                    twin: EdgeIndex::end(),
                    unbounded: cap == UNBOUNDED,
                },
            );
            let rev = graph.add_edge(
                v,
                u,
                Arc {
                    residual: 0,
                    cost: -edge_cost,
                    twin: fwd,
                    unbounded: false,
                },
            );
            graph[fwd].twin = rev;
            forward.push((row, col, fwd));
        }
        Self { graph, forward }
    }

    /// Cheapest source→sink path over arcs with positive residual, found with
    /// a queue-based Bellman–Ford (SPFA) so negative reverse costs are fine.
    fn shortest_path(
        &self,
        source: usize,
        sink: usize,
    ) -> Result<Option<AugmentingPath>, SolverError> {
        let n = self.graph.node_count();
        let mut dist: Vec<Option<i64>> = vec![None; n];
        let mut pred: Vec<Option<EdgeIndex>> = vec![None; n];
        let mut hops = vec![0usize; n];
        let mut queued = vec![false; n];
        let mut queue = VecDeque::new();

        dist[source] = Some(0);
        queue.push_back(source);
        queued[source] = true;

        while let Some(u) = queue.pop_front() {
            queued[u] = false;
            let Some(du) = dist[u] else { continue };
            for edge in self.graph.edges(NodeIndex::new(u)) {
                let arc = edge.weight();
                if arc.residual <= 0 {
                    continue;
                }
                let v = edge.target().index();
                let candidate = du.checked_add(arc.cost).ok_or(SolverError::Overflow)?;
                if dist[v].map_or(true, |dv| candidate < dv) {
                    dist[v] = Some(candidate);
                    pred[v] = Some(edge.id());
                    hops[v] = hops[u] + 1;
                    if hops[v] >= n {
                        return Err(SolverError::NegativeCycle);
                    }
                    if !queued[v] {
                        queued[v] = true;
                        queue.push_back(v);
                    }
                }
            }
        }

        let Some(cost) = dist[sink] else {
            return Ok(None);
        };
        let mut arcs = Vec::new();
        let mut v = sink;
        while v != source {
            let Some(e) = pred[v] else {
                return Ok(None);
            };
            arcs.push(e);
            v = match self.graph.edge_endpoints(e) {
                Some((u, _)) => u.index(),
                None => return Ok(None),
            };
        }
        Ok(Some(AugmentingPath { arcs, cost }))
    }

    fn bottleneck(&self, path: &AugmentingPath) -> Capacity {
        path.arcs
            .iter()
            .map(|&e| self.graph[e].residual)
            .min()
            .unwrap_or(0)
    }

    fn is_unbounded(&self, path: &AugmentingPath) -> bool {
        path.arcs.iter().all(|&e| self.graph[e].unbounded)
    }

    fn augment(&mut self, path: &AugmentingPath, amount: Capacity) {
        for &e in &path.arcs {
            let twin = self.graph[e].twin;
            self.graph[e].residual -= amount;
            self.graph[twin].residual += amount;
        }
    }

    /// Flow on each input edge is the residual of its reverse arc.
    fn flow_matrix(&self, size: usize) -> Matrix {
        let mut flow = Matrix::zeros(size);
        for &(row, col, fwd) in &self.forward {
            let twin = self.graph[fwd].twin;
            flow.set(row, col, self.graph[twin].residual);
        }
        flow
    }
}

/// Min-cost max-flow by successive shortest augmenting paths.
///
/// # Algorithm
///
/// 1. Build a residual graph: forward residual = capacity − flow, reverse
///    residual = flow at negated cost.
/// 2. Find the cheapest source→sink path with positive residual.
/// 3. Push the path's bottleneck along it and update both directions.
/// 4. Repeat until the sink is unreachable.
///
/// The result is a maximum flow, and of all maximum flows the cheapest.
/// Conservation holds at every node except source and sink, and
/// `0 ≤ flow ≤ capacity` on every edge.
///
/// # Examples
///
/// ```
/// use adx_demand::graph::matrix::Matrix;
/// use adx_demand::graph::min_cost_flow::MinCostMaxFlow;
///
/// let capacity = Matrix::from_rows(vec![
///     vec![0, 10, 0, 0],
///     vec![0, 0, 7, 0],
///     vec![0, 0, 0, 100],
///     vec![0, 0, 0, 0],
/// ]).unwrap();
/// let cost = Matrix::filled(4, 1);
///
/// let solution = MinCostMaxFlow::solve(&capacity, &cost, 0, 3).unwrap();
/// assert_eq!(solution.total_flow(), 7);
/// ```
pub struct MinCostMaxFlow;

impl MinCostMaxFlow {
    /// Solve on a square capacity / cost matrix pair.
    pub fn solve(
        capacity: &Matrix,
        cost: &Matrix,
        source: usize,
        sink: usize,
    ) -> Result<FlowSolution, SolverError> {
        Self::check_preconditions(capacity, cost, source, sink)?;

        let mut residual = ResidualGraph::new(capacity, cost);
        let mut total_flow: Capacity = 0;
        let mut total_cost: i64 = 0;
        let mut augmentations = 0;

        while let Some(path) = residual.shortest_path(source, sink)? {
            if residual.is_unbounded(&path) {
                return Err(SolverError::UnboundedFlow);
            }
            let amount = residual.bottleneck(&path);
            residual.augment(&path, amount);

            total_flow = total_flow
                .checked_add(amount)
                .ok_or(SolverError::Overflow)?;
            total_cost = amount
                .checked_mul(path.cost)
                .and_then(|c| total_cost.checked_add(c))
                .ok_or(SolverError::Overflow)?;
            augmentations += 1;
            trace!(
                "augmenting path of {} arcs: +{} at unit cost {}",
                path.arcs.len(),
                amount,
                path.cost
            );
        }

        debug!(
            "min-cost max-flow: {} nodes, flow {}, cost {}, {} augmentations",
            capacity.size(),
            total_flow,
            total_cost,
            augmentations
        );

        Ok(FlowSolution {
            flow: residual.flow_matrix(capacity.size()),
            total_flow,
            total_cost,
            augmentations,
        })
    }

    /// Solve on row-vector input, rejecting non-square matrices.
    pub fn solve_rows(
        capacity: Vec<Vec<Capacity>>,
        cost: Vec<Vec<Capacity>>,
        source: usize,
        sink: usize,
    ) -> Result<FlowSolution, SolverError> {
        let capacity = Matrix::from_rows(capacity)?;
        let cost = Matrix::from_rows(cost)?;
        Self::solve(&capacity, &cost, source, sink)
    }

    fn check_preconditions(
        capacity: &Matrix,
        cost: &Matrix,
        source: usize,
        sink: usize,
    ) -> Result<(), SolverError> {
        let size = capacity.size();
        if cost.size() != size {
            return Err(SolverError::DimensionMismatch {
                capacity: size,
                cost: cost.size(),
            });
        }
        for index in [source, sink] {
            if index >= size {
                return Err(SolverError::IndexOutOfRange { index, size });
            }
        }
        if source == sink {
            return Err(SolverError::SourceIsSink(source));
        }
        if let Some((row, col, value)) = capacity.entries().find(|&(_, _, v)| v < 0) {
            return Err(SolverError::NegativeCapacity { row, col, value });
        }
        Ok(())
    }
}
