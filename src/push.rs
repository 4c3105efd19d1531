//! Forward push from a single source.

use crate::graph::Graph;
use crate::queue::UniqueQueue;

/// Local push from `source` with residual threshold `rmax` per unit of degree.
///
/// Overwrites `reserve` and `residual` (both of length `node_count`). On return every
/// non-dangling `v` has `residual[v] < rmax * out_degree(v)`, dangling nodes hold no
/// residual, and `reserve + residual` sums to 1. Returns the number of pushes.
pub fn forward_push<G: Graph + ?Sized>(
    graph: &G,
    source: usize,
    alpha: f64,
    rmax: f64,
    reserve: &mut [f64],
    residual: &mut [f64],
    queue: &mut UniqueQueue,
) -> usize {
    let n = graph.node_count();
    debug_assert_eq!(reserve.len(), n);
    debug_assert_eq!(residual.len(), n);
    reserve.fill(0.0);
    residual.fill(0.0);
    queue.reset(n);

    if graph.is_dangling(source) {
        reserve[source] = 1.0;
        return 0;
    }
    residual[source] = 1.0;
    if residual[source] >= rmax * graph.out_degree(source) as f64 {
        queue.push(source);
    }

    let mut pushes = 0;
    while let Some(u) = queue.pop() {
        let mass = residual[u];
        residual[u] = 0.0;
        reserve[u] += alpha * mass;
        let neighbors = graph.neighbors_ref(u);
        let delta = (1.0 - alpha) * mass / neighbors.len() as f64;
        for &v in neighbors {
            let degree = graph.out_degree(v);
            if degree == 0 {
                reserve[v] += delta;
                continue;
            }
            residual[v] += delta;
            if residual[v] >= rmax * degree as f64 {
                queue.push(v);
            }
        }
        pushes += 1;
    }
    pushes
}
