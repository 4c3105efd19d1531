//! FORA: forward push followed by index refinement.

use std::time::{Duration, Instant};

use log::{debug, error};

use crate::config::PprConfig;
use crate::graph::{DynamicGraph, Graph};
use crate::index::PprIndex;
use crate::push::forward_push;
use crate::queue::UniqueQueue;
use crate::random::RandomSource;
use crate::{check_node, Error, Result};

/// Counters and phase timings of one query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryStats {
    pub pushes: usize,
    pub push_time: Duration,
    pub refine_time: Duration,
}

/// Single-source PPR evaluator.
///
/// Holds only query scratch space, so one evaluator can be reused across queries, graphs and
/// indexes.
#[derive(Debug, Clone, Default)]
pub struct Fora {
    queue: UniqueQueue,
    residual: Vec<f64>,
}

impl Fora {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate PPR from `source` and hand the estimate to `output`.
    pub fn evaluate<G, I, R, F>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        index: &I,
        source: usize,
        rng: &mut R,
        output: F,
    ) -> Result<QueryStats>
    where
        G: Graph + ?Sized,
        I: PprIndex,
        R: RandomSource,
        F: FnOnce(&[f64]),
    {
        check_node(graph, source)?;
        let n = graph.node_count();
        let mut reserve = vec![0.0; n];
        self.residual.resize(n, 0.0);

        let timer = Instant::now();
        let pushes = forward_push(
            graph,
            source,
            config.alpha,
            config.rmax,
            &mut reserve,
            &mut self.residual,
            &mut self.queue,
        );
        let push_time = timer.elapsed();

        let timer = Instant::now();
        index.refine(graph, config, &mut reserve, &self.residual, rng);
        let refine_time = timer.elapsed();

        debug!(
            "query {source}: {pushes} pushes in {:.3}ms, refine in {:.3}ms",
            push_time.as_secs_f64() * 1e3,
            refine_time.as_secs_f64() * 1e3
        );
        output(&reserve);
        Ok(QueryStats {
            pushes,
            push_time,
            refine_time,
        })
    }

    /// [`Fora::evaluate`], returning the estimate.
    pub fn estimate<G, I, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        index: &I,
        source: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>>
    where
        G: Graph + ?Sized,
        I: PprIndex,
        R: RandomSource,
    {
        let mut estimate = Vec::new();
        self.evaluate(graph, config, index, source, rng, |reserve| {
            estimate.extend_from_slice(reserve)
        })?;
        Ok(estimate)
    }

    /// Insert `u -> v` (and `v -> u` for undirected configs) and repair `index`.
    ///
    /// Returns `Ok(false)` without touching the index if the arc already exists. An
    /// [`Error::AsymmetricEdge`] leaves the graph half-updated; discard it.
    pub fn insert_edge<G, I, R>(
        graph: &mut G,
        config: &PprConfig,
        index: &mut I,
        u: usize,
        v: usize,
        rng: &mut R,
    ) -> Result<bool>
    where
        G: DynamicGraph + ?Sized,
        I: PprIndex,
        R: RandomSource,
    {
        check_update(&*graph, index, u, v, "edge insertion")?;
        let Some(serial) = graph.insert_edge(u, v) else {
            return Ok(false);
        };
        index.update_insert(&*graph, config, u, v, serial, rng)?;

        if !config.is_directed && u != v {
            let Some(serial) = graph.insert_edge(v, u) else {
                error!("undirected insert {u} - {v}: reverse arc already present");
                return Err(Error::AsymmetricEdge { from: v, to: u });
            };
            index.update_insert(&*graph, config, v, u, serial, rng)?;
        }
        Ok(true)
    }

    /// Delete `u -> v` (and `v -> u` for undirected configs) and repair `index`.
    ///
    /// Returns `Ok(false)` without touching the index if the arc is absent.
    pub fn delete_edge<G, I, R>(
        graph: &mut G,
        config: &PprConfig,
        index: &mut I,
        u: usize,
        v: usize,
        rng: &mut R,
    ) -> Result<bool>
    where
        G: DynamicGraph + ?Sized,
        I: PprIndex,
        R: RandomSource,
    {
        check_update(&*graph, index, u, v, "edge deletion")?;
        let Some(serial) = graph.delete_edge(u, v) else {
            return Ok(false);
        };
        index.update_delete(&*graph, config, u, v, serial, rng)?;

        if !config.is_directed && u != v {
            let Some(serial) = graph.delete_edge(v, u) else {
                error!("undirected delete {u} - {v}: reverse arc missing");
                return Err(Error::AsymmetricEdge { from: v, to: u });
            };
            index.update_delete(&*graph, config, v, u, serial, rng)?;
        }
        Ok(true)
    }
}

fn check_update<G, I>(graph: &G, index: &I, u: usize, v: usize, what: &'static str) -> Result<()>
where
    G: Graph + ?Sized,
    I: PprIndex,
{
    check_node(graph, u)?;
    check_node(graph, v)?;
    if !index.supports_edge_updates() {
        return Err(Error::UnsupportedUpdate(what));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyList;
    use crate::random::seeded;
    use crate::stack_index::StackIndex;

    #[test]
    fn out_of_range_source_is_rejected() {
        let g = AdjacencyList::from_edges(2, &[(0, 1)], true);
        let c = PprConfig::default();
        let mut rng = seeded(0);
        let idx = StackIndex::with_forests(&g, &c, 1, &mut rng).unwrap();
        let err = Fora::new().estimate(&g, &c, &idx, 5, &mut rng).unwrap_err();
        assert!(matches!(err, Error::NodeOutOfRange { node: 5, node_count: 2 }));
    }

    #[test]
    fn no_op_updates_return_false() {
        let mut g = AdjacencyList::from_edges(3, &[(0, 1), (1, 2)], true);
        let c = PprConfig::default();
        let mut rng = seeded(1);
        let mut idx = StackIndex::with_forests(&g, &c, 2, &mut rng).unwrap();
        let before = idx.clone();
        assert!(!Fora::insert_edge(&mut g, &c, &mut idx, 0, 1, &mut rng).unwrap());
        assert!(!Fora::delete_edge(&mut g, &c, &mut idx, 2, 0, &mut rng).unwrap());
        assert_eq!(idx, before);
    }

    #[test]
    fn out_of_range_endpoint_leaves_graph_alone() {
        let mut g = AdjacencyList::from_edges(3, &[(0, 1)], true);
        let c = PprConfig::default();
        let mut rng = seeded(2);
        let mut idx = StackIndex::with_forests(&g, &c, 2, &mut rng).unwrap();
        assert!(Fora::insert_edge(&mut g, &c, &mut idx, 0, 3, &mut rng).is_err());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn asymmetric_graph_is_reported() {
        // directed arc 1 -> 0 already present, so mirroring 0 - 1 fails
        let mut g = AdjacencyList::from_edges(2, &[(1, 0)], true);
        let c = PprConfig {
            is_directed: false,
            ..PprConfig::default()
        };
        let mut rng = seeded(3);
        let mut idx = StackIndex::with_forests(&g, &c, 2, &mut rng).unwrap();
        let err = Fora::insert_edge(&mut g, &c, &mut idx, 0, 1, &mut rng).unwrap_err();
        assert!(matches!(err, Error::AsymmetricEdge { from: 1, to: 0 }));
    }
}
