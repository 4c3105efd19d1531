//! Plain random-walk indexes, used as baselines for the forest indexes.

use log::{debug, info};

use crate::config::{check_alpha, PprConfig};
use crate::graph::{EdgeSerial, Graph};
use crate::index::PprIndex;
use crate::random::RandomSource;
use crate::stack_index::check_count;
use crate::{check_node, Result};

/// Walk from `start`, stopping with probability `alpha` at each node (and unconditionally at
/// a dangling one). Returns the terminal node.
pub fn restart_walk<G, R>(graph: &G, start: usize, alpha: f64, rng: &mut R) -> usize
where
    G: Graph + ?Sized,
    R: RandomSource,
{
    let mut cur = start;
    loop {
        let degree = graph.out_degree(cur);
        if degree == 0 || rng.coin(alpha) {
            return cur;
        }
        cur = graph.neighbor(cur, rng.uniform_int(degree));
    }
}

/// Precomputed walk terminals, a fixed number per node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkIndex {
    walks: usize,
    terminals: Vec<Vec<usize>>,
}

impl WalkIndex {
    /// Sample `config.omega()` walks per node.
    pub fn build<G, R>(graph: &G, config: &PprConfig, rng: &mut R) -> Result<Self>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        Self::with_walks(graph, config, config.omega(), rng)
    }

    pub fn with_walks<G, R>(graph: &G, config: &PprConfig, walks: usize, rng: &mut R) -> Result<Self>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        config.validate()?;
        check_count("walks per node", walks)?;
        info!(
            "building walk index: {walks} walks over {} nodes",
            graph.node_count()
        );
        let mut index = Self {
            walks,
            terminals: Vec::new(),
        };
        index.resample(graph, config.alpha, rng);
        Ok(index)
    }

    pub fn walks_per_node(&self) -> usize {
        self.walks
    }

    pub fn terminals(&self, node: usize) -> &[usize] {
        &self.terminals[node]
    }

    fn resample<G, R>(&mut self, graph: &G, alpha: f64, rng: &mut R)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let walks = self.walks;
        self.terminals = (0..graph.node_count())
            .map(|u| (0..walks).map(|_| restart_walk(graph, u, alpha, rng)).collect())
            .collect();
    }
}

impl PprIndex for WalkIndex {
    fn refine<G, R>(
        &self,
        graph: &G,
        _config: &PprConfig,
        reserve: &mut [f64],
        residual: &[f64],
        _rng: &mut R,
    ) where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        for (u, &mass) in residual.iter().enumerate() {
            if mass == 0.0 {
                continue;
            }
            if graph.is_dangling(u) {
                reserve[u] += mass;
                continue;
            }
            let share = mass / self.walks as f64;
            for &t in &self.terminals[u] {
                reserve[t] += share;
            }
        }
    }

    fn update_alpha<G, R>(
        &mut self,
        graph: &G,
        config: &mut PprConfig,
        alpha: f64,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_alpha(alpha)?;
        let old = config.alpha;
        config.alpha = alpha;
        if alpha != old {
            self.resample(graph, alpha, rng);
        }
        Ok(())
    }

    fn update_insert<G, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        a: usize,
        b: usize,
        _serial: EdgeSerial,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)?;
        debug!("walk index: insert {a} -> {b}, resampling");
        self.resample(graph, config.alpha, rng);
        Ok(())
    }

    fn update_delete<G, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        a: usize,
        b: usize,
        _serial: EdgeSerial,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)?;
        debug!("walk index: delete {a} -> {b}, resampling");
        self.resample(graph, config.alpha, rng);
        Ok(())
    }
}

/// Stores nothing; every refinement samples `config.omega()` fresh walks per node that
/// holds residual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RealtimeIndex;

impl RealtimeIndex {
    pub fn new() -> Self {
        Self
    }
}

impl PprIndex for RealtimeIndex {
    /// Unlike the stored indexes this consumes `rng`, so repeated refinements differ.
    fn refine<G, R>(
        &self,
        graph: &G,
        config: &PprConfig,
        reserve: &mut [f64],
        residual: &[f64],
        rng: &mut R,
    ) where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let walks = config.omega();
        for (u, &mass) in residual.iter().enumerate() {
            if mass == 0.0 {
                continue;
            }
            let share = mass / walks as f64;
            for _ in 0..walks {
                reserve[restart_walk(graph, u, config.alpha, rng)] += share;
            }
        }
    }

    fn update_alpha<G, R>(
        &mut self,
        _graph: &G,
        config: &mut PprConfig,
        alpha: f64,
        _rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_alpha(alpha)?;
        config.alpha = alpha;
        Ok(())
    }

    fn update_insert<G, R>(
        &mut self,
        graph: &G,
        _config: &PprConfig,
        a: usize,
        b: usize,
        _serial: EdgeSerial,
        _rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)
    }

    fn update_delete<G, R>(
        &mut self,
        graph: &G,
        _config: &PprConfig,
        a: usize,
        b: usize,
        _serial: EdgeSerial,
        _rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyList;
    use crate::random::seeded;

    #[test]
    fn walk_stops_at_dangling_node() {
        let g = AdjacencyList::from_edges(3, &[(0, 1), (1, 2)], true);
        let mut rng = seeded(0);
        for _ in 0..50 {
            let t = restart_walk(&g, 0, 0.01, &mut rng);
            assert!(t <= 2);
        }
        assert_eq!(restart_walk(&g, 2, 0.5, &mut rng), 2);
    }

    #[test]
    fn refine_conserves_mass() {
        let g = AdjacencyList::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], false);
        let c = PprConfig::default();
        let mut rng = seeded(8);
        let idx = WalkIndex::with_walks(&g, &c, 10, &mut rng).unwrap();
        assert_eq!(idx.terminals(2).len(), 10);

        let mut reserve = vec![0.0; 4];
        idx.refine(&g, &c, &mut reserve, &[0.25, 0.0, 0.5, 0.0], &mut rng);
        let total: f64 = reserve.iter().sum();
        assert!((total - 0.75).abs() < 1e-12);

        let mut reserve = vec![0.0; 4];
        RealtimeIndex::new().refine(&g, &c, &mut reserve, &[0.0, 1.0, 0.0, 0.0], &mut rng);
        let total: f64 = reserve.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
