//! Forest ensemble for a fixed graph whose restart probability may change.
//!
//! Only the forests are stored. Lowering α is repaired in place: each root stays absorbing
//! with probability `new / old` and otherwise draws a neighbor, and the trees this opens up
//! are resolved by cycle popping. Every non-root pointer is already a valid sample under the
//! lower α, so nothing else is redrawn.

use log::{debug, info};

use crate::config::{check_alpha, PprConfig};
use crate::forest::{draw_step, refine_with_forests, WalkForest};
use crate::graph::{EdgeSerial, Graph};
use crate::index::PprIndex;
use crate::queue::UniqueQueue;
use crate::random::RandomSource;
use crate::stack_index::check_count;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStackIndex {
    forests: Vec<WalkForest>,
}

impl StaticStackIndex {
    /// Build `config.omega()` forests.
    pub fn build<G, R>(graph: &G, config: &PprConfig, rng: &mut R) -> Result<Self>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        Self::with_forests(graph, config, config.omega(), rng)
    }

    pub fn with_forests<G, R>(
        graph: &G,
        config: &PprConfig,
        forests: usize,
        rng: &mut R,
    ) -> Result<Self>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        config.validate()?;
        check_count("forest count", forests)?;
        info!(
            "building static index: {forests} forests over {} nodes",
            graph.node_count()
        );
        let mut intree = Vec::new();
        let forests = (0..forests)
            .map(|_| sample_forest(graph, config.alpha, &mut intree, rng))
            .collect();
        Ok(Self { forests })
    }

    /// Parallel build; forest `i` uses a generator seeded by `(seed, i)`.
    #[cfg(feature = "parallel")]
    pub fn build_parallel<G>(
        graph: &G,
        config: &PprConfig,
        forests: usize,
        seed: u64,
    ) -> Result<Self>
    where
        G: Graph + Sync + ?Sized,
    {
        use rayon::prelude::*;

        config.validate()?;
        check_count("forest count", forests)?;
        let alpha = config.alpha;
        let forests = (0..forests)
            .into_par_iter()
            .map(|i| {
                let mut rng = crate::random::seeded(crate::random::mix64(seed ^ i as u64));
                sample_forest(graph, alpha, &mut Vec::new(), &mut rng)
            })
            .collect();
        Ok(Self { forests })
    }

    pub fn forest_count(&self) -> usize {
        self.forests.len()
    }

    pub fn forests(&self) -> &[WalkForest] {
        &self.forests
    }

    fn rebuild<G, R>(&mut self, graph: &G, alpha: f64, rng: &mut R)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let mut intree = Vec::new();
        for forest in &mut self.forests {
            *forest = sample_forest(graph, alpha, &mut intree, rng);
        }
    }

    fn lower_alpha<G, R>(&mut self, graph: &G, old: f64, alpha: f64, rng: &mut R)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let reopen = 1.0 - alpha / old;
        let mut repair = Reopening::new(graph.node_count());
        for (i, forest) in self.forests.iter_mut().enumerate() {
            let (opened, popped) = repair.run(forest, graph, alpha, reopen, rng);
            debug!("forest {i}: reopened {opened} roots, popped {popped} cycle nodes");
        }
    }
}

fn sample_forest<G, R>(graph: &G, alpha: f64, intree: &mut Vec<bool>, rng: &mut R) -> WalkForest
where
    G: Graph + ?Sized,
    R: RandomSource,
{
    let mut forest = WalkForest::new(graph.node_count());
    forest.root_all(graph, intree, |u| draw_step(graph, u, alpha, rng));
    forest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Attached to a tree that survives the update.
    Final,
    /// Its tree was dissolved; needs a new root.
    Pending,
}

/// Scratch state for lowering α on one forest at a time.
struct Reopening {
    status: Vec<Status>,
    opened: Vec<bool>,
    stamp: Vec<u32>,
    epoch: u32,
    queue: UniqueQueue,
}

impl Reopening {
    fn new(node_count: usize) -> Self {
        Self {
            status: vec![Status::Final; node_count],
            opened: vec![false; node_count],
            stamp: vec![0; node_count],
            epoch: 0,
            queue: UniqueQueue::new(node_count),
        }
    }

    /// Returns `(roots reopened, cycle nodes redrawn)`.
    fn run<G, R>(
        &mut self,
        forest: &mut WalkForest,
        graph: &G,
        alpha: f64,
        reopen: f64,
        rng: &mut R,
    ) -> (usize, usize)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let n = forest.node_count();
        self.opened.fill(false);
        self.queue.reset(n);

        let mut opened = 0;
        for r in 0..n {
            if !forest.is_root(r) || graph.is_dangling(r) || !rng.coin(reopen) {
                continue;
            }
            let degree = graph.out_degree(r);
            forest.set_next(r, Some(graph.neighbor(r, rng.uniform_int(degree))));
            self.opened[r] = true;
            self.queue.push(r);
            opened += 1;
        }
        if opened == 0 {
            return (0, 0);
        }

        for u in 0..n {
            self.status[u] = if self.opened[forest.root(u)] {
                Status::Pending
            } else {
                Status::Final
            };
        }
        for r in 0..n {
            if self.opened[r] {
                forest.clear_volume(r);
            }
        }

        let mut popped = 0;
        while let Some(u) = self.queue.pop() {
            popped += self.resolve(forest, graph, alpha, u, rng);
        }
        for u in 0..n {
            popped += self.resolve(forest, graph, alpha, u, rng);
        }
        (opened, popped)
    }

    /// Attach `u`, and the path it leads along, to a tree, popping any cycle on the way.
    fn resolve<G, R>(
        &mut self,
        forest: &mut WalkForest,
        graph: &G,
        alpha: f64,
        u: usize,
        rng: &mut R,
    ) -> usize
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let mut popped = 0;
        while self.status[u] == Status::Pending {
            self.next_epoch();
            let mut cur = u;
            while self.status[cur] == Status::Pending && self.stamp[cur] != self.epoch {
                self.stamp[cur] = self.epoch;
                match forest.next(cur) {
                    Some(v) => cur = v,
                    None => break,
                }
            }

            if self.status[cur] == Status::Final {
                let root = forest.root(cur);
                self.attach_path(forest, graph, u, cur, root);
            } else if forest.next(cur).is_none() {
                forest.make_root(cur, graph.out_degree(cur));
                self.status[cur] = Status::Final;
                self.attach_path(forest, graph, u, cur, cur);
            } else {
                popped += self.pop_cycle(forest, graph, alpha, cur, rng);
            }
        }
        popped
    }

    fn attach_path<G: Graph + ?Sized>(
        &mut self,
        forest: &mut WalkForest,
        graph: &G,
        from: usize,
        end: usize,
        root: usize,
    ) {
        let mut node = from;
        while node != end {
            forest.attach(node, root, graph.out_degree(node));
            self.status[node] = Status::Final;
            match forest.next(node) {
                Some(v) => node = v,
                None => break,
            }
        }
    }

    fn pop_cycle<G, R>(
        &mut self,
        forest: &mut WalkForest,
        graph: &G,
        alpha: f64,
        start: usize,
        rng: &mut R,
    ) -> usize
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let mut node = start;
        let mut len = 0;
        loop {
            let after = forest.next(node);
            forest.set_next(node, draw_step(graph, node, alpha, rng));
            self.queue.push(node);
            len += 1;
            match after {
                Some(v) if v != start => node = v,
                _ => break,
            }
        }
        len
    }

    fn next_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamp.fill(0);
            self.epoch = 1;
        }
    }
}

impl PprIndex for StaticStackIndex {
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
        refine_with_forests(graph, self.forests.iter(), self.forests.len(), reserve, residual);
    }

    /// Lowering α repairs forests in place; raising it resamples them.
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
        if alpha < old {
            info!("static index: lowering alpha {old} -> {alpha}");
            self.lower_alpha(graph, old, alpha, rng);
        } else if alpha > old {
            info!("static index: raising alpha {old} -> {alpha}, rebuilding");
            self.rebuild(graph, alpha, rng);
        }
        Ok(())
    }

    fn supports_edge_updates(&self) -> bool {
        false
    }

    fn update_insert<G, R>(
        &mut self,
        _graph: &G,
        _config: &PprConfig,
        _a: usize,
        _b: usize,
        _serial: EdgeSerial,
        _rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        Err(Error::UnsupportedUpdate("edge insertion"))
    }

    fn update_delete<G, R>(
        &mut self,
        _graph: &G,
        _config: &PprConfig,
        _a: usize,
        _b: usize,
        _serial: EdgeSerial,
        _rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        Err(Error::UnsupportedUpdate("edge deletion"))
    }
}
