//! Forest ensemble with replayable step history.
//!
//! Every forest keeps, per node, the stack of steps that node has drawn. An edge update
//! rewrites or truncates only the history of the arc's tail and then replays all stacks;
//! everything before the rewritten slot is drawn again exactly as before, so repeated
//! repairs stay coupled to the original samples instead of starting from scratch.

use log::{debug, info, trace};

use crate::config::{check_alpha, PprConfig};
use crate::forest::{draw_step, refine_with_forests, WalkForest};
use crate::graph::{EdgeSerial, Graph};
use crate::index::PprIndex;
use crate::random::RandomSource;
use crate::stack::WalkStack;
use crate::{check_node, Error, Result};

/// One forest plus the step history of every node in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackTree {
    forest: WalkForest,
    stacks: Vec<WalkStack>,
}

#[derive(Debug, Default)]
struct Scratch {
    intree: Vec<bool>,
    seen: Vec<usize>,
}

impl StackTree {
    fn new(node_count: usize) -> Self {
        Self {
            forest: WalkForest::new(node_count),
            stacks: vec![WalkStack::new(); node_count],
        }
    }

    pub fn forest(&self) -> &WalkForest {
        &self.forest
    }

    pub fn stack(&self, node: usize) -> &WalkStack {
        &self.stacks[node]
    }

    /// Root the whole forest again, replaying each node's valid history before drawing
    /// (and recording) fresh steps.
    fn reroot<G, R>(&mut self, graph: &G, alpha: f64, scratch: &mut Scratch, rng: &mut R)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let Self { forest, stacks } = self;
        let seen = &mut scratch.seen;
        seen.clear();
        seen.resize(stacks.len(), 0);

        forest.reset();
        forest.root_all(graph, &mut scratch.intree, |u| {
            let stack = &mut stacks[u];
            let step = if seen[u] < stack.top() {
                stack.get(seen[u])
            } else {
                let step = draw_step(graph, u, alpha, rng);
                stack.push(step);
                step
            };
            seen[u] += 1;
            step
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackIndex {
    trees: Vec<StackTree>,
}

impl StackIndex {
    /// Build `config.omega()` forests.
    pub fn build<G, R>(graph: &G, config: &PprConfig, rng: &mut R) -> Result<Self>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        Self::with_forests(graph, config, config.omega(), rng)
    }

    /// Build an explicit number of forests.
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
        let n = graph.node_count();
        info!("building stack index: {forests} forests over {n} nodes");

        let mut scratch = Scratch::default();
        let trees = (0..forests)
            .map(|i| {
                let mut tree = StackTree::new(n);
                tree.reroot(graph, config.alpha, &mut scratch, rng);
                trace!("forest {i}: {} roots", tree.forest.roots().count());
                tree
            })
            .collect();
        Ok(Self { trees })
    }

    /// Build forests in parallel.
    ///
    /// Forest `i` draws from its own generator seeded by `(seed, i)`, so the result does not
    /// depend on the rayon thread count (it differs from a serial build with the same seed).
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
        let n = graph.node_count();
        let alpha = config.alpha;
        info!("building stack index in parallel: {forests} forests over {n} nodes");

        let trees = (0..forests)
            .into_par_iter()
            .map(|i| {
                let mut rng = crate::random::seeded(crate::random::mix64(seed ^ i as u64));
                let mut scratch = Scratch::default();
                let mut tree = StackTree::new(n);
                tree.reroot(graph, alpha, &mut scratch, &mut rng);
                tree
            })
            .collect();
        Ok(Self { trees })
    }

    pub fn forest_count(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[StackTree] {
        &self.trees
    }

    pub fn forests(&self) -> impl Iterator<Item = &WalkForest> + Clone {
        self.trees.iter().map(|t| &t.forest)
    }

    /// Discard all history and sample every forest again.
    fn rebuild<G, R>(&mut self, graph: &G, alpha: f64, rng: &mut R)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let mut scratch = Scratch::default();
        for tree in &mut self.trees {
            for stack in &mut tree.stacks {
                stack.truncate(0);
            }
            tree.reroot(graph, alpha, &mut scratch, rng);
        }
    }

    /// Returns the number of re-rooted forests.
    fn insert_arc<G, R>(&mut self, graph: &G, alpha: f64, a: usize, b: usize, rng: &mut R) -> usize
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let degree = graph.out_degree(a);
        debug_assert!(degree > 0, "insert repair called before the graph gained {a} -> {b}");
        let mut scratch = Scratch::default();
        let mut repaired = 0;

        for tree in &mut self.trees {
            let stack = &mut tree.stacks[a];
            // An empty history means `a` was dangling until now: it must draw its first step.
            if !stack.is_empty() {
                // Each recorded step of `a` would have picked `b` with probability 1/degree;
                // the first such step is where history forks.
                let pos = rng.geometric(1.0 / degree as f64) - 1;
                if !matches!(stack.valid().get(pos), Some(Some(_))) {
                    tree.forest.grow_volume(a);
                    continue;
                }
                stack.overwrite(pos, Some(b));
                stack.truncate(pos + 1);
            }
            tree.reroot(graph, alpha, &mut scratch, rng);
            repaired += 1;
        }
        repaired
    }

    /// Returns the number of re-rooted forests.
    fn delete_arc<G, R>(&mut self, graph: &G, alpha: f64, a: usize, b: usize, rng: &mut R) -> usize
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        let now_dangling = graph.is_dangling(a);
        let mut scratch = Scratch::default();
        let mut repaired = 0;

        for tree in &mut self.trees {
            let stack = &mut tree.stacks[a];
            match stack.position(Some(b)) {
                Some(j) => stack.truncate(if now_dangling { 0 } else { j }),
                None => {
                    // `a` never stepped over the arc, so only its degree changed
                    if now_dangling {
                        stack.truncate(0);
                    }
                    tree.forest.shrink_volume(a);
                    continue;
                }
            }
            tree.reroot(graph, alpha, &mut scratch, rng);
            repaired += 1;
        }
        repaired
    }
}

impl PprIndex for StackIndex {
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
        refine_with_forests(graph, self.forests(), self.trees.len(), reserve, residual);
    }

    /// Stacks record coin flips taken at the old α, so a change rebuilds every forest.
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
        if alpha == old {
            return Ok(());
        }
        info!("stack index: alpha {old} -> {alpha}, rebuilding {} forests", self.trees.len());
        self.rebuild(graph, alpha, rng);
        Ok(())
    }

    fn update_insert<G, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        a: usize,
        b: usize,
        serial: EdgeSerial,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)?;
        let repaired = self.insert_arc(graph, config.alpha, a, b, rng);
        debug!(
            "insert {a} -> {b} ({serial:?}): re-rooted {repaired} of {} forests",
            self.trees.len()
        );
        Ok(())
    }

    fn update_delete<G, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        a: usize,
        b: usize,
        serial: EdgeSerial,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)?;
        let repaired = self.delete_arc(graph, config.alpha, a, b, rng);
        debug!(
            "delete {a} -> {b} ({serial:?}): re-rooted {repaired} of {} forests",
            self.trees.len()
        );
        Ok(())
    }
}

/// A [`StackIndex`] that resamples every forest from scratch on each edge update.
///
/// Serves as the uncoupled reference for the repairing index: same forests, same queries,
/// but no history survives an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildStackIndex {
    inner: StackIndex,
}

impl RebuildStackIndex {
    pub fn build<G, R>(graph: &G, config: &PprConfig, rng: &mut R) -> Result<Self>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        Ok(Self { inner: StackIndex::build(graph, config, rng)? })
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
        Ok(Self { inner: StackIndex::with_forests(graph, config, forests, rng)? })
    }

    pub fn inner(&self) -> &StackIndex {
        &self.inner
    }

    fn resample<G, R>(&mut self, graph: &G, alpha: f64, what: &str, rng: &mut R)
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        self.inner.rebuild(graph, alpha, rng);
        debug!("{what}: rebuilt {} forests", self.inner.trees.len());
    }
}

impl PprIndex for RebuildStackIndex {
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
        self.inner.refine(graph, config, reserve, residual, rng);
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
        self.inner.update_alpha(graph, config, alpha, rng)
    }

    fn update_insert<G, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        a: usize,
        b: usize,
        serial: EdgeSerial,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)?;
        self.resample(graph, config.alpha, &format!("insert {a} -> {b} ({serial:?})"), rng);
        Ok(())
    }

    fn update_delete<G, R>(
        &mut self,
        graph: &G,
        config: &PprConfig,
        a: usize,
        b: usize,
        serial: EdgeSerial,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource,
    {
        check_node(graph, a)?;
        check_node(graph, b)?;
        self.resample(graph, config.alpha, &format!("delete {a} -> {b} ({serial:?})"), rng);
        Ok(())
    }
}

pub(crate) fn check_count(what: &str, count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::InvalidParameter(format!("{what} must be >= 1")));
    }
    Ok(())
}
