//! Rooted walk forests.
//!
//! A [`WalkForest`] is one realisation of the random successor function: every node either
//! absorbs (`next == None`, it is a root) or points at one neighbor. Following `next` from
//! any node ends at its root. Nodes sharing a root form a tree, and each tree keeps
//!
//! - `vol[r]`: the sum of out-degrees of its members, the normaliser used by refinement;
//! - a singly linked member list `r -> aux_traverse[r] -> ... -> aux_last[r]`, so a tree can
//!   be enumerated from its root without scanning the whole forest.
//!
//! Forests are built by loop-erased walks in the manner of Wilson's algorithm. The walk's
//! successor draws are supplied by the caller, which is how the stack index replays
//! recorded history and the static index samples fresh steps through the same code.

use crate::graph::Graph;
use crate::random::RandomSource;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkForest {
    next: Vec<Option<usize>>,
    root: Vec<usize>,
    vol: Vec<usize>,
    aux_traverse: Vec<usize>,
    aux_last: Vec<usize>,
}

impl WalkForest {
    /// An unrooted forest over `node_count` nodes. Call sites root it before use.
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            next: vec![None; node_count],
            root: (0..node_count).collect(),
            vol: vec![0; node_count],
            aux_traverse: (0..node_count).collect(),
            aux_last: (0..node_count).collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.next.len()
    }

    pub fn next(&self, node: usize) -> Option<usize> {
        self.next[node]
    }

    pub fn root(&self, node: usize) -> usize {
        self.root[node]
    }

    pub fn is_root(&self, node: usize) -> bool {
        self.root[node] == node
    }

    /// Degree volume of the tree rooted at `root` (0 for non-roots).
    pub fn volume(&self, root: usize) -> usize {
        self.vol[root]
    }

    /// Sum of all tree volumes. Equals the graph volume for a consistent forest.
    pub fn total_volume(&self) -> usize {
        (0..self.node_count())
            .filter(|&u| self.is_root(u))
            .map(|r| self.vol[r])
            .sum()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.node_count()).filter(move |&u| self.is_root(u))
    }

    /// Members of the tree rooted at `root`, in traversal order (the root first).
    pub fn members(&self, root: usize) -> Members<'_> {
        Members {
            forest: self,
            cursor: Some(root),
            last: self.aux_last[root],
        }
    }

    /// Verify every structural invariant against `graph`.
    ///
    /// O(n · depth); meant for tests and debugging.
    pub fn check<G: Graph + ?Sized>(&self, graph: &G) -> Result<()> {
        let n = graph.node_count();
        if self.node_count() != n {
            return Err(corrupt(format!(
                "forest has {} nodes, graph has {n}",
                self.node_count()
            )));
        }

        let mut expected_vol = vec![0usize; n];
        let mut member_count = vec![0usize; n];
        for u in 0..n {
            let r = self.root[u];
            if self.root[r] != r {
                return Err(corrupt(format!("root of {u} is {r}, which is not a root")));
            }
            if graph.is_dangling(u) && r != u {
                return Err(corrupt(format!("dangling node {u} is rooted at {r}")));
            }
            match (r == u, self.next[u]) {
                (true, Some(v)) => {
                    return Err(corrupt(format!("root {u} has successor {v}")));
                }
                (false, None) => {
                    return Err(corrupt(format!("non-root {u} has no successor")));
                }
                _ => {}
            }
            // the path must reach the root without cycling
            let mut cur = u;
            let mut steps = 0;
            while cur != r {
                match self.next[cur] {
                    Some(v) if self.root[v] == r && steps < n => cur = v,
                    _ => return Err(corrupt(format!("path from {u} does not reach root {r}"))),
                }
                steps += 1;
            }
            expected_vol[r] += graph.out_degree(u);
            member_count[r] += 1;
        }

        for u in 0..n {
            let want = if self.is_root(u) { expected_vol[u] } else { 0 };
            if self.vol[u] != want {
                return Err(corrupt(format!(
                    "volume of {u} is {}, expected {want}",
                    self.vol[u]
                )));
            }
        }

        let mut seen = vec![false; n];
        for r in self.roots() {
            let mut visited = 0usize;
            let mut last = r;
            for v in self.members(r).take(n + 1) {
                if self.root[v] != r || seen[v] {
                    return Err(corrupt(format!("traversal of {r} visits {v} wrongly")));
                }
                seen[v] = true;
                visited += 1;
                last = v;
            }
            if visited != member_count[r] || last != self.aux_last[r] {
                return Err(corrupt(format!(
                    "traversal of {r} visits {visited} of {} members",
                    member_count[r]
                )));
            }
        }
        Ok(())
    }

    /// Forget roots, volumes and traversal links. `next` is left as is.
    pub(crate) fn reset(&mut self) {
        for u in 0..self.node_count() {
            self.root[u] = u;
            self.aux_traverse[u] = u;
            self.aux_last[u] = u;
        }
        self.vol.fill(0);
    }

    pub(crate) fn set_next(&mut self, node: usize, next: Option<usize>) {
        self.next[node] = next;
    }

    /// Make `node` an absorbing root whose tree holds only itself.
    pub(crate) fn make_root(&mut self, node: usize, degree: usize) {
        self.next[node] = None;
        self.root[node] = node;
        self.vol[node] = degree;
        self.aux_last[node] = node;
    }

    /// Append `node` to the tree rooted at `root`.
    pub(crate) fn attach(&mut self, node: usize, root: usize, degree: usize) {
        self.root[node] = root;
        self.vol[root] += degree;
        let tail = self.aux_last[root];
        self.aux_traverse[tail] = node;
        self.aux_last[root] = node;
    }

    /// Drop the volume of a root whose tree is being dissolved.
    pub(crate) fn clear_volume(&mut self, root: usize) {
        self.vol[root] = 0;
    }

    /// `node` gained one outgoing arc without its walk changing.
    pub(crate) fn grow_volume(&mut self, node: usize) {
        let r = self.root[node];
        self.vol[r] += 1;
    }

    /// `node` lost one outgoing arc without its walk changing.
    pub(crate) fn shrink_volume(&mut self, node: usize) {
        let r = self.root[node];
        self.vol[r] = self.vol[r]
            .checked_sub(1)
            .expect("tree volume underflow: forest out of sync with graph");
    }

    /// Root every node.
    ///
    /// Dangling nodes are rooted first as singletons, so a walk never draws a step at a
    /// dangling node. Every other node, in ascending order, walks with `draw` until it hits
    /// a rooted node or absorbs; the loop-erased chain (the latest `next` pointers) is then
    /// attached to the reached root.
    ///
    /// `draw(u)` is called once per visit of `u` and must only return neighbors of `u`.
    pub(crate) fn root_all<G, F>(&mut self, graph: &G, intree: &mut Vec<bool>, mut draw: F)
    where
        G: Graph + ?Sized,
        F: FnMut(usize) -> Option<usize>,
    {
        let n = self.node_count();
        intree.clear();
        intree.resize(n, false);

        for u in 0..n {
            if graph.is_dangling(u) {
                self.make_root(u, 0);
                intree[u] = true;
            }
        }

        for u in 0..n {
            if intree[u] {
                continue;
            }
            let mut current = u;
            let mut absorbed = false;
            while !intree[current] {
                match draw(current) {
                    Some(v) => {
                        self.next[current] = Some(v);
                        current = v;
                    }
                    None => {
                        absorbed = true;
                        break;
                    }
                }
            }

            let last = current;
            let r = if absorbed {
                self.make_root(last, graph.out_degree(last));
                intree[last] = true;
                last
            } else {
                self.root[last]
            };

            let mut node = u;
            while node != last {
                self.attach(node, r, graph.out_degree(node));
                intree[node] = true;
                node = self.next[node].expect("walk chain broken before its end");
            }
        }
    }

    /// Spread `mass` from `node` over its tree, proportionally to member degree.
    pub(crate) fn spread<G: Graph + ?Sized>(
        &self,
        graph: &G,
        node: usize,
        mass: f64,
        reserve: &mut [f64],
    ) {
        let r = self.root[node];
        let scale = mass / self.vol[r] as f64;
        for v in self.members(r) {
            reserve[v] += scale * graph.out_degree(v) as f64;
        }
    }
}

/// Iterator over the members of one tree; see [`WalkForest::members`].
#[derive(Debug, Clone)]
pub struct Members<'a> {
    forest: &'a WalkForest,
    cursor: Option<usize>,
    last: usize,
}

impl Iterator for Members<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let cur = self.cursor?;
        self.cursor = if cur == self.last {
            None
        } else {
            Some(self.forest.aux_traverse[cur])
        };
        Some(cur)
    }
}

/// One fresh step of an α-restart walk at a non-dangling `node`: absorb with probability
/// `alpha`, else move to a uniform neighbor.
pub(crate) fn draw_step<G, R>(graph: &G, node: usize, alpha: f64, rng: &mut R) -> Option<usize>
where
    G: Graph + ?Sized,
    R: RandomSource,
{
    if rng.coin(alpha) {
        return None;
    }
    Some(graph.neighbor(node, rng.uniform_int(graph.out_degree(node))))
}

/// Refinement shared by the forest-backed indexes.
///
/// Residual at a dangling node is already absorbed and moves to the reserve as is; residual
/// at any other node is split evenly across forests and spread over its tree in each.
pub(crate) fn refine_with_forests<'a, G, I>(
    graph: &G,
    forests: I,
    forest_count: usize,
    reserve: &mut [f64],
    residual: &[f64],
) where
    G: Graph + ?Sized,
    I: Iterator<Item = &'a WalkForest> + Clone,
{
    debug_assert_eq!(reserve.len(), graph.node_count());
    debug_assert_eq!(residual.len(), graph.node_count());
    for (u, &mass) in residual.iter().enumerate() {
        if mass == 0.0 {
            continue;
        }
        if graph.is_dangling(u) {
            reserve[u] += mass;
            continue;
        }
        let share = mass / forest_count as f64;
        for forest in forests.clone() {
            forest.spread(graph, u, share, reserve);
        }
    }
}

fn corrupt(msg: String) -> Error {
    Error::CorruptForest(msg)
}
