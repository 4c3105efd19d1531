//! Graph adapter traits and a mutable adjacency-list graph.

use std::collections::HashMap;

/// Stable identifier of a directed arc, assigned when the arc is inserted.
///
/// Serials of deleted arcs are recycled by later insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeSerial(pub usize);

/// A read-only graph view that can return **borrowed** neighbor slices.
///
/// Random walks call [`Graph::neighbor`] once per step, so implementations should make
/// `neighbors_ref` O(1).
pub trait Graph {
    fn node_count(&self) -> usize;
    fn neighbors_ref(&self, node: usize) -> &[usize];

    fn out_degree(&self, node: usize) -> usize {
        self.neighbors_ref(node).len()
    }

    fn neighbor(&self, node: usize, index: usize) -> usize {
        self.neighbors_ref(node)[index]
    }

    /// A node without outgoing arcs. Walks stop there unconditionally.
    fn is_dangling(&self, node: usize) -> bool {
        self.out_degree(node) == 0
    }

    /// Sum of out-degrees over all nodes.
    fn volume(&self) -> usize {
        (0..self.node_count()).map(|u| self.out_degree(u)).sum()
    }
}

/// A graph whose arc set can change.
pub trait DynamicGraph: Graph {
    /// Insert the arc `u -> v`. Returns `None` if it already exists.
    fn insert_edge(&mut self, u: usize, v: usize) -> Option<EdgeSerial>;
    /// Delete the arc `u -> v`. Returns `None` if it does not exist.
    fn delete_edge(&mut self, u: usize, v: usize) -> Option<EdgeSerial>;
}

/// Adjacency lists over a fixed node set `0..n`, with serial-numbered arcs.
///
/// Deletion swaps the last neighbor into the freed slot, so neighbor order is not stable
/// across deletions. Nothing in the index depends on neighbor positions.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyList {
    adj: Vec<Vec<usize>>,
    serials: HashMap<(usize, usize), EdgeSerial>,
    free_serials: Vec<EdgeSerial>,
    next_serial: usize,
}

impl AdjacencyList {
    pub fn new(node_count: usize) -> Self {
        Self {
            adj: vec![Vec::new(); node_count],
            ..Self::default()
        }
    }

    /// Build from an arc list. With `directed == false` every pair is inserted both ways
    /// (self-loops once). Duplicate arcs are skipped.
    ///
    /// Panics if an endpoint is `>= node_count`.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)], directed: bool) -> Self {
        let mut graph = Self::new(node_count);
        for &(u, v) in edges {
            graph.insert_edge(u, v);
            if !directed && u != v {
                graph.insert_edge(v, u);
            }
        }
        graph
    }

    pub fn edge_count(&self) -> usize {
        self.serials.len()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.serials.contains_key(&(u, v))
    }

    pub fn edge_serial(&self, u: usize, v: usize) -> Option<EdgeSerial> {
        self.serials.get(&(u, v)).copied()
    }

    fn allocate_serial(&mut self) -> EdgeSerial {
        self.free_serials.pop().unwrap_or_else(|| {
            let serial = EdgeSerial(self.next_serial);
            self.next_serial += 1;
            serial
        })
    }
}

impl Graph for AdjacencyList {
    fn node_count(&self) -> usize {
        self.adj.len()
    }

    fn neighbors_ref(&self, node: usize) -> &[usize] {
        &self.adj[node]
    }
}

impl DynamicGraph for AdjacencyList {
    fn insert_edge(&mut self, u: usize, v: usize) -> Option<EdgeSerial> {
        assert!(
            u < self.adj.len() && v < self.adj.len(),
            "arc {u} -> {v} out of range (node_count={})",
            self.adj.len()
        );
        if self.has_edge(u, v) {
            return None;
        }
        let serial = self.allocate_serial();
        self.adj[u].push(v);
        self.serials.insert((u, v), serial);
        Some(serial)
    }

    fn delete_edge(&mut self, u: usize, v: usize) -> Option<EdgeSerial> {
        let serial = self.serials.remove(&(u, v))?;
        let nbrs = &mut self.adj[u];
        if let Some(i) = nbrs.iter().position(|&x| x == v) {
            nbrs.swap_remove(i);
        }
        self.free_serials.push(serial);
        Some(serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undirected_edges_are_mirrored_once() {
        // 0 - 1, self-loop on 2
        let g = AdjacencyList::from_edges(3, &[(0, 1), (2, 2)], false);
        assert_eq!(g.neighbors_ref(0), &[1]);
        assert_eq!(g.neighbors_ref(1), &[0]);
        assert_eq!(g.neighbors_ref(2), &[2]);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.volume(), 3);
    }

    #[test]
    fn duplicate_insert_and_missing_delete_are_none() {
        let mut g = AdjacencyList::new(2);
        assert!(g.insert_edge(0, 1).is_some());
        assert!(g.insert_edge(0, 1).is_none());
        assert!(g.delete_edge(1, 0).is_none());
        assert!(g.delete_edge(0, 1).is_some());
        assert!(g.delete_edge(0, 1).is_none());
        assert!(g.is_dangling(0));
    }

    #[test]
    fn serials_are_stable_and_recycled() {
        let mut g = AdjacencyList::new(3);
        let a = g.insert_edge(0, 1).unwrap();
        let b = g.insert_edge(0, 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(g.edge_serial(0, 2), Some(b));

        assert_eq!(g.delete_edge(0, 1), Some(a));
        // deleting 0 -> 1 moved 0 -> 2 within the neighbor list, not its serial
        assert_eq!(g.edge_serial(0, 2), Some(b));
        assert_eq!(g.neighbors_ref(0), &[2]);

        let c = g.insert_edge(1, 2).unwrap();
        assert_eq!(c, a);
    }
}
