//! The capability interface every PPR index implements.

use crate::config::PprConfig;
use crate::graph::{EdgeSerial, Graph};
use crate::random::RandomSource;
use crate::Result;

/// An index that turns FORA's leftover residual into reserve, and that can be kept in sync
/// with the graph and with α.
///
/// The graph and config are lent to every call. Edge updates are called *after* the graph
/// already reflects the change.
pub trait PprIndex {
    /// Add the index's estimate of where `residual` mass ends up to `reserve`.
    ///
    /// Accumulates; never resets existing reserve values.
    fn refine<G, R>(
        &self,
        graph: &G,
        config: &PprConfig,
        reserve: &mut [f64],
        residual: &[f64],
        rng: &mut R,
    ) where
        G: Graph + ?Sized,
        R: RandomSource;

    /// Switch to restart probability `alpha`, storing it in `config`.
    fn update_alpha<G, R>(
        &mut self,
        graph: &G,
        config: &mut PprConfig,
        alpha: f64,
        rng: &mut R,
    ) -> Result<()>
    where
        G: Graph + ?Sized,
        R: RandomSource;

    /// Whether [`PprIndex::update_insert`] and [`PprIndex::update_delete`] are supported.
    fn supports_edge_updates(&self) -> bool {
        true
    }

    /// The graph gained the arc `a -> b`.
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
        R: RandomSource;

    /// The graph lost the arc `a -> b`.
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
        R: RandomSource;
}
