//! Replay a stream of edge updates against a stack index, querying after each batch.
//!
//! Run with `RUST_LOG=debug` to see per-update repair counts and query timings.

use rand::Rng;
use stackppr::{l1_error, seeded, top_k, AdjacencyList, Fora, Graph, PprConfig, StackIndex};

fn main() -> stackppr::Result<()> {
    env_logger::init();

    let n = 2_000;
    let mut rng = seeded(42);
    let edges: Vec<(usize, usize)> = (0..n)
        .map(|i| (i, (i + 1) % n))
        .chain((0..4 * n).map(|_| (rng.random_range(0..n), rng.random_range(0..n))))
        .filter(|&(u, v)| u != v)
        .collect();
    let mut graph = AdjacencyList::from_edges(n, &edges, false);
    let config = PprConfig::new(false, 0.2, 0.3, 0.1, 0.01, 0.001);
    let mut index = StackIndex::build(&graph, &config, &mut rng)?;
    let mut fora = Fora::new();
    let source = 0;

    let mut previous = fora.estimate(&graph, &config, &index, source, &mut rng)?;
    for batch in 0..5 {
        let (mut inserted, mut deleted) = (0, 0);
        for _ in 0..100 {
            let (u, v) = (rng.random_range(0..n), rng.random_range(0..n));
            if u == v {
                continue;
            }
            if rng.random::<f64>() < 0.7 {
                let added = Fora::insert_edge(&mut graph, &config, &mut index, u, v, &mut rng)?;
                inserted += usize::from(added);
            } else {
                let Some(&w) = graph.neighbors_ref(u).first() else {
                    continue;
                };
                let removed = Fora::delete_edge(&mut graph, &config, &mut index, u, w, &mut rng)?;
                deleted += usize::from(removed);
            }
        }

        let mut current = Vec::new();
        let stats = fora.evaluate(&graph, &config, &index, source, &mut rng, |est| {
            current.extend_from_slice(est)
        })?;
        println!(
            "batch {batch}: +{inserted} -{deleted} arcs, {} pushes, drift {:.4}, top {:?}",
            stats.pushes,
            l1_error(&previous, &current),
            &top_k(&current, 3)
        );
        previous = current;
    }
    Ok(())
}
