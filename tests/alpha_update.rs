use rand::Rng;
use stackppr::{
    forward_push, l1_error, seeded, AdjacencyList, Fora, Graph, PprConfig, PprIndex, StackIndex,
    StaticStackIndex, UniqueQueue,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn exact_ppr(g: &AdjacencyList, source: usize, alpha: f64) -> Vec<f64> {
    let n = g.node_count();
    let (mut reserve, mut residual) = (vec![0.0; n], vec![0.0; n]);
    forward_push(g, source, alpha, 1e-12, &mut reserve, &mut residual, &mut UniqueQueue::new(n));
    reserve
}

fn graph(seed: u64) -> AdjacencyList {
    let n = 30;
    let mut rng = seeded(seed);
    let mut edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    for _ in 0..45 {
        let (u, v) = (rng.random_range(0..n), rng.random_range(0..n));
        if u != v {
            edges.push((u, v));
        }
    }
    AdjacencyList::from_edges(n, &edges, false)
}

fn config(alpha: f64) -> PprConfig {
    PprConfig::new(false, alpha, 0.3, 0.1, 0.01, 0.05)
}

#[test]
fn unchanged_alpha_leaves_index_untouched() {
    init();
    let g = graph(1);
    let mut c = config(0.3);
    let mut rng = seeded(2);
    let mut idx = StaticStackIndex::with_forests(&g, &c, 20, &mut rng).unwrap();
    let before = idx.clone();
    idx.update_alpha(&g, &mut c, 0.3, &mut rng).unwrap();
    assert_eq!(idx, before);
    assert_eq!(c.alpha(), 0.3);
}

#[test]
fn lowering_alpha_matches_a_fresh_index() {
    init();
    let g = graph(3);
    let mut c = config(0.5);
    let mut rng = seeded(4);
    let mut idx = StaticStackIndex::with_forests(&g, &c, 2000, &mut rng).unwrap();

    idx.update_alpha(&g, &mut c, 0.2, &mut rng).unwrap();
    assert_eq!(c.alpha(), 0.2);
    for f in idx.forests() {
        f.check(&g).unwrap();
    }

    let mut fora = Fora::new();
    for source in [0, 13] {
        let est = fora.estimate(&g, &c, &idx, source, &mut rng).unwrap();
        let err = l1_error(&est, &exact_ppr(&g, source, 0.2));
        assert!(err < 0.08, "source {source}: l1 {err}");
    }
}

#[test]
fn repeated_lowering_keeps_invariants() {
    init();
    let g = graph(5);
    let mut c = config(0.9);
    let mut rng = seeded(6);
    let mut idx = StaticStackIndex::with_forests(&g, &c, 30, &mut rng).unwrap();
    for alpha in [0.7, 0.4, 0.15, 0.05] {
        idx.update_alpha(&g, &mut c, alpha, &mut rng).unwrap();
        for f in idx.forests() {
            f.check(&g).unwrap();
            assert_eq!(f.total_volume(), g.volume());
        }
    }
}

#[test]
fn raising_alpha_rebuilds() {
    init();
    let g = graph(7);
    let mut c = config(0.1);
    let mut rng = seeded(8);
    let mut idx = StaticStackIndex::with_forests(&g, &c, 1500, &mut rng).unwrap();
    idx.update_alpha(&g, &mut c, 0.4, &mut rng).unwrap();
    assert_eq!(c.alpha(), 0.4);
    for f in idx.forests() {
        f.check(&g).unwrap();
    }
    let est = Fora::new().estimate(&g, &c, &idx, 2, &mut rng).unwrap();
    let err = l1_error(&est, &exact_ppr(&g, 2, 0.4));
    assert!(err < 0.08, "l1 {err}");
}

#[test]
fn invalid_alpha_is_rejected_without_side_effects() {
    init();
    let g = graph(9);
    let mut c = config(0.2);
    let mut rng = seeded(10);
    let mut idx = StaticStackIndex::with_forests(&g, &c, 4, &mut rng).unwrap();
    let before = idx.clone();
    for bad in [0.0, 1.0, -0.5, f64::NAN] {
        assert!(idx.update_alpha(&g, &mut c, bad, &mut rng).is_err());
    }
    assert_eq!(idx, before);
    assert_eq!(c.alpha(), 0.2);
}

#[test]
fn stack_index_supports_updates_after_alpha_change() {
    init();
    let mut g = graph(11);
    let mut c = config(0.2);
    let mut rng = seeded(12);
    let mut idx = StackIndex::with_forests(&g, &c, 10, &mut rng).unwrap();
    idx.update_alpha(&g, &mut c, 0.35, &mut rng).unwrap();
    Fora::insert_edge(&mut g, &c, &mut idx, 4, 17, &mut rng).unwrap();
    Fora::delete_edge(&mut g, &c, &mut idx, 0, 1, &mut rng).unwrap();
    for f in idx.forests() {
        f.check(&g).unwrap();
    }
}
