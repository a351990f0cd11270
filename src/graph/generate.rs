use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::types::{Distance, DistanceMatrix};

/// Seed of the random graph generator, so that runs are reproducible.
pub const DEFAULT_SEED: u64 = 10302011;

/// Random directed graph on `n` nodes where every edge `(i, j)` with `i != j` exists with
/// probability `p`, as a 0/1 adjacency matrix. Cells are drawn in column-major order.
pub fn gen_graph(n: usize, p: f64, seed: u64) -> DistanceMatrix {
    let mut rng = SmallRng::seed_from_u64(seed);

    DistanceMatrix::from_fn(n, |i, j| {
        let edge = rng.gen::<f64>() < p;
        (edge && i != j) as Distance
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = gen_graph(30, 0.2, DEFAULT_SEED);
        let b = gen_graph(30, 0.2, DEFAULT_SEED);
        let c = gen_graph(30, 0.2, DEFAULT_SEED + 1);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_edges() {
        let n = 100;
        let graph = gen_graph(n, 0.1, DEFAULT_SEED);

        assert!(graph.as_slice().iter().all(|&v| v == 0 || v == 1));
        assert!((0..n).all(|i| graph.get(i, i) == 0));

        // Expected 990 edges.
        let edges = graph.as_slice().iter().filter(|&&v| v == 1).count();
        assert!(edges > 800 && edges < 1200, "{} edges", edges);

        assert!(gen_graph(n, 0.0, DEFAULT_SEED).as_slice().iter().all(|&v| v == 0));
        assert_eq!(
            gen_graph(n, 1.0, DEFAULT_SEED)
                .as_slice()
                .iter()
                .filter(|&&v| v == 1)
                .count(),
            n * (n - 1)
        );
    }
}
