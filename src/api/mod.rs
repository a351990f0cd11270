//! Public entry point: solve all-pairs shortest paths for an adjacency matrix.
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::driver::{run_distributed, run_shared};
use crate::prelude::*;
use crate::types::{Config, Deployment, DistanceMatrix};

pub use crate::network::{NetworkError, Tag};
pub use crate::worker::ConvergenceError;

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    /// Shortest path lengths, with zero for unreachable pairs (and on the diagonal).
    #[serde(skip)]
    pub distances: DistanceMatrix,
    pub deployment: Deployment,

    /// Sweeps for the distributed deployment, squarings for the shared one. Includes the
    /// final pass that changed nothing.
    pub sweeps: usize,
    pub elapsed: Duration,
}

/// Computes all-pairs shortest path lengths of the graph described by `adjacency`, where a
/// nonzero entry `(i, j)` is an edge from `i` to `j`.
///
/// Either the complete fixed point is returned or an error; there are no partial results.
pub fn solve(config: &Config, adjacency: &DistanceMatrix) -> Result<Solution> {
    let n = adjacency.size();
    let deployment = config.driver.deployment;
    let before = Instant::now();

    let mut distances = adjacency.clone();
    distances.infinitize();

    let (mut distances, sweeps) = match deployment {
        _ if n == 0 => (distances, 0),
        Deployment::Distributed { workers } => run_distributed(config, workers, &distances)?,
        Deployment::SharedMemory => run_shared(config, &distances)?,
    };

    distances.deinfinitize();
    let elapsed = before.elapsed();

    info!(
        "solved {} nodes ({}) in {} sweeps, {:?}",
        n, deployment, sweeps, elapsed
    );

    Ok(Solution {
        distances,
        deployment,
        sweeps,
        elapsed,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{fletcher16, gen_graph, DEFAULT_SEED};
    use crate::types::{Distance, DriverConfig};
    use std::collections::VecDeque;

    fn config(deployment: Deployment) -> Config {
        Config::new(
            DriverConfig {
                deployment,
                ..default()
            },
            default(),
        )
    }

    fn distributed(workers: usize) -> Config {
        config(Deployment::Distributed { workers })
    }

    /// Breadth-first search from every node, with the same output convention as `solve`.
    fn reference(adjacency: &DistanceMatrix) -> DistanceMatrix {
        let n = adjacency.size();
        let mut result = DistanceMatrix::new(n);

        for source in 0..n {
            let mut dist = vec![None; n];
            let mut queue = VecDeque::new();
            dist[source] = Some(0);
            queue.push_back(source);

            while let Some(u) = queue.pop_front() {
                for v in 0..n {
                    if adjacency.get(u, v) != 0 && dist[v].is_none() {
                        dist[v] = Some(dist[u].unwrap() + 1);
                        queue.push_back(v);
                    }
                }
            }

            for (target, d) in enumerate(dist) {
                result.set(source, target, d.unwrap_or(0));
            }
        }

        result
    }

    #[test]
    fn test_five_nodes() {
        // 0 -> 1 -> 2 -> 3, 3 -> 1, and node 4 is isolated.
        let edges = [(0, 1), (1, 2), (2, 3), (3, 1)];
        let adjacency =
            DistanceMatrix::from_fn(5, |i, j| edges.contains(&(i, j)) as Distance);

        let expected = DistanceMatrix::from_rows(&[
            vec![0, 1, 2, 3, 0],
            vec![0, 0, 1, 2, 0],
            vec![0, 2, 0, 1, 0],
            vec![0, 1, 2, 0, 0],
            vec![0, 0, 0, 0, 0],
        ])
        .unwrap();

        assert_eq!(reference(&adjacency), expected);

        for deployment in [
            Deployment::Distributed { workers: 1 },
            Deployment::Distributed { workers: 2 },
            Deployment::Distributed { workers: 5 },
            Deployment::SharedMemory,
        ] {
            let solution = solve(&config(deployment), &adjacency).unwrap();
            assert_eq!(solution.distances, expected, "{}", deployment);
        }
    }

    #[test]
    fn test_matches_reference() {
        for &(n, p) in &[(1, 0.5), (7, 0.3), (33, 0.08), (64, 0.02)] {
            let adjacency = gen_graph(n, p, DEFAULT_SEED);
            let expected = reference(&adjacency);

            let solution = solve(&distributed(min(n, 3)), &adjacency).unwrap();
            assert_eq!(solution.distances, expected, "n={} p={}", n, p);
        }
    }

    #[test]
    fn test_padding_does_not_interfere() {
        let small = gen_graph(10, 0.2, DEFAULT_SEED);
        let large = DistanceMatrix::from_fn(16, |i, j| {
            if i < 10 && j < 10 {
                small.get(i, j)
            } else {
                0
            }
        });

        let small = solve(&distributed(2), &small).unwrap();
        let large = solve(&distributed(2), &large).unwrap();

        assert_eq!(large.distances.truncate(10), small.distances);
        for i in 0..16 {
            for j in 10..16 {
                assert_eq!(large.distances.get(i, j), 0);
                assert_eq!(large.distances.get(j, i), 0);
            }
        }
    }

    #[test]
    fn test_worker_count_invariance() {
        let adjacency = gen_graph(50, 0.05, DEFAULT_SEED);
        let baseline = solve(&distributed(1), &adjacency).unwrap();
        let checksum = fletcher16(baseline.distances.as_slice());

        for workers in [2, 4, 7] {
            let solution = solve(&distributed(workers), &adjacency).unwrap();
            assert_eq!(solution.distances, baseline.distances, "W={}", workers);
            assert_eq!(fletcher16(solution.distances.as_slice()), checksum);
            assert_eq!(solution.sweeps, baseline.sweeps);
        }

        let shared = solve(&config(Deployment::SharedMemory), &adjacency).unwrap();
        assert_eq!(shared.distances, baseline.distances);

        // Same input, same output.
        let again = solve(&distributed(4), &gen_graph(50, 0.05, DEFAULT_SEED)).unwrap();
        assert_eq!(fletcher16(again.distances.as_slice()), checksum);
    }

    #[test]
    fn test_errors() {
        let adjacency = gen_graph(4, 0.5, DEFAULT_SEED);
        assert!(solve(&distributed(5), &adjacency).is_err());
        assert!(solve(&distributed(0), &adjacency).is_err());

        let empty = solve(&distributed(3), &DistanceMatrix::new(0)).unwrap();
        assert_eq!(empty.distances.size(), 0);
        assert_eq!(empty.sweeps, 0);
    }

    #[test]
    fn test_sweep_limit() {
        let path = DistanceMatrix::from_fn(12, |i, j| (j == i + 1) as Distance);

        let mut config = distributed(3);
        config.driver.max_sweeps = Some(1);

        let error = solve(&config, &path).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConvergenceError>(),
            Some(&ConvergenceError::SweepLimit { sweeps: 1 })
        );

        config.driver.max_sweeps = None;
        let solution = solve(&config, &path).unwrap();
        assert_eq!(solution.distances.get(0, 11), 11);
    }

    #[test]
    fn test_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");

        let mut config = distributed(2);
        config.driver.trace_file = Some(path.clone());

        let solution = solve(&config, &gen_graph(20, 0.1, DEFAULT_SEED)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2 * solution.sweeps);
    }
}
