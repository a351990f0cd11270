use rayon::prelude::*;

use crate::prelude::*;
use crate::types::{
    flatten_mut, pack, sweep_limit, unpack, Config, DistanceMatrix, Kernel, PaddedMatrix,
    TailMask,
};
use crate::worker::ConvergenceError;
use minplus_memops::min_plus_dot;

/// Single-process deployment: repeatedly squares the whole matrix in the min-plus semiring
/// until an iteration changes nothing. Returns the fixed point and the number of iterations.
pub(crate) fn run_shared(config: &Config, distances: &DistanceMatrix) -> Result<(DistanceMatrix, usize)> {
    let n = distances.size();
    let kernel = Kernel::from_kind(config.worker.kernel);
    let tail = TailMask::new(n);
    let max_iterations = config.driver.max_sweeps.unwrap_or_else(|| sweep_limit(n));

    info!(
        "squaring {}x{} matrix in shared memory using {} kernel",
        n, n, kernel
    );

    let mut current = pack(distances);
    let mut next = PaddedMatrix::new(n, n);

    for iteration in 1..=max_iterations {
        let transposed = current.transpose();
        let changed = square(kernel, &tail, &current, &transposed, &mut next);
        swap(&mut current, &mut next);

        debug!("iteration {}: changed={}", iteration, changed);

        if !changed {
            return Ok((unpack(&current)?, iteration));
        }
    }

    Err(ConvergenceError::SweepLimit {
        sweeps: max_iterations,
    }
    .into())
}

/// `output[i, j] = min(input[i, j], min_k input[i, k] + input[k, j])`, one column per task.
/// Row `i` of `input` is column `i` of `transposed`.
fn square(
    kernel: Kernel,
    tail: &TailMask,
    input: &PaddedMatrix,
    transposed: &PaddedMatrix,
    output: &mut PaddedMatrix,
) -> bool {
    let n = input.rows();
    let bpc = output.blocks_per_column();

    if bpc == 0 {
        return false;
    }

    output
        .blocks_mut()
        .par_chunks_mut(bpc)
        .enumerate()
        .map(|(j, column)| {
            let column = flatten_mut(column);
            let mut changed = false;

            for i in 0..n {
                let current = input.get(i, j);
                let through = min_plus_dot(kernel, transposed.column(i), input.column(j), tail);
                let best = min(current, through);

                changed |= best < current;
                column[i] = best;
            }

            changed
        })
        .reduce(|| false, |a, b| a || b)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Deployment, Distance, DriverConfig};

    #[test]
    fn test_star() {
        // Everything reaches the center, which reaches everything: every pair is at most two
        // hops apart.
        let n = 11;
        let mut star = DistanceMatrix::from_fn(n, |i, j| (i != j && (i == 0 || j == 0)) as Distance);
        star.infinitize();

        let config = Config::new(
            DriverConfig {
                deployment: Deployment::SharedMemory,
                ..default()
            },
            default(),
        );

        let (result, iterations) = run_shared(&config, &star).unwrap();
        assert_eq!(iterations, 2);

        for i in 0..n {
            for j in 0..n {
                let expected = match (i, j) {
                    _ if i == j => 0,
                    (0, _) | (_, 0) => 1,
                    _ => 2,
                };
                assert_eq!(result.get(i, j), expected);
            }
        }
    }
}
