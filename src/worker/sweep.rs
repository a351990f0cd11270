use minplus_memops::{relax_stripe, RayonPolicy, SequentialPolicy};

use super::Worker;
use crate::prelude::*;
use crate::types::{PolicyKind, SweepStats};

impl Worker {
    /// One pass over all pivots in increasing order. For every pivot `k`, the owner publishes
    /// its local copy of column `k` and every worker relaxes its stripe through it.
    pub(crate) fn sweep(&mut self) -> Result<SweepStats> {
        let me = self.id();
        let bpc = self.blocks_per_column;
        let mut stats = SweepStats::default();

        for k in 0..self.layout.size() {
            let root = self.layout.owner(k);

            if root == me {
                let local = self.layout.local_index(k);
                self.pivot
                    .copy_from_slice(&self.stripe[local * bpc..(local + 1) * bpc]);
            }

            self.endpoint.broadcast(&mut self.pivot, root)?;

            let changed = self.relax(k);
            stats.columns_changed += changed;
            stats.changed |= changed > 0;
        }

        Ok(stats)
    }

    fn relax(&mut self, k: usize) -> usize {
        let Self {
            kernel,
            policy,
            tail,
            blocks_per_column,
            stripe,
            pivot,
            ..
        } = self;

        match policy {
            PolicyKind::Sequential => {
                relax_stripe(SequentialPolicy, *kernel, stripe, *blocks_per_column, pivot, k, tail)
            }
            PolicyKind::Rayon => {
                relax_stripe(RayonPolicy, *kernel, stripe, *blocks_per_column, pivot, k, tail)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::network::{execute_workers, WorkerEndpoint};
    use crate::prelude::*;
    use crate::types::{pack, unpack, Distance, DistanceMatrix, StripeLayout, WorkerConfig};
    use crate::worker::Worker;

    #[test]
    fn test_single_sweep_reaches_fixed_point() {
        // Pivots are visited in order and carry the updates of all earlier pivots, so the first
        // sweep already finds every shortest path and the second one only confirms it.
        let n = 9;
        let mut cycle = DistanceMatrix::from_fn(n, |i, j| (j == (i + 1) % n) as Distance);
        cycle.infinitize();

        for workers in [1, 2, 4] {
            let layout = StripeLayout::new(n, workers).unwrap();
            let mut inputs = vec![None; workers];
            inputs[0] = Some(pack(&cycle));

            let outputs = execute_workers(inputs, |endpoint: WorkerEndpoint, mut global| {
                let mut worker = Worker::new(endpoint, layout, &WorkerConfig::default(), None);
                worker.distribute(global.as_ref())?;

                let first = worker.sweep()?;
                let second = worker.sweep()?;
                worker.collect(global.as_mut())?;

                Ok((first, second, global))
            })
            .unwrap();

            for (_, second, _) in &outputs {
                assert!(!second.changed);
                assert_eq!(second.columns_changed, 0);
            }
            assert!(any(&outputs, |(first, _, _)| first.changed));

            let result = unpack(outputs[0].2.as_ref().unwrap()).unwrap();
            for i in 0..n {
                for j in 0..n {
                    let expected = ((j + n - i) % n) as Distance;
                    assert_eq!(result.get(i, j), expected, "W={} ({}, {})", workers, i, j);
                }
            }
        }
    }
}
