//! Assignment of matrix columns to workers.
//!
//! Columns are split into contiguous stripes of `n / W` columns. The last worker additionally
//! owns the `n % W` remaining columns, so its stripe may be wider than the others.
use crate::info::WorkerId;
use crate::prelude::*;
use std::ops::Range;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("at least one worker is required")]
    NoWorkers,

    #[error("cannot split {n} columns among {workers} workers")]
    TooManyWorkers { n: usize, workers: usize },
}

/// Worker owning global column `k`. Requires `1 <= num_workers <= n`.
#[inline]
pub fn owner(k: usize, n: usize, num_workers: usize) -> WorkerId {
    let width = n / num_workers;

    // The quotient selects a worker beyond the last one for the remainder columns, which
    // belong to the last worker.
    WorkerId::new(min(k / width, num_workers - 1))
}

/// Position of global column `k` inside the stripe of its owner.
#[inline]
pub fn local_index(k: usize, n: usize, num_workers: usize) -> usize {
    k - owner(k, n, num_workers).get() * (n / num_workers)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StripeLayout {
    n: usize,
    num_workers: usize,
    width: usize,
}

impl StripeLayout {
    pub fn new(n: usize, num_workers: usize) -> Result<Self, PartitionError> {
        if num_workers == 0 {
            return Err(PartitionError::NoWorkers);
        }

        if num_workers > n {
            return Err(PartitionError::TooManyWorkers {
                n,
                workers: num_workers,
            });
        }

        Ok(Self {
            n,
            num_workers,
            width: n / num_workers,
        })
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    #[inline(always)]
    pub fn owner(&self, k: usize) -> WorkerId {
        owner(k, self.n, self.num_workers)
    }

    #[inline(always)]
    pub fn local_index(&self, k: usize) -> usize {
        local_index(k, self.n, self.num_workers)
    }

    pub fn global_index(&self, worker: WorkerId, local: usize) -> usize {
        self.stripe(worker).start + local
    }

    /// Global column indices owned by `worker`.
    pub fn stripe(&self, worker: WorkerId) -> Range<usize> {
        let begin = worker.get() * self.width;
        let end = if worker.get() + 1 == self.num_workers {
            self.n
        } else {
            begin + self.width
        };

        begin..end
    }

    pub fn width(&self, worker: WorkerId) -> usize {
        self.stripe(worker).len()
    }

    pub fn workers(&self) -> impl Iterator<Item = WorkerId> {
        (0..self.num_workers).map(WorkerId::new)
    }

    /// Number of blocks each worker receives when columns hold `blocks_per_column` blocks.
    pub fn counts(&self, blocks_per_column: usize) -> Vec<usize> {
        self.workers()
            .map(|w| self.width(w) * blocks_per_column)
            .collect()
    }

    /// Offset (in blocks) of each worker's stripe within the global buffer.
    pub fn offsets(&self, blocks_per_column: usize) -> Vec<usize> {
        self.workers()
            .map(|w| self.stripe(w).start * blocks_per_column)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invalid() {
        assert_eq!(StripeLayout::new(10, 0), Err(PartitionError::NoWorkers));
        assert_eq!(
            StripeLayout::new(3, 4),
            Err(PartitionError::TooManyWorkers { n: 3, workers: 4 })
        );
    }

    #[test]
    fn test_remainder_goes_to_last() {
        let layout = StripeLayout::new(10, 3).unwrap();
        assert_eq!(layout.stripe(WorkerId(0)), 0..3);
        assert_eq!(layout.stripe(WorkerId(1)), 3..6);
        assert_eq!(layout.stripe(WorkerId(2)), 6..10);

        // k / 3 == 3 would name a fourth worker.
        assert_eq!(layout.owner(9), WorkerId(2));
        assert_eq!(layout.local_index(9), 3);
        assert_eq!(layout.local_index(4), 1);

        assert_eq!(layout.counts(2), vec![6, 6, 8]);
        assert_eq!(layout.offsets(2), vec![0, 6, 12]);
    }

    #[test]
    fn test_completeness() {
        for n in 1..40 {
            for workers in 1..=min(n, 9) {
                let layout = StripeLayout::new(n, workers).unwrap();
                let mut seen = vec![0; n];

                for w in layout.workers() {
                    let stripe = layout.stripe(w);
                    assert_eq!(layout.width(w), stripe.len());

                    for (local, k) in enumerate(stripe) {
                        assert_eq!(layout.owner(k), w, "n={} W={} k={}", n, workers, k);
                        assert_eq!(layout.local_index(k), local);
                        assert_eq!(layout.global_index(w, local), k);
                        seen[k] += 1;
                    }
                }

                assert!(seen.iter().all(|&c| c == 1), "n={} W={}", n, workers);

                let counts = layout.counts(3);
                let offsets = layout.offsets(3);
                assert_eq!(counts.iter().sum::<usize>(), n * 3);
                for w in 1..workers {
                    assert_eq!(offsets[w], offsets[w - 1] + counts[w - 1]);
                }
            }
        }
    }
}
