//! A single member of the worker group: owns one column stripe and runs the convergence loop.
mod sweep;

use std::sync::Arc;
use std::time::Instant;

use crate::driver::SweepTrace;
use crate::network::WorkerEndpoint;
use crate::prelude::*;
use crate::types::{
    blocks_for, Kernel, Lanes, PaddedMatrix, PolicyKind, StripeLayout, TailMask, WorkerConfig,
    WorkerId,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceError {
    #[error("no fixed point was reached within {sweeps} sweeps")]
    SweepLimit { sweeps: usize },
}

pub(crate) struct Worker {
    endpoint: WorkerEndpoint,
    layout: StripeLayout,
    kernel: Kernel,
    policy: PolicyKind,
    tail: TailMask,
    blocks_per_column: usize,
    counts: Vec<usize>,
    offsets: Vec<usize>,

    /// Local columns, `blocks_per_column` blocks each.
    stripe: Vec<Lanes>,
    pivot: Vec<Lanes>,
    trace: Option<Arc<Mutex<SweepTrace>>>,
}

impl Worker {
    pub(crate) fn new(
        endpoint: WorkerEndpoint,
        layout: StripeLayout,
        config: &WorkerConfig,
        trace: Option<Arc<Mutex<SweepTrace>>>,
    ) -> Self {
        assert_eq!(endpoint.num_workers(), layout.num_workers());

        let n = layout.size();
        let blocks_per_column = blocks_for(n);
        let width = layout.width(endpoint.my_id());
        let kernel = Kernel::from_kind(config.kernel);

        debug!(
            "worker {} owns columns {:?} using {} kernel",
            endpoint.my_id(),
            layout.stripe(endpoint.my_id()),
            kernel
        );

        Self {
            layout,
            kernel,
            policy: config.policy,
            tail: TailMask::new(n),
            blocks_per_column,
            counts: layout.counts(blocks_per_column),
            offsets: layout.offsets(blocks_per_column),
            stripe: vec![Lanes::default(); width * blocks_per_column],
            pivot: vec![Lanes::default(); blocks_per_column],
            trace,
            endpoint,
        }
    }

    pub(crate) fn id(&self) -> WorkerId {
        self.endpoint.my_id()
    }

    fn check_global(&self, global: &PaddedMatrix) -> Result {
        let n = self.layout.size();
        if global.rows() != n
            || global.ncols() != n
            || global.blocks_per_column() != self.blocks_per_column
        {
            bail!(
                "global matrix is {}x{} with {} blocks per column, expected {}x{} with {}",
                global.rows(),
                global.ncols(),
                global.blocks_per_column(),
                n,
                n,
                self.blocks_per_column
            );
        }

        Ok(())
    }

    /// Hands every worker its stripe of `global`, which only the coordinator provides.
    pub(crate) fn distribute(&mut self, global: Option<&PaddedMatrix>) -> Result {
        if let Some(global) = global {
            self.check_global(global)?;
        }

        self.endpoint.scatterv(
            global.map(|g| g.blocks()),
            &self.counts,
            &self.offsets,
            &mut self.stripe,
            WorkerId::COORDINATOR,
        )?;

        Ok(())
    }

    /// Inverse of [`distribute`](Self::distribute).
    pub(crate) fn collect(&mut self, global: Option<&mut PaddedMatrix>) -> Result {
        if let Some(global) = &global {
            self.check_global(global)?;
        }

        self.endpoint.gatherv(
            &self.stripe,
            global.map(|g| g.blocks_mut()),
            &self.counts,
            &self.offsets,
            WorkerId::COORDINATOR,
        )?;

        Ok(())
    }

    /// Runs sweeps until no worker changes anything and returns the number of sweeps,
    /// including the final one that observed the fixed point.
    pub(crate) fn converge(&mut self, max_sweeps: usize) -> Result<usize> {
        for sweep in 1..=max_sweeps {
            let before = Instant::now();
            let stats = self.sweep()?;
            let converged = self.endpoint.all_reduce_and(!stats.changed)?;
            let elapsed = before.elapsed();

            debug!(
                "worker {}: sweep {} took {:?}, {} column updates",
                self.id(),
                sweep,
                elapsed,
                stats.columns_changed
            );

            if let Some(trace) = &self.trace {
                trace.lock().record(self.id(), sweep, &stats, elapsed);
            }

            if converged {
                return Ok(sweep);
            }
        }

        Err(ConvergenceError::SweepLimit { sweeps: max_sweeps }.into())
    }

    #[cfg(test)]
    fn local_column(&self, local: usize) -> &[Lanes] {
        let bpc = self.blocks_per_column;
        &self.stripe[local * bpc..(local + 1) * bpc]
    }
}

pub(crate) struct WorkerOutput {
    /// The converged global matrix, only on the coordinator.
    pub(crate) global: Option<PaddedMatrix>,
    pub(crate) sweeps: usize,
}

/// Complete lifecycle of one worker: receive the stripe, converge, and send it back.
pub(crate) fn execute_worker(
    endpoint: WorkerEndpoint,
    mut global: Option<PaddedMatrix>,
    layout: StripeLayout,
    config: &WorkerConfig,
    max_sweeps: usize,
    trace: Option<Arc<Mutex<SweepTrace>>>,
) -> Result<WorkerOutput> {
    let mut worker = Worker::new(endpoint, layout, config, trace);

    worker.distribute(global.as_ref())?;

    // Sweep timings in the trace start when every stripe is in place.
    worker.endpoint.barrier()?;

    let sweeps = worker.converge(max_sweeps)?;
    worker.collect(global.as_mut())?;

    Ok(WorkerOutput { global, sweeps })
}
