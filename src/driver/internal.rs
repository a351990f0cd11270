use std::sync::Arc;

use super::SweepTrace;
use crate::network::execute_workers;
use crate::prelude::*;
use crate::types::{pack, sweep_limit, unpack, Config, DistanceMatrix, StripeLayout};
use crate::worker::execute_worker;

/// Runs the relaxation of `distances` (already infinitized) on `workers` communicating
/// workers. Returns the fixed point and the number of sweeps.
pub(crate) fn run_distributed(
    config: &Config,
    workers: usize,
    distances: &DistanceMatrix,
) -> Result<(DistanceMatrix, usize)> {
    let n = distances.size();
    let layout = StripeLayout::new(n, workers)?;
    let max_sweeps = config.driver.max_sweeps.unwrap_or_else(|| sweep_limit(n));

    let trace = match &config.driver.trace_file {
        Some(path) => Some(Arc::new(Mutex::new(SweepTrace::new(path)?))),
        None => None,
    };

    info!(
        "relaxing {}x{} matrix on {} workers (at most {} sweeps)",
        n, n, workers, max_sweeps
    );

    let mut inputs = vec![None; workers];
    inputs[0] = Some(pack(distances));

    let worker_config = config.worker;
    let outputs = execute_workers(inputs, |endpoint, global| {
        execute_worker(
            endpoint,
            global,
            layout,
            &worker_config,
            max_sweeps,
            trace.clone(),
        )
    })?;

    let coordinator = outputs
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no workers were launched"))?;

    let global = coordinator
        .global
        .ok_or_else(|| anyhow!("coordinator did not return the matrix"))?;

    Ok((unpack(&global)?, coordinator.sweeps))
}
