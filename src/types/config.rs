use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;

use crate::prelude::*;
use crate::types::{KernelKind, PolicyKind};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub driver: DriverConfig,
    pub worker: WorkerConfig,
}

impl Config {
    pub fn new(driver: DriverConfig, worker: WorkerConfig) -> Self {
        Self { driver, worker }
    }

    pub fn from_env() -> Self {
        Self {
            driver: DriverConfig::from_env(),
            worker: WorkerConfig::from_env(),
        }
    }
}

/// How the computation is laid out over the machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
    /// A group of workers, each owning a column stripe, that only communicate through
    /// messages.
    Distributed { workers: usize },

    /// One shared matrix updated by the rayon thread pool.
    SharedMemory,
}

impl Deployment {
    /// Distributed over one worker per available CPU.
    pub fn distributed() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Deployment::Distributed { workers }
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::distributed()
    }
}

impl Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deployment::Distributed { workers: 1 } => write!(f, "distributed with 1 worker"),
            Deployment::Distributed { workers } => {
                write!(f, "distributed with {} workers", workers)
            }
            Deployment::SharedMemory => write!(f, "shared memory"),
        }
    }
}

impl FromStr for Deployment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "shared" => Ok(Deployment::SharedMemory),
            "" | "auto" => Ok(Deployment::distributed()),
            s => match s.parse::<usize>() {
                Ok(workers) if workers > 0 => Ok(Deployment::Distributed { workers }),
                _ => bail!("invalid number of workers {:?}", s),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub deployment: Deployment,

    /// Upper bound on the number of sweeps. `None` uses [`sweep_limit`].
    pub max_sweeps: Option<usize>,
    pub trace_file: Option<PathBuf>,
}

impl DriverConfig {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(value) = env::var("MINPLUS_WORKERS") {
            match value.parse() {
                Ok(deployment) => out.deployment = deployment,
                Err(e) => warn!("{}, reverting to {}", e, out.deployment),
            }
        }

        if let Ok(value) = env::var("MINPLUS_MAX_SWEEPS") {
            match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => out.max_sweeps = Some(n),
                _ => warn!("invalid sweep limit {:?}, ignoring", value),
            }
        }

        if let Ok(filename) = env::var("MINPLUS_TRACE") {
            let filename = filename.trim();

            if !filename.is_empty() {
                out.trace_file = Some(PathBuf::from(filename));
            }
        }

        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerConfig {
    pub kernel: KernelKind,
    pub policy: PolicyKind,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(value) = env::var("MINPLUS_KERNEL") {
            match value.parse() {
                Ok(kernel) => out.kernel = kernel,
                Err(e) => warn!("{}, reverting to {}", e, out.kernel),
            }
        }

        if let Ok(value) = env::var("MINPLUS_POLICY") {
            match value.parse() {
                Ok(policy) => out.policy = policy,
                Err(e) => warn!("{}, reverting to {:?}", e, out.policy),
            }
        }

        out
    }
}

/// Number of sweeps after which the relaxation of an `n`-node graph has certainly reached its
/// fixed point: every sweep at least squares the number of hops covered, and one more sweep
/// is needed to observe that nothing changes.
pub fn sweep_limit(n: usize) -> usize {
    let log2 = (usize::BITS - n.saturating_sub(1).leading_zeros()) as usize;
    log2 + 2
}
