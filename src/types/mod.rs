//! Common types used throughout minplus.
mod config;

use serde::{Deserialize, Serialize};

pub use minplus_core::*;
pub use minplus_memops::{Kernel, KernelKind, PolicyKind};

pub use self::config::*;

/// Outcome of one sweep on one worker.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStats {
    /// Whether any entry of the local stripe decreased.
    pub changed: bool,

    /// Number of (pivot, local column) relaxations that decreased at least one entry.
    pub columns_changed: usize,
}
