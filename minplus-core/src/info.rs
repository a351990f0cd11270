use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Identifies one worker of the group. Worker `0` is the coordinator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u16);

impl WorkerId {
    pub const COORDINATOR: WorkerId = WorkerId(0);

    pub fn new(i: usize) -> Self {
        WorkerId(i as u16)
    }

    pub fn get(&self) -> usize {
        self.0 as usize
    }

    pub fn is_coordinator(&self) -> bool {
        *self == Self::COORDINATOR
    }
}

impl Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
