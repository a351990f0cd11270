//! Vectorized operations on padded columns: the min-plus relaxation kernel and the min-plus
//! dot product, each with a portable and an AVX2 backend.
pub mod host;

use minplus_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

pub use self::host::{
    min_plus_dot, relax, relax_stripe, Policy, PolicyKind, RayonPolicy, SequentialPolicy,
};

/// Kernel requested by the configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    /// Fastest backend supported by the running CPU.
    Auto,
    Portable,
    Avx2,
}

impl Default for KernelKind {
    fn default() -> Self {
        KernelKind::Auto
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown kernel {0:?}, expected one of: auto, portable, avx2")]
pub struct UnknownKernelError(pub String);

impl FromStr for KernelKind {
    type Err = UnknownKernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(KernelKind::Auto),
            "portable" | "scalar" => Ok(KernelKind::Portable),
            "avx2" => Ok(KernelKind::Avx2),
            _ => Err(UnknownKernelError(s.to_string())),
        }
    }
}

impl Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelKind::Auto => "auto",
            KernelKind::Portable => "portable",
            KernelKind::Avx2 => "avx2",
        };

        f.write_str(name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Backend {
    Portable,
    Avx2,
}

/// A kernel backend that is known to be supported by the running CPU.
///
/// The only way to obtain an AVX2 kernel is through runtime feature detection, which is what
/// makes dispatching to the `target_feature` functions sound.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Kernel(pub(crate) Backend);

impl Kernel {
    pub fn portable() -> Self {
        Kernel(Backend::Portable)
    }

    pub fn avx2() -> Option<Self> {
        if avx2_available() {
            Some(Kernel(Backend::Avx2))
        } else {
            None
        }
    }

    pub fn detect() -> Self {
        Self::avx2().unwrap_or_else(Self::portable)
    }

    pub fn from_kind(kind: KernelKind) -> Self {
        match kind {
            KernelKind::Auto => Self::detect(),
            KernelKind::Portable => Self::portable(),
            KernelKind::Avx2 => Self::avx2().unwrap_or_else(|| {
                warn!("AVX2 is not supported by this CPU, falling back to portable kernel");
                Self::portable()
            }),
        }
    }

    /// Every kernel the running CPU supports.
    pub fn available() -> Vec<Self> {
        let mut kernels = vec![Self::portable()];
        kernels.extend(Self::avx2());
        kernels
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            Backend::Portable => "portable",
            Backend::Avx2 => "avx2",
        }
    }
}

impl Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn avx2_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2")
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}
