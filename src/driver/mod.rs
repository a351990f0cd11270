//! Coordinator side of a run: prepares the global matrix, launches the deployment, and turns
//! the result back into a logical matrix.
mod internal;
mod shared;
mod trace;

pub(crate) use self::internal::run_distributed;
pub(crate) use self::shared::run_shared;
pub(crate) use self::trace::SweepTrace;
