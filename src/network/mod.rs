//! Message-passing communicator connecting a fixed group of workers.
//!
//! Every ordered pair of workers shares one FIFO channel, so messages between two workers are
//! never reordered. Collectives are built on top of these point-to-point channels.
mod endpoint;
mod internal;
mod message;

pub(crate) use self::endpoint::{execute_workers, WorkerEndpoint};
pub use self::internal::NetworkError;
pub use self::message::Tag;

#[cfg(test)]
pub(crate) use self::internal::connect;
