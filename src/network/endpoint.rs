use std::any::Any;
use std::sync::Arc;

use super::internal::{connect, Link, NetworkError};
use super::message::{Payload, Tag};
use crate::prelude::*;
use crate::types::{Lanes, WorkerId};

/// One worker's handle to the communicator.
///
/// All collectives must be entered by every worker of the group in the same order. Otherwise
/// the peers stall, or detect the mismatch through the per-channel sequence numbers.
#[derive(Debug)]
pub(crate) struct WorkerEndpoint {
    link: Link,
}

impl WorkerEndpoint {
    pub(crate) fn new(link: Link) -> Self {
        Self { link }
    }

    pub(crate) fn my_id(&self) -> WorkerId {
        self.link.my_id()
    }

    pub(crate) fn num_workers(&self) -> usize {
        self.link.num_workers()
    }

    fn peers(&self) -> impl Iterator<Item = WorkerId> {
        let me = self.my_id();
        (0..self.num_workers())
            .map(WorkerId::new)
            .filter(move |&w| w != me)
    }

    fn recv_blocks(
        &mut self,
        src: WorkerId,
        tag: Tag,
        expected: usize,
    ) -> Result<Arc<[Lanes]>, NetworkError> {
        match self.link.recv(src, tag)? {
            Payload::Blocks(blocks) if blocks.len() == expected => Ok(blocks),
            other => Err(NetworkError::SizeMismatch {
                src,
                expected,
                found: other.len(),
            }),
        }
    }

    fn recv_flag(&mut self, src: WorkerId, tag: Tag) -> Result<bool, NetworkError> {
        match self.link.recv(src, tag)? {
            Payload::Flag(flag) => Ok(flag),
            other => Err(NetworkError::SizeMismatch {
                src,
                expected: 1,
                found: other.len(),
            }),
        }
    }

    /// After this call, `buffer` holds the contents `root` passed in on every worker.
    pub(crate) fn broadcast(&mut self, buffer: &mut [Lanes], root: WorkerId) -> Result<(), NetworkError> {
        if self.my_id() == root {
            let peers = self.peers().collect_vec();
            if peers.is_empty() {
                return Ok(());
            }

            let shared: Arc<[Lanes]> = Arc::from(&*buffer);
            for dst in peers {
                self.link
                    .send(dst, Tag::Broadcast, Payload::Blocks(Arc::clone(&shared)))?;
            }
        } else {
            let blocks = self.recv_blocks(root, Tag::Broadcast, buffer.len())?;
            buffer.copy_from_slice(&blocks);
        }

        Ok(())
    }

    /// Worker `w` receives `send[offsets[w]..offsets[w] + counts[w]]` of the root into `recv`,
    /// which must hold exactly `counts[w]` blocks. Only the root provides `send`.
    pub(crate) fn scatterv(
        &mut self,
        send: Option<&[Lanes]>,
        counts: &[usize],
        offsets: &[usize],
        recv: &mut [Lanes],
        root: WorkerId,
    ) -> Result<(), NetworkError> {
        let me = self.my_id();

        if me == root {
            let send = send.ok_or(NetworkError::MissingRootBuffer(root))?;

            for dst in self.peers().collect_vec() {
                let range = offsets[dst.get()]..offsets[dst.get()] + counts[dst.get()];
                let blocks: Arc<[Lanes]> = Arc::from(&send[range]);
                self.link.send(dst, Tag::Scatter, Payload::Blocks(blocks))?;
            }

            let range = offsets[me.get()]..offsets[me.get()] + counts[me.get()];
            recv.copy_from_slice(&send[range]);
        } else {
            let blocks = self.recv_blocks(root, Tag::Scatter, recv.len())?;
            recv.copy_from_slice(&blocks);
        }

        Ok(())
    }

    /// Inverse of [`scatterv`](Self::scatterv): the root collects `send` of worker `w` into
    /// `recv[offsets[w]..offsets[w] + counts[w]]`. Only the root provides `recv`.
    pub(crate) fn gatherv(
        &mut self,
        send: &[Lanes],
        recv: Option<&mut [Lanes]>,
        counts: &[usize],
        offsets: &[usize],
        root: WorkerId,
    ) -> Result<(), NetworkError> {
        let me = self.my_id();

        if me == root {
            let recv = recv.ok_or(NetworkError::MissingRootBuffer(root))?;
            recv[offsets[me.get()]..offsets[me.get()] + counts[me.get()]].copy_from_slice(send);

            for src in self.peers().collect_vec() {
                let count = counts[src.get()];
                let offset = offsets[src.get()];
                let blocks = self.recv_blocks(src, Tag::Gather, count)?;
                recv[offset..offset + count].copy_from_slice(&blocks);
            }
        } else {
            let blocks: Arc<[Lanes]> = Arc::from(send);
            self.link.send(root, Tag::Gather, Payload::Blocks(blocks))?;
        }

        Ok(())
    }

    /// Logical AND of `value` over all workers. Every worker receives the same result.
    pub(crate) fn all_reduce_and(&mut self, value: bool) -> Result<bool, NetworkError> {
        self.reduce_and(Tag::Reduce, value)
    }

    /// Returns once every worker has entered the barrier.
    pub(crate) fn barrier(&mut self) -> Result<(), NetworkError> {
        self.reduce_and(Tag::Barrier, true).map(|_| ())
    }

    fn reduce_and(&mut self, tag: Tag, value: bool) -> Result<bool, NetworkError> {
        let root = WorkerId::COORDINATOR;

        if self.my_id() == root {
            let peers = self.peers().collect_vec();

            // All contributions are received, even after the result is known, so that the
            // channels stay in sequence.
            let mut result = value;
            for &src in &peers {
                result &= self.recv_flag(src, tag)?;
            }

            for &dst in &peers {
                self.link.send(dst, tag, Payload::Flag(result))?;
            }

            Ok(result)
        } else {
            self.link.send(root, tag, Payload::Flag(value))?;
            self.recv_flag(root, tag)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<unknown>"
    }
}

fn is_disconnect(error: &Error) -> bool {
    matches!(
        error.downcast_ref::<NetworkError>(),
        Some(NetworkError::Disconnected(_))
    )
}

/// Launches one thread per element of `inputs`, connected by a fresh communicator, and runs
/// `fun` on each of them. Element `i` of `inputs` is handed to worker `i`.
///
/// If any worker fails, the run fails. Peers of a failed worker usually report a disconnect,
/// so the error of the worker that failed first is preferred over those.
pub(crate) fn execute_workers<I, T, F>(inputs: Vec<I>, fun: F) -> Result<Vec<T>>
where
    I: Send,
    T: Send,
    F: Fn(WorkerEndpoint, I) -> Result<T> + Sync,
{
    let links = connect(inputs.len());
    let fun = &fun;

    let results = crossbeam::thread::scope(|scope| -> Result<_> {
        let handles = zip(links, inputs)
            .map(|(link, input)| {
                let id = link.my_id();

                scope
                    .builder()
                    .name(format!("worker-{}", id))
                    .spawn(move |_| fun(WorkerEndpoint::new(link), input))
                    .with_context(|| format!("failed to spawn worker {}", id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(handles.into_iter().map(|h| h.join()).collect_vec())
    })
    .map_err(|_| anyhow!("worker thread panicked"))??;

    let mut outputs = Vec::with_capacity(results.len());
    let mut failure: Option<Error> = None;

    for (i, result) in enumerate(results) {
        let error = match result {
            Ok(Ok(output)) => {
                outputs.push(output);
                continue;
            }
            Ok(Err(e)) => e.context(format!("worker {} failed", i)),
            Err(payload) => anyhow!("worker {} panicked: {}", i, panic_message(&*payload)),
        };

        debug!("{:#}", error);

        failure = match failure {
            Some(previous) if !is_disconnect(&previous) || is_disconnect(&error) => {
                Some(previous)
            }
            _ => Some(error),
        };
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(outputs),
    }
}
