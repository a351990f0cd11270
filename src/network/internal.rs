use crossbeam::channel::{self, Receiver, Sender};

use super::message::{Message, Payload, Tag};
use crate::prelude::*;
use crate::types::WorkerId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("worker {0} does not exist")]
    InvalidWorker(WorkerId),

    #[error("connection to worker {0} was closed")]
    Disconnected(WorkerId),

    #[error(
        "expected {expected} message #{expected_seq} from worker {src}, \
         received {found} message #{found_seq}"
    )]
    OutOfSequence {
        src: WorkerId,
        expected: Tag,
        expected_seq: u64,
        found: Tag,
        found_seq: u64,
    },

    #[error("received {found} elements from worker {src} while expecting {expected}")]
    SizeMismatch {
        src: WorkerId,
        expected: usize,
        found: usize,
    },

    #[error("worker {0} is the root of a collective but provided no buffer")]
    MissingRootBuffer(WorkerId),
}

/// The channels of one worker: an outgoing and an incoming channel for every peer.
#[derive(Debug)]
pub(crate) struct Link {
    my_id: WorkerId,
    outboxes: Vec<Sender<Message>>,
    inboxes: Vec<Receiver<Message>>,
    sent: Vec<u64>,
    received: Vec<u64>,
}

/// Creates a fully connected mesh between `num_workers` workers. Element `i` of the result
/// belongs to worker `i`.
pub(crate) fn connect(num_workers: usize) -> Vec<Link> {
    let mut outboxes = (0..num_workers).map(|_| vec![]).collect_vec();
    let mut inboxes = (0..num_workers).map(|_| vec![]).collect_vec();

    for src in 0..num_workers {
        for dst in 0..num_workers {
            let (sender, receiver) = channel::unbounded();
            outboxes[src].push(sender);
            inboxes[dst].push(receiver);
        }
    }

    enumerate(zip(outboxes, inboxes))
        .map(|(i, (outboxes, inboxes))| Link {
            my_id: WorkerId::new(i),
            outboxes,
            inboxes,
            sent: vec![0; num_workers],
            received: vec![0; num_workers],
        })
        .collect()
}

impl Link {
    pub(crate) fn my_id(&self) -> WorkerId {
        self.my_id
    }

    pub(crate) fn num_workers(&self) -> usize {
        self.outboxes.len()
    }

    fn check_peer(&self, peer: WorkerId) -> Result<usize, NetworkError> {
        if peer.get() < self.num_workers() {
            Ok(peer.get())
        } else {
            Err(NetworkError::InvalidWorker(peer))
        }
    }

    pub(crate) fn send(&mut self, dst: WorkerId, tag: Tag, payload: Payload) -> Result<(), NetworkError> {
        let index = self.check_peer(dst)?;
        let seq = self.sent[index];
        self.sent[index] += 1;

        trace!(
            "{} -> {}: {} #{} ({} elements)",
            self.my_id,
            dst,
            tag,
            seq,
            payload.len()
        );

        self.outboxes[index]
            .send(Message { tag, seq, payload })
            .map_err(|_| NetworkError::Disconnected(dst))
    }

    /// Blocks until the next message from `src` arrives. The message must be the next one in
    /// sequence and belong to collective `tag`.
    pub(crate) fn recv(&mut self, src: WorkerId, tag: Tag) -> Result<Payload, NetworkError> {
        let index = self.check_peer(src)?;
        let message = self.inboxes[index]
            .recv()
            .map_err(|_| NetworkError::Disconnected(src))?;

        let expected_seq = self.received[index];
        self.received[index] += 1;

        if message.tag != tag || message.seq != expected_seq {
            return Err(NetworkError::OutOfSequence {
                src,
                expected: tag,
                expected_seq,
                found: message.tag,
                found_seq: message.seq,
            });
        }

        trace!("{} <- {}: {} #{}", self.my_id, src, tag, expected_seq);
        Ok(message.payload)
    }
}
