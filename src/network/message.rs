use minplus_core::Lanes;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Identifies the collective a message belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Broadcast,
    Scatter,
    Gather,
    Reduce,
    Barrier,
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Broadcast => "broadcast",
            Tag::Scatter => "scatter",
            Tag::Gather => "gather",
            Tag::Reduce => "reduce",
            Tag::Barrier => "barrier",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Payload {
    /// Column data. Shared between all receivers of a broadcast.
    Blocks(Arc<[Lanes]>),
    Flag(bool),
}

impl Payload {
    pub(crate) fn len(&self) -> usize {
        match self {
            Payload::Blocks(blocks) => blocks.len(),
            Payload::Flag(_) => 1,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Message {
    pub(crate) tag: Tag,
    pub(crate) seq: u64,
    pub(crate) payload: Payload,
}
