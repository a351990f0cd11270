//! Inputs and outputs around the solver: random graphs, the text matrix format, and the
//! checksum used to compare results between runs.
mod checksum;
mod generate;
mod io;

pub use self::checksum::fletcher16;
pub use self::generate::{gen_graph, DEFAULT_SEED};
pub use self::io::{read_matrix, write_matrix};
