//! Data model shared by every crate of the minplus workspace: the logical distance matrix,
//! its padded vector-aligned layout, and the column partitioning among workers.
pub mod info;
pub mod layout;
pub mod matrix;
pub mod partition;
pub mod prelude;

pub use info::*;
pub use layout::*;
pub use matrix::*;
pub use partition::*;
