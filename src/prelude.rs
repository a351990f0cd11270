pub use minplus_core::prelude::*;
