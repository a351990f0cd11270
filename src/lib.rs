//! Distributed, vectorized all-pairs shortest paths on dense unweighted graphs.
//!
//! A fixed group of workers owns contiguous column stripes of the distance matrix. For every
//! pivot column the owner broadcasts it to the group and every worker relaxes its stripe
//! through it with a SIMD min-plus kernel. Sweeps over all pivots repeat until no entry
//! changes anywhere in the group.
pub mod api;
mod driver;
pub mod graph;
mod network;
mod prelude;
pub mod types;
mod worker;

pub use api::{solve, Solution};

pub fn hostname() -> &'static str {
    lazy_static::lazy_static! {
        static ref HOSTNAME: String = {
            match ::hostname::get() {
                Ok(s) => s.to_string_lossy().into_owned(),
                Err(_) => "<anonymous>".into(),
            }
        };
    };

    &HOSTNAME
}

pub fn initialize_logger() {
    use std::time::Instant;

    lazy_static::lazy_static! {
        static ref START_TIMING: Instant = Instant::now();
    }

    let _ = *START_TIMING;

    env_logger::Builder::from_default_env()
        .format(|formatter, record| {
            use std::io::Write;
            let duration = START_TIMING.elapsed();

            writeln!(
                formatter,
                "[{} {} {:.6}] {}: {}",
                hostname(),
                record.module_path().unwrap_or("?"),
                duration.as_secs_f64(),
                record.level(),
                record.args(),
            )
        })
        .init();
}
