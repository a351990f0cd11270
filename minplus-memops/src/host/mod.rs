use crate::{Backend, Kernel};
use minplus_core::prelude::*;
use minplus_core::{flatten, Distance, Lanes, TailMask};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(target_arch = "x86_64")]
mod avx2;
mod portable;

/// Stripes larger than this many blocks are split in two halves which are handed to
/// [`Policy::join`].
const WORK_SPLIT_THRESHOLD: usize = 1024 * 4;

pub trait Policy: Sized {
    fn join<A, B, RA, RB>(self, left: A, right: B) -> (RA, RB)
    where
        A: FnOnce(Self) -> RA + Send,
        B: FnOnce(Self) -> RB + Send,
        RA: Send,
        RB: Send;
}

#[derive(Debug, Clone, Copy)]
pub struct RayonPolicy;
impl Policy for RayonPolicy {
    fn join<A, B, RA, RB>(self, left: A, right: B) -> (RA, RB)
    where
        A: FnOnce(Self) -> RA + Send,
        B: FnOnce(Self) -> RB + Send,
        RA: Send,
        RB: Send,
    {
        rayon::join(|| left(Self), || right(Self))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SequentialPolicy;
impl Policy for SequentialPolicy {
    fn join<A, B, RA, RB>(self, left: A, right: B) -> (RA, RB)
    where
        A: FnOnce(Self) -> RA + Send,
        B: FnOnce(Self) -> RB + Send,
        RA: Send,
        RB: Send,
    {
        (left(Self), right(Self))
    }
}

/// Policy selected by the configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    Sequential,
    Rayon,
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Sequential
    }
}

impl FromStr for PolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(PolicyKind::Sequential),
            "rayon" | "parallel" => Ok(PolicyKind::Rayon),
            _ => bail!("unknown policy {:?}, expected one of: sequential, rayon", s),
        }
    }
}

/// Relaxes local column `column` through pivot column `pivot`:
///
/// `column[i] = min(column[i], pivot[i] + column[k])`
///
/// for every real row `i` described by `tail`. Returns `true` if any real row decreased.
/// Padding lanes are neither written nor considered for the return value.
#[inline]
pub fn relax(kernel: Kernel, column: &mut [Lanes], pivot: &[Lanes], k: usize, tail: &TailMask) -> bool {
    let blocks = tail.blocks();
    assert!(k < tail.rows(), "pivot {} out of bounds", k);
    assert!(column.len() >= blocks && pivot.len() >= blocks);

    let weight = flatten(column)[k];
    let column = &mut column[..blocks];
    let pivot = &pivot[..blocks];

    match kernel.0 {
        Backend::Portable => portable::relax(column, pivot, weight, tail),
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 => unsafe {
            // SAFETY: `Backend::Avx2` is only constructed after runtime feature detection.
            avx2::relax(column, pivot, weight, tail)
        },
        #[cfg(not(target_arch = "x86_64"))]
        Backend::Avx2 => portable::relax(column, pivot, weight, tail),
    }
}

/// Applies [`relax`] to every column of `stripe` (consecutive columns of `blocks_per_column`
/// blocks each) and returns the number of columns that changed.
pub fn relax_stripe<P: Policy>(
    policy: P,
    kernel: Kernel,
    stripe: &mut [Lanes],
    blocks_per_column: usize,
    pivot: &[Lanes],
    k: usize,
    tail: &TailMask,
) -> usize {
    if blocks_per_column == 0 {
        return 0;
    }

    debug_assert_eq!(stripe.len() % blocks_per_column, 0);
    let ncols = stripe.len() / blocks_per_column;

    if stripe.len() > WORK_SPLIT_THRESHOLD && ncols >= 2 {
        let (left, right) = stripe.split_at_mut((ncols / 2) * blocks_per_column);
        let (a, b) = policy.join(
            move |p| relax_stripe(p, kernel, left, blocks_per_column, pivot, k, tail),
            move |p| relax_stripe(p, kernel, right, blocks_per_column, pivot, k, tail),
        );

        return a + b;
    }

    let mut changed = 0;
    for column in stripe.chunks_exact_mut(blocks_per_column) {
        if relax(kernel, column, pivot, k, tail) {
            changed += 1;
        }
    }

    changed
}

/// Returns `min(lhs[r] + rhs[r])` over the real rows `r` described by `tail`, or
/// `Distance::MAX` if there are none.
#[inline]
pub fn min_plus_dot(kernel: Kernel, lhs: &[Lanes], rhs: &[Lanes], tail: &TailMask) -> Distance {
    let blocks = tail.blocks();
    assert!(lhs.len() >= blocks && rhs.len() >= blocks);

    let lhs = &lhs[..blocks];
    let rhs = &rhs[..blocks];

    match kernel.0 {
        Backend::Portable => portable::min_plus_dot(lhs, rhs, tail),
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 => unsafe {
            // SAFETY: see `relax`.
            avx2::min_plus_dot(lhs, rhs, tail)
        },
        #[cfg(not(target_arch = "x86_64"))]
        Backend::Avx2 => portable::min_plus_dot(lhs, rhs, tail),
    }
}
