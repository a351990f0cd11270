//! Lane-by-lane implementation written as fixed-size array operations, which the compiler
//! turns into vector instructions on most targets.
use minplus_core::prelude::*;
use minplus_core::{Distance, Lanes, TailMask, VECTOR_LANES};

pub(super) fn relax(
    column: &mut [Lanes],
    pivot: &[Lanes],
    weight: Distance,
    tail: &TailMask,
) -> bool {
    let last = column.len().wrapping_sub(1);
    let mut any = 0;

    for (i, (current, pivot)) in enumerate(zip(column.iter_mut(), pivot)) {
        let mut candidate = [0; VECTOR_LANES];
        let mut mask = [0; VECTOR_LANES];

        // Padding lanes may hold anything, so the addition has to wrap instead of trap.
        for lane in 0..VECTOR_LANES {
            candidate[lane] = pivot.0[lane].wrapping_add(weight);
            mask[lane] = -((current.0[lane] > candidate[lane]) as Distance);
        }

        if i == last && tail.is_partial() {
            for lane in 0..VECTOR_LANES {
                mask[lane] &= tail.lanes().0[lane];
            }
        }

        for lane in 0..VECTOR_LANES {
            any |= mask[lane];
            current.0[lane] =
                (mask[lane] & candidate[lane]).wrapping_add(!mask[lane] & current.0[lane]);
        }
    }

    any != 0
}

pub(super) fn min_plus_dot(lhs: &[Lanes], rhs: &[Lanes], tail: &TailMask) -> Distance {
    let last = lhs.len().wrapping_sub(1);
    let mut acc = [Distance::MAX; VECTOR_LANES];

    for (i, (a, b)) in enumerate(zip(lhs, rhs)) {
        for lane in 0..VECTOR_LANES {
            let valid = i != last || !tail.is_partial() || tail.lanes().0[lane] != 0;
            if valid {
                acc[lane] = min(acc[lane], a.0[lane].wrapping_add(b.0[lane]));
            }
        }
    }

    acc.iter().copied().min().unwrap_or(Distance::MAX)
}
