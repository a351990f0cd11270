use minplus_core::{Distance, Lanes, TailMask};
use std::arch::x86_64::*;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load(lanes: &Lanes) -> __m256i {
    _mm256_load_si256(lanes as *const Lanes as *const __m256i)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn store(lanes: &mut Lanes, value: __m256i) {
    _mm256_store_si256(lanes as *mut Lanes as *mut __m256i, value)
}

/// # Safety
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn relax(
    column: &mut [Lanes],
    pivot: &[Lanes],
    weight: Distance,
    tail: &TailMask,
) -> bool {
    let last = column.len().wrapping_sub(1);
    let weight = _mm256_set1_epi32(weight);
    let valid = load(tail.lanes());
    let mut changed = false;

    for (i, (current, pivot)) in column.iter_mut().zip(pivot).enumerate() {
        let lij = load(current);
        let sum = _mm256_add_epi32(load(pivot), weight);

        // All ones on lanes where the path through the pivot is shorter.
        let mut mask = _mm256_cmpgt_epi32(lij, sum);

        if i == last && tail.is_partial() {
            mask = _mm256_and_si256(mask, valid);
        }

        if _mm256_testz_si256(mask, mask) == 0 {
            changed = true;
        }

        let taken = _mm256_and_si256(mask, sum);
        let kept = _mm256_andnot_si256(mask, lij);
        store(current, _mm256_add_epi32(taken, kept));
    }

    changed
}

/// # Safety
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn min_plus_dot(lhs: &[Lanes], rhs: &[Lanes], tail: &TailMask) -> Distance {
    let last = lhs.len().wrapping_sub(1);
    let infinity = _mm256_set1_epi32(Distance::MAX);
    let valid = load(tail.lanes());
    let mut acc = infinity;

    for (i, (a, b)) in lhs.iter().zip(rhs).enumerate() {
        let mut sum = _mm256_add_epi32(load(a), load(b));

        if i == last && tail.is_partial() {
            sum = _mm256_blendv_epi8(infinity, sum, valid);
        }

        acc = _mm256_min_epi32(acc, sum);
    }

    let mut out = Lanes::default();
    store(&mut out, acc);
    out.0.iter().copied().min().unwrap_or(Distance::MAX)
}
