//! Physical layout of distance matrices: column-major storage where every column is padded to
//! a whole number of vector blocks.
//!
//! All buffers are `Vec<Lanes>`, so the allocator hands out memory aligned to the vector width
//! and every column starts at an aligned offset. The kernels in `minplus-memops` rely on this
//! to use aligned vector loads and stores without a scalar remainder loop.
use crate::matrix::{Distance, DistanceMatrix};
use crate::prelude::*;
use std::mem::size_of;
use std::slice;

/// Number of distances in one vector (a 256-bit vector of 32-bit integers).
pub const VECTOR_LANES: usize = 8;

/// Size of one vector in bytes, which is also the alignment of every buffer.
pub const VECTOR_BYTES: usize = VECTOR_LANES * size_of::<Distance>();

/// One vector worth of consecutive rows of a single column.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[repr(C, align(32))]
pub struct Lanes(pub [Distance; VECTOR_LANES]);

const _: () = assert!(size_of::<Lanes>() == VECTOR_BYTES);

impl Lanes {
    #[inline(always)]
    pub const fn splat(value: Distance) -> Self {
        Self([value; VECTOR_LANES])
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("matrix of {rows} rows and {ncols} columns is not square")]
    NotSquare { rows: usize, ncols: usize },

    #[error("expected a {expected}x{expected} matrix, found {found}x{found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("buffer holds {found} blocks, expected {expected}")]
    SizeMismatch { expected: usize, found: usize },
}

/// Number of vector blocks needed to hold `rows` entries.
#[inline(always)]
pub fn blocks_for(rows: usize) -> usize {
    rows.div_ceil(VECTOR_LANES)
}

/// `rows` rounded up to the next multiple of [`VECTOR_LANES`].
#[inline(always)]
pub fn padded_len(rows: usize) -> usize {
    blocks_for(rows) * VECTOR_LANES
}

/// Views a slice of blocks as the flat sequence of distances it contains.
#[inline(always)]
pub fn flatten(blocks: &[Lanes]) -> &[Distance] {
    // SAFETY: `Lanes` is a `repr(C)` wrapper around `[Distance; VECTOR_LANES]` and has no
    // padding (asserted above), so `len` blocks are exactly `len * VECTOR_LANES` distances.
    unsafe { slice::from_raw_parts(blocks.as_ptr() as *const Distance, blocks.len() * VECTOR_LANES) }
}

#[inline(always)]
pub fn flatten_mut(blocks: &mut [Lanes]) -> &mut [Distance] {
    // SAFETY: see `flatten`.
    unsafe {
        slice::from_raw_parts_mut(
            blocks.as_mut_ptr() as *mut Distance,
            blocks.len() * VECTOR_LANES,
        )
    }
}

/// Describes which lanes of a padded column hold real rows.
///
/// Only the first [`TailMask::blocks`] blocks of a column contain real rows. Of those, only the
/// last one may be partial, in which case [`TailMask::lanes`] is `-1` on the valid lanes and `0`
/// on the padding lanes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TailMask {
    rows: usize,
    blocks: usize,
    lanes: Lanes,
}

impl TailMask {
    pub fn new(rows: usize) -> Self {
        let blocks = blocks_for(rows);
        let valid = rows - blocks.saturating_sub(1) * VECTOR_LANES;

        let mut lanes = Lanes::splat(0);
        for (lane, value) in enumerate(&mut lanes.0) {
            if lane < valid {
                *value = -1;
            }
        }

        Self {
            rows,
            blocks,
            lanes,
        }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// True if the last block holding real rows also holds padding.
    #[inline(always)]
    pub fn is_partial(&self) -> bool {
        self.rows % VECTOR_LANES != 0
    }

    #[inline(always)]
    pub fn lanes(&self) -> &Lanes {
        &self.lanes
    }
}

/// Column-major matrix whose columns are padded to a multiple of [`VECTOR_LANES`] entries.
///
/// The padding rows hold filler that carries no meaning: it is zero after construction, may
/// become garbage during computation, and is never copied back into a [`DistanceMatrix`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PaddedMatrix {
    rows: usize,
    ncols: usize,
    blocks_per_column: usize,
    data: Vec<Lanes>,
}

impl PaddedMatrix {
    pub fn new(rows: usize, ncols: usize) -> Self {
        Self::with_stride(rows, ncols, rows)
    }

    /// Allocates a matrix with at least `min_stride` entries per column (rounded up to whole
    /// vector blocks).
    pub fn with_stride(rows: usize, ncols: usize, min_stride: usize) -> Self {
        let blocks_per_column = blocks_for(max(rows, min_stride));

        Self {
            rows,
            ncols,
            blocks_per_column,
            data: vec![Lanes::default(); blocks_per_column * ncols],
        }
    }

    pub fn from_blocks(
        rows: usize,
        ncols: usize,
        blocks_per_column: usize,
        data: Vec<Lanes>,
    ) -> Result<Self, LayoutError> {
        if blocks_per_column < blocks_for(rows) || data.len() != blocks_per_column * ncols {
            return Err(LayoutError::SizeMismatch {
                expected: blocks_for(rows) * ncols,
                found: data.len(),
            });
        }

        Ok(Self {
            rows,
            ncols,
            blocks_per_column,
            data,
        })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline(always)]
    pub fn blocks_per_column(&self) -> usize {
        self.blocks_per_column
    }

    /// Physical number of entries per column, padding included.
    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.blocks_per_column * VECTOR_LANES
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> Distance {
        self.as_flat()[j * self.stride() + i]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, value: Distance) {
        let stride = self.stride();
        self.as_flat_mut()[j * stride + i] = value;
    }

    pub fn column(&self, j: usize) -> &[Lanes] {
        let n = self.blocks_per_column;
        &self.data[j * n..(j + 1) * n]
    }

    pub fn column_mut(&mut self, j: usize) -> &mut [Lanes] {
        let n = self.blocks_per_column;
        &mut self.data[j * n..(j + 1) * n]
    }

    pub fn blocks(&self) -> &[Lanes] {
        &self.data
    }

    pub fn blocks_mut(&mut self) -> &mut [Lanes] {
        &mut self.data
    }

    pub fn into_blocks(self) -> Vec<Lanes> {
        self.data
    }

    pub fn as_flat(&self) -> &[Distance] {
        flatten(&self.data)
    }

    pub fn as_flat_mut(&mut self) -> &mut [Distance] {
        flatten_mut(&mut self.data)
    }

    /// Overwrites every padding cell with `value`.
    pub fn fill_padding(&mut self, value: Distance) {
        let (rows, stride) = (self.rows, self.stride());
        for column in self.as_flat_mut().chunks_exact_mut(stride) {
            for cell in &mut column[rows..] {
                *cell = value;
            }
        }
    }

    /// Returns the transpose, padded to the same vector width. Padding cells of the result are
    /// zero.
    pub fn transpose(&self) -> Self {
        let mut result = Self::new(self.ncols, self.rows);
        for j in 0..self.ncols {
            for i in 0..self.rows {
                result.set(j, i, self.get(i, j));
            }
        }

        result
    }
}

/// Copies a logical matrix into a freshly allocated padded matrix.
pub fn pack(logical: &DistanceMatrix) -> PaddedMatrix {
    let n = logical.size();
    let mut padded = PaddedMatrix::new(n, n);

    // Dimensions match by construction.
    let _ = pack_into(logical, &mut padded);
    padded
}

/// Copies every logical column into the front of the corresponding padded column. The padding
/// rows of `padded` are left untouched.
pub fn pack_into(logical: &DistanceMatrix, padded: &mut PaddedMatrix) -> Result<(), LayoutError> {
    let n = logical.size();
    if padded.rows() != padded.ncols() {
        return Err(LayoutError::NotSquare {
            rows: padded.rows(),
            ncols: padded.ncols(),
        });
    }

    if padded.rows() != n {
        return Err(LayoutError::DimensionMismatch {
            expected: n,
            found: padded.rows(),
        });
    }

    for j in 0..n {
        flatten_mut(padded.column_mut(j))[..n].copy_from_slice(logical.column(j));
    }

    Ok(())
}

/// Drops the padding rows of a square padded matrix.
pub fn unpack(padded: &PaddedMatrix) -> Result<DistanceMatrix, LayoutError> {
    let n = padded.rows();
    if n != padded.ncols() {
        return Err(LayoutError::NotSquare {
            rows: n,
            ncols: padded.ncols(),
        });
    }

    let mut data = Vec::with_capacity(n * n);
    for j in 0..n {
        data.extend_from_slice(&flatten(padded.column(j))[..n]);
    }

    DistanceMatrix::from_column_major(n, data).map_err(|_| LayoutError::SizeMismatch {
        expected: n * n,
        found: padded.blocks().len(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample(n: usize) -> DistanceMatrix {
        DistanceMatrix::from_fn(n, |i, j| (i * 31 + j * 7) as Distance % 101)
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 8);
        assert_eq!(padded_len(8), 8);
        assert_eq!(padded_len(9), 16);
        assert_eq!(blocks_for(17), 3);
    }

    #[test]
    fn test_pack_unpack() {
        for &n in &[0, 1, 5, 8, 10, 16, 17, 33] {
            let logical = sample(n);

            let padded = pack(&logical);
            assert_eq!(padded.stride(), padded_len(n));
            assert_eq!(unpack(&padded).unwrap(), logical);

            for &extra in &[0, 1, 8, 13] {
                let mut padded = PaddedMatrix::with_stride(n, n, n + extra);
                padded.fill_padding(-12345);
                pack_into(&logical, &mut padded).unwrap();

                assert!(padded.stride() >= n + extra);
                assert_eq!(padded.stride() % VECTOR_LANES, 0);
                assert_eq!(unpack(&padded).unwrap(), logical);

                // Filler stays where it was.
                if padded.stride() > n {
                    assert_eq!(padded.get(n, 0), -12345);
                }
            }
        }
    }

    #[test]
    fn test_pack_without_padding() {
        let logical = sample(16);
        let padded = pack(&logical);
        assert_eq!(padded.as_flat(), logical.as_slice());
    }

    #[test]
    fn test_pack_errors() {
        let logical = sample(4);
        let mut wrong = PaddedMatrix::new(5, 5);
        assert_eq!(
            pack_into(&logical, &mut wrong),
            Err(LayoutError::DimensionMismatch {
                expected: 4,
                found: 5
            })
        );

        let stripe = PaddedMatrix::new(4, 2);
        assert_eq!(
            unpack(&stripe),
            Err(LayoutError::NotSquare { rows: 4, ncols: 2 })
        );
    }

    #[test]
    fn test_alignment() {
        let padded = PaddedMatrix::new(13, 5);
        for j in 0..padded.ncols() {
            let ptr = padded.column(j).as_ptr() as usize;
            assert_eq!(ptr % VECTOR_BYTES, 0, "column {} is not aligned", j);
        }
    }

    #[test]
    fn test_tail_mask() {
        let mask = TailMask::new(10);
        assert_eq!(mask.blocks(), 2);
        assert!(mask.is_partial());
        assert_eq!(mask.lanes().0, [-1, -1, 0, 0, 0, 0, 0, 0]);

        let mask = TailMask::new(16);
        assert_eq!(mask.blocks(), 2);
        assert!(!mask.is_partial());
        assert_eq!(mask.lanes().0, [-1; VECTOR_LANES]);

        let mask = TailMask::new(0);
        assert_eq!(mask.blocks(), 0);
    }

    #[test]
    fn test_transpose() {
        let logical = sample(11);
        let padded = pack(&logical);
        let transposed = padded.transpose();

        for i in 0..11 {
            for j in 0..11 {
                assert_eq!(transposed.get(j, i), logical.get(i, j));
            }
        }
    }
}
