use crate::prelude::*;
use std::fmt::{self, Debug};

/// Length of a path in an unweighted graph, or the sentinel [`infinity`].
pub type Distance = i32;

/// Sentinel used for "no path" in an `n`-node graph.
///
/// No shortest path in an unweighted graph with `n` nodes uses more than `n - 1` edges, so
/// `n + 1` is larger than any real distance and two sentinels added together never wrap.
#[inline(always)]
pub const fn infinity(n: usize) -> Distance {
    n as Distance + 1
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("expected {expected} entries for a square matrix, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

/// Dense `n`×`n` matrix stored column-major: entry `(i, j)` lives at `j * n + i`.
#[derive(Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<Distance>,
}

impl DistanceMatrix {
    /// All-zero matrix, i.e. the adjacency matrix of a graph without edges.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0; n * n],
        }
    }

    pub fn from_fn<F>(n: usize, mut fun: F) -> Self
    where
        F: FnMut(usize, usize) -> Distance,
    {
        let mut data = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                data.push(fun(i, j));
            }
        }

        Self { n, data }
    }

    pub fn from_column_major(n: usize, data: Vec<Distance>) -> Result<Self, MatrixError> {
        if data.len() != n * n {
            return Err(MatrixError::SizeMismatch {
                expected: n * n,
                found: data.len(),
            });
        }

        Ok(Self { n, data })
    }

    /// Builds a matrix from rows, as they appear in text form.
    pub fn from_rows(rows: &[Vec<Distance>]) -> Result<Self, MatrixError> {
        let n = rows.len();
        for row in rows {
            if row.len() != n {
                return Err(MatrixError::SizeMismatch {
                    expected: n,
                    found: row.len(),
                });
            }
        }

        Ok(Self::from_fn(n, |i, j| rows[i][j]))
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> Distance {
        self.data[j * self.n + i]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, value: Distance) {
        self.data[j * self.n + i] = value;
    }

    pub fn column(&self, j: usize) -> &[Distance] {
        &self.data[j * self.n..(j + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[Distance] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<Distance> {
        self.data
    }

    pub fn infinity(&self) -> Distance {
        infinity(self.n)
    }

    /// Converts an adjacency matrix (zero for no edge) into the initial distance matrix:
    /// every zero becomes [`infinity`] and the diagonal becomes zero.
    pub fn infinitize(&mut self) {
        let inf = self.infinity();
        for value in &mut self.data {
            if *value == 0 {
                *value = inf;
            }
        }

        for i in 0..self.n {
            self.set(i, i, 0);
        }
    }

    /// Inverse of [`DistanceMatrix::infinitize`] for the output: unreachable pairs become zero.
    pub fn deinfinitize(&mut self) {
        let inf = self.infinity();
        for value in &mut self.data {
            if *value == inf {
                *value = 0;
            }
        }
    }

    /// Returns the `size`×`size` top-left block.
    pub fn truncate(&self, size: usize) -> Self {
        assert!(size <= self.n);
        Self::from_fn(size, |i, j| self.get(i, j))
    }
}

impl Debug for DistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DistanceMatrix({}x{})", self.n, self.n)?;
        for i in 0..self.n {
            let row = (0..self.n).map(|j| self.get(i, j)).join(" ");
            writeln!(f, "  {}", row)?;
        }

        Ok(())
    }
}
