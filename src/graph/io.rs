use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::prelude::*;
use crate::types::{Distance, DistanceMatrix};

/// Reads a square matrix written as one line of space-separated integers per row. Blank lines
/// are skipped.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<DistanceMatrix> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("could not open input file {:?}", path))?;

    let mut rows: Vec<Vec<Distance>> = vec![];

    for (index, line) in enumerate(BufReader::new(file).lines()) {
        let lineno = index + 1;
        let line = line.with_context(|| format!("failed to read {:?}", path))?;

        if line.trim().is_empty() {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<Distance>().with_context(|| {
                    format!("{}:{}: invalid entry {:?}", path.display(), lineno, token)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                bail!(
                    "{}:{}: expected {} entries, found {}",
                    path.display(),
                    lineno,
                    first.len(),
                    row.len()
                );
            }
        }

        rows.push(row);
    }

    DistanceMatrix::from_rows(&rows)
        .with_context(|| format!("{}: matrix is not square", path.display()))
}

/// Inverse of [`read_matrix`].
pub fn write_matrix(path: impl AsRef<Path>, matrix: &DistanceMatrix) -> Result {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("could not open output file {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for i in 0..matrix.size() {
        let row = (0..matrix.size()).map(|j| matrix.get(i, j)).join(" ");
        writeln!(writer, "{}", row).with_context(|| format!("failed to write {:?}", path))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {:?}", path))?;

    Ok(())
}
