use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Integral edge capacity / flow quantity.
pub type Capacity = i64;

/// Sentinel for an edge with no practical capacity limit.
///
/// It is finite so that residual arithmetic stays well defined; every
/// population-derived capacity in a network is far below it.
pub const UNBOUNDED: Capacity = Capacity::MAX;

/// Errors arising from malformed matrix input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
}

/// A dense square matrix indexed by network node position.
///
/// Used for capacities, costs, flows and unused flow alike. Serializes
/// as a list of rows so exported matrices keep the node order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Capacity>>", try_from = "Vec<Vec<Capacity>>")]
pub struct Matrix {
    size: usize,
    cells: Vec<Capacity>,
}

impl Matrix {
    /// An all-zero `size × size` matrix.
    pub fn zeros(size: usize) -> Self {
        Self::filled(size, 0)
    }

    /// A `size × size` matrix with every entry set to `value`.
    pub fn filled(size: usize, value: Capacity) -> Self {
        Self {
            size,
            cells: vec![value; size * size],
        }
    }

    /// Build a matrix from rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<Capacity>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(MatrixError::NotSquare {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            cells.extend(values);
        }
        Ok(Self { size, cells })
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Capacity {
        self.cells[self.offset(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Capacity) {
        let offset = self.offset(row, col);
        self.cells[offset] = value;
    }

    pub fn row(&self, row: usize) -> &[Capacity] {
        let start = self.offset(row, 0);
        &self.cells[start..start + self.size]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = Capacity> + '_ {
        assert!(col < self.size, "column {} out of range {}", col, self.size);
        self.cells.iter().skip(col).step_by(self.size.max(1)).copied()
    }

    /// Every entry as `(row, col, value)`, row-major.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, Capacity)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / size, i % size, v))
    }

    /// Row sum, saturating at the numeric bounds.
    pub fn row_sum(&self, row: usize) -> Capacity {
        self.row(row).iter().fold(0, |acc: Capacity, &v| acc.saturating_add(v))
    }

    /// Column sum, saturating at the numeric bounds.
    pub fn column_sum(&self, col: usize) -> Capacity {
        self.column(col).fold(0, |acc: Capacity, v| acc.saturating_add(v))
    }

    /// Elementwise `self − other`.
    ///
    /// # Panics
    ///
    /// Panics if the matrices differ in size.
    pub fn difference(&self, other: &Matrix) -> Matrix {
        assert_eq!(
            self.size, other.size,
            "cannot subtract a {}x{} matrix from a {}x{} matrix",
            other.size, other.size, self.size, self.size
        );
        Matrix {
            size: self.size,
            cells: self
                .cells
                .iter()
                .zip(&other.cells)
                .map(|(a, b)| a - b)
                .collect(),
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<Capacity>> {
        (0..self.size).map(|r| self.row(r).to_vec()).collect()
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.size && col < self.size,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.size,
            self.size
        );
        row * self.size + col
    }
}

impl From<Matrix> for Vec<Vec<Capacity>> {
    fn from(matrix: Matrix) -> Self {
        matrix.to_rows()
    }
}

impl TryFrom<Vec<Vec<Capacity>>> for Matrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<Capacity>>) -> Result<Self, Self::Error> {
        Matrix::from_rows(rows)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            let row: Vec<String> = self.row(r).iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", row.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut m = Matrix::zeros(3);
        m.set(0, 2, 7);
        assert_eq!(m.get(0, 2), 7);
        assert_eq!(m.get(2, 0), 0);
        assert_eq!(m.size(), 3);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(vec![vec![0, 1], vec![2]]).unwrap_err();
        assert_eq!(
            err,
            MatrixError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn test_row_and_column_sums() {
        let m = Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]).unwrap();
        assert_eq!(m.row_sum(0), 6);
        assert_eq!(m.column_sum(2), 18);
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![2, 5, 8]);
    }

    #[test]
    fn test_sums_saturate_on_unbounded() {
        let m = Matrix::from_rows(vec![vec![UNBOUNDED, 5], vec![0, 0]]).unwrap();
        assert_eq!(m.row_sum(0), UNBOUNDED);
    }

    #[test]
    fn test_difference() {
        let a = Matrix::from_rows(vec![vec![5, 3], vec![0, 9]]).unwrap();
        let b = Matrix::from_rows(vec![vec![2, 3], vec![0, 4]]).unwrap();
        assert_eq!(a.difference(&b).to_rows(), vec![vec![3, 0], vec![0, 5]]);
    }

    #[test]
    fn test_serializes_as_rows() {
        let m = Matrix::from_rows(vec![vec![0, 1], vec![2, 3]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[0,1],[2,3]]");
        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_empty_matrix() {
        let m = Matrix::zeros(0);
        assert_eq!(m.entries().count(), 0);
        assert!(m.to_rows().is_empty());
    }
}
