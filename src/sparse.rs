use crate::Real;
use crate::error::EngineError;

/// One row of a [`SparseRowMatrix`]: column indices kept sorted ascending,
/// values stored in the matching slot.
#[derive(Clone, Debug, Default)]
struct SparseRow {
    cols: Vec<usize>,
    values: Vec<Real>,
}

impl SparseRow {
    fn get(&self, col: usize) -> Option<Real> {
        self.cols.binary_search(&col).ok().map(|slot| self.values[slot])
    }

    fn set(&mut self, col: usize, value: Real) {
        match self.cols.binary_search(&col) {
            Ok(slot) => self.values[slot] = value,
            Err(slot) => {
                self.cols.insert(slot, col);
                self.values.insert(slot, value);
            }
        }
    }

    #[inline]
    fn dot(&self, vector: &[Real]) -> Real {
        self.cols
            .iter()
            .zip(&self.values)
            .map(|(&c, &v)| v * vector[c])
            .sum()
    }
}

/// Rectangular sparse matrix with row-compressed storage.
#[derive(Clone, Debug)]
pub struct SparseRowMatrix {
    rows: Vec<SparseRow>,
    cols: usize,
}

impl SparseRowMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![SparseRow::default(); rows],
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.cols.len()).sum()
    }

    /// Stored value at `(row, col)`, or 0 when nothing was set there.
    pub fn get(&self, row: usize, col: usize) -> Real {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(0.0)
    }

    /// Insert or overwrite `(row, col)`.
    ///
    /// Panics if `row` or `col` is outside the matrix shape.
    pub fn set(&mut self, row: usize, col: usize, value: Real) {
        assert!(
            row < self.rows.len() && col < self.cols,
            "sparse index ({row}, {col}) outside {}x{} matrix",
            self.rows.len(),
            self.cols
        );
        self.rows[row].set(col, value);
    }

    /// Dense matrix-vector product `M v`.
    pub fn multiply(&self, vector: &[Real]) -> Result<Vec<Real>, EngineError> {
        self.check_len(vector.len())?;
        Ok(self.rows.iter().map(|r| r.dot(vector)).collect())
    }

    /// `q · (M q)` for a square matrix.
    pub fn quadratic_form(&self, q: &[Real]) -> Result<Real, EngineError> {
        self.check_len(q.len())?;
        if q.len() != self.rows.len() {
            return Err(EngineError::DimensionMismatch {
                expected: self.rows.len(),
                actual: q.len(),
            });
        }
        Ok(self.quadratic_form_unchecked(q))
    }

    /// Same as [`quadratic_form`](Self::quadratic_form) for callers that
    /// already guarantee `q.len() == rows == cols`.
    #[inline]
    pub(crate) fn quadratic_form_unchecked(&self, q: &[Real]) -> Real {
        self.rows
            .iter()
            .zip(q)
            .filter(|(r, _)| !r.cols.is_empty())
            .map(|(r, &qr)| qr * r.dot(q))
            .sum()
    }

    /// Sum of all stored entries in `row`, 0 for a row outside the matrix.
    pub fn row_sum(&self, row: usize) -> Real {
        self.rows.get(row).map_or(0.0, |r| r.values.iter().sum())
    }

    /// Sum of stored entries in `row` whose column is set in `mask`.
    pub fn row_sum_masked(&self, row: usize, mask: &[bool]) -> Real {
        self.rows.get(row).map_or(0.0, |r| {
            r.cols
                .iter()
                .zip(&r.values)
                .filter(|(c, _)| mask.get(**c).copied().unwrap_or(false))
                .map(|(_, v)| *v)
                .sum()
        })
    }

    /// Divide every stored entry by the largest stored value.
    /// No-op when the matrix is empty or its maximum is zero.
    pub fn normalize(&mut self) {
        let max = self
            .rows
            .iter()
            .flat_map(|r| r.values.iter().copied())
            .fold(None, |acc: Option<Real>, v| Some(acc.map_or(v, |m| m.max(v))));
        let Some(max) = max else { return };
        if max == 0.0 {
            return;
        }
        for r in &mut self.rows {
            for v in &mut r.values {
                *v /= max;
            }
        }
    }

    fn check_len(&self, len: usize) -> Result<(), EngineError> {
        if len == self.cols {
            Ok(())
        } else {
            Err(EngineError::DimensionMismatch {
                expected: self.cols,
                actual: len,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unset_is_zero() {
        let m = SparseRowMatrix::new(3, 4);
        for r in 0..3 {
            for c in 0..4 {
                assert_eq!(m.get(r, c), 0.0);
            }
        }
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn test_last_set_wins() {
        let mut m = SparseRowMatrix::new(4, 4);
        m.set(1, 2, 3.0);
        m.set(1, 0, -1.0);
        m.set(1, 2, 7.5);
        m.set(3, 3, 2.0);
        assert_eq!(m.get(1, 2), 7.5);
        assert_eq!(m.get(1, 0), -1.0);
        assert_eq!(m.get(3, 3), 2.0);
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn test_insert_keeps_columns_sorted() {
        let mut m = SparseRowMatrix::new(1, 10);
        for &c in &[7, 2, 9, 0, 5, 3] {
            m.set(0, c, c as Real);
        }
        let cols = &m.rows[0].cols;
        assert!(cols.windows(2).all(|w| w[0] < w[1]), "columns not sorted: {:?}", cols);
        for &c in &[7, 2, 9, 0, 5, 3] {
            assert_eq!(m.get(0, c), c as Real);
        }
    }

    #[test]
    fn test_multiply_single_row() {
        let mut m = SparseRowMatrix::new(4, 4);
        m.set(0, 3, 1.0);
        m.set(1, 3, -2.0);
        m.set(2, 3, 3.0);
        m.set(3, 3, -4.0);
        let out = m.multiply(&[10.0, 10.0, 10.0, 10.0]).unwrap();
        assert_eq!(out, vec![10.0, -20.0, 30.0, -40.0]);
    }

    #[test]
    fn test_multiply_zero_rows_gives_zero() {
        let m = SparseRowMatrix::new(3, 3);
        let out = m.multiply(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(out, vec![0.0; 3]);
    }

    #[test]
    fn test_multiply_wrong_length_fails() {
        let m = SparseRowMatrix::new(3, 3);
        let err = m.multiply(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, EngineError::DimensionMismatch { expected: 3, actual: 2 });
    }

    #[test]
    fn test_quadratic_form_matches_multiply() {
        let mut m = SparseRowMatrix::new(3, 3);
        m.set(0, 1, 2.0);
        m.set(1, 0, -0.5);
        m.set(2, 2, 4.0);
        let q = [1.0, 2.0, 3.0];
        let mq = m.multiply(&q).unwrap();
        let expected: Real = q.iter().zip(&mq).map(|(a, b)| a * b).sum();
        let got = m.quadratic_form(&q).unwrap();
        assert!((got - expected).abs() < 1e-12);
        assert!(m.quadratic_form(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_row_sums() {
        let mut m = SparseRowMatrix::new(2, 4);
        m.set(0, 0, 1.0);
        m.set(0, 2, 2.0);
        m.set(0, 3, 4.0);
        assert_eq!(m.row_sum(0), 7.0);
        assert_eq!(m.row_sum(1), 0.0);
        let mask = [true, false, false, true];
        assert_eq!(m.row_sum_masked(0, &mask), 5.0);
        assert_eq!(m.row_sum_masked(1, &mask), 0.0);
    }

    #[test]
    fn test_row_sums_out_of_range() {
        let mut m = SparseRowMatrix::new(2, 2);
        m.set(1, 1, 3.0);
        assert_eq!(m.row_sum(2), 0.0);
        assert_eq!(m.row_sum_masked(5, &[true, true]), 0.0);
        assert_eq!(m.get(2, 0), 0.0);
    }

    #[test]
    fn test_normalize_divides_by_max() {
        let mut m = SparseRowMatrix::new(2, 2);
        m.set(0, 0, 2.0);
        m.set(1, 1, -8.0);
        m.set(0, 1, 4.0);
        m.normalize();
        assert_eq!(m.get(0, 0), 0.5);
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(1, 1), -2.0);
    }

    #[test]
    fn test_normalize_empty_is_noop() {
        let mut m = SparseRowMatrix::new(2, 2);
        m.normalize();
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.get(1, 1), 0.0);
    }
}
