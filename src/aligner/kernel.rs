//! Column-wise computation of the DP matrix.
//!
//! Both kernels are generic over the symbol type (bytes, or vectors of symbol ranks for batches),
//! the score type, the trace policy and the optimum tracker, so the same loops serve every
//! aligner variant. The first sequence runs along the columns, the second along the rows.

use crate::aligner::matrix::{DpMatrix, MatrixCoordinate, TracePolicy};
use crate::aligner::optimum::OptimumTracking;
use crate::aligner::recursion::{AffineCell, AffineRecursion};
use crate::aligner::score::DpScore;

/// Fill the full matrix. `matrix` has to be allocated for the unbanded geometry of the two
/// sequences.
pub fn compute_unbanded<A, V, P, T, F>(
    seq1: &[A],
    seq2: &[A],
    recursion: &AffineRecursion<V>,
    matrix: &mut DpMatrix<V, P>,
    tracker: &mut T,
    substitution: F,
)
where
    V: DpScore,
    P: TracePolicy<V>,
    T: OptimumTracking<V>,
    F: Fn(&A, &A) -> V,
{
    {
        let (cells, trace) = matrix.parts_mut();

        let origin = trace.origin(recursion);
        cells[0] = origin;
        tracker.track(origin.best, MatrixCoordinate::new(0, 0));

        for row in 1..=seq2.len() {
            let coordinate = MatrixCoordinate::new(0, row);
            let cell = trace.first_column(recursion, &cells[row - 1], coordinate);

            cells[row] = cell;
            tracker.track(cell.best, coordinate);
        }
    }

    for (j, symbol1) in seq1.iter().enumerate() {
        matrix.advance_column();

        let column = j + 1;
        let (cells, trace) = matrix.parts_mut();

        let mut diagonal = cells[0].best;
        let coordinate = MatrixCoordinate::new(column, 0);
        let cell = trace.first_row(recursion, &cells[0], coordinate);
        cells[0] = cell;
        tracker.track(cell.best, coordinate);

        for (i, symbol2) in seq2.iter().enumerate() {
            let row = i + 1;
            let coordinate = MatrixCoordinate::new(column, row);

            // cells[row] still holds the left neighbour, cells[row - 1] the cell above
            let left = cells[row];
            let previous = AffineCell {
                best: left.best,
                horizontal: left.horizontal,
                vertical: cells[row - 1].vertical,
            };

            let cell = trace.inner(recursion, diagonal, &previous, substitution(symbol1, symbol2), coordinate);
            cells[row] = cell;
            tracker.track(cell.best, coordinate);

            diagonal = left.best;
        }
    }
}

/// Fill the cells of a diagonal band. Cells of a column are stored by their band offset, which
/// makes the diagonal predecessor share the offset of the cell being computed and the left
/// neighbour sit at the next offset.
///
/// Cells just outside the band read `lowest`, except for free first rows and columns, where the
/// band may start away from the origin.
pub fn compute_banded<A, V, P, T, F>(
    seq1: &[A],
    seq2: &[A],
    recursion: &AffineRecursion<V>,
    matrix: &mut DpMatrix<V, P>,
    tracker: &mut T,
    lowest: V,
    substitution: F,
)
where
    V: DpScore,
    P: TracePolicy<V>,
    T: OptimumTracking<V>,
    F: Fn(&A, &A) -> V,
{
    let geometry = *matrix.geometry();
    let height = geometry.height();
    let Some(last_column) = geometry.last_column() else {
        return;
    };

    let zero = V::zero_score();
    let virtual_above = if recursion.first_column_free() {
        AffineCell { best: zero, horizontal: lowest, vertical: zero }
    } else {
        AffineCell::uniform(lowest)
    };

    let virtual_left = if recursion.first_row_free() {
        AffineCell { best: zero, horizontal: zero, vertical: lowest }
    } else {
        AffineCell::uniform(lowest)
    };

    for column in 0..=last_column {
        if column > 0 {
            matrix.advance_column();
        }

        let Some(rows) = geometry.row_range(column) else {
            continue;
        };

        let (cells, trace) = matrix.parts_mut();
        let first_row = *rows.start();

        for row in rows {
            let offset = (row as isize + geometry.upper_diagonal() - column as isize) as usize;
            let coordinate = MatrixCoordinate::new(column, row);
            let left_in_band = offset + 1 < height;

            let cell = if column == 0 {
                if row == 0 {
                    trace.origin(recursion)
                } else {
                    let above = if row == first_row { virtual_above } else { cells[offset - 1] };
                    trace.first_column(recursion, &above, coordinate)
                }
            } else if row == 0 {
                let left = if left_in_band { cells[offset + 1] } else { virtual_left };
                trace.first_row(recursion, &left, coordinate)
            } else {
                let previous = AffineCell {
                    best: cells[offset].best,
                    horizontal: if left_in_band { cells[offset + 1].horizontal } else { lowest },
                    vertical: if row == first_row { lowest } else { cells[offset - 1].vertical },
                };

                let substitution = substitution(&seq1[column - 1], &seq2[row - 1]);
                trace.inner(recursion, cells[offset].best, &previous, substitution, coordinate)
            };

            cells[offset] = cell;
            tracker.track(cell.best, coordinate);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aligner::config::{AlignmentMethod, Band};
    use crate::aligner::matrix::{BandGeometry, DpMatrix, MatrixCoordinate, NoTrace};
    use crate::aligner::optimum::{OptimumTracker, TrackingPolicy};
    use crate::aligner::recursion::AffineRecursion;
    use super::{compute_banded, compute_unbanded};

    fn unit(a: &u8, b: &u8) -> i32 {
        if a == b { 0 } else { -1 }
    }

    fn global_unbanded(seq1: &[u8], seq2: &[u8], recursion: &AffineRecursion<i32>) -> (i32, DpMatrix<i32, NoTrace>) {
        let mut matrix = DpMatrix::new(NoTrace);
        matrix.allocate(BandGeometry::unbanded(seq1.len(), seq2.len()), false, i32::MIN / 2).unwrap();

        let policy = TrackingPolicy::from_method(&AlignmentMethod::global());
        let mut tracker = OptimumTracker::new(policy, seq1.len(), seq2.len());
        compute_unbanded(seq1, seq2, recursion, &mut matrix, &mut tracker, unit);

        (tracker.optimum().score, matrix)
    }

    #[test]
    fn test_unbanded_edit_distance() {
        let recursion = AffineRecursion::new(-1, -1, false, false, false);

        let (score, matrix) = global_unbanded(b"ACGT", b"AGT", &recursion);
        assert_eq!(score, -1);

        // The last column holds the distances of every prefix of the second sequence to ACGT
        let last: Vec<(i32, MatrixCoordinate)> = matrix.current_column()
            .map(|(cell, coordinate)| (cell.best, coordinate))
            .collect();

        assert_eq!(last.len(), 4);
        assert_eq!(last[0], (-4, MatrixCoordinate::new(4, 0)));
        assert_eq!(last[3], (-1, MatrixCoordinate::new(4, 3)));

        let (score, _) = global_unbanded(b"", b"ACG", &recursion);
        assert_eq!(score, -3);
    }

    #[test]
    fn test_affine_gap() {
        // One gap of length 2 beats two mismatches
        let recursion = AffineRecursion::new(-6, -1, false, false, false);
        let (score, _) = global_unbanded(b"AACCTT", b"AATT", &recursion);
        assert_eq!(score, -7);
    }

    #[test]
    fn test_wide_band_equals_unbanded() {
        let recursion = AffineRecursion::new(-3, -1, false, false, false);
        let seq1 = b"GATTACAGATTACA";
        let seq2 = b"GATACAGTTAC";

        let (expected, _) = global_unbanded(seq1, seq2, &recursion);

        let band = Band::new(-(seq2.len() as isize), seq1.len() as isize);
        let mut matrix = DpMatrix::new(NoTrace);
        let lowest = i32::MIN / 2;
        matrix.allocate(BandGeometry::banded(&band, seq1.len(), seq2.len()), true, lowest).unwrap();

        let policy = TrackingPolicy::from_method(&AlignmentMethod::global());
        let mut tracker = OptimumTracker::new(policy, seq1.len(), seq2.len());
        compute_banded(seq1, seq2, &recursion, &mut matrix, &mut tracker, lowest, unit);

        assert_eq!(tracker.optimum().score, expected);
        assert_eq!(tracker.optimum().coordinate, MatrixCoordinate::new(seq1.len(), seq2.len()));
    }

    #[test]
    fn test_narrow_band() {
        let recursion = AffineRecursion::new(-1, -1, false, false, false);
        let lowest = i32::MIN / 2;

        // A band of width one forces the main diagonal, all mismatches
        let band = Band::new(0, 0);
        let mut matrix = DpMatrix::new(NoTrace);
        matrix.allocate(BandGeometry::banded(&band, 4, 4), true, lowest).unwrap();

        let policy = TrackingPolicy::from_method(&AlignmentMethod::global());
        let mut tracker = OptimumTracker::new(policy, 4, 4);
        compute_banded(b"ACGT", b"CGTA", &recursion, &mut matrix, &mut tracker, lowest, unit);

        assert_eq!(tracker.optimum().score, -4);

        // The unbanded alignment only needs two gaps
        let (score, _) = global_unbanded(b"ACGT", b"CGTA", &recursion);
        assert_eq!(score, -2);
    }
}
