use crate::aligner::alignment::AlignedSequences;
use crate::aligner::matrix::{MatrixCoordinate, TraceStorage};
use crate::aligner::trace::TraceDirections;

/// Result of walking the trace matrix back from an alignment end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Traceback {
    /// Cell where the alignment starts
    pub begin: MatrixCoordinate,
    pub alignment: AlignedSequences,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WalkState {
    Best,
    Vertical,
    Horizontal,
}

/// Reconstruct the alignment ending at `end`.
///
/// When several predecessors tie, the diagonal is preferred over a vertical gap, and a vertical
/// gap over a horizontal one. A gap run is followed until the cell whose trace records the gap
/// opening. The walk stops at the first cell without a predecessor: the origin, a free first row
/// or column cell, or, for local alignments, a cell where the score restarted at zero.
pub fn traceback<T>(trace: &T, seq1: &[u8], seq2: &[u8], end: MatrixCoordinate) -> Traceback
where
    T: TraceStorage + ?Sized
{
    let capacity = end.column + end.row;
    let mut first = Vec::with_capacity(capacity);
    let mut second = Vec::with_capacity(capacity);

    let (mut column, mut row) = (end.column, end.row);
    let mut state = WalkState::Best;

    loop {
        let directions = trace.trace_at(MatrixCoordinate::new(column, row));

        match state {
            WalkState::Best => {
                if directions.contains(TraceDirections::DIAGONAL) && column > 0 && row > 0 {
                    first.push(Some(seq1[column - 1]));
                    second.push(Some(seq2[row - 1]));
                    column -= 1;
                    row -= 1;
                } else if directions.contains(TraceDirections::UP) && row > 0 {
                    state = WalkState::Vertical;
                } else if directions.contains(TraceDirections::LEFT) && column > 0 {
                    state = WalkState::Horizontal;
                } else {
                    break;
                }
            },
            WalkState::Vertical => {
                if row == 0 {
                    break;
                }

                first.push(None);
                second.push(Some(seq2[row - 1]));

                if directions.contains(TraceDirections::CARRY_UP_OPEN) {
                    state = WalkState::Best;
                }

                row -= 1;
            },
            WalkState::Horizontal => {
                if column == 0 {
                    break;
                }

                first.push(Some(seq1[column - 1]));
                second.push(None);

                if directions.contains(TraceDirections::CARRY_LEFT_OPEN) {
                    state = WalkState::Best;
                }

                column -= 1;
            },
        }
    }

    first.reverse();
    second.reverse();

    Traceback {
        begin: MatrixCoordinate::new(column, row),
        alignment: AlignedSequences { first, second },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::aligner::matrix::{MatrixCoordinate, TraceStorage};
    use crate::aligner::trace::TraceDirections;
    use super::traceback;

    #[derive(Default)]
    struct SparseTrace(HashMap<(usize, usize), TraceDirections>);

    impl SparseTrace {
        fn with(mut self, column: usize, row: usize, directions: TraceDirections) -> Self {
            self.0.insert((column, row), directions);
            self
        }
    }

    impl TraceStorage for SparseTrace {
        fn trace_at(&self, coordinate: MatrixCoordinate) -> TraceDirections {
            self.0.get(&(coordinate.column, coordinate.row)).copied().unwrap_or_default()
        }
    }

    #[test]
    fn test_diagonal_and_gap() {
        // ACGT vs AGT: A-A, C deleted, G-G, T-T
        let trace = SparseTrace::default()
            .with(4, 3, TraceDirections::DIAGONAL)
            .with(3, 2, TraceDirections::DIAGONAL)
            .with(2, 1, TraceDirections::LEFT_OPEN)
            .with(1, 1, TraceDirections::DIAGONAL)
            .with(0, 0, TraceDirections::NONE);

        let tb = traceback(&trace, b"ACGT", b"AGT", MatrixCoordinate::new(4, 3));

        assert_eq!(tb.begin, MatrixCoordinate::new(0, 0));
        assert_eq!(tb.alignment.first, vec![Some(b'A'), Some(b'C'), Some(b'G'), Some(b'T')]);
        assert_eq!(tb.alignment.second, vec![Some(b'A'), None, Some(b'G'), Some(b'T')]);
    }

    #[test]
    fn test_gap_run_until_open() {
        // Vertical gap of length 2 at the end, opened from (2, 1)
        let trace = SparseTrace::default()
            .with(2, 3, TraceDirections::UP)
            .with(2, 2, TraceDirections::CARRY_UP_OPEN)
            .with(2, 1, TraceDirections::DIAGONAL)
            .with(1, 0, TraceDirections::LEFT_OPEN);

        let tb = traceback(&trace, b"AC", b"CGG", MatrixCoordinate::new(2, 3));

        assert_eq!(tb.alignment.first, vec![Some(b'A'), Some(b'C'), None, None]);
        assert_eq!(tb.alignment.second, vec![None, Some(b'C'), Some(b'G'), Some(b'G')]);
        assert_eq!(tb.begin, MatrixCoordinate::new(0, 0));
    }

    #[test]
    fn test_stops_without_predecessor() {
        let trace = SparseTrace::default()
            .with(3, 2, TraceDirections::DIAGONAL | TraceDirections::UP)
            .with(2, 1, TraceDirections::CARRY_LEFT_OPEN);

        let tb = traceback(&trace, b"TAC", b"AC", MatrixCoordinate::new(3, 2));

        assert_eq!(tb.begin, MatrixCoordinate::new(2, 1));
        assert_eq!(tb.alignment.first, vec![Some(b'C')]);
        assert_eq!(tb.alignment.second, vec![Some(b'C')]);
    }
}
