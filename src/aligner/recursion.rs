use crate::aligner::score::{DpScore, ScoreType};
use crate::aligner::trace::TraceDirections;

/// One DP cell of the gap-affine recurrence.
///
/// `horizontal` and `vertical` hold the gap scores handed to the cell on the right and the cell
/// below, so a single column of cells suffices to compute the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AffineCell<V> {
    pub best: V,
    pub horizontal: V,
    pub vertical: V,
}

impl<V> AffineCell<V>
where
    V: Copy
{
    #[inline(always)]
    pub fn uniform(score: V) -> Self {
        Self { best: score, horizontal: score, vertical: score }
    }
}

/// A computed cell along with its trace information.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TracedCell<S> {
    pub cell: AffineCell<S>,

    /// Directions stored in the trace matrix for this cell
    pub trace: TraceDirections,

    /// Trace of the gap score handed to the right neighbour (`LEFT` or `LEFT_OPEN`)
    pub horizontal_trace: TraceDirections,

    /// Trace of the gap score handed to the lower neighbour (`UP` or `UP_OPEN`)
    pub vertical_trace: TraceDirections,
}

/// The Gotoh recurrence for gap-affine alignments.
#[derive(Clone, Copy, Debug)]
pub struct AffineRecursion<V> {
    gap_open: V,
    gap_extension: V,
    first_row_free: bool,
    first_column_free: bool,
    local: bool,
}

impl<V> AffineRecursion<V>
where
    V: DpScore
{
    /// `gap_open` is the score of a gap of length one, i.e., it includes the first extension.
    ///
    /// Local alignments always start for free anywhere in the first row and column.
    pub fn new(gap_open: V, gap_extension: V, first_row_free: bool, first_column_free: bool, local: bool) -> Self {
        Self {
            gap_open,
            gap_extension,
            first_row_free: first_row_free || local,
            first_column_free: first_column_free || local,
            local,
        }
    }

    #[inline(always)]
    pub fn first_row_free(&self) -> bool {
        self.first_row_free
    }

    #[inline(always)]
    pub fn first_column_free(&self) -> bool {
        self.first_column_free
    }

    #[inline(always)]
    pub fn is_local(&self) -> bool {
        self.local
    }

    #[inline]
    pub fn initialise_origin_cell(&self) -> AffineCell<V> {
        let zero = V::zero_score();

        AffineCell {
            best: zero,
            horizontal: if self.first_row_free { zero } else { self.gap_open },
            vertical: if self.first_column_free { zero } else { self.gap_open },
        }
    }

    #[inline]
    pub fn initialise_first_row_cell(&self, previous: &AffineCell<V>) -> AffineCell<V> {
        AffineCell {
            best: previous.horizontal,
            horizontal: if self.first_row_free {
                previous.horizontal
            } else {
                previous.horizontal + self.gap_extension
            },
            vertical: previous.horizontal + self.gap_open,
        }
    }

    #[inline]
    pub fn initialise_first_column_cell(&self, previous: &AffineCell<V>) -> AffineCell<V> {
        AffineCell {
            best: previous.vertical,
            horizontal: previous.vertical + self.gap_open,
            vertical: if self.first_column_free {
                previous.vertical
            } else {
                previous.vertical + self.gap_extension
            },
        }
    }

    /// Compute an inner cell from the best score of its diagonal predecessor and the gap scores
    /// handed over by its left (`previous.horizontal`) and upper (`previous.vertical`) neighbours.
    #[inline(always)]
    pub fn compute_inner_cell(&self, diagonal: V, previous: &AffineCell<V>, substitution: V) -> AffineCell<V> {
        let mut best = (diagonal + substitution)
            .maximum(previous.vertical)
            .maximum(previous.horizontal);

        if self.local {
            best = best.maximum(V::zero_score());
        }

        let open = best + self.gap_open;

        AffineCell {
            best,
            horizontal: (previous.horizontal + self.gap_extension).maximum(open),
            vertical: (previous.vertical + self.gap_extension).maximum(open),
        }
    }
}

impl<S> AffineRecursion<S>
where
    S: ScoreType
{
    pub fn initialise_origin_cell_traced(&self) -> TracedCell<S> {
        TracedCell {
            cell: self.initialise_origin_cell(),
            trace: TraceDirections::NONE,
            horizontal_trace: TraceDirections::LEFT_OPEN,
            vertical_trace: TraceDirections::UP_OPEN,
        }
    }

    pub fn initialise_first_row_cell_traced(
        &self,
        previous: &AffineCell<S>,
        horizontal_trace: TraceDirections,
    ) -> TracedCell<S> {
        TracedCell {
            cell: self.initialise_first_row_cell(previous),
            trace: if self.first_row_free { TraceDirections::NONE } else { horizontal_trace },
            horizontal_trace: TraceDirections::LEFT,
            vertical_trace: TraceDirections::UP_OPEN,
        }
    }

    pub fn initialise_first_column_cell_traced(
        &self,
        previous: &AffineCell<S>,
        vertical_trace: TraceDirections,
    ) -> TracedCell<S> {
        TracedCell {
            cell: self.initialise_first_column_cell(previous),
            trace: if self.first_column_free { TraceDirections::NONE } else { vertical_trace },
            horizontal_trace: TraceDirections::LEFT_OPEN,
            vertical_trace: TraceDirections::UP,
        }
    }

    /// Same as [`Self::compute_inner_cell`], additionally recording every predecessor that ties the
    /// best score. `horizontal_trace` and `vertical_trace` are the traces handed over along with
    /// the gap scores in `previous`.
    #[inline(always)]
    pub fn compute_inner_cell_traced(
        &self,
        diagonal: S,
        previous: &AffineCell<S>,
        substitution: S,
        horizontal_trace: TraceDirections,
        vertical_trace: TraceDirections,
    ) -> TracedCell<S> {
        let diagonal = diagonal + substitution;
        let mut best = diagonal
            .maximum(previous.vertical)
            .maximum(previous.horizontal);

        let mut trace = TraceDirections::NONE;
        if diagonal == best {
            trace |= TraceDirections::DIAGONAL;
        }

        if previous.vertical == best {
            trace |= TraceDirections::UP;
        }

        if previous.horizontal == best {
            trace |= TraceDirections::LEFT;
        }

        if self.local && best <= S::zero() {
            best = S::zero();
            trace = TraceDirections::NONE;
        }

        trace |= vertical_trace & TraceDirections::CARRY_UP_OPEN;
        trace |= horizontal_trace & TraceDirections::CARRY_LEFT_OPEN;

        let open = best + self.gap_open;

        // Opening wins ties, which ends a gap run as early as possible during traceback
        let vertical_extension = previous.vertical + self.gap_extension;
        let (vertical, next_vertical_trace) = if open >= vertical_extension {
            (open, TraceDirections::UP_OPEN)
        } else {
            (vertical_extension, TraceDirections::UP)
        };

        let horizontal_extension = previous.horizontal + self.gap_extension;
        let (horizontal, next_horizontal_trace) = if open >= horizontal_extension {
            (open, TraceDirections::LEFT_OPEN)
        } else {
            (horizontal_extension, TraceDirections::LEFT)
        };

        TracedCell {
            cell: AffineCell { best, horizontal, vertical },
            trace,
            horizontal_trace: next_horizontal_trace,
            vertical_trace: next_vertical_trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aligner::trace::TraceDirections;
    use super::{AffineCell, AffineRecursion};

    #[test]
    fn test_initialisation() {
        let rec = AffineRecursion::<i32>::new(-11, -1, false, false, false);

        let origin = rec.initialise_origin_cell();
        assert_eq!(origin, AffineCell { best: 0, horizontal: -11, vertical: -11 });

        let first_row = rec.initialise_first_row_cell(&origin);
        assert_eq!(first_row, AffineCell { best: -11, horizontal: -12, vertical: -22 });

        let first_row2 = rec.initialise_first_row_cell(&first_row);
        assert_eq!(first_row2.best, -12);

        let first_col = rec.initialise_first_column_cell(&origin);
        assert_eq!(first_col, AffineCell { best: -11, horizontal: -22, vertical: -12 });
    }

    #[test]
    fn test_free_initialisation() {
        let rec = AffineRecursion::<i32>::new(-11, -1, true, false, false);

        let origin = rec.initialise_origin_cell();
        assert_eq!(origin, AffineCell { best: 0, horizontal: 0, vertical: -11 });

        let mut cell = origin;
        for _ in 0..5 {
            cell = rec.initialise_first_row_cell(&cell);
            assert_eq!(cell.best, 0);
            assert_eq!(cell.vertical, -11);
        }

        let col = rec.initialise_first_column_cell(&origin);
        assert_eq!(col.best, -11);

        let traced = rec.initialise_first_row_cell_traced(&origin, TraceDirections::LEFT_OPEN);
        assert!(traced.trace.is_none());
    }

    #[test]
    fn test_inner_cell() {
        let rec = AffineRecursion::<i32>::new(-3, -1, false, false, false);
        let previous = AffineCell { best: 0, horizontal: -4, vertical: 1 };

        let cell = rec.compute_inner_cell(0, &previous, 2);
        assert_eq!(cell, AffineCell { best: 2, horizontal: -1, vertical: 0 });

        // Diagonal and vertical tie
        let traced = rec.compute_inner_cell_traced(
            -1, &previous, 2, TraceDirections::LEFT, TraceDirections::UP_OPEN);

        assert_eq!(traced.cell.best, 1);
        assert!(traced.trace.contains(TraceDirections::DIAGONAL));
        assert!(traced.trace.contains(TraceDirections::UP_OPEN));
        assert!(!traced.trace.intersects(TraceDirections::LEFT_OPEN));

        // Vertical: max(1 - 1, 1 - 3) = 0 extends
        assert_eq!(traced.cell.vertical, 0);
        assert_eq!(traced.vertical_trace, TraceDirections::UP);

        // Horizontal: max(-4 - 1, 1 - 3) = -2 opens
        assert_eq!(traced.cell.horizontal, -2);
        assert_eq!(traced.horizontal_trace, TraceDirections::LEFT_OPEN);

        // Untraced and traced scores agree
        assert_eq!(traced.cell, rec.compute_inner_cell(-1, &previous, 2));
    }

    #[test]
    fn test_local_clamp() {
        let rec = AffineRecursion::<i32>::new(-3, -1, false, false, true);
        assert!(rec.first_row_free() && rec.first_column_free());

        let previous = AffineCell { best: 0, horizontal: -3, vertical: -3 };
        let cell = rec.compute_inner_cell(0, &previous, -1);
        assert_eq!(cell.best, 0);

        let traced = rec.compute_inner_cell_traced(
            0, &previous, -1, TraceDirections::LEFT_OPEN, TraceDirections::UP);
        assert_eq!(traced.cell.best, 0);
        assert!(!traced.trace.has_source());
        assert!(traced.trace.contains(TraceDirections::CARRY_LEFT_OPEN));
    }
}
