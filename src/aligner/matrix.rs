use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::aligner::config::Band;
use crate::aligner::recursion::{AffineCell, AffineRecursion};
use crate::aligner::score::{DpScore, ScoreType};
use crate::aligner::trace::TraceDirections;
use crate::errors::AlignError;

/// Position in the DP matrix. Column `j` corresponds to the prefix of length `j` of the first
/// sequence, row `i` to the prefix of length `i` of the second sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatrixCoordinate {
    pub column: usize,
    pub row: usize,
}

impl MatrixCoordinate {
    #[inline(always)]
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

/// The part of the `(n + 1) × (m + 1)` matrix that is computed.
///
/// A cell lies in the band if `lower <= column - row <= upper`. The unbanded matrix is the band
/// `[-m, n]`. Stored cells of a column are addressed by `row + upper - column`, so the same
/// physical offset in two consecutive columns refers to the same diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandGeometry {
    lower: isize,
    upper: isize,
    columns: usize,
    rows: usize,
}

impl BandGeometry {
    pub fn unbanded(seq1_len: usize, seq2_len: usize) -> Self {
        Self {
            lower: -(seq2_len as isize),
            upper: seq1_len as isize,
            columns: seq1_len + 1,
            rows: seq2_len + 1,
        }
    }

    /// Band clipped to the matrix dimensions
    pub fn banded(band: &Band, seq1_len: usize, seq2_len: usize) -> Self {
        Self {
            lower: band.lower_diagonal.max(-(seq2_len as isize)),
            upper: band.upper_diagonal.min(seq1_len as isize),
            columns: seq1_len + 1,
            rows: seq2_len + 1,
        }
    }

    #[inline(always)]
    pub fn lower_diagonal(&self) -> isize {
        self.lower
    }

    #[inline(always)]
    pub fn upper_diagonal(&self) -> isize {
        self.upper
    }

    #[inline(always)]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of stored cells per column
    #[inline]
    pub fn height(&self) -> usize {
        if self.upper < self.lower {
            0
        } else {
            (self.upper - self.lower + 1) as usize
        }
    }

    /// The last column containing cells of the band
    pub fn last_column(&self) -> Option<usize> {
        let last = (self.rows as isize - 1 + self.upper).min(self.columns as isize - 1);

        (last >= 0).then_some(last as usize)
    }

    /// Rows of the given column that lie in the band, if any
    pub fn row_range(&self, column: usize) -> Option<RangeInclusive<usize>> {
        let column = column as isize;
        let first = (column - self.upper).max(0);
        let last = (column - self.lower).min(self.rows as isize - 1);

        (first <= last).then(|| first as usize..=last as usize)
    }

    /// Offset of a coordinate within its stored column, `None` outside the band or matrix.
    #[inline]
    pub fn offset(&self, coordinate: MatrixCoordinate) -> Option<usize> {
        if coordinate.column >= self.columns || coordinate.row >= self.rows {
            return None;
        }

        let offset = coordinate.row as isize + self.upper - coordinate.column as isize;
        (offset >= 0 && (offset as usize) < self.height()).then_some(offset as usize)
    }

    /// Inverse of [`Self::offset`]
    #[inline]
    pub fn coordinate(&self, column: usize, offset: usize) -> MatrixCoordinate {
        let row = column as isize + offset as isize - self.upper;
        MatrixCoordinate::new(column, row as usize)
    }
}

/// How the trace matrix addresses its cells.
pub trait TraceLayout {
    fn from_geometry(geometry: &BandGeometry) -> Self;

    fn column_height(&self) -> usize;

    /// Offset within a column, `None` if the coordinate is not stored
    fn offset(&self, coordinate: MatrixCoordinate) -> Option<usize>;
}

/// Every cell of the `(n + 1) × (m + 1)` matrix is stored.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullLayout {
    rows: usize,
}

impl TraceLayout for FullLayout {
    fn from_geometry(geometry: &BandGeometry) -> Self {
        Self { rows: geometry.rows() }
    }

    #[inline(always)]
    fn column_height(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    fn offset(&self, coordinate: MatrixCoordinate) -> Option<usize> {
        (coordinate.row < self.rows).then_some(coordinate.row)
    }
}

/// Only cells in the band are stored.
#[derive(Clone, Copy, Debug)]
pub struct BandedLayout(BandGeometry);

impl Default for BandedLayout {
    fn default() -> Self {
        Self(BandGeometry::unbanded(0, 0))
    }
}

impl TraceLayout for BandedLayout {
    fn from_geometry(geometry: &BandGeometry) -> Self {
        Self(*geometry)
    }

    #[inline(always)]
    fn column_height(&self) -> usize {
        self.0.height()
    }

    #[inline(always)]
    fn offset(&self, coordinate: MatrixCoordinate) -> Option<usize> {
        self.0.offset(coordinate)
    }
}

/// Read access to recorded trace directions.
pub trait TraceStorage {
    fn trace_at(&self, coordinate: MatrixCoordinate) -> TraceDirections;
}

/// Decides whether, and how, trace directions are recorded while the DP matrix is filled.
pub trait TracePolicy<V>
where
    V: DpScore
{
    fn allocate(&mut self, geometry: &BandGeometry) -> Result<(), AlignError>;

    /// Called before the cells of a new column are computed
    fn start_column(&mut self) {}

    fn origin(&mut self, recursion: &AffineRecursion<V>) -> AffineCell<V>;

    fn first_row(&mut self, recursion: &AffineRecursion<V>, previous: &AffineCell<V>, coordinate: MatrixCoordinate)
        -> AffineCell<V>;

    fn first_column(&mut self, recursion: &AffineRecursion<V>, previous: &AffineCell<V>, coordinate: MatrixCoordinate)
        -> AffineCell<V>;

    fn inner(
        &mut self,
        recursion: &AffineRecursion<V>,
        diagonal: V,
        previous: &AffineCell<V>,
        substitution: V,
        coordinate: MatrixCoordinate,
    ) -> AffineCell<V>;
}

/// Compute scores only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTrace;

impl<V> TracePolicy<V> for NoTrace
where
    V: DpScore
{
    #[inline(always)]
    fn allocate(&mut self, _: &BandGeometry) -> Result<(), AlignError> {
        Ok(())
    }

    #[inline(always)]
    fn origin(&mut self, recursion: &AffineRecursion<V>) -> AffineCell<V> {
        recursion.initialise_origin_cell()
    }

    #[inline(always)]
    fn first_row(&mut self, recursion: &AffineRecursion<V>, previous: &AffineCell<V>, _: MatrixCoordinate) -> AffineCell<V> {
        recursion.initialise_first_row_cell(previous)
    }

    #[inline(always)]
    fn first_column(&mut self, recursion: &AffineRecursion<V>, previous: &AffineCell<V>, _: MatrixCoordinate) -> AffineCell<V> {
        recursion.initialise_first_column_cell(previous)
    }

    #[inline(always)]
    fn inner(
        &mut self,
        recursion: &AffineRecursion<V>,
        diagonal: V,
        previous: &AffineCell<V>,
        substitution: V,
        _: MatrixCoordinate,
    ) -> AffineCell<V> {
        recursion.compute_inner_cell(diagonal, previous, substitution)
    }
}

/// Trace directions of every computed cell.
///
/// Besides the matrix itself, keeps the gap traces handed from one cell to the next: one per row
/// for horizontal gaps, and a single one for the vertical gap running down the current column.
#[derive(Clone, Debug)]
pub struct TraceMatrix<L> {
    layout: L,
    directions: Vec<TraceDirections>,
    horizontal_traces: Vec<TraceDirections>,
    vertical_trace: TraceDirections,
}

impl<L> TraceMatrix<L>
where
    L: TraceLayout + Default
{
    pub fn new() -> Self {
        Self {
            layout: L::default(),
            directions: Vec::new(),
            horizontal_traces: Vec::new(),
            vertical_trace: TraceDirections::NONE,
        }
    }
}

impl<L> Default for TraceMatrix<L>
where
    L: TraceLayout + Default
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L> TraceMatrix<L>
where
    L: TraceLayout
{
    #[inline]
    fn index(&self, coordinate: MatrixCoordinate) -> Option<usize> {
        self.layout.offset(coordinate)
            .map(|offset| coordinate.column * self.layout.column_height() + offset)
            .filter(|&ix| ix < self.directions.len())
    }

    #[inline]
    fn set(&mut self, coordinate: MatrixCoordinate, directions: TraceDirections) {
        if let Some(ix) = self.index(coordinate) {
            self.directions[ix] = directions;
        }
    }
}

impl<L> TraceStorage for TraceMatrix<L>
where
    L: TraceLayout
{
    #[inline]
    fn trace_at(&self, coordinate: MatrixCoordinate) -> TraceDirections {
        self.index(coordinate)
            .map(|ix| self.directions[ix])
            .unwrap_or_default()
    }
}

impl<S, L> TracePolicy<S> for TraceMatrix<L>
where
    S: ScoreType,
    L: TraceLayout
{
    fn allocate(&mut self, geometry: &BandGeometry) -> Result<(), AlignError> {
        self.layout = L::from_geometry(geometry);

        let cells = geometry.columns().saturating_mul(self.layout.column_height());
        self.directions.clear();
        self.directions.try_reserve_exact(cells)
            .map_err(|source| AlignError::AllocationFailed { cells, source })?;
        self.directions.resize(cells, TraceDirections::NONE);

        self.horizontal_traces.clear();
        self.horizontal_traces.resize(geometry.rows(), TraceDirections::NONE);
        self.vertical_trace = TraceDirections::NONE;

        Ok(())
    }

    #[inline(always)]
    fn start_column(&mut self) {
        self.vertical_trace = TraceDirections::NONE;
    }

    fn origin(&mut self, recursion: &AffineRecursion<S>) -> AffineCell<S> {
        let traced = recursion.initialise_origin_cell_traced();
        let origin = MatrixCoordinate::default();

        self.set(origin, traced.trace);
        self.horizontal_traces[0] = traced.horizontal_trace;
        self.vertical_trace = traced.vertical_trace;

        traced.cell
    }

    fn first_row(&mut self, recursion: &AffineRecursion<S>, previous: &AffineCell<S>, coordinate: MatrixCoordinate) -> AffineCell<S> {
        let traced = recursion.initialise_first_row_cell_traced(previous, self.horizontal_traces[0]);

        self.set(coordinate, traced.trace);
        self.horizontal_traces[0] = traced.horizontal_trace;
        self.vertical_trace = traced.vertical_trace;

        traced.cell
    }

    fn first_column(&mut self, recursion: &AffineRecursion<S>, previous: &AffineCell<S>, coordinate: MatrixCoordinate) -> AffineCell<S> {
        let traced = recursion.initialise_first_column_cell_traced(previous, self.vertical_trace);

        self.set(coordinate, traced.trace);
        self.horizontal_traces[coordinate.row] = traced.horizontal_trace;
        self.vertical_trace = traced.vertical_trace;

        traced.cell
    }

    #[inline]
    fn inner(
        &mut self,
        recursion: &AffineRecursion<S>,
        diagonal: S,
        previous: &AffineCell<S>,
        substitution: S,
        coordinate: MatrixCoordinate,
    ) -> AffineCell<S> {
        let traced = recursion.compute_inner_cell_traced(
            diagonal,
            previous,
            substitution,
            self.horizontal_traces[coordinate.row],
            self.vertical_trace,
        );

        self.set(coordinate, traced.trace);
        self.horizontal_traces[coordinate.row] = traced.horizontal_trace;
        self.vertical_trace = traced.vertical_trace;

        traced.cell
    }
}

/// Score storage for the column currently being computed, plus the trace policy.
///
/// Scores only need a single column: each cell is overwritten once its successors in the next
/// column have read it. Unbanded columns are indexed by row, banded columns by the band offset.
#[derive(Debug)]
pub struct DpMatrix<V, P> {
    cells: Vec<AffineCell<V>>,
    trace: P,
    geometry: BandGeometry,
    banded: bool,
    column: usize,
}

impl<V, P> DpMatrix<V, P>
where
    V: DpScore,
    P: TracePolicy<V>
{
    pub fn new(trace: P) -> Self {
        Self {
            cells: Vec::new(),
            trace,
            geometry: BandGeometry::unbanded(0, 0),
            banded: false,
            column: 0,
        }
    }

    /// Size the storage for the given geometry and reset the column cursor. Every stored cell
    /// starts out as `lowest`.
    pub fn allocate(&mut self, geometry: BandGeometry, banded: bool, lowest: V) -> Result<(), AlignError> {
        let height = if banded { geometry.height() } else { geometry.rows() };

        self.cells.clear();
        self.cells.try_reserve_exact(height)
            .map_err(|source| AlignError::AllocationFailed { cells: height, source })?;
        self.cells.resize(height, AffineCell::uniform(lowest));

        self.trace.allocate(&geometry)?;
        self.trace.start_column();

        self.geometry = geometry;
        self.banded = banded;
        self.column = 0;

        Ok(())
    }

    #[inline(always)]
    pub fn geometry(&self) -> &BandGeometry {
        &self.geometry
    }

    #[inline(always)]
    pub fn column_index(&self) -> usize {
        self.column
    }

    /// The stored cells of the current column with their matrix coordinates, rows ascending.
    pub fn current_column(&self) -> impl Iterator<Item = (&AffineCell<V>, MatrixCoordinate)> + '_ {
        let column = self.column;
        let rows = if self.banded {
            self.geometry.row_range(column)
        } else {
            Some(0..=self.geometry.rows() - 1)
        };

        rows.into_iter()
            .flatten()
            .filter_map(move |row| {
                let coordinate = MatrixCoordinate::new(column, row);
                let offset = if self.banded { self.geometry.offset(coordinate)? } else { row };

                Some((&self.cells[offset], coordinate))
            })
    }

    #[inline]
    pub fn advance_column(&mut self) {
        self.column += 1;
        self.trace.start_column();
    }

    #[inline(always)]
    pub(crate) fn parts_mut(&mut self) -> (&mut [AffineCell<V>], &mut P) {
        (&mut self.cells, &mut self.trace)
    }

    pub fn trace(&self) -> &P {
        &self.trace
    }

    pub fn into_trace(self) -> P {
        self.trace
    }
}
