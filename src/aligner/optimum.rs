use num::Bounded;
use serde::Serialize;

use crate::aligner::config::AlignmentMethod;
use crate::aligner::matrix::MatrixCoordinate;
use crate::aligner::score::{ScoreType, SimdScore};

/// Best score found so far, and the cell where it was first seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AlignmentOptimum<S> {
    pub score: S,
    pub coordinate: MatrixCoordinate,
}

impl<S> AlignmentOptimum<S>
where
    S: ScoreType
{
    /// Replace the optimum if `score` is strictly better. Returns whether it was replaced.
    #[inline(always)]
    pub fn update_if_new_optimal_score(&mut self, score: S, coordinate: MatrixCoordinate) -> bool {
        if score > self.score {
            self.score = score;
            self.coordinate = coordinate;
            true
        } else {
            false
        }
    }
}

impl<S> Default for AlignmentOptimum<S>
where
    S: ScoreType
{
    fn default() -> Self {
        Self {
            score: <S as Bounded>::min_value(),
            coordinate: MatrixCoordinate::default(),
        }
    }
}

/// The cells that are candidates for the end of an alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackingPolicy {
    pub every_cell: bool,
    pub last_row: bool,
    pub last_column: bool,
}

impl TrackingPolicy {
    pub fn from_method(method: &AlignmentMethod) -> Self {
        match method {
            AlignmentMethod::Local => Self { every_cell: true, last_row: true, last_column: true },
            AlignmentMethod::Global(free) => Self {
                every_cell: false,
                last_row: free.seq1_trailing,
                last_column: free.seq2_trailing,
            },
        }
    }
}

/// Receives every computed cell score in column-major order.
pub trait OptimumTracking<V> {
    fn track(&mut self, score: V, coordinate: MatrixCoordinate);
}

#[derive(Clone, Debug)]
pub struct OptimumTracker<S> {
    optimum: AlignmentOptimum<S>,
    policy: TrackingPolicy,
    sink: MatrixCoordinate,
}

impl<S> OptimumTracker<S>
where
    S: ScoreType
{
    pub fn new(policy: TrackingPolicy, seq1_len: usize, seq2_len: usize) -> Self {
        Self {
            optimum: AlignmentOptimum::default(),
            policy,
            sink: MatrixCoordinate::new(seq1_len, seq2_len),
        }
    }

    #[inline(always)]
    fn is_tracked(&self, coordinate: MatrixCoordinate) -> bool {
        self.policy.every_cell
            || (self.policy.last_row && coordinate.row == self.sink.row)
            || (self.policy.last_column && coordinate.column == self.sink.column)
            || coordinate == self.sink
    }

    pub fn optimum(&self) -> &AlignmentOptimum<S> {
        &self.optimum
    }

    pub fn reset(&mut self) {
        self.optimum = AlignmentOptimum::default();
    }
}

impl<S> OptimumTracking<S> for OptimumTracker<S>
where
    S: ScoreType
{
    #[inline(always)]
    fn track(&mut self, score: S, coordinate: MatrixCoordinate) {
        if self.is_tracked(coordinate) {
            self.optimum.update_if_new_optimal_score(score, coordinate);
        }
    }
}

/// Optimum tracking for a batch of sequence pairs computed in the lanes of a vector.
///
/// Each lane has its own matrix dimensions. Per row and column, bit masks store which lanes have
/// their last row (or column) there, and which lanes still have cells there at all. Cells in the
/// padding of shorter pairs are never tracked.
#[derive(Clone, Debug)]
pub struct LaneOptimumTracker<V>
where
    V: SimdScore
{
    optima: Vec<AlignmentOptimum<V::Scalar>>,
    policy: TrackingPolicy,
    row_last: Vec<u32>,
    row_valid: Vec<u32>,
    column_last: Vec<u32>,
    column_valid: Vec<u32>,
}

impl<V> LaneOptimumTracker<V>
where
    V: SimdScore
{
    /// `lengths` holds the lengths of the first and second sequence of each lane, at most
    /// `V::LANES` entries.
    pub fn new(policy: TrackingPolicy, lengths: &[(usize, usize)]) -> Self {
        let lanes = lengths.len().min(V::LANES).min(u32::BITS as usize);
        let max_columns = lengths.iter().map(|&(n, _)| n + 1).max().unwrap_or(1);
        let max_rows = lengths.iter().map(|&(_, m)| m + 1).max().unwrap_or(1);

        let mut row_last = vec![0u32; max_rows];
        let mut row_valid = vec![0u32; max_rows];
        let mut column_last = vec![0u32; max_columns];
        let mut column_valid = vec![0u32; max_columns];

        for (lane, &(n, m)) in lengths.iter().take(lanes).enumerate() {
            let bit = 1u32 << lane;

            row_last[m] |= bit;
            column_last[n] |= bit;
            row_valid[..=m].iter_mut().for_each(|mask| *mask |= bit);
            column_valid[..=n].iter_mut().for_each(|mask| *mask |= bit);
        }

        Self {
            optima: vec![AlignmentOptimum::default(); lanes],
            policy,
            row_last,
            row_valid,
            column_last,
            column_valid,
        }
    }

    #[inline]
    fn tracked_lanes(&self, coordinate: MatrixCoordinate) -> u32 {
        let (Some(&row_last), Some(&row_valid)) = (self.row_last.get(coordinate.row), self.row_valid.get(coordinate.row)) else {
            return 0;
        };

        let (Some(&column_last), Some(&column_valid)) = (self.column_last.get(coordinate.column), self.column_valid.get(coordinate.column)) else {
            return 0;
        };

        if self.policy.every_cell {
            return row_valid & column_valid;
        }

        let mut mask = row_last & column_last;
        if self.policy.last_row {
            mask |= row_last & column_valid;
        }

        if self.policy.last_column {
            mask |= column_last & row_valid;
        }

        mask
    }

    pub fn optimum(&self, lane: usize) -> Option<&AlignmentOptimum<V::Scalar>> {
        self.optima.get(lane)
    }

    pub fn optima(&self) -> &[AlignmentOptimum<V::Scalar>] {
        &self.optima
    }
}

impl<V> OptimumTracking<V> for LaneOptimumTracker<V>
where
    V: SimdScore
{
    #[inline]
    fn track(&mut self, score: V, coordinate: MatrixCoordinate) {
        let mut mask = self.tracked_lanes(coordinate);
        if mask == 0 {
            return;
        }

        let scores = score.to_lanes();
        while mask != 0 {
            let lane = mask.trailing_zeros() as usize;
            self.optima[lane].update_if_new_optimal_score(scores.as_ref()[lane], coordinate);
            mask &= mask - 1;
        }
    }
}
