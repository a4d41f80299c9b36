pub mod gap_scheme;

use num::ToPrimitive;
use serde::Serialize;

use crate::aligner::score::{ScoreType, SimdScore};
use crate::errors::AlignError;

pub use gap_scheme::GapScheme;

/// Substitution scores between two symbol ranks.
pub trait SubstitutionScore<S>: Send + Sync
where
    S: ScoreType
{
    fn score(&self, first: u8, second: u8) -> S;

    /// Lane-wise substitution scores, where each lane of the inputs holds a symbol rank.
    fn score_lanes<V>(&self, first: V, second: V) -> V
    where
        V: SimdScore<Scalar = S>
    {
        let first = first.to_lanes();
        let second = second.to_lanes();
        let mut scores = V::Lanes::default();

        for ((score, a), b) in scores.as_mut().iter_mut().zip(first.as_ref()).zip(second.as_ref()) {
            *score = self.score(a.to_u8().unwrap_or(0), b.to_u8().unwrap_or(0));
        }

        V::from_lanes(scores)
    }

    /// The lowest and the highest score of any pair of symbols.
    fn score_range(&self) -> (S, S);

    /// Whether this scheme equals the unit edit distance (match 0, mismatch -1)
    fn is_unit_edit(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchMismatch<S> {
    match_score: S,
    mismatch_score: S,
}

impl<S> MatchMismatch<S>
where
    S: ScoreType
{
    pub fn new(match_score: i64, mismatch_score: i64) -> Result<Self, AlignError> {
        Ok(Self {
            match_score: S::from_i64_checked("match score", match_score)?,
            mismatch_score: S::from_i64_checked("mismatch score", mismatch_score)?,
        })
    }

    #[inline(always)]
    pub fn match_score(&self) -> S {
        self.match_score
    }

    #[inline(always)]
    pub fn mismatch_score(&self) -> S {
        self.mismatch_score
    }
}

impl<S> SubstitutionScore<S> for MatchMismatch<S>
where
    S: ScoreType
{
    #[inline(always)]
    fn score(&self, first: u8, second: u8) -> S {
        if first == second {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    #[inline(always)]
    fn score_lanes<V>(&self, first: V, second: V) -> V
    where
        V: SimdScore<Scalar = S>
    {
        V::select_eq(first, second, V::splat(self.match_score), V::splat(self.mismatch_score))
    }

    fn score_range(&self) -> (S, S) {
        (self.match_score.min(self.mismatch_score), self.match_score.max(self.mismatch_score))
    }

    fn is_unit_edit(&self) -> bool {
        self.match_score == S::zero() && self.mismatch_score == -S::one()
    }
}

/// A dense substitution table over the symbol ranks `0..size`, stored row-major.
///
/// Symbols outside the table score as the lowest score in the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreTable<S> {
    size: usize,
    scores: Vec<S>,
    fallback: S,
    highest: S,
}

impl<S> ScoreTable<S>
where
    S: ScoreType
{
    pub fn new(size: usize, scores: &[i64]) -> Result<Self, AlignError> {
        let expected = size.checked_mul(size)
            .ok_or(AlignError::InvalidScoreTable { expected: usize::MAX, actual: scores.len() })?;

        if size == 0 || scores.len() != expected {
            return Err(AlignError::InvalidScoreTable { expected, actual: scores.len() });
        }

        let scores = scores.iter()
            .map(|&v| S::from_i64_checked("substitution table entry", v))
            .collect::<Result<Vec<_>, _>>()?;

        let fallback = scores.iter().copied().min().unwrap_or_else(S::zero);
        let highest = scores.iter().copied().max().unwrap_or_else(S::zero);

        Ok(Self { size, scores, fallback, highest })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl<S> SubstitutionScore<S> for ScoreTable<S>
where
    S: ScoreType
{
    #[inline]
    fn score(&self, first: u8, second: u8) -> S {
        let (first, second) = (first as usize, second as usize);
        if first < self.size && second < self.size {
            self.scores[first * self.size + second]
        } else {
            self.fallback
        }
    }

    fn score_range(&self) -> (S, S) {
        (self.fallback, self.highest)
    }
}
