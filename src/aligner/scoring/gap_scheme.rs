use serde::Serialize;

use crate::aligner::score::{ScoreType, SimdScore};
use crate::errors::AlignError;

/// Gap scores of an alignment.
///
/// A gap run of length `n > 0` scores `gap_open + n * gap_extension`, i.e., the open score is
/// charged once per run on top of the extension score for every gap character. Linear gap scores
/// are the special case `gap_open == 0`. Both values are zero or negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GapScheme<S> {
    gap_open: S,
    gap_extension: S,
}

impl<S> GapScheme<S>
where
    S: ScoreType
{
    pub fn linear(gap_extension: i64) -> Result<Self, AlignError> {
        Self::affine(0, gap_extension)
    }

    pub fn affine(gap_open: i64, gap_extension: i64) -> Result<Self, AlignError> {
        let mut scheme = Self { gap_open: S::zero(), gap_extension: S::zero() };
        scheme.set_affine(gap_open, gap_extension)?;

        Ok(scheme)
    }

    pub fn set_linear(&mut self, gap_extension: i64) -> Result<(), AlignError> {
        self.set_affine(0, gap_extension)
    }

    /// Reconfigure the gap scores. On error the scheme is left unchanged.
    pub fn set_affine(&mut self, gap_open: i64, gap_extension: i64) -> Result<(), AlignError> {
        if gap_open > 0 {
            return Err(AlignError::PositiveGapScore { option: "gap open", value: gap_open });
        }

        if gap_extension > 0 {
            return Err(AlignError::PositiveGapScore { option: "gap extension", value: gap_extension });
        }

        let open = S::from_i64_checked("gap open", gap_open)?;
        let extension = S::from_i64_checked("gap extension", gap_extension)?;

        // The recurrence adds both at once when opening a gap
        let first_gap = gap_open.checked_add(gap_extension)
            .ok_or(AlignError::ScoreOutOfRange { option: "gap open + gap extension", value: i64::MIN })?;
        S::from_i64_checked("gap open + gap extension", first_gap)?;

        // Unreachable cells sit a gap open and an extension above the minimum
        let lowest_offset = first_gap.checked_add(gap_extension)
            .ok_or(AlignError::ScoreOutOfRange { option: "gap open + 2 * gap extension", value: i64::MIN })?;
        S::from_i64_checked("gap open + 2 * gap extension", lowest_offset)?;

        self.gap_open = open;
        self.gap_extension = extension;

        Ok(())
    }

    #[inline(always)]
    pub fn gap_open(&self) -> S {
        self.gap_open
    }

    #[inline(always)]
    pub fn gap_extension(&self) -> S {
        self.gap_extension
    }

    /// Score of a gap of length one
    #[inline(always)]
    pub fn gap_open_score(&self) -> S {
        self.gap_open + self.gap_extension
    }

    #[inline]
    pub fn is_linear(&self) -> bool {
        self.gap_open == S::zero()
    }

    /// Total score of a single gap run of the given length.
    #[inline]
    pub fn score(&self, length: usize) -> i64 {
        if length == 0 {
            return 0;
        }

        self.gap_open.as_i64() + length as i64 * self.gap_extension.as_i64()
    }

    #[inline]
    pub fn lowest_viable(&self) -> S {
        S::lowest_viable(self.gap_open_score(), self.gap_extension)
    }

    /// The gap open (including the first extension) and gap extension scores, broadcast to all
    /// lanes of a vector.
    pub fn broadcast<V>(&self) -> (V, V)
    where
        V: SimdScore<Scalar = S>
    {
        (V::splat(self.gap_open_score()), V::splat(self.gap_extension))
    }
}
