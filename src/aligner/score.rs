use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::Add;

use num::{Bounded, FromPrimitive, PrimInt, Signed, ToPrimitive};
use wide::{i16x16, i32x8, CmpEq};

use crate::errors::AlignError;

/// The arithmetic needed by the score-only recurrence.
///
/// Implemented both for plain integers and for SIMD vectors, where each lane holds the score of a
/// different sequence pair.
pub trait DpScore: Copy + Add<Output = Self> + Send + Sync + 'static {
    fn zero_score() -> Self;

    /// Maximum, lane-wise for vectors
    fn maximum(self, other: Self) -> Self;
}

/// Scalar score element of an alignment.
pub trait ScoreType: DpScore + PrimInt + Signed + FromPrimitive + ToPrimitive + Bounded
    + Default + Hash + Debug + Display
{
    /// Convert a user supplied score, failing if it can't be represented by this type.
    fn from_i64_checked(option: &'static str, value: i64) -> Result<Self, AlignError> {
        Self::from_i64(value)
            .ok_or(AlignError::ScoreOutOfRange { option, value })
    }

    fn as_i64(&self) -> i64;

    /// The score used for unreachable cells. Adding a gap open and extension never underflows.
    #[inline]
    fn lowest_viable(gap_open: Self, gap_extension: Self) -> Self {
        <Self as Bounded>::min_value() - (gap_open + gap_extension)
    }
}

macro_rules! impl_score_type {
    ($($t:ty),*) => {$(
        impl DpScore for $t {
            #[inline(always)]
            fn zero_score() -> Self {
                0
            }

            #[inline(always)]
            fn maximum(self, other: Self) -> Self {
                Ord::max(self, other)
            }
        }

        impl ScoreType for $t {
            #[inline(always)]
            fn as_i64(&self) -> i64 {
                *self as i64
            }
        }
    )*};
}

impl_score_type!(i8, i16, i32, i64);

/// A vector of scores, one lane per sequence pair in a batch.
pub trait SimdScore: DpScore {
    type Scalar: ScoreType;
    type Lanes: AsRef<[Self::Scalar]> + AsMut<[Self::Scalar]> + Default + Copy + Debug;

    const LANES: usize;

    fn splat(value: Self::Scalar) -> Self;
    fn from_lanes(lanes: Self::Lanes) -> Self;
    fn to_lanes(self) -> Self::Lanes;

    /// Lane-wise `if a == b { if_equal } else { otherwise }`
    fn select_eq(a: Self, b: Self, if_equal: Self, otherwise: Self) -> Self;
}

impl DpScore for i16x16 {
    #[inline(always)]
    fn zero_score() -> Self {
        i16x16::splat(0)
    }

    #[inline(always)]
    fn maximum(self, other: Self) -> Self {
        self.max(other)
    }
}

impl SimdScore for i16x16 {
    type Scalar = i16;
    type Lanes = [i16; 16];

    const LANES: usize = 16;

    #[inline(always)]
    fn splat(value: i16) -> Self {
        i16x16::splat(value)
    }

    #[inline(always)]
    fn from_lanes(lanes: [i16; 16]) -> Self {
        i16x16::from(lanes)
    }

    #[inline(always)]
    fn to_lanes(self) -> [i16; 16] {
        self.to_array()
    }

    #[inline(always)]
    fn select_eq(a: Self, b: Self, if_equal: Self, otherwise: Self) -> Self {
        a.cmp_eq(b).blend(if_equal, otherwise)
    }
}

impl DpScore for i32x8 {
    #[inline(always)]
    fn zero_score() -> Self {
        i32x8::splat(0)
    }

    #[inline(always)]
    fn maximum(self, other: Self) -> Self {
        self.max(other)
    }
}

impl SimdScore for i32x8 {
    type Scalar = i32;
    type Lanes = [i32; 8];

    const LANES: usize = 8;

    #[inline(always)]
    fn splat(value: i32) -> Self {
        i32x8::splat(value)
    }

    #[inline(always)]
    fn from_lanes(lanes: [i32; 8]) -> Self {
        i32x8::from(lanes)
    }

    #[inline(always)]
    fn to_lanes(self) -> [i32; 8] {
        self.to_array()
    }

    #[inline(always)]
    fn select_eq(a: Self, b: Self, if_equal: Self, otherwise: Self) -> Self {
        a.cmp_eq(b).blend(if_equal, otherwise)
    }
}
