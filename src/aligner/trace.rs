use std::fmt::{Debug, Formatter};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Set of trace directions recorded for a DP cell.
///
/// `DIAGONAL`, `UP` and `LEFT` mark every predecessor that yields the cell's best score; ties are
/// combined. The carry bits tell whether the gap score reaching this cell from above (or from the
/// left) opened a new gap instead of extending one.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TraceDirections(u8);

impl TraceDirections {
    pub const NONE: Self = Self(0);
    pub const DIAGONAL: Self = Self(0b0000_0001);
    pub const CARRY_UP_OPEN: Self = Self(0b0000_0010);
    pub const UP: Self = Self(0b0000_0100);
    pub const UP_OPEN: Self = Self(Self::UP.0 | Self::CARRY_UP_OPEN.0);
    pub const CARRY_LEFT_OPEN: Self = Self(0b0000_1000);
    pub const LEFT: Self = Self(0b0001_0000);
    pub const LEFT_OPEN: Self = Self(Self::LEFT.0 | Self::CARRY_LEFT_OPEN.0);

    #[inline(always)]
    pub fn bits(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// All bits of `other` are set
    #[inline(always)]
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set
    #[inline(always)]
    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether the cell has any predecessor for its best score
    #[inline(always)]
    pub fn has_source(&self) -> bool {
        self.intersects(Self::DIAGONAL | Self::UP | Self::LEFT)
    }
}

impl BitOr for TraceDirections {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TraceDirections {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitAnd for TraceDirections {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Debug for TraceDirections {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return write!(f, "NONE");
        }

        let names = [
            (Self::DIAGONAL, "DIAGONAL"),
            (Self::UP, "UP"),
            (Self::CARRY_UP_OPEN, "CARRY_UP_OPEN"),
            (Self::LEFT, "LEFT"),
            (Self::CARRY_LEFT_OPEN, "CARRY_LEFT_OPEN"),
        ];

        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }

        Ok(())
    }
}
