use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum AlignError {
    /// A configured score does not fit the score type chosen for the aligner
    ScoreOutOfRange { option: &'static str, value: i64 },

    /// Gap scores are penalties and have to be zero or negative
    PositiveGapScore { option: &'static str, value: i64 },

    /// The upper diagonal of the band lies below the lower diagonal
    InvalidBand { lower: isize, upper: isize },

    /// The band does not contain the matrix origin, and the alignment can't start elsewhere
    BandExcludesOrigin { lower: isize, upper: isize },

    /// The band contains no cell of the DP matrix of a pair
    BandOutsideMatrix { lower: isize, upper: isize, seq1_len: usize, seq2_len: usize },

    /// The band does not reach the last matrix cell of a pair, and the alignment can't end elsewhere
    BandExcludesSink { lower: isize, upper: isize, diagonal: isize },

    /// Scores of some alignment path of a pair could leave the range of the configured score type
    AlignmentScoreOutOfRange { seq1_len: usize, seq2_len: usize, lowest: i64, highest: i64 },

    /// A combination of options that can't be computed together
    IncompatibleConfiguration(String),

    /// The number of scores given for a substitution table doesn't match its dimension
    InvalidScoreTable { expected: usize, actual: usize },

    /// Could not reserve memory for the DP matrix
    AllocationFailed { cells: usize, source: TryReserveError },

    /// Tasks were submitted to an execution handler that was already closed
    HandlerClosed,
}

impl Error for AlignError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::AllocationFailed { ref source, .. } => Some(source),
            _ => None
        }
    }
}

impl Display for AlignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::ScoreOutOfRange { option, value } =>
                write!(f, "Invalid {option}: score value {value} out of range for configured score type."),
            Self::PositiveGapScore { option, value } =>
                write!(f, "Invalid {option}: gap scores must be zero or negative, got {value}."),
            Self::InvalidBand { lower, upper } =>
                write!(f, "Invalid band: the upper diagonal ({upper}) is smaller than the lower diagonal ({lower})."),
            Self::BandExcludesOrigin { lower, upper } =>
                write!(f, "Invalid band [{lower}, {upper}]: the band does not cover the matrix origin, \
                    but leading gaps are not free."),
            Self::BandOutsideMatrix { lower, upper, seq1_len, seq2_len } =>
                write!(f, "Invalid band [{lower}, {upper}]: the band lies outside the alignment matrix \
                    of sequences with length {seq1_len} and {seq2_len}."),
            Self::BandExcludesSink { lower, upper, diagonal } =>
                write!(f, "Invalid band [{lower}, {upper}]: the band does not reach the last matrix cell \
                    (diagonal {diagonal}), but trailing gaps are not free."),
            Self::AlignmentScoreOutOfRange { seq1_len, seq2_len, lowest, highest } =>
                write!(f, "Sequences with length {seq1_len} and {seq2_len} can reach scores between {lowest} \
                    and {highest}, out of range for configured score type."),
            Self::IncompatibleConfiguration(ref reason) =>
                write!(f, "Incompatible alignment configuration: {reason}"),
            Self::InvalidScoreTable { expected, actual } =>
                write!(f, "Invalid scoring table: expected {expected} scores, got {actual}."),
            Self::AllocationFailed { cells, .. } =>
                write!(f, "Could not allocate the alignment matrix ({cells} cells)."),
            Self::HandlerClosed =>
                write!(f, "The execution handler was already closed, can't submit more tasks."),
        }
    }
}
