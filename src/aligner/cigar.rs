use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

use crate::aligner::alignment::AlignedSequences;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CigarOp {
    /// Aligned symbols, match or mismatch
    Match,

    /// Symbol only present in the second sequence
    Insertion,

    /// Symbol only present in the first sequence
    Deletion,

    SequenceMatch,
    SequenceMismatch,
}

impl CigarOp {
    pub fn symbol(&self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::SequenceMatch => '=',
            Self::SequenceMismatch => 'X',
        }
    }
}

/// Run-length encoded alignment, with the first sequence as reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Cigar(SmallVec<[(CigarOp, usize); 8]>);

impl Cigar {
    /// Encode an alignment. With `extended`, aligned symbols are split into `=` and `X`.
    pub fn from_alignment(alignment: &AlignedSequences, extended: bool) -> Self {
        let ops = alignment.columns()
            .filter_map(|column| match column {
                (Some(_), Some(_)) if !extended => Some(CigarOp::Match),
                (Some(a), Some(b)) if a == b => Some(CigarOp::SequenceMatch),
                (Some(_), Some(_)) => Some(CigarOp::SequenceMismatch),
                (None, Some(_)) => Some(CigarOp::Insertion),
                (Some(_), None) => Some(CigarOp::Deletion),
                (None, None) => None,
            });

        let chunks = ops.chunk_by(|op| *op);
        let runs = chunks.into_iter()
            .map(|(op, run)| (op, run.count()))
            .collect();

        Self(runs)
    }

    pub fn operations(&self) -> &[(CigarOp, usize)] {
        &self.0
    }

    /// Number of first sequence symbols covered
    pub fn reference_length(&self) -> usize {
        self.0.iter()
            .filter(|(op, _)| *op != CigarOp::Insertion)
            .map(|(_, len)| len)
            .sum()
    }

    /// Number of second sequence symbols covered
    pub fn query_length(&self) -> usize {
        self.0.iter()
            .filter(|(op, _)| *op != CigarOp::Deletion)
            .map(|(_, len)| len)
            .sum()
    }
}

impl Display for Cigar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|(op, len)| format!("{len}{}", op.symbol())).join(""))
    }
}
