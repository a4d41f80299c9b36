use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::aligner::config::OutputSelection;
use crate::aligner::matrix::MatrixCoordinate;

/// The two gapped sequences of an alignment, column by column. `None` is a gap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AlignedSequences {
    pub first: Vec<Option<u8>>,
    pub second: Vec<Option<u8>>,
}

impl AlignedSequences {
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// Iterate over the alignment columns
    pub fn columns(&self) -> impl Iterator<Item = (Option<u8>, Option<u8>)> + '_ {
        self.first.iter().copied().zip(self.second.iter().copied())
    }

    pub fn num_matches(&self) -> usize {
        self.columns()
            .filter(|(a, b)| matches!((a, b), (Some(a), Some(b)) if a == b))
            .count()
    }

    /// Both rows as text, gaps shown as `-`. Symbols are interpreted as ASCII.
    pub fn to_strings(&self) -> (String, String) {
        let render = |row: &[Option<u8>]| row.iter()
            .map(|symbol| symbol.map(char::from).unwrap_or('-'))
            .collect::<String>();

        (render(&self.first), render(&self.second))
    }
}

impl Display for AlignedSequences {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (first, second) = self.to_strings();

        writeln!(f, "{first}")?;
        write!(f, "{second}")
    }
}

/// Outcome of a single pairwise alignment. Fields that were not selected in the
/// [`OutputSelection`] are `None`.
///
/// Positions are 0-based prefix lengths: an end position of `j` in the first sequence means the
/// alignment covers up to and including symbol `j - 1`, and a begin position of `j` that it starts
/// at symbol `j`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlignmentResult<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence1_id: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence2_id: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<S>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence1_begin_position: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence2_begin_position: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence1_end_position: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence2_end_position: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignedSequences>,
}

impl<S> Default for AlignmentResult<S> {
    fn default() -> Self {
        Self {
            sequence1_id: None,
            sequence2_id: None,
            score: None,
            sequence1_begin_position: None,
            sequence2_begin_position: None,
            sequence1_end_position: None,
            sequence2_end_position: None,
            alignment: None,
        }
    }
}

/// Fills an [`AlignmentResult`], skipping every value that was not requested.
pub struct ResultBuilder<'a, S> {
    output: &'a OutputSelection,
    result: AlignmentResult<S>,
}

impl<'a, S> ResultBuilder<'a, S> {
    pub fn new(output: &'a OutputSelection) -> Self {
        Self { output, result: AlignmentResult::default() }
    }

    /// Both sequences of a pair share the pair's index as identifier.
    pub fn sequence_ids(mut self, index: usize) -> Self {
        if self.output.sequence_ids {
            self.result.sequence1_id = Some(index);
            self.result.sequence2_id = Some(index);
        }

        self
    }

    pub fn score(mut self, score: S) -> Self {
        if self.output.score {
            self.result.score = Some(score);
        }

        self
    }

    pub fn end_position(mut self, end: MatrixCoordinate) -> Self {
        if self.output.end_position {
            self.result.sequence1_end_position = Some(end.column);
            self.result.sequence2_end_position = Some(end.row);
        }

        self
    }

    pub fn begin_position(mut self, begin: MatrixCoordinate) -> Self {
        if self.output.begin_position {
            self.result.sequence1_begin_position = Some(begin.column);
            self.result.sequence2_begin_position = Some(begin.row);
        }

        self
    }

    pub fn alignment(mut self, alignment: AlignedSequences) -> Self {
        if self.output.alignment {
            self.result.alignment = Some(alignment);
        }

        self
    }

    pub fn build(self) -> AlignmentResult<S> {
        self.result
    }
}
