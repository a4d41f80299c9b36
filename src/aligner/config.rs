use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AlignError;

/// Which sequence ends may carry unpenalised gaps.
///
/// The first sequence runs along the matrix columns, the second along the rows. A free leading
/// end of the first sequence makes the first matrix row free, a free trailing end means the
/// optimum is searched in the whole last row. The second sequence behaves the same for the first
/// and last column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeEndGaps {
    pub seq1_leading: bool,
    pub seq1_trailing: bool,
    pub seq2_leading: bool,
    pub seq2_trailing: bool,
}

impl FreeEndGaps {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { seq1_leading: true, seq1_trailing: true, seq2_leading: true, seq2_trailing: true }
    }

    pub fn any(&self) -> bool {
        self.seq1_leading || self.seq1_trailing || self.seq2_leading || self.seq2_trailing
    }
}

/// Type of alignment to perform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentMethod {
    /// End-to-end alignment, optionally with free end gaps (semi-global and overlap alignments)
    Global(FreeEndGaps),

    /// Best scoring pair of substrings, scores never drop below zero
    Local,
}

impl AlignmentMethod {
    pub fn global() -> Self {
        Self::Global(FreeEndGaps::none())
    }

    /// Align the second sequence completely to any substring of the first.
    pub fn semi_global() -> Self {
        Self::Global(FreeEndGaps { seq1_leading: true, seq1_trailing: true, ..FreeEndGaps::none() })
    }

    pub fn overlap() -> Self {
        Self::Global(FreeEndGaps::all())
    }

    pub fn local() -> Self {
        Self::Local
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Local alignments can start and end anywhere.
    pub fn free_end_gaps(&self) -> FreeEndGaps {
        match self {
            Self::Global(free) => *free,
            Self::Local => FreeEndGaps::all(),
        }
    }
}

impl Default for AlignmentMethod {
    fn default() -> Self {
        Self::global()
    }
}

/// Diagonal band restricting the computed cells. Diagonal `d` holds the cells with
/// `column - row == d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    pub lower_diagonal: isize,
    pub upper_diagonal: isize,
}

impl Band {
    pub fn new(lower_diagonal: isize, upper_diagonal: isize) -> Self {
        Self { lower_diagonal, upper_diagonal }
    }

    #[inline]
    pub fn contains(&self, diagonal: isize) -> bool {
        self.lower_diagonal <= diagonal && diagonal <= self.upper_diagonal
    }
}

/// The values reported for each alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSelection {
    pub score: bool,
    pub begin_position: bool,
    pub end_position: bool,
    pub alignment: bool,
    pub sequence_ids: bool,
}

impl OutputSelection {
    pub fn all() -> Self {
        Self { score: true, begin_position: true, end_position: true, alignment: true, sequence_ids: true }
    }

    pub fn score_only() -> Self {
        Self { score: true, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        !(self.score || self.begin_position || self.end_position || self.alignment || self.sequence_ids)
    }

    /// Begin positions and alignments both require walking the trace matrix.
    pub fn requires_traceback(&self) -> bool {
        self.begin_position || self.alignment
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel { threads: usize },
}

/// Gap scores as configured by the user. A gap of length `n` scores `open + n * extension`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GapCosts {
    pub open: i64,
    pub extension: i64,
}

impl GapCosts {
    pub fn linear(extension: i64) -> Self {
        Self { open: 0, extension }
    }

    pub fn affine(open: i64, extension: i64) -> Self {
        Self { open, extension }
    }
}

impl Default for GapCosts {
    fn default() -> Self {
        Self::affine(-10, -1)
    }
}

pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// A validated alignment configuration. Use [`AlignmentConfig::builder`] to create one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    gap_costs: GapCosts,
    method: AlignmentMethod,
    band: Option<Band>,
    output: OutputSelection,
    parallelism: Parallelism,
    chunk_size: usize,
}

impl AlignmentConfig {
    pub fn builder() -> AlignmentConfigBuilder {
        AlignmentConfigBuilder::default()
    }

    #[inline]
    pub fn gap_costs(&self) -> GapCosts {
        self.gap_costs
    }

    #[inline]
    pub fn method(&self) -> &AlignmentMethod {
        &self.method
    }

    #[inline]
    pub fn band(&self) -> Option<&Band> {
        self.band.as_ref()
    }

    #[inline]
    pub fn output(&self) -> &OutputSelection {
        &self.output
    }

    #[inline]
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Number of sequence pairs handed to a single task
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Checks that require the sequence lengths: the band has to overlap the matrix of the pair,
    /// and has to reach the last cell unless the alignment may end elsewhere.
    pub fn check_pair(&self, seq1_len: usize, seq2_len: usize) -> Result<(), AlignError> {
        let Some(band) = self.band else {
            return Ok(());
        };

        let (lower, upper) = (band.lower_diagonal, band.upper_diagonal);
        if upper < -(seq2_len as isize) || lower > seq1_len as isize {
            return Err(AlignError::BandOutsideMatrix { lower, upper, seq1_len, seq2_len });
        }

        let free = self.method.free_end_gaps();
        let diagonal = seq1_len as isize - seq2_len as isize;
        let reachable = if diagonal > upper {
            free.seq1_trailing
        } else if diagonal < lower {
            free.seq2_trailing
        } else {
            true
        };

        if !reachable {
            return Err(AlignError::BandExcludesSink { lower, upper, diagonal });
        }

        Ok(())
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            gap_costs: GapCosts::default(),
            method: AlignmentMethod::default(),
            band: None,
            output: OutputSelection::all(),
            parallelism: Parallelism::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AlignmentConfigBuilder {
    gap_costs: GapCosts,
    method: AlignmentMethod,
    band: Option<Band>,
    output: OutputSelection,
    parallelism: Parallelism,
    chunk_size: usize,
}

impl Default for AlignmentConfigBuilder {
    fn default() -> Self {
        Self {
            gap_costs: GapCosts::default(),
            method: AlignmentMethod::default(),
            band: None,
            output: OutputSelection::default(),
            parallelism: Parallelism::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl AlignmentConfigBuilder {
    pub fn gap_costs(mut self, gap_costs: GapCosts) -> Self {
        self.gap_costs = gap_costs;
        self
    }

    pub fn method(mut self, method: AlignmentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    pub fn output(mut self, output: OutputSelection) -> Self {
        self.output = output;
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Validate and build the configuration. Selecting no outputs at all selects every output.
    pub fn build(self) -> Result<AlignmentConfig, AlignError> {
        if self.gap_costs.open > 0 {
            return Err(AlignError::PositiveGapScore { option: "gap open", value: self.gap_costs.open });
        }

        if self.gap_costs.extension > 0 {
            return Err(AlignError::PositiveGapScore { option: "gap extension", value: self.gap_costs.extension });
        }

        if let Some(band) = self.band {
            let (lower, upper) = (band.lower_diagonal, band.upper_diagonal);
            if lower > upper {
                return Err(AlignError::InvalidBand { lower, upper });
            }

            if self.method.is_local() {
                return Err(AlignError::IncompatibleConfiguration(
                    "banded local alignments are not supported".to_string()));
            }

            let free = self.method.free_end_gaps();
            if (upper < 0 && !free.seq2_leading) || (lower > 0 && !free.seq1_leading) {
                return Err(AlignError::BandExcludesOrigin { lower, upper });
            }
        }

        if self.chunk_size == 0 {
            return Err(AlignError::IncompatibleConfiguration(
                "the chunk size must be at least one".to_string()));
        }

        if let Parallelism::Parallel { threads: 0 } = self.parallelism {
            warn!("Parallel execution requested without worker threads, submitted alignments will not run.");
        }

        let output = if self.output.is_empty() { OutputSelection::all() } else { self.output };

        Ok(AlignmentConfig {
            gap_costs: self.gap_costs,
            method: self.method,
            band: self.band,
            output,
            parallelism: self.parallelism,
            chunk_size: self.chunk_size,
        })
    }
}
