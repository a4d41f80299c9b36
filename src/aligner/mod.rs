pub mod score;
pub mod scoring;
pub mod config;
pub mod trace;
pub mod recursion;
pub mod matrix;
pub mod optimum;
pub mod kernel;
pub mod traceback;
pub mod alignment;
pub mod cigar;
pub mod edit_distance;
pub mod simd;

use std::sync::Arc;

use itertools::Itertools;
use num::Bounded;
use tracing::{debug, span, trace, Level};

use crate::aligner::config::AlignmentConfig;
use crate::aligner::matrix::{BandGeometry, BandedLayout, DpMatrix, FullLayout, NoTrace, TraceLayout, TraceMatrix, TracePolicy};
use crate::aligner::optimum::{AlignmentOptimum, OptimumTracker, TrackingPolicy};
use crate::aligner::recursion::AffineRecursion;
use crate::aligner::score::ScoreType;
use crate::aligner::scoring::{GapScheme, SubstitutionScore};
use crate::aligner::traceback::{traceback, Traceback};
use crate::errors::AlignError;
use crate::execution::{AlignmentExecutor, ExecutionHandler, Executor};

pub use alignment::{AlignedSequences, AlignmentResult, ResultBuilder};
pub use config::{AlignmentMethod, Band, FreeEndGaps, GapCosts, OutputSelection, Parallelism};

/// A sequence pair along with its position in the input.
#[derive(Clone, Debug)]
pub(crate) struct IndexedPair<Q> {
    pub index: usize,
    pub first: Q,
    pub second: Q,
}

/// Enumerate and validate all pairs, so configuration errors surface before any alignment runs.
pub(crate) fn collect_pairs<I, Q, C>(pairs: I, check: C) -> Result<Vec<IndexedPair<Q>>, AlignError>
where
    I: IntoIterator<Item = (Q, Q)>,
    Q: AsRef<[u8]>,
    C: Fn(usize, usize) -> Result<(), AlignError>,
{
    pairs.into_iter()
        .enumerate()
        .map(|(index, (first, second))| {
            check(first.as_ref().len(), second.as_ref().len())?;
            Ok(IndexedPair { index, first, second })
        })
        .collect()
}

/// Check that every score the recurrence can produce for a pair of the given lengths lies
/// strictly above the lowest viable score and fits `S`.
///
/// Each cell is reached in at most `seq1_len + seq2_len` steps, and a candidate score adds one
/// more. No step costs more than the largest of the gap open, gap extension and substitution
/// penalties. The highest score is bounded by matching every symbol of the shorter sequence.
pub(crate) fn check_score_range<S, M>(gaps: &GapScheme<S>, scoring: &M, seq1_len: usize, seq2_len: usize) -> Result<(), AlignError>
where
    S: ScoreType,
    M: SubstitutionScore<S>,
{
    let (lowest_substitution, highest_substitution) = scoring.score_range();
    let penalty = [gaps.gap_open_score(), gaps.gap_extension(), lowest_substitution]
        .iter()
        .map(|score| score.as_i64().saturating_neg())
        .fold(0, i64::max);

    let length = |len: usize| i64::try_from(len).unwrap_or(i64::MAX);
    let steps = length(seq1_len).saturating_add(length(seq2_len)).saturating_add(1);
    let lowest = steps.saturating_mul(penalty).saturating_neg();
    let highest = length(seq1_len.min(seq2_len)).saturating_mul(highest_substitution.as_i64().max(0));

    if lowest <= gaps.lowest_viable().as_i64() || highest > <S as Bounded>::max_value().as_i64() {
        return Err(AlignError::AlignmentScoreOutOfRange { seq1_len, seq2_len, lowest, highest });
    }

    Ok(())
}

pub(crate) fn into_chunks<Q>(pairs: Vec<IndexedPair<Q>>, chunk_size: usize) -> Vec<Vec<IndexedPair<Q>>> {
    let chunks = pairs.into_iter().chunks(chunk_size);

    chunks.into_iter()
        .map(|chunk| chunk.collect())
        .collect()
}

struct AlignerCore<S, M> {
    config: AlignmentConfig,
    gaps: GapScheme<S>,
    scoring: M,
}

impl<S, M> AlignerCore<S, M>
where
    S: ScoreType,
    M: SubstitutionScore<S>,
{
    fn recursion(&self) -> AffineRecursion<S> {
        let free = self.config.method().free_end_gaps();

        AffineRecursion::new(
            self.gaps.gap_open_score(),
            self.gaps.gap_extension(),
            free.seq1_leading,
            free.seq2_leading,
            self.config.method().is_local(),
        )
    }

    /// Unit costs, no band and free ends only on the first sequence can use the bit-parallel
    /// edit distance.
    fn use_edit_distance(&self) -> bool {
        let free = self.config.method().free_end_gaps();

        self.config.band().is_none()
            && !self.config.method().is_local()
            && !free.seq2_leading
            && !free.seq2_trailing
            && self.gaps.is_linear()
            && self.gaps.gap_extension() == -S::one()
            && self.scoring.is_unit_edit()
    }

    fn check_pair(&self, seq1_len: usize, seq2_len: usize) -> Result<(), AlignError> {
        self.config.check_pair(seq1_len, seq2_len)?;

        // The bit-parallel path saturates instead of relying on sentinel scores
        if !self.config.output().requires_traceback() && self.use_edit_distance() {
            return Ok(());
        }

        check_score_range(&self.gaps, &self.scoring, seq1_len, seq2_len)
    }

    fn compute_matrix<P>(&self, seq1: &[u8], seq2: &[u8], matrix: &mut DpMatrix<S, P>) -> Result<AlignmentOptimum<S>, AlignError>
    where
        P: TracePolicy<S>
    {
        let recursion = self.recursion();
        let lowest = self.gaps.lowest_viable();
        let policy = TrackingPolicy::from_method(self.config.method());
        let mut tracker = OptimumTracker::new(policy, seq1.len(), seq2.len());
        let substitution = |a: &u8, b: &u8| self.scoring.score(*a, *b);

        match self.config.band() {
            Some(band) => {
                matrix.allocate(BandGeometry::banded(band, seq1.len(), seq2.len()), true, lowest)?;
                kernel::compute_banded(seq1, seq2, &recursion, matrix, &mut tracker, lowest, substitution);
            },
            None => {
                matrix.allocate(BandGeometry::unbanded(seq1.len(), seq2.len()), false, lowest)?;
                kernel::compute_unbanded(seq1, seq2, &recursion, matrix, &mut tracker, substitution);
            }
        }

        Ok(*tracker.optimum())
    }

    fn compute_traced<L>(&self, seq1: &[u8], seq2: &[u8]) -> Result<(AlignmentOptimum<S>, Traceback), AlignError>
    where
        L: TraceLayout + Default
    {
        let mut matrix = DpMatrix::new(TraceMatrix::<L>::new());
        let optimum = self.compute_matrix(seq1, seq2, &mut matrix)?;
        let tb = traceback(matrix.trace(), seq1, seq2, optimum.coordinate);

        Ok((optimum, tb))
    }

    fn compute(&self, index: usize, seq1: &[u8], seq2: &[u8]) -> Result<AlignmentResult<S>, AlignError> {
        trace!(index, seq1_len = seq1.len(), seq2_len = seq2.len(), "Aligning pair");

        let output = self.config.output();
        let builder = ResultBuilder::new(output)
            .sequence_ids(index);

        if !output.requires_traceback() {
            let optimum = if self.use_edit_distance() {
                let free = self.config.method().free_end_gaps();
                let result = edit_distance::edit_distance(seq1, seq2, free.seq1_leading, free.seq1_trailing);
                let score = S::from_i64(-(result.distance as i64))
                    .unwrap_or_else(<S as Bounded>::min_value);

                AlignmentOptimum { score, coordinate: result.end }
            } else {
                let mut matrix = DpMatrix::new(NoTrace);
                self.compute_matrix(seq1, seq2, &mut matrix)?
            };

            return Ok(builder
                .score(optimum.score)
                .end_position(optimum.coordinate)
                .build());
        }

        let (optimum, tb) = if self.config.band().is_some() {
            self.compute_traced::<BandedLayout>(seq1, seq2)?
        } else {
            self.compute_traced::<FullLayout>(seq1, seq2)?
        };

        Ok(builder
            .score(optimum.score)
            .end_position(optimum.coordinate)
            .begin_position(tb.begin)
            .alignment(tb.alignment)
            .build())
    }
}

/// Pairwise aligner for byte sequences with scalar scores of type `S`.
///
/// The configuration and scoring scheme are shared between all tasks spawned by the aligner.
pub struct PairwiseAligner<S, M> {
    core: Arc<AlignerCore<S, M>>,
}

impl<S, M> Clone for PairwiseAligner<S, M> {
    fn clone(&self) -> Self {
        Self { core: Arc::clone(&self.core) }
    }
}

impl<S, M> PairwiseAligner<S, M>
where
    S: ScoreType,
    M: SubstitutionScore<S> + 'static,
{
    pub fn new(config: AlignmentConfig, scoring: M) -> Result<Self, AlignError> {
        let costs = config.gap_costs();
        let gaps = GapScheme::affine(costs.open, costs.extension)?;

        Ok(Self {
            core: Arc::new(AlignerCore { config, gaps, scoring }),
        })
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.core.config
    }

    pub fn gap_scheme(&self) -> &GapScheme<S> {
        &self.core.gaps
    }

    pub fn scoring(&self) -> &M {
        &self.core.scoring
    }

    pub fn align<A, B>(&self, seq1: &A, seq2: &B) -> Result<AlignmentResult<S>, AlignError>
    where
        A: AsRef<[u8]> + ?Sized,
        B: AsRef<[u8]> + ?Sized,
    {
        self.align_pair(0, seq1.as_ref(), seq2.as_ref())
    }

    /// Align a single pair, reporting `index` as its sequence identifier.
    pub fn align_pair(&self, index: usize, seq1: &[u8], seq2: &[u8]) -> Result<AlignmentResult<S>, AlignError> {
        self.core.check_pair(seq1.len(), seq2.len())?;
        self.core.compute(index, seq1, seq2)
    }

    /// Align all pairs with the configured execution handler, passing each result to `delegate`.
    ///
    /// Each task aligns a chunk of pairs and owns a clone of the delegate. With parallel
    /// execution, results arrive in completion order. Returns after all pairs have been aligned.
    pub fn align_all<I, Q, D>(&self, pairs: I, delegate: D) -> Result<(), AlignError>
    where
        I: IntoIterator<Item = (Q, Q)>,
        Q: AsRef<[u8]> + Send + 'static,
        D: FnMut(AlignmentResult<S>) + Clone + Send + 'static,
    {
        let pairs = collect_pairs(pairs, |n, m| self.core.check_pair(n, m))?;
        let span = span!(Level::DEBUG, "align_all", pairs = pairs.len());
        let _enter = span.enter();
        debug!("Aligning {} sequence pairs.", pairs.len());

        let (errors, failures) = crossbeam_channel::unbounded::<AlignError>();
        let mut executor = Executor::new(self.core.config.parallelism());

        for chunk in into_chunks(pairs, self.core.config.chunk_size()) {
            let core = Arc::clone(&self.core);
            let errors = errors.clone();

            executor.execute(move |chunk: Vec<IndexedPair<Q>>, mut delegate: D| {
                for pair in chunk {
                    match core.compute(pair.index, pair.first.as_ref(), pair.second.as_ref()) {
                        Ok(result) => delegate(result),
                        Err(e) => {
                            let _ = errors.send(e);
                        }
                    }
                }
            }, chunk, delegate.clone())?;
        }

        executor.wait();
        drop(errors);

        match failures.try_iter().next() {
            Some(e) => Err(e),
            None => Ok(())
        }
    }

    /// Lazily align all pairs, yielding results in input order.
    pub fn align_ordered<I, Q>(&self, pairs: I) -> Result<impl Iterator<Item = Result<AlignmentResult<S>, AlignError>>, AlignError>
    where
        I: IntoIterator<Item = (Q, Q)>,
        Q: AsRef<[u8]> + Send + 'static,
    {
        let pairs = collect_pairs(pairs, |n, m| self.core.check_pair(n, m))?;
        let chunks = into_chunks(pairs, self.core.config.chunk_size());

        let core = Arc::clone(&self.core);
        let algorithm = move |chunk: Vec<IndexedPair<Q>>, emit: &mut dyn FnMut(Result<AlignmentResult<S>, AlignError>)| {
            for pair in chunk {
                emit(core.compute(pair.index, pair.first.as_ref(), pair.second.as_ref()));
            }
        };

        Ok(AlignmentExecutor::new(chunks.into_iter(), algorithm, Executor::new(self.core.config.parallelism())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::aligner::config::{AlignmentConfig, AlignmentMethod, Band, FreeEndGaps, GapCosts, OutputSelection, Parallelism};
    use crate::aligner::scoring::{MatchMismatch, ScoreTable};
    use crate::errors::AlignError;
    use super::{AlignmentResult, PairwiseAligner};

    fn aligner(method: AlignmentMethod, gaps: GapCosts, match_score: i64, mismatch: i64) -> PairwiseAligner<i32, MatchMismatch<i32>> {
        let config = AlignmentConfig::builder()
            .method(method)
            .gap_costs(gaps)
            .build()
            .unwrap();

        PairwiseAligner::new(config, MatchMismatch::new(match_score, mismatch).unwrap()).unwrap()
    }

    fn strings(result: &AlignmentResult<i32>) -> (String, String) {
        result.alignment.as_ref().unwrap().to_strings()
    }

    #[test]
    fn test_global_with_single_deletion() {
        let aligner = aligner(AlignmentMethod::global(), GapCosts::linear(-1), 1, -1);
        let result = aligner.align(b"ACGT", b"AGT").unwrap();

        assert_eq!(result.score, Some(2));
        assert_eq!(strings(&result), ("ACGT".to_string(), "A-GT".to_string()));
        assert_eq!(result.sequence1_begin_position, Some(0));
        assert_eq!(result.sequence2_begin_position, Some(0));
        assert_eq!(result.sequence1_end_position, Some(4));
        assert_eq!(result.sequence2_end_position, Some(3));
        assert_eq!(result.sequence1_id, Some(0));
    }

    #[test]
    fn test_empty_sequences() {
        let aligner = aligner(AlignmentMethod::global(), GapCosts::linear(-3), 1, -1);

        let result = aligner.align(b"", b"ACGTA").unwrap();
        assert_eq!(result.score, Some(-15));
        assert_eq!(strings(&result), ("-----".to_string(), "ACGTA".to_string()));

        let result = aligner.align(b"ACG", b"").unwrap();
        assert_eq!(result.score, Some(-9));

        let result = aligner.align(b"", b"").unwrap();
        assert_eq!(result.score, Some(0));
        assert!(result.alignment.unwrap().is_empty());
    }

    #[test]
    fn test_affine_prefers_single_gap() {
        let aligner = aligner(AlignmentMethod::global(), GapCosts::affine(-5, -1), 2, -3);
        let result = aligner.align(b"ACGTTTACGT", b"ACGTACGT").unwrap();

        // 8 matches, one gap of length two
        assert_eq!(result.score, Some(16 - 7));

        let (first, second) = strings(&result);
        assert_eq!(first, "ACGTTTACGT");
        assert_eq!(second.matches('-').count(), 2);
        assert!(second.contains("--"));
    }

    #[test]
    fn test_local() {
        let aligner = aligner(AlignmentMethod::local(), GapCosts::affine(-5, -1), 2, -3);
        let result = aligner.align(b"TTTTGATTACATTTT", b"CCGATTACACC").unwrap();

        assert_eq!(result.score, Some(14));
        assert_eq!(strings(&result), ("GATTACA".to_string(), "GATTACA".to_string()));
        assert_eq!(result.sequence1_begin_position, Some(4));
        assert_eq!(result.sequence2_begin_position, Some(2));
        assert_eq!(result.sequence1_end_position, Some(11));
        assert_eq!(result.sequence2_end_position, Some(9));

        // Nothing in common
        let result = aligner.align(b"AAAA", b"CCCC").unwrap();
        assert_eq!(result.score, Some(0));
        assert!(result.alignment.unwrap().is_empty());
    }

    #[test]
    fn test_semi_global() {
        let aligner = aligner(AlignmentMethod::semi_global(), GapCosts::affine(-5, -1), 2, -3);
        let result = aligner.align(b"TTTTACGTACTTTT", b"ACGTAC").unwrap();

        assert_eq!(result.score, Some(12));
        assert_eq!(result.sequence1_begin_position, Some(4));
        assert_eq!(result.sequence1_end_position, Some(10));
        assert_eq!(strings(&result), ("ACGTAC".to_string(), "ACGTAC".to_string()));
    }

    #[test]
    fn test_overlap() {
        let free = FreeEndGaps::all();
        let aligner = aligner(AlignmentMethod::Global(free), GapCosts::linear(-2), 1, -1);

        // Suffix of the first sequence overlaps the prefix of the second
        let result = aligner.align(b"GGGGACGT", b"ACGTCCCC").unwrap();
        assert_eq!(result.score, Some(4));
        assert_eq!(result.sequence1_begin_position, Some(4));
        assert_eq!(result.sequence2_begin_position, Some(0));
        assert_eq!(result.sequence1_end_position, Some(8));
        assert_eq!(result.sequence2_end_position, Some(4));
    }

    #[test]
    fn test_edit_distance_path() {
        let config = AlignmentConfig::builder()
            .gap_costs(GapCosts::linear(-1))
            .output(OutputSelection { score: true, end_position: true, ..OutputSelection::default() })
            .build()
            .unwrap();

        let fast = PairwiseAligner::<i32, _>::new(config, MatchMismatch::new(0, -1).unwrap()).unwrap();
        let result = fast.align(b"kitten", b"sitting").unwrap();

        assert_eq!(result.score, Some(-3));
        assert_eq!(result.sequence1_end_position, Some(6));
        assert_eq!(result.sequence2_end_position, Some(7));
        assert!(result.alignment.is_none());

        // Same score through the DP path
        let traced = aligner(AlignmentMethod::global(), GapCosts::linear(-1), 0, -1);
        assert_eq!(traced.align(b"kitten", b"sitting").unwrap().score, Some(-3));
    }

    #[test]
    fn test_banded() {
        let config = AlignmentConfig::builder()
            .gap_costs(GapCosts::affine(-5, -1))
            .band(Band::new(-2, 2))
            .build()
            .unwrap();

        let banded = PairwiseAligner::<i32, _>::new(config, MatchMismatch::new(2, -3).unwrap()).unwrap();
        let unbanded = aligner(AlignmentMethod::global(), GapCosts::affine(-5, -1), 2, -3);

        let seq1 = b"ACGTTGCAACGTAGCT";
        let seq2 = b"ACGTGCAACGTTAGCT";

        let expected = unbanded.align(seq1, seq2).unwrap();
        let result = banded.align(seq1, seq2).unwrap();

        assert_eq!(result.score, expected.score);
        assert_eq!(result.alignment, expected.alignment);

        // Sink outside the band
        assert!(matches!(banded.align(b"ACGTACGT", b"AC"), Err(AlignError::BandExcludesSink { .. })));
    }

    #[test]
    fn test_score_table() {
        #[rustfmt::skip]
        let table = ScoreTable::<i16>::new(4, &[
             2, -1, -1, -1,
            -1,  2, -1, -1,
            -1, -1,  2, -1,
            -1, -1, -1,  2,
        ]).unwrap();

        let config = AlignmentConfig::builder()
            .gap_costs(GapCosts::linear(-2))
            .build()
            .unwrap();

        let aligner = PairwiseAligner::<i16, _>::new(config, table).unwrap();
        let result = aligner.align(&[0u8, 1, 2, 3][..], &[0u8, 2, 3][..]).unwrap();

        assert_eq!(result.score, Some(4));
    }

    #[test]
    fn test_score_out_of_range() {
        let config = AlignmentConfig::builder()
            .gap_costs(GapCosts::affine(-200, -1))
            .build()
            .unwrap();

        let result = PairwiseAligner::<i8, _>::new(config, MatchMismatch::new(1, -1).unwrap());
        assert!(matches!(result, Err(AlignError::ScoreOutOfRange { option: "gap open", value: -200 })));
    }

    #[test]
    fn test_pair_score_range() {
        let config = |band: Option<Band>| {
            let mut builder = AlignmentConfig::builder().gap_costs(GapCosts::affine(-40, -10));
            if let Some(band) = band {
                builder = builder.band(band);
            }

            builder.build().unwrap()
        };

        // Unreachable band cells start at -68, below the score of three mismatches
        let narrow = PairwiseAligner::<i8, _>::new(config(Some(Band::new(0, 0))), MatchMismatch::new(1, -30).unwrap()).unwrap();
        assert_eq!(narrow.gap_scheme().lowest_viable(), -68);
        assert!(matches!(
            narrow.align(b"AAA", b"CCC"),
            Err(AlignError::AlignmentScoreOutOfRange { seq1_len: 3, seq2_len: 3, lowest: -350, highest: 3 })
        ));

        let unbanded = PairwiseAligner::<i8, _>::new(config(None), MatchMismatch::new(1, -30).unwrap()).unwrap();
        assert!(matches!(unbanded.align(b"AAA", b"CCC"), Err(AlignError::AlignmentScoreOutOfRange { .. })));

        // Positive scores can overflow as well
        let config = AlignmentConfig::builder().gap_costs(GapCosts::linear(-1)).build().unwrap();
        let matches = PairwiseAligner::<i8, _>::new(config, MatchMismatch::new(10, -1).unwrap()).unwrap();
        assert_eq!(matches.align(&[b'A'; 12], &[b'A'; 12]).unwrap().score, Some(120));
        assert!(matches!(
            matches.align(&[b'A'; 13], &[b'A'; 13]),
            Err(AlignError::AlignmentScoreOutOfRange { highest: 130, .. })
        ));
    }

    #[test]
    fn test_narrow_scores_match_wide() {
        let config = || AlignmentConfig::builder()
            .gap_costs(GapCosts::affine(-5, -1))
            .build()
            .unwrap();

        let narrow = PairwiseAligner::<i8, _>::new(config(), MatchMismatch::new(2, -3).unwrap()).unwrap();
        let wide = PairwiseAligner::<i32, _>::new(config(), MatchMismatch::new(2, -3).unwrap()).unwrap();

        let result = narrow.align(b"ACGTACGTA", b"ACTTACGA").unwrap();
        let expected = wide.align(b"ACGTACGTA", b"ACTTACGA").unwrap();
        assert_eq!(result.score.map(i32::from), expected.score);
        assert_eq!(result.alignment, expected.alignment);

        // 21 steps of at most 6 reach -126, below the lowest viable score of -121
        assert_eq!(narrow.gap_scheme().lowest_viable(), -121);
        assert!(matches!(narrow.align(b"ACGTACGTACGT", b"ACGTACGT"), Err(AlignError::AlignmentScoreOutOfRange { .. })));

        // Bulk alignment validates every pair before aligning any
        let pairs = vec![(b"ACGT".to_vec(), b"ACG".to_vec()), (vec![b'A'; 12], vec![b'C'; 8])];
        let result = narrow.align_all(pairs, |_| panic!("nothing should be aligned"));
        assert!(matches!(result, Err(AlignError::AlignmentScoreOutOfRange { seq1_len: 12, seq2_len: 8, .. })));
    }

    #[test]
    #[should_panic(expected = "delegate failed on pair 2")]
    fn test_align_all_propagates_panics() {
        let config = AlignmentConfig::builder()
            .parallelism(Parallelism::Parallel { threads: 3 })
            .chunk_size(1)
            .build()
            .unwrap();

        let aligner = PairwiseAligner::<i32, _>::new(config, MatchMismatch::new(1, -1).unwrap()).unwrap();
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..6)
            .map(|_| (b"ACGT".to_vec(), b"AGT".to_vec()))
            .collect();

        let _ = aligner.align_all(pairs, |result: AlignmentResult<i32>| {
            if result.sequence1_id == Some(2) {
                panic!("delegate failed on pair 2");
            }
        });
    }

    #[test]
    fn test_align_all_and_ordered() {
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..40)
            .map(|i| {
                let first: Vec<u8> = (0..(5 + i % 7)).map(|k| b"ACGT"[(k * 3 + i) % 4]).collect();
                let second: Vec<u8> = (0..(4 + i % 5)).map(|k| b"ACGT"[(k + i) % 4]).collect();
                (first, second)
            })
            .collect();

        for parallelism in [Parallelism::Sequential, Parallelism::Parallel { threads: 4 }] {
            let config = AlignmentConfig::builder()
                .gap_costs(GapCosts::affine(-4, -1))
                .parallelism(parallelism)
                .chunk_size(3)
                .build()
                .unwrap();

            let aligner = PairwiseAligner::<i32, _>::new(config, MatchMismatch::new(1, -2).unwrap()).unwrap();

            let collected = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&collected);
            aligner.align_all(pairs.clone(), move |result| sink.lock().unwrap().push(result)).unwrap();

            let mut collected = collected.lock().unwrap().clone();
            collected.sort_by_key(|result| result.sequence1_id);

            let ordered: Vec<AlignmentResult<i32>> = aligner.align_ordered(pairs.clone())
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();

            assert_eq!(collected.len(), pairs.len());
            assert_eq!(collected, ordered);

            for (i, (result, (first, second))) in ordered.iter().zip(&pairs).enumerate() {
                assert_eq!(result.sequence1_id, Some(i));
                assert_eq!(result, &aligner.align_pair(i, first, second).unwrap());
            }
        }
    }
}
