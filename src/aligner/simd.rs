//! Aligning batches of sequence pairs in the lanes of SIMD vectors.

use std::sync::Arc;

use num::FromPrimitive;
use tracing::{debug, span, Level};

use crate::aligner::alignment::{AlignmentResult, ResultBuilder};
use crate::aligner::config::AlignmentConfig;
use crate::aligner::matrix::{BandGeometry, DpMatrix, NoTrace};
use crate::aligner::optimum::{LaneOptimumTracker, TrackingPolicy};
use crate::aligner::recursion::AffineRecursion;
use crate::aligner::score::SimdScore;
use crate::aligner::scoring::{GapScheme, SubstitutionScore};
use crate::aligner::{check_score_range, collect_pairs, into_chunks, kernel, IndexedPair};
use crate::errors::AlignError;
use crate::execution::{ExecutionHandler, Executor};

/// Pack a set of sequences into vectors of symbol ranks, one sequence per lane. Shorter sequences
/// are padded with rank 0.
pub fn pack_sequences<V>(sequences: &[&[u8]], length: usize) -> Vec<V>
where
    V: SimdScore
{
    (0..length)
        .map(|position| {
            let mut lanes = V::Lanes::default();
            for (lane, sequence) in lanes.as_mut().iter_mut().zip(sequences) {
                if let Some(&symbol) = sequence.get(position) {
                    *lane = V::Scalar::from_u8(symbol).unwrap_or_default();
                }
            }

            V::from_lanes(lanes)
        })
        .collect()
}

struct BatchCore<V, M>
where
    V: SimdScore
{
    config: AlignmentConfig,
    gaps: GapScheme<V::Scalar>,
    scoring: M,
}

impl<V, M> BatchCore<V, M>
where
    V: SimdScore,
    M: SubstitutionScore<V::Scalar>,
{
    fn check_pair(&self, seq1_len: usize, seq2_len: usize) -> Result<(), AlignError> {
        self.config.check_pair(seq1_len, seq2_len)?;
        check_score_range(&self.gaps, &self.scoring, seq1_len, seq2_len)
    }

    fn compute_batch<Q>(&self, batch: &[IndexedPair<Q>]) -> Result<Vec<AlignmentResult<V::Scalar>>, AlignError>
    where
        Q: AsRef<[u8]>
    {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let batch = &batch[..batch.len().min(V::LANES)];
        let firsts: Vec<&[u8]> = batch.iter().map(|pair| pair.first.as_ref()).collect();
        let seconds: Vec<&[u8]> = batch.iter().map(|pair| pair.second.as_ref()).collect();
        let lengths: Vec<(usize, usize)> = firsts.iter().zip(&seconds)
            .map(|(first, second)| (first.len(), second.len()))
            .collect();

        let max_first = lengths.iter().map(|&(n, _)| n).max().unwrap_or(0);
        let max_second = lengths.iter().map(|&(_, m)| m).max().unwrap_or(0);

        let seq1 = pack_sequences::<V>(&firsts, max_first);
        let seq2 = pack_sequences::<V>(&seconds, max_second);

        let free = self.config.method().free_end_gaps();
        let (gap_open, gap_extension) = self.gaps.broadcast::<V>();
        let recursion = AffineRecursion::new(
            gap_open, gap_extension, free.seq1_leading, free.seq2_leading, self.config.method().is_local());

        let lowest = V::splat(self.gaps.lowest_viable());
        let policy = TrackingPolicy::from_method(self.config.method());
        let mut tracker = LaneOptimumTracker::<V>::new(policy, &lengths);
        let substitution = |a: &V, b: &V| self.scoring.score_lanes(*a, *b);

        let mut matrix = DpMatrix::new(NoTrace);
        match self.config.band() {
            Some(band) => {
                matrix.allocate(BandGeometry::banded(band, max_first, max_second), true, lowest)?;
                kernel::compute_banded(&seq1, &seq2, &recursion, &mut matrix, &mut tracker, lowest, substitution);
            },
            None => {
                matrix.allocate(BandGeometry::unbanded(max_first, max_second), false, lowest)?;
                kernel::compute_unbanded(&seq1, &seq2, &recursion, &mut matrix, &mut tracker, substitution);
            }
        }

        let output = self.config.output();
        let results = batch.iter()
            .zip(tracker.optima())
            .map(|(pair, optimum)| ResultBuilder::new(output)
                .sequence_ids(pair.index)
                .score(optimum.score)
                .end_position(optimum.coordinate)
                .build())
            .collect();

        Ok(results)
    }
}

/// Aligns up to `V::LANES` pairs at once, computing scores and end positions.
///
/// Gives the same results as [`crate::aligner::PairwiseAligner`] with the same configuration and
/// score type. Begin positions and alignments require a traceback, which is not available for
/// vectorised alignments.
pub struct BatchAligner<V, M>
where
    V: SimdScore
{
    core: Arc<BatchCore<V, M>>,
}

impl<V, M> Clone for BatchAligner<V, M>
where
    V: SimdScore
{
    fn clone(&self) -> Self {
        Self { core: Arc::clone(&self.core) }
    }
}

impl<V, M> BatchAligner<V, M>
where
    V: SimdScore,
    M: SubstitutionScore<V::Scalar> + 'static,
{
    pub fn new(config: AlignmentConfig, scoring: M) -> Result<Self, AlignError> {
        if config.output().requires_traceback() {
            return Err(AlignError::IncompatibleConfiguration(
                "vectorised alignments only compute scores and end positions, \
                begin positions and alignments require the scalar aligner".to_string()));
        }

        let costs = config.gap_costs();
        let gaps = GapScheme::affine(costs.open, costs.extension)?;

        Ok(Self {
            core: Arc::new(BatchCore { config, gaps, scoring }),
        })
    }

    pub fn lanes(&self) -> usize {
        V::LANES
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.core.config
    }

    /// Align all pairs on the calling thread, `V::LANES` pairs at a time. Results are in input
    /// order.
    pub fn align_batch<Q>(&self, pairs: &[(Q, Q)]) -> Result<Vec<AlignmentResult<V::Scalar>>, AlignError>
    where
        Q: AsRef<[u8]>
    {
        let pairs = collect_pairs(
            pairs.iter().map(|(first, second)| (first.as_ref(), second.as_ref())),
            |n, m| self.core.check_pair(n, m),
        )?;

        let mut results = Vec::with_capacity(pairs.len());
        for batch in pairs.chunks(V::LANES) {
            results.extend(self.core.compute_batch(batch)?);
        }

        Ok(results)
    }

    /// Align all pairs with the configured execution handler. Each task computes one batch of
    /// `V::LANES` pairs and passes the unpacked results to its clone of `delegate`.
    pub fn align_all<I, Q, D>(&self, pairs: I, delegate: D) -> Result<(), AlignError>
    where
        I: IntoIterator<Item = (Q, Q)>,
        Q: AsRef<[u8]> + Send + 'static,
        D: FnMut(AlignmentResult<V::Scalar>) + Clone + Send + 'static,
    {
        let pairs = collect_pairs(pairs, |n, m| self.core.check_pair(n, m))?;
        let span = span!(Level::DEBUG, "align_batches", pairs = pairs.len(), lanes = V::LANES);
        let _enter = span.enter();
        debug!("Aligning {} sequence pairs in batches of {}.", pairs.len(), V::LANES);

        let (errors, failures) = crossbeam_channel::unbounded::<AlignError>();
        let mut executor = Executor::new(self.core.config.parallelism());

        for batch in into_chunks(pairs, V::LANES) {
            let core = Arc::clone(&self.core);
            let errors = errors.clone();

            executor.execute(move |batch: Vec<IndexedPair<Q>>, mut delegate: D| {
                match core.compute_batch(&batch) {
                    Ok(results) => results.into_iter().for_each(&mut delegate),
                    Err(e) => {
                        let _ = errors.send(e);
                    }
                }
            }, batch, delegate.clone())?;
        }

        executor.wait();
        drop(errors);

        match failures.try_iter().next() {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}
