//! Bit-parallel unit-cost edit distance.
//!
//! Columns of the DP matrix are encoded as bit vectors of vertical score differences, following
//! Myers' algorithm with Hyyrö's extension to patterns longer than a machine word. The second
//! sequence is the pattern, split into blocks of 64 rows; the first sequence is scanned one
//! column at a time.

use crate::aligner::matrix::MatrixCoordinate;

const WORD_SIZE: usize = u64::BITS as usize;

/// Edit distance and the matrix cell where it was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditDistance {
    pub distance: usize,
    pub end: MatrixCoordinate,
}

/// Advance one block of the column by a single text symbol.
///
/// `hin` is the horizontal difference entering the block at its top row, the returned value the
/// horizontal difference leaving it at the row marked by `high`.
#[inline(always)]
fn advance_block(pv: &mut u64, mv: &mut u64, eq: u64, hin: i8, high: u64) -> i8 {
    let (pv_in, mv_in) = (*pv, *mv);
    let hin_negative = u64::from(hin < 0);

    let xv = eq | mv_in;
    let eq = eq | hin_negative;
    let xh = ((eq & pv_in).wrapping_add(pv_in) ^ pv_in) | eq;

    let mut ph = mv_in | !(xh | pv_in);
    let mut mh = pv_in & xh;

    let hout = if ph & high != 0 {
        1
    } else if mh & high != 0 {
        -1
    } else {
        0
    };

    ph <<= 1;
    mh <<= 1;
    mh |= hin_negative;
    if hin > 0 {
        ph |= 1;
    }

    *pv = mh | !(xv | ph);
    *mv = ph & xv;

    hout
}

/// Unit-cost edit distance between `seq1` (columns) and `seq2` (rows).
///
/// With `free_leading`, the alignment may skip a prefix of `seq1` at no cost. With
/// `free_trailing`, it may skip a suffix, and the first column with the minimal distance in the
/// last row is reported.
pub fn edit_distance(seq1: &[u8], seq2: &[u8], free_leading: bool, free_trailing: bool) -> EditDistance {
    let n = seq1.len();
    let m = seq2.len();

    if m == 0 {
        return if free_trailing || free_leading {
            let column = if free_trailing { 0 } else { n };
            EditDistance { distance: 0, end: MatrixCoordinate::new(column, 0) }
        } else {
            EditDistance { distance: n, end: MatrixCoordinate::new(n, 0) }
        };
    }

    let blocks = m.div_ceil(WORD_SIZE);
    let last_high = 1u64 << ((m - 1) % WORD_SIZE);

    let mut peq = vec![0u64; 256 * blocks];
    for (i, &symbol) in seq2.iter().enumerate() {
        peq[symbol as usize * blocks + i / WORD_SIZE] |= 1 << (i % WORD_SIZE);
    }

    let mut pv = vec![!0u64; blocks];
    let mut mv = vec![0u64; blocks];

    let mut distance = m;
    let mut best = EditDistance { distance, end: MatrixCoordinate::new(0, m) };
    let hin_top = if free_leading { 0 } else { 1 };

    for (j, &symbol) in seq1.iter().enumerate() {
        let eq = &peq[symbol as usize * blocks..(symbol as usize + 1) * blocks];

        let mut carry = hin_top;
        for block in 0..blocks {
            let high = if block == blocks - 1 { last_high } else { 1 << (WORD_SIZE - 1) };
            carry = advance_block(&mut pv[block], &mut mv[block], eq[block], carry, high);
        }

        distance = (distance as isize + carry as isize) as usize;

        if free_trailing && distance < best.distance {
            best = EditDistance { distance, end: MatrixCoordinate::new(j + 1, m) };
        }
    }

    if free_trailing {
        best
    } else {
        EditDistance { distance, end: MatrixCoordinate::new(n, m) }
    }
}
