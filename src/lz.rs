//! Lempel-Ziv factorization from longest-previous-factor arrays.
//!
//! Given, for every position `i` of a sequence, the usable match length
//! `lpf[i]` (0 = no match, emit a literal) and the earlier copy source
//! `prev_occ[i]`, this module produces the greedy leftmost factorization:
//! non-overlapping factors covering the whole sequence, where the factor
//! starting at `i` consumes `max(lpf[i], 1)` positions.
//!
//! The factorization itself is an inherently sequential-looking pointer
//! walk. The parallel path breaks that chain in five stages:
//!
//! 1. **Pointers**: `pointer[i] = min(n, i + max(lpf[i], 1))`, the landing
//!    position of a greedy step taken at `i`.
//! 2. **Block contraction**: partition positions into fixed-width blocks
//!    and record, per block, the first block boundary a walk from its
//!    start reaches.
//! 3. **Pointer doubling**: propagate "on the factorization walk" across
//!    the block graph in logarithmically many rounds of binary lifting.
//! 4. **Expansion**: re-walk the per-position pointers inside reachable
//!    blocks only, marking the exact factor boundaries.
//! 5. **Compaction**: exclusive prefix sum over the boundary markers,
//!    then scatter into the dense output list.
//!
//! Total work is O(n); parallel depth is O(log n). Every stage is one flat
//! data-parallel loop, and the fork-join join point between stages is the
//! barrier that orders their writes.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::bits::{ceil_log2, tree_depth};
use crate::scan;
use crate::{ParlzError, ParlzResult};

/// Minimum block width for the contraction stage. Wider blocks keep the
/// doubling stage short; the per-block walk stays O(n) total regardless.
const MIN_BLOCK: usize = 256;

/// Inputs shorter than this take the sequential path.
const SEQUENTIAL_CUTOFF: usize = 8;

/// Position-chunk width for the compaction scatter.
const SCATTER_CHUNK: usize = 16 * 1024;

/// One factor of a factorization: the span starting at `pos`, copied from
/// the earlier position `src`.
///
/// Factor lengths are implicit: factor `k` extends to the next factor's
/// `pos`, the last one to the end of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Factor {
    /// Start position of the factor.
    pub pos: usize,
    /// Copy source, passed through from `prev_occ[pos]` unchanged.
    /// Meaningful only for copy factors (`lpf[pos] > 0`); literal factors
    /// carry whatever the producer stored there (conventionally -1).
    pub src: isize,
}

/// Options controlling parallel factorization.
#[derive(Debug, Clone)]
pub struct FactorizeOptions {
    /// Number of worker threads. 0 = auto (use the shared global pool
    /// sized to all available cores); any other value runs the call in a
    /// dedicated pool of exactly that many threads.
    pub threads: usize,
}

impl Default for FactorizeOptions {
    fn default() -> Self {
        FactorizeOptions { threads: 0 }
    }
}

/// Factorize with default options.
///
/// See [`factorize_with_options`].
pub fn factorize(lpf: &[usize], prev_occ: &[isize]) -> ParlzResult<Vec<Factor>> {
    factorize_with_options(lpf, prev_occ, &FactorizeOptions::default())
}

/// Compute the greedy leftmost factorization of `lpf`/`prev_occ`.
///
/// `lpf` and `prev_occ` must have the same length `n`; the result covers
/// `[0, n)` exactly once with strictly increasing positions. The output is
/// deterministic: identical inputs produce identical factor lists at any
/// thread count.
///
/// Inputs shorter than 8 positions are factorized by the sequential walk
/// (the block-parallel path is tuned for inputs that actually have
/// blocks); an empty input yields an empty factor list.
pub fn factorize_with_options(
    lpf: &[usize],
    prev_occ: &[isize],
    options: &FactorizeOptions,
) -> ParlzResult<Vec<Factor>> {
    if lpf.len() != prev_occ.len() {
        return Err(ParlzError::InvalidInput);
    }
    if lpf.len() < SEQUENTIAL_CUTOFF {
        return factorize_sequential(lpf, prev_occ);
    }

    if options.threads == 0 {
        return Ok(factorize_parallel(lpf, prev_occ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|_| ParlzError::ThreadPool)?;
    Ok(pool.install(|| factorize_parallel(lpf, prev_occ)))
}

/// Single-threaded reference factorizer.
///
/// Walks the greedy pointer chain directly. Total for every input length;
/// the parallel entry points fall back to this for very short inputs.
pub fn factorize_sequential(lpf: &[usize], prev_occ: &[isize]) -> ParlzResult<Vec<Factor>> {
    if lpf.len() != prev_occ.len() {
        return Err(ParlzError::InvalidInput);
    }

    let n = lpf.len();
    let mut factors = Vec::new();
    let mut i = 0;
    while i < n {
        factors.push(Factor {
            pos: i,
            src: prev_occ[i],
        });
        i += lpf[i].max(1);
    }
    Ok(factors)
}

/// The five-stage block-parallel kernel. Caller guarantees equal input
/// lengths and a non-empty input.
fn factorize_parallel(lpf: &[usize], prev_occ: &[isize]) -> Vec<Factor> {
    let n = lpf.len();

    // Stage 1: greedy step pointers. pointer[i] > i always, so every walk
    // below strictly advances and terminates.
    let mut pointers = vec![0usize; n];
    pointers
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, p)| *p = n.min(i + lpf[i].max(1)));

    let block = ceil_log2(n).max(MIN_BLOCK);
    let num_blocks = n.div_ceil(block);

    // Stage 2: block contraction. succ[b] is the block whose boundary a
    // walk from b's first position lands on; walks that run off the end
    // map to the sentinel slot num_blocks, which points to itself.
    //
    // The per-block walk is unbounded in isolation but O(n) summed over
    // all blocks: the walks are segments of chains that strictly increase
    // and stop at the first boundary.
    let mut succ = vec![0usize; num_blocks + 1];
    succ[num_blocks] = num_blocks;
    succ[..num_blocks]
        .par_iter_mut()
        .enumerate()
        .for_each(|(b, s)| {
            let mut j = pointers[b * block];
            while j % block != 0 && j != n {
                j = pointers[j];
            }
            *s = if j == n { num_blocks } else { j / block };
        });

    // Block-level inclusion markers. The factorization walk starts at
    // position 0, so block 0 is always on it; the sentinel never is
    // (marking it is harmless and ignored).
    let marked: Vec<AtomicBool> = (0..=num_blocks).map(|_| AtomicBool::new(false)).collect();
    marked[0].store(true, Ordering::Relaxed);

    // Stage 3: pointer doubling over the block graph. Each round marks
    // every marked block's current successor and doubles the stride.
    // Marking is a monotone idempotent set, so concurrent stores of
    // `true` are order-independent; the stride update reads `succ` and
    // writes the ping-pong twin `succ_next`, never in place.
    let mut succ_next = vec![0usize; num_blocks + 1];
    succ_next[num_blocks] = num_blocks;
    for _ in 0..tree_depth(num_blocks) {
        succ_next[..num_blocks]
            .par_iter_mut()
            .enumerate()
            .for_each(|(b, next)| {
                let j = succ[b];
                if marked[b].load(Ordering::Relaxed) {
                    marked[j].store(true, Ordering::Relaxed);
                }
                *next = succ[j];
            });
        std::mem::swap(&mut succ, &mut succ_next);
    }

    // Stage 4: expansion. Each marked block re-walks the per-position
    // pointers from its first position, marking every landing as a factor
    // boundary until the walk reaches a block boundary or the end. Marked
    // blocks sit on the single factorization walk, so their segments are
    // disjoint; the landing boundary itself is marked by the next marked
    // block's own iteration.
    let flags: Vec<AtomicBool> = (0..=n).map(|_| AtomicBool::new(false)).collect();
    flags[n].store(true, Ordering::Relaxed); // scan sentinel
    (0..num_blocks).into_par_iter().for_each(|b| {
        if !marked[b].load(Ordering::Relaxed) {
            return;
        }
        let start = b * block;
        flags[start].store(true, Ordering::Relaxed);
        let mut j = pointers[start];
        while j % block != 0 && j != n {
            flags[j].store(true, Ordering::Relaxed);
            j = pointers[j];
        }
    });

    // Stage 5: compaction. The exclusive scan of the 0/1 boundary flags
    // assigns each marked position its output slot; sums[n] is the factor
    // count (the sentinel flag at n is excluded by exclusivity).
    let flag_counts: Vec<usize> = flags
        .par_iter()
        .map(|f| f.load(Ordering::Relaxed) as usize)
        .collect();
    let sums = scan::exclusive_sum(&flag_counts);
    let total = sums[n];

    // Scatter. Positions are chunked, and chunk [lo, hi) owns exactly the
    // output slots sums[lo]..sums[hi], so the output vector splits into
    // disjoint per-chunk windows up front and every slot has one writer.
    let mut factors = vec![Factor { pos: 0, src: 0 }; total];
    let mut windows: Vec<(usize, usize, &mut [Factor])> = Vec::new();
    let mut rest: &mut [Factor] = &mut factors;
    let mut lo = 0;
    while lo < n {
        let hi = (lo + SCATTER_CHUNK).min(n);
        let (window, tail) = std::mem::take(&mut rest).split_at_mut(sums[hi] - sums[lo]);
        windows.push((lo, hi, window));
        rest = tail;
        lo = hi;
    }
    windows.into_par_iter().for_each(|(lo, hi, window)| {
        let mut slot = 0;
        for i in lo..hi {
            if sums[i] < sums[i + 1] {
                window[slot] = Factor {
                    pos: i,
                    src: prev_occ[i],
                };
                slot += 1;
            }
        }
    });

    factors
}
