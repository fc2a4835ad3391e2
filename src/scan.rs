//! Exclusive prefix sums over integer slices.
//!
//! The parallel version is a blocked two-pass scan: sum each chunk
//! independently, scan the (small) chunk-sum array sequentially, then fill
//! every chunk from its running offset. Each pass is a flat data-parallel
//! loop; the join between passes orders the writes.

use rayon::prelude::*;

/// Chunk width for the blocked parallel scan.
const CHUNK: usize = 16 * 1024;

/// Inputs shorter than this are scanned sequentially; two parallel passes
/// over a handful of chunks cost more than they save.
const PARALLEL_CUTOFF: usize = 4 * CHUNK;

/// Compute the exclusive prefix sum of `values`.
///
/// `out[i]` is the sum of `values[..i]`; `out[0] == 0`. The output has the
/// same length as the input, so the grand total is
/// `out[len - 1] + values[len - 1]`.
pub fn exclusive_sum(values: &[usize]) -> Vec<usize> {
    if values.len() < PARALLEL_CUTOFF {
        return exclusive_sum_sequential(values);
    }

    // Pass 1: independent chunk totals.
    let chunk_sums: Vec<usize> = values
        .par_chunks(CHUNK)
        .map(|chunk| chunk.iter().sum())
        .collect();

    // The chunk-sum array is input_len / CHUNK entries; scan it in place.
    let offsets = exclusive_sum_sequential(&chunk_sums);

    // Pass 2: each chunk fills its output window from its offset.
    let mut out = vec![0usize; values.len()];
    out.par_chunks_mut(CHUNK)
        .zip(values.par_chunks(CHUNK))
        .zip(offsets.par_iter())
        .for_each(|((out_chunk, in_chunk), &offset)| {
            let mut running = offset;
            for (slot, &value) in out_chunk.iter_mut().zip(in_chunk) {
                *slot = running;
                running += value;
            }
        });

    out
}

/// Sequential exclusive prefix sum; reference for the parallel version and
/// the small-input path.
pub fn exclusive_sum_sequential(values: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(values.len());
    let mut running = 0usize;
    for &value in values {
        out.push(running);
        running += value;
    }
    out
}
