//! Span pooling and pair merging over encoder hidden states.
//!
//! The encoder itself is external; this module consumes its output, a
//! `[seq_len, hidden]` matrix per example, reduces each span's token range
//! to one vector ([`pool_span`]) and the two span vectors to one feature
//! vector ([`merge_spans`]). Strategy dispatch is over the closed enums in
//! [`crate::config`], so an unknown strategy cannot reach this module; the
//! remaining failure modes (empty range, width mismatch, zero norm) are
//! explicit errors.

use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};

use crate::config::{MergeType, PoolType};
use crate::{Error, Result};

/// Reduce the hidden states of one token range `[start, end)` to a single
/// vector.
///
/// Output width is `hidden` for `mean`/`max`/`first` and `3 * hidden` for
/// `combined` (`[mean, max, first]`).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the range is empty or exceeds the
/// sequence length.
pub fn pool_span(
    hidden: ArrayView2<'_, f32>,
    start: usize,
    end: usize,
    pool: PoolType,
) -> Result<Array1<f32>> {
    if start >= end || end > hidden.nrows() {
        return Err(Error::invalid_input(format!(
            "span range [{start}, {end}) invalid for sequence of {} tokens",
            hidden.nrows()
        )));
    }
    let span = hidden.slice(s![start..end, ..]);

    let mean = || {
        span.mean_axis(Axis(0))
            .ok_or_else(|| Error::invalid_input("empty span in mean pooling"))
    };
    let max = || span.fold_axis(Axis(0), f32::NEG_INFINITY, |acc, v| acc.max(*v));
    let first = || hidden.row(start).to_owned();

    match pool {
        PoolType::Mean => mean(),
        PoolType::Max => Ok(max()),
        PoolType::First => Ok(first()),
        PoolType::Combined => {
            let mut combined = Vec::with_capacity(3 * hidden.ncols());
            combined.extend(mean()?.iter());
            combined.extend(max().iter());
            combined.extend(first().iter());
            Ok(Array1::from_vec(combined))
        }
    }
}

/// Merge the two pooled span vectors of one example into a single feature
/// vector.
///
/// Output width is the input width for `featwise_mul`/`featwise_mul_norm`,
/// doubled for `concat` and tripled for `combined`
/// (`[emb1, emb2, emb1 * emb2]`).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when an element-wise strategy is applied
/// to vectors of different widths, or when normalization meets a zero-norm
/// vector.
pub fn merge_spans(
    emb1: ArrayView1<'_, f32>,
    emb2: ArrayView1<'_, f32>,
    merge: MergeType,
) -> Result<Array1<f32>> {
    let elementwise = matches!(
        merge,
        MergeType::FeatwiseMul | MergeType::FeatwiseMulNorm | MergeType::Combined
    );
    if elementwise && emb1.len() != emb2.len() {
        return Err(Error::invalid_input(format!(
            "{merge} requires equal widths, got {} and {}",
            emb1.len(),
            emb2.len()
        )));
    }

    match merge {
        MergeType::FeatwiseMul => Ok(&emb1 * &emb2),
        MergeType::Concat => {
            let mut merged = Vec::with_capacity(emb1.len() + emb2.len());
            merged.extend(emb1.iter());
            merged.extend(emb2.iter());
            Ok(Array1::from_vec(merged))
        }
        MergeType::FeatwiseMulNorm => {
            let unit = |v: ArrayView1<'_, f32>| -> Result<Array1<f32>> {
                let norm = v.dot(&v).sqrt();
                if norm == 0.0 {
                    return Err(Error::invalid_input(
                        "featwise_mul_norm on a zero-norm vector",
                    ));
                }
                Ok(v.mapv(|x| x / norm))
            };
            Ok(unit(emb1)? * unit(emb2)?)
        }
        MergeType::Combined => {
            let mut merged = Vec::with_capacity(3 * emb1.len());
            merged.extend(emb1.iter());
            merged.extend(emb2.iter());
            merged.extend((&emb1 * &emb2).iter());
            Ok(Array1::from_vec(merged))
        }
    }
}

/// Pool both spans of one example and merge them: the per-example forward
/// path from hidden states to the classification head input.
///
/// `positions` is the feature record's position table; the first two slot
/// pairs are used, in slot order.
pub fn extract_pair_feature(
    hidden: ArrayView2<'_, f32>,
    positions: &[usize],
    pool: PoolType,
    merge: MergeType,
) -> Result<Array1<f32>> {
    if positions.len() < 4 {
        return Err(Error::invalid_input(format!(
            "position table needs at least 4 slots, got {}",
            positions.len()
        )));
    }
    let emb1 = pool_span(hidden, positions[0], positions[1], pool)?;
    let emb2 = pool_span(hidden, positions[2], positions[3], pool)?;
    merge_spans(emb1.view(), emb2.view(), merge)
}
