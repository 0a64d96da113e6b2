//! # Padding and Device Placement
//!
//! Right-pads variable-length examples into rectangular batches.
//!
//! Host-side batches are [`ndarray`] arrays; [`to_device`] and friends move them
//! into `i64` [`Tensor`]s on a caller-chosen [`Device`].

use candle_core::{Device, Tensor};
use ndarray::{Array2, Array3, ArrayBase, Data, Dimension, s};

use crate::{
    errors::{FieldError, FieldResult},
    types::IndexType,
};

/// Pick the compute device: the first CUDA device if available, else the CPU.
///
/// Callers decide this once and pass the device to every `compose` call.
pub fn default_device() -> Device {
    match Device::cuda_if_available(0) {
        Ok(device) => device,
        Err(err) => {
            log::warn!("falling back to cpu: {err}");
            Device::Cpu
        }
    }
}

/// Right-pad 1-D sequences into a `(batch, max_len)` array.
///
/// ## Arguments
/// * `sequences` - the examples.
/// * `pad_index` - the fill value past each example's end.
/// * `total_length` - pad to at least this many columns.
pub fn pad_sequences<S: AsRef<[IndexType]>>(
    sequences: &[S],
    pad_index: IndexType,
    total_length: Option<usize>,
) -> FieldResult<Array2<IndexType>> {
    if sequences.is_empty() {
        return Err(FieldError::EmptyBatch);
    }
    let max_len = sequences
        .iter()
        .map(|seq| seq.as_ref().len())
        .max()
        .unwrap_or(0)
        .max(total_length.unwrap_or(0));

    let mut out = Array2::from_elem((sequences.len(), max_len), pad_index);
    for (mut row, seq) in out.rows_mut().into_iter().zip(sequences) {
        let seq = seq.as_ref();
        row.slice_mut(s![..seq.len()])
            .iter_mut()
            .zip(seq)
            .for_each(|(dst, &src)| *dst = src);
    }
    Ok(out)
}

/// Right-pad 2-D examples into a `(batch, max_rows, max_cols)` array.
pub fn pad_matrices(
    matrices: &[Array2<IndexType>],
    pad_index: IndexType,
) -> FieldResult<Array3<IndexType>> {
    if matrices.is_empty() {
        return Err(FieldError::EmptyBatch);
    }
    let rows = matrices.iter().map(|m| m.nrows()).max().unwrap_or(0);
    let cols = matrices.iter().map(|m| m.ncols()).max().unwrap_or(0);

    let mut out = Array3::from_elem((matrices.len(), rows, cols), pad_index);
    for (b, m) in matrices.iter().enumerate() {
        out.slice_mut(s![b, ..m.nrows(), ..m.ncols()]).assign(m);
    }
    Ok(out)
}

/// Move a host-side array into an `i64` tensor on `device`.
pub fn to_device<S, D>(
    array: &ArrayBase<S, D>,
    device: &Device,
) -> FieldResult<Tensor>
where
    S: Data<Elem = IndexType>,
    D: Dimension,
{
    let shape = array.shape().to_vec();
    let flat: Vec<IndexType> = array.iter().copied().collect();
    Ok(Tensor::from_vec(flat, shape, device)?)
}
