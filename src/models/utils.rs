use candle_core::{DType, Result, Tensor, D};
use candle_nn::{Init, Linear, VarBuilder};

//
// Linear layer with Xavier-uniform initialisation
//
//   Glorot & Bengio (2010): Uniform(-a, a) with a = sqrt(6 / (fan_in + fan_out)).
//
pub(crate) fn xavier_linear(in_dim: usize, out_dim: usize, vs: VarBuilder) -> Result<Linear> {
    let bound = (6.0 / (in_dim + out_dim) as f64).sqrt();
    let init_ws = Init::Uniform {
        lo: -bound,
        up: bound,
    };
    let ws = vs.get_with_hints((out_dim, in_dim), "weight", init_ws)?;
    let bs = vs.get_with_hints(out_dim, "bias", Init::Const(0.0))?;
    Ok(Linear::new(ws, Some(bs)))
}

/// Fraction of rows whose argmax matches the one-hot target.
pub(crate) fn one_hot_accuracy(logits: &Tensor, labels: &Tensor) -> Result<f32> {
    logits
        .argmax(D::Minus1)?
        .eq(&labels.argmax(D::Minus1)?)?
        .to_dtype(DType::F32)?
        .mean_all()?
        .to_scalar::<f32>()
}

/// Class indices from one-hot rows.
pub(crate) fn one_hot_to_classes(labels: &Tensor) -> Result<Tensor> {
    labels.argmax(D::Minus1)
}

/// Gathers `values` rows for a `[n, width]` neighbor index tensor, zeroing
/// the padded slots via `mask`. Yields `[n, width, dim]`.
pub(crate) fn masked_gather(values: &Tensor, indices: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let (n, width) = indices.dims2()?;
    let dim = values.dim(1)?;
    let gathered = values
        .index_select(&indices.flatten_all()?, 0)?
        .reshape((n, width, dim))?;
    gathered.broadcast_mul(&mask.reshape((n, width, 1))?)
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    #[test]
    fn test_masked_gather_zeroes_padded_slots() -> Result<()> {
        let device = Device::Cpu;
        let values = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], (3, 2), &device)?;
        let indices = Tensor::from_vec(vec![1u32, 0, 2, 0], (2, 2), &device)?;
        let mask = Tensor::from_vec(vec![1.0f32, 0.0, 1.0, 1.0], (2, 2), &device)?;
        let gathered = masked_gather(&values, &indices, &mask)?;
        let entries = gathered.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(entries, vec![3.0, 4.0, 0.0, 0.0, 5.0, 6.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_one_hot_accuracy_counts_matches() -> Result<()> {
        let device = Device::Cpu;
        let logits = Tensor::from_vec(vec![0.9f32, 0.1, 0.2, 0.8], (2, 2), &device)?;
        let labels = Tensor::from_vec(vec![1.0f32, 0.0, 1.0, 0.0], (2, 2), &device)?;
        assert_eq!(one_hot_accuracy(&logits, &labels)?, 0.5);
        Ok(())
    }
}
