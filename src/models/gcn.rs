use candle_core::{Result, Tensor};
use candle_nn::{Init, VarBuilder};

/// Graph convolution over a precomputed dense propagation matrix:
/// `adj @ x @ W + b`.
pub struct DenseGcnConv {
    weight: Tensor,
    bias: Tensor,
}

impl DenseGcnConv {
    pub fn new(in_dim: usize, out_dim: usize, vs: VarBuilder) -> Result<Self> {
        // Xavier Uniform
        let bound = (6.0 / (in_dim + out_dim) as f64).sqrt();
        let weight = vs.get_with_hints(
            (in_dim, out_dim),
            "weight",
            Init::Uniform {
                lo: -bound,
                up: bound,
            },
        )?;
        let bias = vs.get_with_hints((1, out_dim), "bias", Init::Const(0.0))?;
        Ok(Self { weight, bias })
    }

    pub fn forward(&self, x: &Tensor, adj: &Tensor) -> Result<Tensor> {
        let support = x.matmul(&self.weight)?;
        adj.matmul(&support)?.broadcast_add(&self.bias)
    }
}

#[cfg(test)]
mod tests {
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    use super::*;

    #[test]
    fn test_identity_propagation_keeps_projection() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let conv = DenseGcnConv::new(3, 2, vs)?;
        let x = Tensor::from_vec(vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0], (2, 3), &device)?;
        let eye = Tensor::eye(2, DType::F32, &device)?;
        let averaged = Tensor::full(0.5f32, (2, 2), &device)?;
        let direct = conv.forward(&x, &eye)?;
        let mixed = conv.forward(&x, &averaged)?;
        assert_eq!(direct.dims(), &[2, 2]);
        // an averaging propagation matrix mixes both rows equally
        let mixed = mixed.to_vec2::<f32>()?;
        assert!((mixed[0][0] - mixed[1][0]).abs() < 1e-6);
        assert!((mixed[0][1] - mixed[1][1]).abs() < 1e-6);
        Ok(())
    }
}
