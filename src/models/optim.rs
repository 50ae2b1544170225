use candle_core::{Result, Tensor, Var};
use candle_nn::optim::Optimizer;

/// Settings for classic momentum SGD.
#[derive(Clone, Copy, Debug)]
pub struct ParamsMomentumSgd {
    pub lr: f64,
    pub momentum: f64,
}

impl Default for ParamsMomentumSgd {
    fn default() -> Self {
        Self {
            lr: 0.01,
            momentum: 0.9,
        }
    }
}

/// Momentum SGD: `v <- momentum * v + g`, then `w <- w - lr * v`.
///
/// Velocity buffers are allocated on the first step that produces a
/// gradient for a variable.
#[derive(Debug)]
pub struct MomentumSgd {
    vars: Vec<Var>,
    velocities: Vec<Option<Tensor>>,
    params: ParamsMomentumSgd,
}

impl Optimizer for MomentumSgd {
    type Config = ParamsMomentumSgd;

    fn new(vars: Vec<Var>, params: ParamsMomentumSgd) -> Result<Self> {
        let vars: Vec<_> = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .collect();
        let velocities = vec![None; vars.len()];
        Ok(Self {
            vars,
            velocities,
            params,
        })
    }

    fn learning_rate(&self) -> f64 {
        self.params.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.params.lr = lr;
    }

    fn step(&mut self, grads: &candle_core::backprop::GradStore) -> Result<()> {
        for (var, velocity) in self.vars.iter().zip(self.velocities.iter_mut()) {
            if let Some(grad) = grads.get(var) {
                let update = match velocity.as_ref() {
                    Some(prev) => ((prev * self.params.momentum)? + grad)?,
                    None => grad.clone(),
                };
                var.set(&var.sub(&(&update * self.params.lr)?)?)?;
                *velocity = Some(update);
            }
        }
        Ok(())
    }
}

impl MomentumSgd {
    pub fn momentum(&self) -> f64 {
        self.params.momentum
    }

    pub fn set_momentum(&mut self, momentum: f64) {
        self.params.momentum = momentum;
    }
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    #[test]
    fn test_momentum_carries_previous_update() -> Result<()> {
        let device = Device::Cpu;
        let var = Var::new(&[2.0f32], &device)?;
        let mut optimizer = MomentumSgd::new(
            vec![var.clone()],
            ParamsMomentumSgd {
                lr: 0.1,
                momentum: 0.9,
            },
        )?;

        // d/dx x^2 = 2x; first step has no velocity: 2 - 0.1 * 4 = 1.6
        let loss = var.as_tensor().sqr()?.sum_all()?;
        optimizer.backward_step(&loss)?;
        assert!((var.to_vec1::<f32>()?[0] - 1.6).abs() < 1e-6);

        // v = 0.9 * 4 + 3.2 = 6.8; 1.6 - 0.68 = 0.92
        let loss = var.as_tensor().sqr()?.sum_all()?;
        optimizer.backward_step(&loss)?;
        assert!((var.to_vec1::<f32>()?[0] - 0.92).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_zero_momentum_matches_plain_sgd() -> Result<()> {
        let device = Device::Cpu;
        let var = Var::new(&[1.0f32], &device)?;
        let mut optimizer = MomentumSgd::new(
            vec![var.clone()],
            ParamsMomentumSgd {
                lr: 0.5,
                momentum: 0.0,
            },
        )?;
        let loss = var.as_tensor().sqr()?.sum_all()?;
        optimizer.backward_step(&loss)?;
        let loss = var.as_tensor().sqr()?.sum_all()?;
        optimizer.backward_step(&loss)?;
        // 1.0 -> 0.0 -> 0.0
        assert!(var.to_vec1::<f32>()?[0].abs() < 1e-6);
        Ok(())
    }
}
