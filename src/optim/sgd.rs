//! SGD optimizer with optional momentum.

use ndarray::Array1;

use super::optimizer::{buffers_from_state, buffers_to_state, Optimizer, OptimizerState};
use crate::error::Result;
use crate::model::Param;

/// Stochastic gradient descent.
///
/// With momentum μ: v_t = μ * v_{t-1} + g_t, θ_t = θ_{t-1} - lr * v_t.
/// With μ = 0 this reduces to plain SGD.
pub struct Sgd {
    lr: f32,
    momentum: f32,
    t: u64,
    velocity: Vec<Option<Array1<f32>>>,
}

impl Sgd {
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self { lr, momentum, t: 0, velocity: Vec::new() }
    }

    fn ensure_buffers(&mut self, params: &[Param]) {
        if self.velocity.is_empty() {
            self.velocity = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [Param]) {
        self.ensure_buffers(params);
        self.t += 1;

        for (idx, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad().cloned() else {
                continue;
            };

            if self.momentum > 0.0 {
                let velocity = match self.velocity[idx].take() {
                    Some(v) => v * self.momentum + &grad,
                    None => grad.clone(),
                };
                param.data_mut().scaled_add(-self.lr, &velocity);
                self.velocity[idx] = Some(velocity);
            } else {
                param.data_mut().scaled_add(-self.lr, &grad);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn state(&self) -> OptimizerState {
        let mut state = OptimizerState { step_count: self.t, ..Default::default() };
        state
            .buffers
            .insert("velocity".to_string(), buffers_to_state(&self.velocity));
        state
    }

    fn load_state(&mut self, state: &OptimizerState) -> Result<()> {
        self.t = state.step_count;
        self.velocity = state
            .buffers
            .get("velocity")
            .map(|b| buffers_from_state(b))
            .unwrap_or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn param_with_grad(data: Vec<f32>, grad: Vec<f32>) -> Param {
        let mut p = Param::from_vec("w", data);
        p.set_grad(Array1::from_vec(grad));
        p
    }

    #[test]
    fn test_plain_sgd_step() {
        let mut opt = Sgd::new(0.1, 0.0);
        let mut params = vec![param_with_grad(vec![1.0, 2.0], vec![0.5, 1.0])];

        opt.step(&mut params);

        let data = params[0].data().to_vec();
        assert_abs_diff_eq!(data[0], 0.95, epsilon = 1e-6);
        assert_abs_diff_eq!(data[1], 1.9, epsilon = 1e-6);
    }

    #[test]
    fn test_momentum_accumulates() {
        let mut opt = Sgd::new(0.1, 0.9);
        let mut params = vec![param_with_grad(vec![0.0], vec![1.0])];

        // First step: v = 1.0, delta = -0.1.
        opt.step(&mut params);
        assert_abs_diff_eq!(params[0].data()[0], -0.1, epsilon = 1e-6);

        // Second step with the same gradient: v = 0.9 + 1.0 = 1.9.
        params[0].set_grad(Array1::from_vec(vec![1.0]));
        opt.step(&mut params);
        assert_abs_diff_eq!(params[0].data()[0], -0.29, epsilon = 1e-6);
    }

    #[test]
    fn test_no_grad_no_update() {
        let mut opt = Sgd::new(0.1, 0.0);
        let mut params = vec![Param::from_vec("w", vec![1.0])];

        opt.step(&mut params);
        assert_eq!(params[0].data()[0], 1.0);
    }

    #[test]
    fn test_state_roundtrip_is_identical() {
        let mut opt = Sgd::new(0.1, 0.9);
        let mut params = vec![param_with_grad(vec![0.0, 0.0], vec![0.3, -0.7])];
        opt.step(&mut params);

        let state = opt.state();
        let mut restored = Sgd::new(0.1, 0.9);
        restored.load_state(&state).unwrap();
        assert_eq!(restored.state(), state);
    }

    #[test]
    fn test_zero_grad_clears() {
        let mut opt = Sgd::new(0.1, 0.0);
        let mut params = vec![param_with_grad(vec![1.0], vec![1.0])];
        opt.zero_grad(&mut params);
        assert!(params[0].grad().is_none());
    }
}
