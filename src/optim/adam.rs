//! Adam optimizer.

use ndarray::Array1;

use super::optimizer::{buffers_from_state, buffers_to_state, Optimizer, OptimizerState};
use crate::error::Result;
use crate::model::Param;

/// Adam with bias-corrected first and second moments.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>,
    v: Vec<Option<Array1<f32>>>,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Adam with the usual defaults (β1 = 0.9, β2 = 0.999, ε = 1e-8).
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    fn ensure_buffers(&mut self, params: &[Param]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Param]) {
        self.ensure_buffers(params);
        self.t += 1;

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);

        for (idx, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad().cloned() else {
                continue;
            };

            let m = match self.m[idx].take() {
                Some(m) => m * self.beta1 + &(grad.clone() * (1.0 - self.beta1)),
                None => grad.clone() * (1.0 - self.beta1),
            };
            let grad_sq = grad.mapv(|g| g * g);
            let v = match self.v[idx].take() {
                Some(v) => v * self.beta2 + &(grad_sq * (1.0 - self.beta2)),
                None => grad_sq * (1.0 - self.beta2),
            };

            {
                let data = param.data_mut();
                for ((d, &m_i), &v_i) in data.iter_mut().zip(m.iter()).zip(v.iter()) {
                    let m_hat = m_i / bias1;
                    let v_hat = v_i / bias2;
                    *d -= self.lr * m_hat / (v_hat.sqrt() + self.epsilon);
                }
            }

            self.m[idx] = Some(m);
            self.v[idx] = Some(v);
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
        state.buffers.insert("m".to_string(), buffers_to_state(&self.m));
        state.buffers.insert("v".to_string(), buffers_to_state(&self.v));
        state
    }

    fn load_state(&mut self, state: &OptimizerState) -> Result<()> {
        self.t = state.step_count;
        self.m = state
            .buffers
            .get("m")
            .map(|b| buffers_from_state(b))
            .unwrap_or_default();
        self.v = state
            .buffers
            .get("v")
            .map(|b| buffers_from_state(b))
            .unwrap_or_default();
        Ok(())
    }
}
