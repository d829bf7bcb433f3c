//! AdamW optimizer (Adam with decoupled weight decay).

use ndarray::Array1;

use super::optimizer::{buffers_from_state, buffers_to_state, Optimizer, OptimizerState};
use crate::error::Result;
use crate::model::Param;

/// AdamW applies weight decay directly to the parameters instead of folding
/// it into the gradient:
///
/// θ_t = (1 - lr * λ) * θ_{t-1} - lr * m̂_t / (√v̂_t + ε)
pub struct AdamW {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>,
    v: Vec<Option<Array1<f32>>>,
}

impl AdamW {
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, weight_decay, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// AdamW with the usual defaults (weight_decay = 0.01).
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, 0.01)
    }

    fn ensure_buffers(&mut self, params: &[Param]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for AdamW {
    fn step(&mut self, params: &mut [Param]) {
        self.ensure_buffers(params);
        self.t += 1;

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);
        let decay = 1.0 - self.lr * self.weight_decay;

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
                    *d = *d * decay - self.lr * m_hat / (v_hat.sqrt() + self.epsilon);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_decay_shrinks_params_without_grad_signal() {
        // Zero gradient: the update is pure decay.
        let mut opt = AdamW::new(0.1, 0.9, 0.999, 1e-8, 0.5);
        let mut params = vec![Param::from_vec("w", vec![1.0])];
        params[0].set_grad(Array1::from_vec(vec![0.0]));

        opt.step(&mut params);

        // (1 - lr * wd) = 0.95
        assert!((params[0].data()[0] - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weight_decay_matches_adam() {
        use super::super::adam::Adam;

        let mut adamw = AdamW::new(0.01, 0.9, 0.999, 1e-8, 0.0);
        let mut adam = Adam::new(0.01, 0.9, 0.999, 1e-8);

        let mut p1 = vec![Param::from_vec("w", vec![0.4, -0.2])];
        let mut p2 = vec![Param::from_vec("w", vec![0.4, -0.2])];

        for _ in 0..5 {
            p1[0].set_grad(Array1::from_vec(vec![0.3, -0.1]));
            p2[0].set_grad(Array1::from_vec(vec![0.3, -0.1]));
            adamw.step(&mut p1);
            adam.step(&mut p2);
        }

        assert_eq!(p1[0].data().to_vec(), p2[0].data().to_vec());
    }

    #[test]
    fn test_state_roundtrip_is_identical() {
        let mut opt = AdamW::default_params(0.01);
        let mut params = vec![Param::from_vec("w", vec![0.5])];
        params[0].set_grad(Array1::from_vec(vec![0.1]));
        opt.step(&mut params);

        let state = opt.state();
        let mut restored = AdamW::default_params(0.01);
        restored.load_state(&state).unwrap();
        assert_eq!(restored.state(), state);
    }
}
