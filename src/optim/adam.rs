use crate::optim::Optimizer;

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone, Default)]
struct Moments {
    m: Vec<f32>,
    v: Vec<f32>,
}

/// Adam optimizer as described in [Adam: A Method for Stochastic
/// Optimization](https://arxiv.org/abs/1412.6980), with bias correction.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta_1: f32,
    pub beta_2: f32,
    pub epsilon: f32,
    time: i32,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta_1: f32, beta_2: f32, epsilon: f32) -> Adam {
        Adam { learning_rate, beta_1, beta_2, epsilon, time: 0, moments: Vec::new() }
    }
}

impl Optimizer for Adam {
    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn begin_step(&mut self) {
        self.time += 1;
    }

    fn step(&mut self, slot: usize, params: &mut [f32], grads: &[f32], grad_scale: f32) {
        if self.moments.len() <= slot {
            self.moments.resize_with(slot + 1, Moments::default);
        }
        let state = &mut self.moments[slot];
        if state.m.len() != params.len() {
            state.m = vec![0.0; params.len()];
            state.v = vec![0.0; params.len()];
        }

        let t = self.time.max(1);
        let lr_t = self.learning_rate * (1.0 - self.beta_2.powi(t)).sqrt()
            / (1.0 - self.beta_1.powi(t));

        for i in 0..params.len() {
            let g = grads[i] * grad_scale;
            state.m[i] = self.beta_1 * state.m[i] + (1.0 - self.beta_1) * g;
            state.v[i] = self.beta_2 * state.v[i] + (1.0 - self.beta_2) * g * g;
            params[i] -= lr_t * state.m[i] / (state.v[i].sqrt() + self.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_step_moves_by_learning_rate() {
        // With bias correction the first update is lr * g / |g| (up to epsilon).
        let mut adam = Adam::new(0.001, 0.9, 0.999, 1e-7);
        let mut w = [0.0, 0.0];
        adam.begin_step();
        adam.step(0, &mut w, &[3.0, -0.5], 1.0);
        assert_relative_eq!(w[0], -0.001, epsilon = 1e-6);
        assert_relative_eq!(w[1], 0.001, epsilon = 1e-6);
    }

    #[test]
    fn keeps_separate_state_per_slot() {
        let mut adam = Adam::new(0.1, 0.9, 0.999, 1e-7);
        let (mut a, mut b) = ([1.0], [1.0]);
        adam.begin_step();
        adam.step(0, &mut a, &[1.0], 1.0);
        adam.step(3, &mut b, &[1.0], 1.0);
        assert_eq!(a, b);
    }
}
