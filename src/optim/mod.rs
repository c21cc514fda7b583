pub mod adam;
pub mod sgd;

use serde::{Serialize, Deserialize};

use crate::network::Network;

pub use adam::Adam;
pub use sgd::Sgd;

/// Updates trainable tensors from accumulated gradients.
pub trait Optimizer {
    fn learning_rate(&self) -> f32;

    /// Called once per mini-batch, before the per-tensor `step`s.
    fn begin_step(&mut self) {}

    /// Updates `params` in place. `slot` identifies the tensor across calls
    /// so stateful optimizers can keep per-tensor moments; `grad_scale`
    /// turns accumulated sums into batch means.
    fn step(&mut self, slot: usize, params: &mut [f32], grads: &[f32], grad_scale: f32);
}

/// Applies one optimizer update to every trainable tensor of `network`.
pub fn apply(optimizer: &mut dyn Optimizer, network: &mut Network, grad_scale: f32) {
    optimizer.begin_step();
    let mut slot = 0;
    for layer in &mut network.layers {
        for (params, grads) in layer.params_and_grads() {
            optimizer.step(slot, params, grads, grad_scale);
            slot += 1;
        }
    }
}

/// Serializable optimizer choice, with the usual framework defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        learning_rate: f32,
    },
    Adam {
        learning_rate: f32,
        #[serde(default = "default_beta_1")]
        beta_1: f32,
        #[serde(default = "default_beta_2")]
        beta_2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
}

fn default_beta_1() -> f32 { 0.9 }
fn default_beta_2() -> f32 { 0.999 }
fn default_epsilon() -> f32 { 1e-7 }

impl OptimizerConfig {
    pub fn sgd() -> OptimizerConfig {
        OptimizerConfig::Sgd { learning_rate: 0.01 }
    }

    pub fn adam() -> OptimizerConfig {
        OptimizerConfig::Adam {
            learning_rate: 0.001,
            beta_1: default_beta_1(),
            beta_2: default_beta_2(),
            epsilon: default_epsilon(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        match *self {
            OptimizerConfig::Sgd { learning_rate } | OptimizerConfig::Adam { learning_rate, .. } => learning_rate,
        }
    }

    pub fn with_learning_rate(mut self, lr: f32) -> OptimizerConfig {
        match &mut self {
            OptimizerConfig::Sgd { learning_rate } | OptimizerConfig::Adam { learning_rate, .. } => *learning_rate = lr,
        }
        self
    }

    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerConfig::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate)),
            OptimizerConfig::Adam { learning_rate, beta_1, beta_2, epsilon } => {
                Box::new(Adam::new(learning_rate, beta_1, beta_2, epsilon))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json_with_defaults() {
        let cfg: OptimizerConfig =
            serde_json::from_str(r#"{"type":"adam","learning_rate":0.01}"#).unwrap();
        assert_eq!(cfg, OptimizerConfig::adam().with_learning_rate(0.01));
        assert_eq!(cfg.build().learning_rate(), 0.01);
    }
}
