//! Optimizers.
use anyhow::Result;
use candle_core::{backprop::GradStore, Var};
use candle_nn::Optimizer as _;
use candle_optimisers::{
    adam::{Adam, ParamsAdam},
    rmsprop::{ParamsRMSprop, RMSprop},
};
use serde::{Deserialize, Serialize};

/// Configuration of the optimizer of the online network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// RMSProp optimizer.
    RmsProp {
        /// Learning rate.
        lr: f64,
        /// Decay of the moving average of squared gradients.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Term added to the denominator.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Momentum, `0` disables it.
        #[serde(default = "default_momentum")]
        momentum: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn default_alpha() -> f64 {
    0.99
}

fn default_eps() -> f64 {
    0.01
}

fn default_momentum() -> f64 {
    0.95
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::RmsProp {
            lr: 7e-4,
            alpha: default_alpha(),
            eps: default_eps(),
            momentum: default_momentum(),
        }
    }
}

impl OptimizerConfig {
    /// Constructs the optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::RmsProp {
                lr,
                alpha,
                eps,
                momentum,
            } => {
                let params = ParamsRMSprop {
                    lr: *lr,
                    alpha: *alpha,
                    eps: *eps,
                    momentum: if *momentum > 0.0 { Some(*momentum) } else { None },
                    ..ParamsRMSprop::default()
                };
                let opt = RMSprop::new(vars, params)?;
                Ok(Optimizer::RmsProp(opt))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::RmsProp {
                lr: _,
                alpha,
                eps,
                momentum,
            } => Self::RmsProp {
                lr,
                alpha,
                eps,
                momentum,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of the optimizers of `candle-optimisers`.
pub enum Optimizer {
    /// RMSProp optimizer.
    RmsProp(RMSprop),

    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Updates the variables with the given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::RmsProp(opt) => Ok(opt.step(grads)?),
            Self::Adam(opt) => Ok(opt.step(grads)?),
        }
    }

    /// Sets the learning rate of the next steps.
    pub fn set_learning_rate(&mut self, lr: f64) {
        match self {
            Self::RmsProp(opt) => opt.set_learning_rate(lr),
            Self::Adam(opt) => opt.set_learning_rate(lr),
        }
    }

    /// The current learning rate.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::RmsProp(opt) => opt.learning_rate(),
            Self::Adam(opt) => opt.learning_rate(),
        }
    }
}
