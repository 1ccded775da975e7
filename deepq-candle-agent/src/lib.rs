//! Action-value networks for deep Q-learning implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! [`QNetwork`] implements [`ValueFunction`](deepq_core::ValueFunction) with a
//! multilayer perceptron over the flattened stacked state.
pub mod mlp;
pub mod opt;
mod q_network;
pub mod util;
use anyhow::Result;
pub use mlp::{Activation, Mlp, MlpConfig};
pub use opt::{Optimizer, OptimizerConfig};
pub use q_network::{QNetwork, QNetworkConfig};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Opens the candle device.
    pub fn open(&self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(*n)?),
        }
    }
}
