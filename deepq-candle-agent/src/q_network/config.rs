use crate::{Activation, Device, OptimizerConfig};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`QNetwork`](super::QNetwork).
pub struct QNetworkConfig {
    /// Length of a stacked state.
    pub state_dim: usize,

    /// The number of actions.
    pub action_size: usize,

    /// Sizes of the hidden layers.
    pub hidden_sizes: Vec<usize>,

    /// Activation function of the hidden layers.
    pub activation: Activation,

    /// Optimizer of the online network.
    pub opt_config: OptimizerConfig,

    /// Device.
    pub device: Device,
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self {
            state_dim: 0,
            action_size: 0,
            hidden_sizes: vec![50, 50, 50],
            activation: Activation::Sigmoid,
            opt_config: OptimizerConfig::default(),
            device: Device::Cpu,
        }
    }
}

impl QNetworkConfig {
    /// Sets the input and output dimensions.
    pub fn dims(mut self, state_dim: usize, action_size: usize) -> Self {
        self.state_dim = state_dim;
        self.action_size = action_size;
        self
    }

    /// Sets the sizes of the hidden layers.
    pub fn hidden_sizes(mut self, v: Vec<usize>) -> Self {
        self.hidden_sizes = v;
        self
    }

    /// Sets the activation function of the hidden layers.
    pub fn activation(mut self, v: Activation) -> Self {
        self.activation = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`QNetworkConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of QNetwork from {}", path_.display());
        Ok(b)
    }

    /// Saves [`QNetworkConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of QNetwork into {}", path_.display());
        Ok(())
    }
}
