//! Configuration of [`ReplayMemory`](super::ReplayMemory).
use crate::{error::DeepQError, DataFormat};
use serde::{Deserialize, Serialize};

/// Configuration of [`ReplayMemory`](super::ReplayMemory).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReplayMemoryConfig {
    pub(super) capacity: usize,
    pub(super) history_length: usize,
    pub(super) obs_dim: usize,
    pub(super) data_format: DataFormat,
    pub(super) seed: u64,
}

impl Default for ReplayMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            history_length: 4,
            obs_dim: 1,
            data_format: DataFormat::ChannelsFirst,
            seed: 42,
        }
    }
}

impl ReplayMemoryConfig {
    /// Sets the capacity of the replay memory.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of observations in a stacked state.
    pub fn history_length(mut self, history_length: usize) -> Self {
        self.history_length = history_length;
        self
    }

    /// Sets the length of an observation.
    pub fn obs_dim(mut self, obs_dim: usize) -> Self {
        self.obs_dim = obs_dim;
        self
    }

    /// Sets the layout of sampled stacked states.
    pub fn data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that a memory built with this configuration can be sampled.
    ///
    /// Once the memory is full, the `history_length` slots after the write
    /// cursor cannot end a window, so the capacity must exceed twice the
    /// history length.
    pub fn validate(&self) -> Result<(), DeepQError> {
        if self.history_length == 0 {
            return Err(DeepQError::invalid_config("history_length", "must be positive"));
        }
        if self.obs_dim == 0 {
            return Err(DeepQError::invalid_config("obs_dim", "must be positive"));
        }
        if self.capacity <= 2 * self.history_length {
            return Err(DeepQError::invalid_config(
                "capacity",
                format!(
                    "{} must be larger than twice the history length {}",
                    self.capacity, self.history_length
                ),
            ));
        }
        Ok(())
    }
}
