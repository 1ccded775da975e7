//! Configuration of [`DeepQ`](super::DeepQ).
use crate::{
    error::DeepQError, DataFormat, EpsilonGreedy, LearningRateSchedule, ReplayMemoryConfig,
    Schedule, Stabilization,
};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`DeepQ`](super::DeepQ).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DeepQConfig {
    /// The number of observations in a stacked state.
    pub history_length: usize,

    /// Capacity of the replay memory.
    pub memory_size: usize,

    /// Minibatch size.
    pub batch_size: usize,

    /// Layout of stacked states.
    pub data_format: DataFormat,

    /// Exploration probability at the start.
    pub ep_start: f64,

    /// Final exploration probability.
    pub ep_end: f64,

    /// Length of the exploration decay in steps.
    pub t_ep_end: usize,

    /// Learning is enabled after this step.
    pub t_learn_start: usize,

    /// Interval of gradient updates in steps.
    pub t_train_freq: usize,

    /// Interval of target synchronizations in steps.
    pub t_target_q_update_freq: usize,

    /// Discount factor.
    pub discount_r: f32,

    /// Lower bound of stored rewards.
    pub min_r: f32,

    /// Upper bound of stored rewards.
    pub max_r: f32,

    /// Loss stabilization.
    pub stabilization: Stabilization,

    /// Initial learning rate.
    pub learning_rate: f64,

    /// Lower bound of the learning rate.
    pub learning_rate_minimum: f64,

    /// Multiplicative decay of the learning rate per stair.
    pub learning_rate_decay: f64,

    /// Length of a learning rate stair in steps.
    pub learning_rate_decay_step: usize,

    /// If `true`, episodes start with [`Env::new_random_game`](crate::Env::new_random_game).
    pub random_start: bool,

    /// If `true`, the history window is refilled with the first observation of
    /// every new episode.
    pub reprime_history_on_reset: bool,

    /// Random seed of exploration and sampling.
    pub seed: u64,
}

impl Default for DeepQConfig {
    fn default() -> Self {
        Self {
            history_length: 1,
            memory_size: 1_000_000,
            batch_size: 32,
            data_format: DataFormat::ChannelsFirst,
            ep_start: 1.0,
            ep_end: 0.1,
            t_ep_end: 1_000_000,
            t_learn_start: 1000,
            t_train_freq: 4,
            t_target_q_update_freq: 10000,
            discount_r: 0.99,
            min_r: -1.0,
            max_r: 1.0,
            stabilization: Stabilization::default(),
            learning_rate: 7e-4,
            learning_rate_minimum: 2.5e-4,
            learning_rate_decay: 0.96,
            learning_rate_decay_step: 50000,
            random_start: false,
            reprime_history_on_reset: true,
            seed: 123,
        }
    }
}

impl DeepQConfig {
    /// Sets the number of observations in a stacked state.
    pub fn history_length(mut self, v: usize) -> Self {
        self.history_length = v;
        self
    }

    /// Sets the capacity of the replay memory.
    pub fn memory_size(mut self, v: usize) -> Self {
        self.memory_size = v;
        self
    }

    /// Sets the minibatch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the layout of stacked states.
    pub fn data_format(mut self, v: DataFormat) -> Self {
        self.data_format = v;
        self
    }

    /// Sets the exploration probabilities at the start and at the end of the decay.
    pub fn epsilon(mut self, ep_start: f64, ep_end: f64) -> Self {
        self.ep_start = ep_start;
        self.ep_end = ep_end;
        self
    }

    /// Sets the length of the exploration decay.
    pub fn t_ep_end(mut self, v: usize) -> Self {
        self.t_ep_end = v;
        self
    }

    /// Sets the step after which learning is enabled.
    pub fn t_learn_start(mut self, v: usize) -> Self {
        self.t_learn_start = v;
        self
    }

    /// Sets the interval of gradient updates.
    pub fn t_train_freq(mut self, v: usize) -> Self {
        self.t_train_freq = v;
        self
    }

    /// Sets the interval of target synchronizations.
    pub fn t_target_q_update_freq(mut self, v: usize) -> Self {
        self.t_target_q_update_freq = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_r(mut self, v: f32) -> Self {
        self.discount_r = v;
        self
    }

    /// Sets the bounds of stored rewards.
    pub fn reward_range(mut self, min_r: f32, max_r: f32) -> Self {
        self.min_r = min_r;
        self.max_r = max_r;
        self
    }

    /// Sets the loss stabilization.
    pub fn stabilization(mut self, v: Stabilization) -> Self {
        self.stabilization = v;
        self
    }

    /// Sets the initial learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the staircase decay of the learning rate.
    pub fn learning_rate_decay(mut self, decay: f64, decay_step: usize, minimum: f64) -> Self {
        self.learning_rate_decay = decay;
        self.learning_rate_decay_step = decay_step;
        self.learning_rate_minimum = minimum;
        self
    }

    /// Sets if episodes start from a randomized state.
    pub fn random_start(mut self, v: bool) -> Self {
        self.random_start = v;
        self
    }

    /// Sets if the history window is refilled at the start of every episode.
    pub fn reprime_history_on_reset(mut self, v: bool) -> Self {
        self.reprime_history_on_reset = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<(), DeepQError> {
        let check = |ok: bool, name: &str, reason: &str| {
            if ok {
                Ok(())
            } else {
                Err(DeepQError::invalid_config(name, reason))
            }
        };
        check(self.history_length > 0, "history_length", "must be positive")?;
        check(self.batch_size > 0, "batch_size", "must be positive")?;
        check(self.t_ep_end > 0, "t_ep_end", "must be positive")?;
        check(self.t_train_freq > 0, "t_train_freq", "must be positive")?;
        check(
            self.t_target_q_update_freq > 0,
            "t_target_q_update_freq",
            "must be positive",
        )?;
        check(
            self.learning_rate_decay_step > 0,
            "learning_rate_decay_step",
            "must be positive",
        )?;
        check(self.min_r <= self.max_r, "min_r", "must not exceed max_r")?;
        check(
            (0.0..=1.0).contains(&self.discount_r),
            "discount_r",
            "must be in [0, 1]",
        )?;
        check(
            self.memory_size > 2 * self.history_length,
            "memory_size",
            "must be larger than twice the history length",
        )?;
        if let Stabilization::DeltaClip {
            min_delta,
            max_delta,
        } = self.stabilization
        {
            check(min_delta <= max_delta, "min_delta", "must not exceed max_delta")?;
        }
        Ok(())
    }

    /// Exploration schedule.
    pub fn exploration(&self) -> EpsilonGreedy {
        EpsilonGreedy::default()
            .ep_start(self.ep_start)
            .ep_end(self.ep_end)
            .t_ep_end(self.t_ep_end)
            .t_learn_start(self.t_learn_start)
    }

    /// Learning and synchronization cadence.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            t_learn_start: self.t_learn_start,
            t_train_freq: self.t_train_freq,
            t_target_q_update_freq: self.t_target_q_update_freq,
        }
    }

    /// Learning rate schedule.
    pub fn learning_rate_schedule(&self) -> LearningRateSchedule {
        LearningRateSchedule {
            initial: self.learning_rate,
            minimum: self.learning_rate_minimum,
            decay: self.learning_rate_decay,
            decay_step: self.learning_rate_decay_step,
        }
    }

    /// Configuration of the replay memory for observations of length `obs_dim`.
    ///
    /// The memory's sampling rng is seeded apart from the agent's exploration rng.
    pub fn replay_memory_config(&self, obs_dim: usize) -> ReplayMemoryConfig {
        ReplayMemoryConfig::default()
            .capacity(self.memory_size)
            .history_length(self.history_length)
            .obs_dim(obs_dim)
            .data_format(self.data_format)
            .seed(self.seed.wrapping_add(1))
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DeepQ agent into {}", path_.display());
        Ok(())
    }

    /// Loads a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        info!("Load config of DeepQ agent from {}", path_.display());
        Ok(config)
    }
}
