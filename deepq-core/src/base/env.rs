//! Environment.
use super::{Info, Step};
use anyhow::Result;

/// Represents an environment with a discrete action space.
///
/// Observations are flat `f32` vectors whose length is the product of
/// [`Env::observation_dims`].
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: u64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns its first step.
    fn new_game(&mut self) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Starts a new episode from a randomized initial state.
    ///
    /// Environments without a notion of random start fall back to [`Env::new_game`].
    fn new_random_game(&mut self) -> Result<Step<Self>>
    where
        Self: Sized,
    {
        self.new_game()
    }

    /// Performs an environment step.
    ///
    /// `is_training` lets the environment distinguish training episodes from
    /// evaluation episodes, e.g. for episode-level statistics.
    fn step(&mut self, action: usize, is_training: bool) -> Result<Step<Self>>
    where
        Self: Sized;

    /// The number of discrete actions.
    fn action_size(&self) -> usize;

    /// Shape of an observation.
    fn observation_dims(&self) -> &[usize];

    /// The number of elements in an observation.
    fn obs_dim(&self) -> usize {
        self.observation_dims().iter().product()
    }
}
