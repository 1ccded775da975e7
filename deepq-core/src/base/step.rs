//! Environment step.
use super::Env;

/// Additional information to the observation and reward.
pub trait Info {}

impl Info for () {}

/// Represents an observation, reward and terminal flag `(o_t+1, r_t, terminal_t)`
/// with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step and at the
/// start of an episode. In the latter case the reward is zero and the terminal
/// flag is `false`.
pub struct Step<E: Env> {
    /// Observation.
    pub observation: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode is terminated.
    pub terminal: bool,

    /// Information defined by the environment.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(observation: Vec<f32>, reward: f32, terminal: bool, info: E::Info) -> Self {
        Step {
            observation,
            reward,
            terminal,
            info,
        }
    }
}
