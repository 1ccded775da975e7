//! Deep Q-learning agent.
mod base;
mod config;
mod report;
pub use base::{bellman_targets, clip_reward, DeepQ};
pub use config::DeepQConfig;
pub use report::{LearnOutput, StepReport};
