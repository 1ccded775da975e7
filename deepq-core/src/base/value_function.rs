//! Action-value function approximator.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The role of a [`ValueFunction`] in the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Role {
    /// Parameters updated by gradient descent.
    Online,

    /// Frozen copy of the online parameters used for Bellman targets.
    Target,
}

impl Role {
    /// Name used in file names and log messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Target => "target",
        }
    }
}

/// Loss stabilization applied by [`ValueFunction::update`].
///
/// The two clipping strategies are not equivalent: `DeltaClip` clips the
/// TD-error before squaring it, `GradNormClip` rescales the gradients of the
/// unclipped squared error.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum Stabilization {
    /// Plain mean squared TD-error.
    None,

    /// TD-error clipped into `[min_delta, max_delta]` before squaring.
    DeltaClip {
        /// Lower bound of the TD-error.
        min_delta: f32,
        /// Upper bound of the TD-error.
        max_delta: f32,
    },

    /// Gradients rescaled so that their global L2 norm is at most `max_grad_norm`.
    GradNormClip {
        /// Maximum global gradient norm.
        max_grad_norm: f32,
    },
}

impl Default for Stabilization {
    fn default() -> Self {
        Self::DeltaClip {
            min_delta: -1.0,
            max_delta: 1.0,
        }
    }
}

/// A minibatch regression problem handed to [`ValueFunction::update`].
#[derive(Debug, Clone)]
pub struct UpdateRequest<'a> {
    /// Stacked states, `batch_size * state_dim` values in row-major order.
    pub states: &'a [f32],

    /// Actions taken in the states.
    pub actions: &'a [usize],

    /// Bellman targets for the taken actions.
    pub targets: &'a [f32],

    /// Learning rate of this update.
    pub learning_rate: f64,

    /// Loss stabilization.
    pub stabilization: Stabilization,
}

impl<'a> UpdateRequest<'a> {
    /// The number of samples in the request.
    pub fn batch_size(&self) -> usize {
        self.actions.len()
    }
}

/// Result of a gradient update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutput {
    /// Action-values of the batch before the update, `batch_size * action_size` values.
    pub q_values: Vec<f32>,

    /// Loss of the batch before the update.
    pub loss: f32,
}

/// Maps stacked observations to action-values.
///
/// The agent owns two structurally identical instances, one per [`Role`].
pub trait ValueFunction {
    /// File extension of saved parameters.
    const PARAMS_EXTENSION: &'static str = "params";

    /// The number of actions, i.e., the length of the output.
    fn action_size(&self) -> usize;

    /// The length of a stacked state, i.e., the length of the input.
    fn state_dim(&self) -> usize;

    /// Total number of scalar parameters.
    fn parameter_count(&self) -> usize;

    /// Action-values of a single stacked state.
    fn predict_values(&self, state: &[f32]) -> Result<Vec<f32>>;

    /// Greedy action for a single stacked state.
    fn predict_action(&self, state: &[f32]) -> Result<usize> {
        Ok(argmax(&self.predict_values(state)?))
    }

    /// Maximum action-value of each state in a batch of stacked states.
    fn predict_max_value(&self, states: &[f32]) -> Result<Vec<f32>>;

    /// Overwrites every parameter with the corresponding parameter of `other`.
    fn copy_parameters_from(&mut self, other: &Self) -> Result<()>
    where
        Self: Sized;

    /// Performs one gradient step on the squared error between the targets and
    /// the action-values of the taken actions.
    fn update(&mut self, request: &UpdateRequest) -> Result<UpdateOutput>;

    /// Saves the parameters to a file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from a file.
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// Index of the largest value, the first one on ties.
pub fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(i_max, v_max), (i, &v)| {
            if v > v_max {
                (i, v)
            } else {
                (i_max, v_max)
            }
        })
        .0
}
