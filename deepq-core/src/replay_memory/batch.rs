//! Transitions and minibatches.

/// One environment step as stored in the replay memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation after the step.
    pub observation: Vec<f32>,

    /// Action taken.
    pub action: usize,

    /// Clipped reward.
    pub reward: f32,

    /// Flag denoting if the episode terminated at this step.
    pub terminal: bool,
}

/// A minibatch of `(s_t, a_t, r_t, s_t+1, terminal_t)`.
///
/// States are stacked observations flattened in row-major order, so `states`
/// and `next_states` hold `len() * state_dim` values.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// Stacked states.
    pub states: Vec<f32>,

    /// Actions.
    pub actions: Vec<usize>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Stacked next states.
    pub next_states: Vec<f32>,

    /// Terminal flags of the next states.
    pub terminals: Vec<bool>,

    /// Memory indices of the sampled transitions.
    pub ixs: Vec<usize>,

    /// The length of a stacked state.
    pub state_dim: usize,
}

impl TransitionBatch {
    /// Creates a batch of `batch_size` zeroed samples.
    pub(super) fn zeros(batch_size: usize, state_dim: usize) -> Self {
        Self {
            states: vec![0.0; batch_size * state_dim],
            actions: vec![0; batch_size],
            rewards: vec![0.0; batch_size],
            next_states: vec![0.0; batch_size * state_dim],
            terminals: vec![false; batch_size],
            ixs: vec![0; batch_size],
            state_dim,
        }
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the batch has no sample.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The stacked state of the `i`-th sample.
    pub fn state(&self, i: usize) -> &[f32] {
        &self.states[i * self.state_dim..(i + 1) * self.state_dim]
    }

    /// The stacked next state of the `i`-th sample.
    pub fn next_state(&self, i: usize) -> &[f32] {
        &self.next_states[i * self.state_dim..(i + 1) * self.state_dim]
    }

    /// Unpack the data `(s_t, a_t, r_t, s_t+1, terminal_t)`.
    pub fn unpack(self) -> (Vec<f32>, Vec<usize>, Vec<f32>, Vec<f32>, Vec<bool>) {
        (
            self.states,
            self.actions,
            self.rewards,
            self.next_states,
            self.terminals,
        )
    }
}
