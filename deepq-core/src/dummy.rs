//! Deterministic collaborators used in tests.
use crate::{Env, Step, UpdateOutput, UpdateRequest, ValueFunction};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

/// An update received by [`DummyValueFunction`].
#[derive(Debug, Clone, PartialEq)]
pub struct DummyUpdate {
    /// Stacked states.
    pub states: Vec<f32>,
    /// Actions.
    pub actions: Vec<usize>,
    /// Bellman targets.
    pub targets: Vec<f32>,
    /// Learning rate.
    pub learning_rate: f64,
}

/// A value function whose action-values do not depend on the state.
///
/// The parameters are the action-values themselves. Entries of a lookup table
/// override them for specific states. An update moves the value of each taken
/// action towards its target by `learning_rate` times the TD-error.
#[derive(Debug, Clone)]
pub struct DummyValueFunction {
    action_size: usize,
    state_dim: usize,
    params: Vec<f32>,
    table: Vec<(Vec<f32>, Vec<f32>)>,
    updates: Vec<DummyUpdate>,
    n_copies: usize,
}

#[derive(Deserialize, Serialize)]
struct DummyParams {
    params: Vec<f32>,
}

impl DummyValueFunction {
    /// Creates a value function returning zeros.
    pub fn new(action_size: usize, state_dim: usize) -> Self {
        Self {
            action_size,
            state_dim,
            params: vec![0.0; action_size],
            table: vec![],
            updates: vec![],
            n_copies: 0,
        }
    }

    /// Sets the state-independent action-values.
    pub fn with_params(mut self, params: Vec<f32>) -> Self {
        assert_eq!(params.len(), self.action_size);
        self.params = params;
        self
    }

    /// Sets the action-values of a specific state.
    pub fn with_entry(mut self, state: Vec<f32>, values: Vec<f32>) -> Self {
        assert_eq!(state.len(), self.state_dim);
        assert_eq!(values.len(), self.action_size);
        self.table.push((state, values));
        self
    }

    /// The parameters.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Updates received so far.
    pub fn updates(&self) -> &[DummyUpdate] {
        &self.updates
    }

    /// The number of parameter copies received.
    pub fn n_copies(&self) -> usize {
        self.n_copies
    }

    fn values(&self, state: &[f32]) -> Vec<f32> {
        self.table
            .iter()
            .find(|(s, _)| s.as_slice() == state)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.params.clone())
    }
}

impl ValueFunction for DummyValueFunction {
    const PARAMS_EXTENSION: &'static str = "yaml";

    fn action_size(&self) -> usize {
        self.action_size
    }

    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn predict_values(&self, state: &[f32]) -> Result<Vec<f32>> {
        ensure!(state.len() == self.state_dim, "state length {}", state.len());
        Ok(self.values(state))
    }

    fn predict_max_value(&self, states: &[f32]) -> Result<Vec<f32>> {
        ensure!(states.len() % self.state_dim == 0, "states length {}", states.len());
        Ok(states
            .chunks(self.state_dim)
            .map(|s| {
                self.values(s)
                    .into_iter()
                    .fold(f32::NEG_INFINITY, f32::max)
            })
            .collect())
    }

    fn copy_parameters_from(&mut self, other: &Self) -> Result<()> {
        self.params.copy_from_slice(&other.params);
        self.table = other.table.clone();
        self.n_copies += 1;
        Ok(())
    }

    fn update(&mut self, request: &UpdateRequest) -> Result<UpdateOutput> {
        let batch_size = request.batch_size();
        ensure!(request.targets.len() == batch_size, "targets length");
        ensure!(request.states.len() == batch_size * self.state_dim, "states length");

        let mut q_values = Vec::with_capacity(batch_size * self.action_size);
        let mut loss = 0.0;
        let mut deltas = vec![];
        for (i, s) in request.states.chunks(self.state_dim).enumerate() {
            let values = self.values(s);
            let delta = request.targets[i] - values[request.actions[i]];
            loss += delta * delta;
            deltas.push(delta);
            q_values.extend(values);
        }
        for (delta, &a) in deltas.iter().zip(request.actions.iter()) {
            self.params[a] += request.learning_rate as f32 * delta;
        }

        self.updates.push(DummyUpdate {
            states: request.states.to_vec(),
            actions: request.actions.to_vec(),
            targets: request.targets.to_vec(),
            learning_rate: request.learning_rate,
        });

        Ok(UpdateOutput {
            q_values,
            loss: loss / batch_size as f32,
        })
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_yaml::to_writer(
            file,
            &DummyParams {
                params: self.params.clone(),
            },
        )?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let rdr = BufReader::new(File::open(path)?);
        let p: DummyParams = serde_yaml::from_reader(rdr)?;
        ensure!(p.params.len() == self.action_size, "parameter count mismatch");
        self.params = p.params;
        Ok(())
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Debug, Clone, PartialEq)]
pub struct DummyEnvConfig {
    /// The number of actions.
    pub action_size: usize,

    /// The length of an observation.
    pub obs_dim: usize,

    /// The number of steps of an episode.
    pub episode_length: usize,

    /// Raw rewards returned by the steps, cycled through.
    pub rewards: Vec<f32>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            action_size: 2,
            obs_dim: 1,
            episode_length: 5,
            rewards: vec![0.0],
        }
    }
}

/// A scripted environment.
///
/// The observation after the `k`-th step of the environment's lifetime is
/// `[k; obs_dim]`, so every frame in a replay memory can be traced back to the
/// step that produced it. The first observation of the `n`-th episode is
/// `[-n; obs_dim]`. Episodes end after `episode_length` steps.
pub struct DummyEnv {
    config: DummyEnvConfig,
    observation_dims: Vec<usize>,
    n_steps: usize,
    n_episode_steps: usize,
    actions: Vec<usize>,
    n_games: usize,
    n_random_games: usize,
}

impl DummyEnv {
    /// Actions received so far.
    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    /// The number of episodes started, including random starts.
    pub fn n_games(&self) -> usize {
        self.n_games
    }

    /// The number of episodes started with [`Env::new_random_game`].
    pub fn n_random_games(&self) -> usize {
        self.n_random_games
    }

    fn observation(&self) -> Vec<f32> {
        vec![self.n_steps as f32; self.config.obs_dim]
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Info = ();

    fn build(config: &Self::Config, _seed: u64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            observation_dims: vec![config.obs_dim],
            n_steps: 0,
            n_episode_steps: 0,
            actions: vec![],
            n_games: 0,
            n_random_games: 0,
        })
    }

    fn new_game(&mut self) -> Result<Step<Self>> {
        self.n_games += 1;
        self.n_episode_steps = 0;
        let observation = vec![-(self.n_games as f32); self.config.obs_dim];
        Ok(Step::new(observation, 0.0, false, ()))
    }

    fn new_random_game(&mut self) -> Result<Step<Self>> {
        self.n_random_games += 1;
        self.new_game()
    }

    fn step(&mut self, action: usize, _is_training: bool) -> Result<Step<Self>> {
        ensure!(action < self.config.action_size, "invalid action {}", action);
        let reward = self.config.rewards[self.n_steps % self.config.rewards.len()];
        self.actions.push(action);
        self.n_steps += 1;
        self.n_episode_steps += 1;
        let terminal = self.n_episode_steps >= self.config.episode_length;
        Ok(Step::new(self.observation(), reward, terminal, ()))
    }

    fn action_size(&self) -> usize {
        self.config.action_size
    }

    fn observation_dims(&self) -> &[usize] {
        &self.observation_dims
    }
}
