use super::{DeepQConfig, LearnOutput, StepReport};
use crate::{
    error::DeepQError, Env, EpsilonGreedy, HistoryBuffer, LearningRateSchedule, ReplayBufferBase,
    ReplayMemory, Role, Schedule, Step, TargetSync, TrainingClock, UpdateRequest, ValueFunction,
};
use anyhow::Result;
use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Clips a reward into `[min_r, max_r]`.
pub fn clip_reward(reward: f32, min_r: f32, max_r: f32) -> f32 {
    reward.max(min_r).min(max_r)
}

/// Bellman targets `r + (1 - terminal) * discount * max_q_next`.
///
/// Terminal transitions do not bootstrap, so their target is the reward alone.
pub fn bellman_targets(
    rewards: &[f32],
    terminals: &[bool],
    max_q_next: &[f32],
    discount_r: f32,
) -> Vec<f32> {
    rewards
        .iter()
        .zip(terminals.iter())
        .zip(max_q_next.iter())
        .map(|((&r, &terminal), &q)| if terminal { r } else { r + discount_r * q })
        .collect()
}

/// Deep Q-learning agent.
///
/// The agent owns the environment, the online and target value functions,
/// the replay memory and the history window. [`DeepQ::begin`] must be called
/// once before stepping; it synchronizes the target network and primes the
/// history window with the first observation of an episode.
///
/// Timing decisions are taken from the [`TrainingClock`] given to
/// [`DeepQ::step`]; the caller advances the clock.
pub struct DeepQ<E, V>
where
    E: Env,
    V: ValueFunction,
{
    config: DeepQConfig,
    env: E,
    online: V,
    target: V,
    target_sync: TargetSync,
    memory: ReplayMemory,
    history: HistoryBuffer,
    exploration: EpsilonGreedy,
    schedule: Schedule,
    lr_schedule: LearningRateSchedule,
    rng: StdRng,
    n_episodes: usize,
}

impl<E, V> DeepQ<E, V>
where
    E: Env,
    V: ValueFunction,
{
    /// Constructs the agent.
    ///
    /// The value functions must take stacked states of length
    /// `history_length * env.obs_dim()` and return `env.action_size()` values.
    pub fn build(config: DeepQConfig, env: E, online: V, target: V) -> Result<Self> {
        config.validate()?;
        let obs_dim = env.obs_dim();
        let state_dim = config.history_length * obs_dim;
        if online.state_dim() != state_dim {
            return Err(DeepQError::DimensionMismatch {
                expected: state_dim,
                actual: online.state_dim(),
            }
            .into());
        }
        if online.action_size() != env.action_size() {
            return Err(DeepQError::DimensionMismatch {
                expected: env.action_size(),
                actual: online.action_size(),
            }
            .into());
        }

        let mut target_sync = TargetSync::new();
        target_sync.bind(&online, &target)?;
        let memory = ReplayMemory::build(&config.replay_memory_config(obs_dim))?;
        let history = HistoryBuffer::new(config.history_length, obs_dim, config.data_format);
        info!(
            "Build DeepQ agent: state_dim = {}, action_size = {}, parameters = {}",
            state_dim,
            online.action_size(),
            online.parameter_count()
        );

        Ok(Self {
            exploration: config.exploration(),
            schedule: config.schedule(),
            lr_schedule: config.learning_rate_schedule(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            env,
            online,
            target,
            target_sync,
            memory,
            history,
            n_episodes: 0,
        })
    }

    /// Synchronizes the target network and starts the first episode.
    pub fn begin(&mut self) -> Result<()> {
        self.update_target_q_network()?;
        let step = self.new_game()?;
        self.history.fill(&step.observation);
        Ok(())
    }

    fn new_game(&mut self) -> Result<Step<E>> {
        self.n_episodes += 1;
        if self.config.random_start {
            self.env.new_random_game()
        } else {
            self.env.new_game()
        }
    }

    /// Exploration probability at the clock.
    pub fn epsilon(&self, clock: &TrainingClock) -> f64 {
        self.exploration.epsilon(clock.t())
    }

    /// Selects an action for a stacked state, at random with probability `ep`.
    pub fn predict(&mut self, state: &[f32], ep: f64) -> Result<usize> {
        if EpsilonGreedy::is_random(ep, &mut self.rng) {
            Ok(self.rng.gen_range(0..self.env.action_size()))
        } else {
            self.online.predict_action(state)
        }
    }

    /// Performs one step of the training loop at the clock.
    ///
    /// Selects an action, executes it, stores the transition and, depending on
    /// the clock, updates the online network and synchronizes the target
    /// network. A terminal step starts a new episode.
    pub fn step(&mut self, clock: &TrainingClock) -> Result<StepReport> {
        let ep = self.epsilon(clock);
        let state = self.history.get();
        let action = self.predict(&state, ep)?;
        let step = self.env.step(action, true)?;
        let (learned, synced) = self.observe(
            clock,
            &step.observation,
            step.reward,
            action,
            step.terminal,
        )?;
        trace!(
            "t = {}, action = {}, reward = {}, terminal = {}",
            clock.t(),
            action,
            step.reward,
            step.terminal
        );

        if step.terminal {
            let first = self.new_game()?;
            if self.config.reprime_history_on_reset {
                self.history.fill(&first.observation);
            }
            debug!("Start episode {} at t = {}", self.n_episodes, clock.t());
        }

        Ok(StepReport {
            t: clock.t(),
            action,
            reward: step.reward,
            terminal: step.terminal,
            epsilon: ep,
            q_values: learned.q_values,
            loss: learned.loss,
            updated: learned.updated,
            learning_rate: learned.learning_rate,
            synced,
        })
    }

    /// Stores a transition and performs the updates due at the clock.
    ///
    /// Returns the outcome of the minibatch update and whether the target
    /// network was synchronized.
    pub fn observe(
        &mut self,
        clock: &TrainingClock,
        observation: &[f32],
        reward: f32,
        action: usize,
        terminal: bool,
    ) -> Result<(LearnOutput, bool)> {
        let reward = clip_reward(reward, self.config.min_r, self.config.max_r);
        self.history.add(observation);
        self.memory.add(observation, reward, action, terminal);

        let mut learned = LearnOutput::skipped();
        let mut synced = false;
        if self.schedule.is_train_step(clock) {
            learned = self.q_learning_minibatch(clock)?;
        }
        if self.schedule.is_sync_step(clock) {
            self.update_target_q_network()?;
            synced = true;
        }
        Ok((learned, synced))
    }

    /// Performs one gradient update on a minibatch sampled from the replay memory.
    ///
    /// Returns [`LearnOutput::skipped`] while the memory holds too few
    /// transitions to build a window.
    pub fn q_learning_minibatch(&mut self, clock: &TrainingClock) -> Result<LearnOutput> {
        if self.memory.count() < self.memory.min_count() {
            return Ok(LearnOutput::skipped());
        }

        let batch = self.memory.batch(self.config.batch_size)?;
        let max_q_next = self.target.predict_max_value(&batch.next_states)?;
        let targets = bellman_targets(
            &batch.rewards,
            &batch.terminals,
            &max_q_next,
            self.config.discount_r,
        );
        let learning_rate = self.lr_schedule.learning_rate(clock);
        let output = self.online.update(&UpdateRequest {
            states: &batch.states,
            actions: &batch.actions,
            targets: &targets,
            learning_rate,
            stabilization: self.config.stabilization,
        })?;

        if !output.loss.is_finite() {
            warn!("Non-finite loss {} at t = {}", output.loss, clock.t());
        }

        Ok(LearnOutput {
            q_values: output.q_values,
            loss: output.loss,
            updated: true,
            learning_rate: Some(learning_rate),
        })
    }

    /// Copies the online parameters into the target network.
    pub fn update_target_q_network(&mut self) -> Result<()> {
        self.target_sync.sync(&self.online, &mut self.target)
    }

    /// Saves the parameters of both networks in a directory.
    pub fn save_params<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.online.save(&Self::params_path(&path, Role::Online))?;
        self.target.save(&Self::params_path(&path, Role::Target))?;
        Ok(())
    }

    /// Loads the parameters of both networks from a directory.
    pub fn load_params<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.online.load(&Self::params_path(&path, Role::Online))?;
        self.target.load(&Self::params_path(&path, Role::Target))?;
        Ok(())
    }

    /// File of the parameters of the network with the given role in a directory.
    pub fn params_path<T: AsRef<Path>>(path: T, role: Role) -> PathBuf {
        path.as_ref()
            .join(format!("{}.{}", role.as_str(), V::PARAMS_EXTENSION))
    }

    /// Configuration.
    pub fn config(&self) -> &DeepQConfig {
        &self.config
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The online value function.
    pub fn online(&self) -> &V {
        &self.online
    }

    /// The target value function.
    pub fn target(&self) -> &V {
        &self.target
    }

    /// The replay memory.
    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// The history window.
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// The target synchronizer.
    pub fn target_sync(&self) -> &TargetSync {
        &self.target_sync
    }

    /// The number of episodes started.
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_reward() {
        assert_eq!(clip_reward(5.0, -1.0, 1.0), 1.0);
        assert_eq!(clip_reward(-5.0, -1.0, 1.0), -1.0);
        assert_eq!(clip_reward(0.25, -1.0, 1.0), 0.25);
    }

    #[test]
    fn test_bellman_targets() {
        let targets = bellman_targets(&[1.0, 0.5], &[true, false], &[100.0, 2.0], 0.5);
        assert_eq!(targets, vec![1.0, 1.5]);
    }
}
