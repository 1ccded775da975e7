//! A one-dimensional corridor.
//!
//! The agent starts at the leftmost cell and is rewarded when it reaches the
//! rightmost one. Each cell is observed as a one-hot vector.
use anyhow::Result;
use deepq_core::{Env, Step};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Moves one cell to the left.
pub const LEFT: usize = 0;

/// Moves one cell to the right.
pub const RIGHT: usize = 1;

/// Stays in the current cell.
pub const NOOP: usize = 2;

/// Configuration of [`Corridor`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CorridorConfig {
    /// Shape of an observation. The corridor has as many cells as an observation has elements.
    pub observation_dims: Vec<usize>,

    /// The number of times each action is repeated.
    pub n_action_repeat: usize,

    /// The maximum number of no-op actions of [`Env::new_random_game`].
    pub max_random_start: usize,

    /// Episodes are terminated after this number of steps.
    pub max_episode_steps: usize,

    /// Reward of reaching the rightmost cell.
    pub goal_reward: f32,

    /// Reward of every other step.
    pub step_reward: f32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            observation_dims: vec![10],
            n_action_repeat: 1,
            max_random_start: 30,
            max_episode_steps: 40,
            goal_reward: 1.0,
            step_reward: -0.01,
        }
    }
}

impl CorridorConfig {
    /// Sets the shape of an observation, and the episode length to four times the number of cells.
    pub fn observation_dims(mut self, v: Vec<usize>) -> Self {
        self.max_episode_steps = 4 * v.iter().product::<usize>();
        self.observation_dims = v;
        self
    }

    /// Sets the number of times each action is repeated.
    pub fn n_action_repeat(mut self, v: usize) -> Self {
        self.n_action_repeat = v;
        self
    }

    /// Sets the maximum number of no-op actions at the start of an episode.
    pub fn max_random_start(mut self, v: usize) -> Self {
        self.max_random_start = v;
        self
    }

    /// Sets the maximum episode length.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// The number of cells.
    pub fn n_cells(&self) -> usize {
        self.observation_dims.iter().product()
    }
}

/// The corridor environment.
pub struct Corridor {
    config: CorridorConfig,
    position: usize,
    n_steps: usize,
    rng: StdRng,
}

impl Corridor {
    /// The current cell.
    pub fn position(&self) -> usize {
        self.position
    }

    fn observation(&self) -> Vec<f32> {
        let mut obs = vec![0.0; self.config.n_cells()];
        obs[self.position] = 1.0;
        obs
    }

    fn is_goal(&self) -> bool {
        self.position + 1 == self.config.n_cells()
    }

    // Single move without action repeat.
    fn act(&mut self, action: usize) -> (f32, bool) {
        match action {
            LEFT => self.position = self.position.saturating_sub(1),
            RIGHT => self.position = (self.position + 1).min(self.config.n_cells() - 1),
            _ => {}
        }
        self.n_steps += 1;

        if self.is_goal() {
            (self.config.goal_reward, true)
        } else {
            (
                self.config.step_reward,
                self.n_steps >= self.config.max_episode_steps,
            )
        }
    }
}

impl Env for Corridor {
    type Config = CorridorConfig;
    type Info = ();

    fn build(config: &Self::Config, seed: u64) -> Result<Self> {
        anyhow::ensure!(config.n_cells() >= 2, "a corridor needs at least two cells");
        anyhow::ensure!(config.n_action_repeat > 0, "n_action_repeat must be positive");
        anyhow::ensure!(
            config.max_episode_steps > 0,
            "max_episode_steps must be positive"
        );
        Ok(Self {
            config: config.clone(),
            position: 0,
            n_steps: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn new_game(&mut self) -> Result<Step<Self>> {
        self.position = 0;
        self.n_steps = 0;
        Ok(Step::new(self.observation(), 0.0, false, ()))
    }

    fn new_random_game(&mut self) -> Result<Step<Self>> {
        let step = self.new_game()?;
        if self.config.max_random_start == 0 {
            return Ok(step);
        }
        let n_noops = self.rng.gen_range(0..self.config.max_random_start);
        trace!("Random start with {} no-op actions", n_noops);
        for _ in 0..n_noops {
            let step = self.step(NOOP, true)?;
            if step.terminal {
                return self.new_game();
            }
        }
        // The step counter of the episode starts after the no-op actions.
        self.n_steps = 0;
        Ok(Step::new(self.observation(), 0.0, false, ()))
    }

    fn step(&mut self, action: usize, _is_training: bool) -> Result<Step<Self>> {
        anyhow::ensure!(action < self.action_size(), "invalid action: {}", action);
        let mut reward = 0.0;
        let mut terminal = false;
        for _ in 0..self.config.n_action_repeat {
            let (r, t) = self.act(action);
            reward += r;
            terminal = t;
            if terminal {
                break;
            }
        }
        Ok(Step::new(self.observation(), reward, terminal, ()))
    }

    fn action_size(&self) -> usize {
        3
    }

    fn observation_dims(&self) -> &[usize] {
        &self.config.observation_dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor(n_cells: usize) -> Corridor {
        let config = CorridorConfig::default().observation_dims(vec![n_cells]);
        Corridor::build(&config, 0).unwrap()
    }

    #[test]
    fn test_walk_to_goal() {
        let mut env = corridor(4);
        let step = env.new_game().unwrap();
        assert_eq!(step.observation, vec![1.0, 0.0, 0.0, 0.0]);

        let step = env.step(LEFT, true).unwrap();
        assert_eq!(env.position(), 0);
        assert_eq!(step.reward, -0.01);
        assert!(!step.terminal);

        env.step(RIGHT, true).unwrap();
        env.step(RIGHT, true).unwrap();
        let step = env.step(RIGHT, true).unwrap();
        assert_eq!(step.observation, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(step.reward, 1.0);
        assert!(step.terminal);
    }

    #[test]
    fn test_episode_is_truncated() {
        let config = CorridorConfig::default()
            .observation_dims(vec![5])
            .max_episode_steps(3);
        let mut env = Corridor::build(&config, 0).unwrap();
        env.new_game().unwrap();
        assert!(!env.step(NOOP, true).unwrap().terminal);
        assert!(!env.step(NOOP, true).unwrap().terminal);
        assert!(env.step(NOOP, true).unwrap().terminal);
    }

    #[test]
    fn test_action_repeat() {
        let config = CorridorConfig::default()
            .observation_dims(vec![6])
            .n_action_repeat(2);
        let mut env = Corridor::build(&config, 0).unwrap();
        env.new_game().unwrap();
        let step = env.step(RIGHT, true).unwrap();
        assert_eq!(env.position(), 2);
        assert!((step.reward + 0.02).abs() < 1e-6);

        // Repeats stop at the goal.
        env.step(RIGHT, true).unwrap();
        let step = env.step(RIGHT, true).unwrap();
        assert_eq!(env.position(), 5);
        assert!((step.reward - 1.0).abs() < 1e-6);
        assert!(step.terminal);
    }

    #[test]
    fn test_random_start_keeps_position() {
        let config = CorridorConfig::default()
            .observation_dims(vec![3])
            .max_random_start(5);
        let mut env = Corridor::build(&config, 7).unwrap();
        let step = env.new_random_game().unwrap();
        assert_eq!(step.observation, vec![1.0, 0.0, 0.0]);
        assert!(!step.terminal);
    }

    #[test]
    fn test_invalid_action() {
        let mut env = corridor(3);
        env.new_game().unwrap();
        assert!(env.step(3, true).is_err());
    }

    #[test]
    fn test_too_short() {
        let config = CorridorConfig::default().observation_dims(vec![1]);
        assert!(Corridor::build(&config, 0).is_err());
    }
}
