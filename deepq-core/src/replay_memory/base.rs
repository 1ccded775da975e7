use super::{ReplayMemoryConfig, Transition, TransitionBatch};
use crate::{
    error::DeepQError, history::stack_frames, DataFormat, ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// The number of draws per sample before giving up on finding a valid window.
const MAX_DRAWS_PER_SAMPLE: usize = 1000;

/// Circular store of transitions with windowed sampling.
///
/// Transitions are kept in a struct-of-arrays layout over `capacity` slots.
/// `add` writes at the write cursor and advances it cyclically, overwriting the
/// oldest transition once the memory is full.
///
/// A sample is addressed by the slot `j` holding the last frame of its next
/// state. The state is made of the frames in slots `[j - h, j - 1]` and the
/// next state of the frames in slots `[j - h + 1, j]`, where `h` is the history
/// length. The action, reward and terminal flag are those of slot `j`.
/// `j` is drawn uniformly from `[h, count)` and rejected when the window
/// `[j - h, j]` contains the write cursor, since such a window would splice
/// the newest frames to the oldest ones. Terminal flags inside a window are
/// not checked; only the terminal flag of slot `j` gates bootstrapping.
///
/// # Examples
///
/// ```rust
/// use deepq_core::{ReplayMemory, ReplayMemoryConfig, ReplayBufferBase};
///
/// let config = ReplayMemoryConfig::default()
///     .capacity(10)
///     .history_length(2)
///     .obs_dim(1);
/// let mut memory = ReplayMemory::build(&config).unwrap();
/// for (k, o) in [1.0f32, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
///     memory.add(&[*o], if k == 4 { 1.0 } else { 0.0 }, 0, k == 4);
/// }
///
/// let batch = memory.batch_at(&[4]).unwrap();
/// assert_eq!(batch.states, vec![3.0, 4.0]);
/// assert_eq!(batch.next_states, vec![4.0, 5.0]);
/// assert_eq!(batch.rewards, vec![1.0]);
/// assert_eq!(batch.terminals, vec![true]);
/// ```
pub struct ReplayMemory {
    capacity: usize,
    history_length: usize,
    obs_dim: usize,
    data_format: DataFormat,

    observations: Vec<f32>,
    actions: Vec<usize>,
    rewards: Vec<f32>,
    terminals: Vec<bool>,

    /// Slot written by the next `add`.
    current: usize,

    /// The number of stored transitions, saturating at `capacity`.
    count: usize,

    rng: StdRng,
}

impl ReplayMemory {
    /// Appends a transition, overwriting the oldest one when the memory is full.
    ///
    /// The observation is copied. Panics if its length is not `obs_dim`.
    pub fn add(&mut self, observation: &[f32], reward: f32, action: usize, terminal: bool) {
        assert_eq!(
            observation.len(),
            self.obs_dim,
            "observation length does not match the replay memory"
        );
        let start = self.current * self.obs_dim;
        self.observations[start..start + self.obs_dim].copy_from_slice(observation);
        self.actions[self.current] = action;
        self.rewards[self.current] = reward;
        self.terminals[self.current] = terminal;

        self.count = self.capacity.min(self.count + 1);
        self.current = (self.current + 1) % self.capacity;
    }

    /// The number of stored transitions.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The slot written by the next `add`.
    pub fn write_cursor(&self) -> usize {
        self.current
    }

    /// The number of frames in a stacked state.
    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// The length of a stacked state.
    pub fn state_dim(&self) -> usize {
        self.history_length * self.obs_dim
    }

    /// The minimum number of stored transitions required by sampling.
    pub fn min_count(&self) -> usize {
        self.history_length + 1
    }

    fn frame(&self, slot: usize) -> &[f32] {
        &self.observations[slot * self.obs_dim..(slot + 1) * self.obs_dim]
    }

    fn transition_at(&self, slot: usize) -> Transition {
        Transition {
            observation: self.frame(slot).to_vec(),
            action: self.actions[slot],
            reward: self.rewards[slot],
            terminal: self.terminals[slot],
        }
    }

    /// Stored transitions in insertion order, oldest first.
    pub fn transitions(&self) -> Vec<Transition> {
        let oldest = if self.count == self.capacity {
            self.current
        } else {
            0
        };
        (0..self.count)
            .map(|k| self.transition_at((oldest + k) % self.capacity))
            .collect()
    }

    /// Returns `true` if the window ending at slot `ix` can be sampled.
    pub fn is_valid_index(&self, ix: usize) -> bool {
        if ix < self.history_length || ix >= self.count {
            return false;
        }
        !(ix >= self.current && ix - self.history_length < self.current)
    }

    /// Draws `batch_size` valid indices uniformly with replacement.
    pub fn sample_indices(&mut self, batch_size: usize) -> Result<Vec<usize>> {
        if self.count < self.min_count() {
            return Err(DeepQError::InsufficientHistory {
                count: self.count,
                required: self.min_count(),
            }
            .into());
        }

        let mut ixs = Vec::with_capacity(batch_size);
        while ixs.len() < batch_size {
            let mut n_draws = 0;
            let ix = loop {
                if n_draws == MAX_DRAWS_PER_SAMPLE {
                    return Err(DeepQError::NoValidWindow(n_draws).into());
                }
                n_draws += 1;
                let ix = self.rng.gen_range(self.history_length..self.count);
                if self.is_valid_index(ix) {
                    break ix;
                }
            };
            ixs.push(ix);
        }
        Ok(ixs)
    }

    /// Draws a random minibatch of `batch_size` transitions.
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch> {
        let ixs = self.sample_indices(batch_size)?;
        self.batch_at(&ixs)
    }

    /// Builds the minibatch of the given indices.
    ///
    /// Each index is the slot holding the last frame of the next state and
    /// must satisfy [`ReplayMemory::is_valid_index`].
    pub fn batch_at(&self, ixs: &[usize]) -> Result<TransitionBatch> {
        let state_dim = self.state_dim();
        let mut batch = TransitionBatch::zeros(ixs.len(), state_dim);

        for (i, &ix) in ixs.iter().enumerate() {
            ensure!(
                self.is_valid_index(ix),
                "index {} does not end a valid window (count = {}, write cursor = {})",
                ix,
                self.count,
                self.current
            );
            let h = self.history_length;
            stack_frames(
                (ix - h..ix).map(|slot| self.frame(slot)),
                self.obs_dim,
                self.data_format,
                &mut batch.states[i * state_dim..(i + 1) * state_dim],
            );
            stack_frames(
                (ix + 1 - h..=ix).map(|slot| self.frame(slot)),
                self.obs_dim,
                self.data_format,
                &mut batch.next_states[i * state_dim..(i + 1) * state_dim],
            );
            batch.actions[i] = self.actions[ix];
            batch.rewards[i] = self.rewards[ix];
            batch.terminals[i] = self.terminals[ix];
            batch.ixs[i] = ix;
        }

        Ok(batch)
    }
}

impl ExperienceBufferBase for ReplayMemory {
    type Item = Transition;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        ensure!(
            tr.observation.len() == self.obs_dim,
            DeepQError::DimensionMismatch {
                expected: self.obs_dim,
                actual: tr.observation.len()
            }
        );
        self.add(&tr.observation, tr.reward, tr.action, tr.terminal);
        Ok(())
    }

    fn len(&self) -> usize {
        self.count
    }
}

impl ReplayBufferBase for ReplayMemory {
    type Config = ReplayMemoryConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity;

        Ok(Self {
            capacity,
            history_length: config.history_length,
            obs_dim: config.obs_dim,
            data_format: config.data_format,
            observations: vec![0.0; capacity * config.obs_dim],
            actions: vec![0; capacity],
            rewards: vec![0.0; capacity],
            terminals: vec![false; capacity],
            current: 0,
            count: 0,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(capacity: usize, history_length: usize) -> ReplayMemory {
        let config = ReplayMemoryConfig::default()
            .capacity(capacity)
            .history_length(history_length)
            .obs_dim(1)
            .seed(7);
        ReplayMemory::build(&config).unwrap()
    }

    fn fill(memory: &mut ReplayMemory, n: usize) {
        for k in 0..n {
            memory.add(&[k as f32], k as f32 * 0.1, k % 3, false);
        }
    }

    #[test]
    fn test_build_rejects_small_capacity() {
        let config = ReplayMemoryConfig::default()
            .capacity(4)
            .history_length(2)
            .obs_dim(1);
        assert!(ReplayMemory::build(&config).is_err());
    }

    #[test]
    fn test_capacity_overwrites_oldest() {
        let mut memory = memory(5, 1);
        fill(&mut memory, 8);

        assert_eq!(memory.count(), 5);
        assert_eq!(memory.write_cursor(), 3);
        let observations: Vec<f32> = memory
            .transitions()
            .iter()
            .map(|tr| tr.observation[0])
            .collect();
        assert_eq!(observations, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_sample_before_enough_history_fails() {
        let mut memory = memory(10, 3);
        fill(&mut memory, 3);
        let err = memory.sample(1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DeepQError>(),
            Some(&DeepQError::InsufficientHistory {
                count: 3,
                required: 4
            })
        );
    }

    #[test]
    fn test_windows_near_write_cursor_are_invalid() {
        let mut memory = memory(8, 2);
        fill(&mut memory, 11);

        // Write cursor is at slot 3; windows [j - 2, j] containing slot 3 are rejected.
        assert_eq!(memory.write_cursor(), 3);
        assert!(!memory.is_valid_index(3));
        assert!(!memory.is_valid_index(4));
        assert!(memory.is_valid_index(2));
        assert!(memory.is_valid_index(5));
        assert!(!memory.is_valid_index(1));
        assert!(memory.batch_at(&[4]).is_err());
    }

    #[test]
    fn test_sampled_next_state_is_shifted_state() {
        let mut memory = memory(16, 3);
        fill(&mut memory, 40);

        let batch = memory.sample(64).unwrap();
        assert_eq!(batch.len(), 64);
        for i in 0..batch.len() {
            let state = batch.state(i);
            let next_state = batch.next_state(i);
            assert_eq!(state.len(), 3);
            assert_eq!(&state[1..], &next_state[..2]);
            assert_eq!(next_state[2], state[2] + 1.0);
            assert!(memory.is_valid_index(batch.ixs[i]));
        }
    }

    #[test]
    fn test_push_checks_observation_length() {
        let mut memory = memory(8, 1);
        let tr = Transition {
            observation: vec![2.0],
            action: 1,
            reward: 0.5,
            terminal: true,
        };
        memory.push(tr).unwrap();
        assert_eq!(ExperienceBufferBase::len(&memory), 1);
        assert_eq!(memory.transitions()[0].reward, 0.5);
        assert!(memory.transitions()[0].terminal);

        let err = memory
            .push(Transition {
                observation: vec![1.0, 2.0],
                action: 0,
                reward: 0.0,
                terminal: false,
            })
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DeepQError>(),
            Some(&DeepQError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(memory.count(), 1);
    }
}
