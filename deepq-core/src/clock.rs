//! Global step counter and the timing decisions derived from it.
use serde::{Deserialize, Serialize};

/// The global step counter.
///
/// Every timing decision of the agent is a function of the clock passed to it,
/// and the training loop advances the clock exactly once per iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct TrainingClock {
    t: usize,
}

impl TrainingClock {
    /// Creates a clock at step `start_t`.
    pub fn new(start_t: usize) -> Self {
        Self { t: start_t }
    }

    /// The current step.
    pub fn t(&self) -> usize {
        self.t
    }

    /// Advances the clock by one step.
    pub fn tick(&mut self) {
        self.t += 1;
    }
}

/// Learning and synchronization cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Schedule {
    /// Learning is enabled for steps strictly after this one.
    pub t_learn_start: usize,

    /// Interval of gradient updates in steps.
    pub t_train_freq: usize,

    /// Interval of target synchronizations in steps.
    pub t_target_q_update_freq: usize,
}

impl Schedule {
    /// Returns `true` if learning is enabled at the clock.
    pub fn is_learning(&self, clock: &TrainingClock) -> bool {
        clock.t() > self.t_learn_start
    }

    /// Returns `true` if a gradient update is due at the clock.
    pub fn is_train_step(&self, clock: &TrainingClock) -> bool {
        self.is_learning(clock) && clock.t() % self.t_train_freq == 0
    }

    /// Returns `true` if a target synchronization is due at the clock.
    pub fn is_sync_step(&self, clock: &TrainingClock) -> bool {
        self.is_learning(clock)
            && clock.t() % self.t_target_q_update_freq == self.t_target_q_update_freq - 1
    }
}

/// Exponentially decayed learning rate with a floor.
///
/// `lr(t) = max(minimum, initial * decay ^ floor(t / decay_step))`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LearningRateSchedule {
    /// Learning rate at step 0.
    pub initial: f64,

    /// Lower bound.
    pub minimum: f64,

    /// Multiplicative decay per stair.
    pub decay: f64,

    /// Length of a stair in steps.
    pub decay_step: usize,
}

impl LearningRateSchedule {
    /// Learning rate at the clock.
    pub fn learning_rate(&self, clock: &TrainingClock) -> f64 {
        let n_stairs = (clock.t() / self.decay_step) as i32;
        (self.initial * self.decay.powi(n_stairs)).max(self.minimum)
    }
}
