//! Epsilon-greedy exploration schedule.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linearly annealed exploration probability.
///
/// Epsilon stays at `ep_start` until `t_learn_start`, then decays linearly to
/// `ep_end` over `t_ep_end` steps and stays there.
///
/// ```rust
/// use deepq_core::EpsilonGreedy;
///
/// let schedule = EpsilonGreedy::default()
///     .ep_start(1.0)
///     .ep_end(0.1)
///     .t_ep_end(100)
///     .t_learn_start(50);
/// assert!((schedule.epsilon(0) - 1.0).abs() < 1e-12);
/// assert!((schedule.epsilon(50) - 1.0).abs() < 1e-12);
/// assert!((schedule.epsilon(100) - 0.55).abs() < 1e-12);
/// assert_eq!(schedule.epsilon(150), 0.1);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EpsilonGreedy {
    /// Exploration probability before learning starts.
    pub ep_start: f64,

    /// Final exploration probability.
    pub ep_end: f64,

    /// Length of the decay in steps.
    pub t_ep_end: usize,

    /// Step at which the decay begins.
    pub t_learn_start: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            ep_start: 1.0,
            ep_end: 0.1,
            t_ep_end: 1_000_000,
            t_learn_start: 1000,
        }
    }
}

impl EpsilonGreedy {
    /// Sets the initial exploration probability.
    pub fn ep_start(mut self, v: f64) -> Self {
        self.ep_start = v;
        self
    }

    /// Sets the final exploration probability.
    pub fn ep_end(mut self, v: f64) -> Self {
        self.ep_end = v;
        self
    }

    /// Sets the length of the decay in steps.
    pub fn t_ep_end(mut self, v: usize) -> Self {
        self.t_ep_end = v;
        self
    }

    /// Sets the step at which the decay begins.
    pub fn t_learn_start(mut self, v: usize) -> Self {
        self.t_learn_start = v;
        self
    }

    /// Exploration probability at step `t`.
    pub fn epsilon(&self, t: usize) -> f64 {
        let elapsed = t.saturating_sub(self.t_learn_start);
        let remaining = self.t_ep_end.saturating_sub(elapsed) as f64;
        self.ep_end + ((self.ep_start - self.ep_end) * remaining / self.t_ep_end as f64).max(0.0)
    }

    /// Returns `true` with probability `epsilon`.
    pub fn is_random(epsilon: f64, rng: &mut impl Rng) -> bool {
        rng.gen::<f64>() < epsilon
    }
}
