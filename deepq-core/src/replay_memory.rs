//! Fixed-capacity experience replay with stacked-observation sampling.
//!
//! [`ReplayMemory`] stores one observation per environment step together with
//! the action that led to it, the clipped reward and the terminal flag. A
//! sampled transition is rebuilt from `history_length + 1` consecutive slots:
//! the first `history_length` form the state, the last `history_length` form
//! the next state, and the action, reward and terminal flag come from the last
//! slot.
mod base;
mod batch;
mod config;
pub use base::ReplayMemory;
pub use batch::{Transition, TransitionBatch};
pub use config::ReplayMemoryConfig;
