#![warn(missing_docs)]
//! Core components of deep Q-learning.
//!
//! The crate provides the agent control loop of DQN and its data structures,
//! independent of the numeric backend of the action-value function:
//!
//! * [`HistoryBuffer`] keeps the most recent observations as a stacked state.
//! * [`ReplayMemory`] is a fixed-capacity circular store of transitions with
//!   windowed minibatch sampling.
//! * [`EpsilonGreedy`] anneals the exploration probability.
//! * [`TargetSync`] keeps the target network a frozen snapshot of the online network.
//! * [`DeepQ`] orchestrates action selection, storage, learning and synchronization,
//!   driven by a [`TrainingClock`].
//! * [`Trainer`] runs the loop with periodic record flushes and checkpoints.
//!
//! The action-value function is abstracted by [`ValueFunction`] and the
//! environment by [`Env`].
pub mod dummy;
pub mod error;
pub mod record;

mod base;
pub use base::{
    argmax, Env, ExperienceBufferBase, Info, ReplayBufferBase, Role, Stabilization, Step,
    UpdateOutput, UpdateRequest, ValueFunction,
};

mod clock;
pub use clock::{LearningRateSchedule, Schedule, TrainingClock};

mod deep_q;
pub use deep_q::{bellman_targets, clip_reward, DeepQ, DeepQConfig, LearnOutput, StepReport};

mod exploration;
pub use exploration::EpsilonGreedy;

mod history;
pub use history::{DataFormat, HistoryBuffer};

mod replay_memory;
pub use replay_memory::{ReplayMemory, ReplayMemoryConfig, Transition, TransitionBatch};

mod target_sync;
pub use target_sync::TargetSync;

pub mod trainer;
pub use trainer::{Trainer, TrainerConfig};
