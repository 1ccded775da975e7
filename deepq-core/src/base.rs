//! Core interfaces shared by the agent and its collaborators.
mod env;
mod replay_buffer;
mod step;
mod value_function;
pub use env::Env;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use step::{Info, Step};
pub use value_function::{argmax, Role, Stabilization, UpdateOutput, UpdateRequest, ValueFunction};
