//! Command line flags.
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use deepq_core::{DataFormat, Stabilization};
use std::path::PathBuf;

/// Loss stabilization selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StabilizationArg {
    /// Plain squared TD-error.
    None,

    /// TD-error clipped into `[-1, 1]`.
    DeltaClip,

    /// Gradients rescaled to `--max-grad-norm`.
    GradNormClip,
}

/// Train a deep Q-network with experience replay on a toy corridor task
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Name of the environment, `Corridor-v<n>` for a corridor of `n` cells
    #[arg(long, default_value = "Corridor-v10")]
    pub env_name: String,

    /// The number of times each action is repeated
    #[arg(long, default_value_t = 1)]
    pub n_action_repeat: usize,

    /// The maximum number of no-op actions at the beginning of an episode
    #[arg(long, default_value_t = 30)]
    pub max_random_start: usize,

    /// The number of observations stacked into a state
    #[arg(long, default_value_t = 1)]
    pub history_length: usize,

    /// The maximum value of clipped reward
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub max_reward: f32,

    /// The minimum value of clipped reward
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub min_reward: f32,

    /// Shape of an observation
    #[arg(long, default_value = "[81]")]
    pub observation_dims: String,

    /// Start episodes with random no-op actions
    #[arg(long, default_value_t = false)]
    pub random_start: bool,

    /// Epsilon at the start of the exploration schedule
    #[arg(long, default_value_t = 1.0)]
    pub ep_start: f64,

    /// Epsilon at the end of the exploration schedule
    #[arg(long, default_value_t = 0.1)]
    pub ep_end: f64,

    /// Minibatch size
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// The maximum gradient norm with `--stabilization grad-norm-clip`
    #[arg(long, default_value_t = 40.0)]
    pub max_grad_norm: f32,

    /// Capacity of the replay memory
    #[arg(long, default_value_t = 1_000_000)]
    pub memory_size: usize,

    /// The number of learning steps over which epsilon decays
    #[arg(long, default_value_t = 1_000_000)]
    pub t_ep_end: usize,

    /// The step after which learning starts
    #[arg(long, default_value_t = 1000)]
    pub t_learn_start: usize,

    /// Interval of checkpoints, `0` disables saving
    #[arg(long, default_value_t = 5000)]
    pub t_save: usize,

    /// Interval of progress reports
    #[arg(long, default_value_t = 1000)]
    pub t_test: usize,

    /// The number of training steps
    #[arg(long, default_value_t = 100_000)]
    pub t_train_max: usize,

    /// Interval of minibatch updates
    #[arg(long, default_value_t = 4)]
    pub t_train_freq: usize,

    /// Interval of target network updates
    #[arg(long, default_value_t = 10000)]
    pub t_target_q_update_freq: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 7e-4)]
    pub learning_rate: f64,

    /// Decay of the RMSProp moving average
    #[arg(long, default_value_t = 0.99)]
    pub decay: f64,

    /// Momentum of RMSProp
    #[arg(long, default_value_t = 0.0)]
    pub momentum: f64,

    /// Discount factor of return
    #[arg(long, default_value_t = 0.99)]
    pub gamma: f32,

    /// Default log filter, overridden by `RUST_LOG`
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Random seed
    #[arg(long, default_value_t = 123)]
    pub random_seed: u64,

    /// Layout of stacked states, `NCHW` or `NHWC`
    #[arg(long, default_value = "NCHW")]
    pub data_format: DataFormat,

    /// Loss stabilization
    #[arg(long, value_enum, default_value_t = StabilizationArg::DeltaClip)]
    pub stabilization: StabilizationArg,

    /// Agent configuration file, replaces the agent flags
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of checkpoints, derived from the flags if not given
    #[arg(long)]
    pub model_dir: Option<String>,

    /// Write records for TensorBoard into the model directory
    #[arg(long, default_value_t = false)]
    pub tensorboard: bool,
}

impl Args {
    /// Shape of an observation parsed from `--observation-dims`, e.g. `[81]`.
    pub fn observation_dims(&self) -> Result<Vec<usize>> {
        let dims: Vec<usize> = serde_yaml::from_str(&self.observation_dims)
            .with_context(|| format!("invalid observation dims: {}", self.observation_dims))?;
        anyhow::ensure!(
            !dims.is_empty() && dims.iter().all(|&d| d > 0),
            "observation dims must be non-empty and positive: {:?}",
            dims
        );
        Ok(dims)
    }

    /// Loss stabilization selected by `--stabilization`.
    pub fn stabilization(&self) -> Stabilization {
        match self.stabilization {
            StabilizationArg::None => Stabilization::None,
            StabilizationArg::DeltaClip => Stabilization::default(),
            StabilizationArg::GradNormClip => Stabilization::GradNormClip {
                max_grad_norm: self.max_grad_norm,
            },
        }
    }

    /// The model directory, by default `checkpoints/<env_name>/<flags>`.
    ///
    /// Flags that do not change the learned model are left out of the default name.
    pub fn model_dir(&self) -> String {
        if let Some(model_dir) = &self.model_dir {
            return model_dir.clone();
        }
        let flags = [
            format!("batch_size={}", self.batch_size),
            format!("data_format={:?}", self.data_format),
            format!("ep_end={}", self.ep_end),
            format!("gamma={}", self.gamma),
            format!("history_length={}", self.history_length),
            format!("learning_rate={}", self.learning_rate),
            format!("memory_size={}", self.memory_size),
            format!("stabilization={:?}", self.stabilization),
            format!("t_learn_start={}", self.t_learn_start),
            format!("t_target_q_update_freq={}", self.t_target_q_update_freq),
            format!("t_train_freq={}", self.t_train_freq),
        ];
        format!("checkpoints/{}/{}", self.env_name, flags.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["deepq"]);
        assert_eq!(args.env_name, "Corridor-v10");
        assert_eq!(args.observation_dims().unwrap(), vec![81]);
        assert_eq!(args.min_reward, -1.0);
        assert_eq!(args.t_ep_end, 1_000_000);
        assert_eq!(args.data_format, DataFormat::ChannelsFirst);
        assert_eq!(args.stabilization(), Stabilization::default());
        assert!(args.model_dir().starts_with("checkpoints/Corridor-v10/"));
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "deepq",
            "--observation-dims",
            "[4, 3]",
            "--data-format",
            "NHWC",
            "--min-reward",
            "-2",
            "--stabilization",
            "grad-norm-clip",
            "--max-grad-norm",
            "10",
            "--model-dir",
            "runs/a",
        ]);
        assert_eq!(args.observation_dims().unwrap(), vec![4, 3]);
        assert_eq!(args.data_format, DataFormat::ChannelsLast);
        assert_eq!(args.min_reward, -2.0);
        assert_eq!(
            args.stabilization(),
            Stabilization::GradNormClip {
                max_grad_norm: 10.0
            }
        );
        assert_eq!(args.model_dir(), "runs/a");
    }

    #[test]
    fn test_invalid_observation_dims() {
        let args = Args::parse_from(["deepq", "--observation-dims", "[0]"]);
        assert!(args.observation_dims().is_err());
    }
}
