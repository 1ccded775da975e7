//! Trains a deep Q-network with experience replay on the corridor environment.
mod args;
mod corridor;

use anyhow::Result;
use args::Args;
use clap::Parser;
use corridor::{Corridor, CorridorConfig};
use deepq_candle_agent::{OptimizerConfig, QNetwork, QNetworkConfig};
use deepq_core::{
    record::{NullRecorder, Recorder, StatRecorder},
    DeepQ, DeepQConfig, Env as _, Trainer, TrainerConfig,
};
use deepq_tensorboard::TensorboardRecorder;
use log::info;
use std::path::Path;

const HIDDEN_SIZES: [usize; 3] = [50, 50, 50];
const RMSPROP_EPS: f64 = 0.01;

fn create_env_config(args: &Args) -> Result<CorridorConfig> {
    anyhow::ensure!(
        args.env_name.starts_with("Corridor"),
        "unsupported environment: {}",
        args.env_name
    );
    Ok(CorridorConfig::default()
        .observation_dims(args.observation_dims()?)
        .n_action_repeat(args.n_action_repeat)
        .max_random_start(args.max_random_start))
}

fn create_agent_config(args: &Args) -> Result<DeepQConfig> {
    if let Some(path) = &args.config {
        return DeepQConfig::load(path);
    }
    Ok(DeepQConfig::default()
        .history_length(args.history_length)
        .memory_size(args.memory_size)
        .batch_size(args.batch_size)
        .data_format(args.data_format)
        .epsilon(args.ep_start, args.ep_end)
        .t_ep_end(args.t_ep_end)
        .t_learn_start(args.t_learn_start)
        .t_train_freq(args.t_train_freq)
        .t_target_q_update_freq(args.t_target_q_update_freq)
        .discount_r(args.gamma)
        .reward_range(args.min_reward, args.max_reward)
        .stabilization(args.stabilization())
        .learning_rate(args.learning_rate)
        .random_start(args.random_start)
        .seed(args.random_seed))
}

fn create_q_network_config(args: &Args, state_dim: usize, action_size: usize) -> QNetworkConfig {
    let opt_config = OptimizerConfig::RmsProp {
        lr: args.learning_rate,
        alpha: args.decay,
        eps: RMSPROP_EPS,
        momentum: args.momentum,
    };
    QNetworkConfig::default()
        .dims(state_dim, action_size)
        .hidden_sizes(HIDDEN_SIZES.to_vec())
        .opt_config(opt_config)
}

fn create_recorder(args: &Args, model_dir: &str) -> StatRecorder {
    let inner: Box<dyn Recorder> = match args.tensorboard {
        true => Box::new(TensorboardRecorder::new(model_dir)),
        false => Box::new(NullRecorder::new()),
    };
    StatRecorder::new(inner)
}

fn train(args: &Args) -> Result<()> {
    let model_dir = args.model_dir();
    let env_config = create_env_config(args)?;
    let agent_config = create_agent_config(args)?;
    let trainer_config = TrainerConfig::default()
        .t_train_max(args.t_train_max)
        .t_save(args.t_save)
        .t_test(args.t_test)
        .model_dir(model_dir.clone());

    let env = Corridor::build(&env_config, args.random_seed)?;
    let state_dim = agent_config.history_length * env.obs_dim();
    let q_config = create_q_network_config(args, state_dim, env.action_size());
    let online = QNetwork::build(q_config.clone())?;
    let target = QNetwork::build(q_config.clone())?;

    std::fs::create_dir_all(&model_dir)?;
    agent_config.save(Path::new(&model_dir).join("agent.yaml"))?;
    q_config.save(Path::new(&model_dir).join("q_network.yaml"))?;
    trainer_config.save(Path::new(&model_dir).join("trainer.yaml"))?;

    let mut agent = DeepQ::build(agent_config, env, online, target)?;
    let mut recorder = create_recorder(args, &model_dir);
    let mut trainer = Trainer::build(trainer_config);
    let clock = trainer.train(&mut agent, &mut recorder)?;

    info!(
        "{} episodes in {} steps, model saved in {}",
        recorder.n_episodes_total(),
        clock.t(),
        model_dir
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();
    train(&args)
}
