use anyhow::Result;
use deepq_core::{
    dummy::{DummyEnv, DummyEnvConfig, DummyValueFunction},
    error::DeepQError,
    DeepQ, DeepQConfig, Env, Role, StepReport, TrainingClock, ValueFunction,
};
use tempdir::TempDir;

fn env(episode_length: usize, rewards: Vec<f32>) -> Result<DummyEnv> {
    let config = DummyEnvConfig {
        action_size: 2,
        obs_dim: 1,
        episode_length,
        rewards,
    };
    DummyEnv::build(&config, 0)
}

fn agent(config: DeepQConfig, env: DummyEnv) -> Result<DeepQ<DummyEnv, DummyValueFunction>> {
    let state_dim = config.history_length;
    let online = DummyValueFunction::new(2, state_dim);
    let target = DummyValueFunction::new(2, state_dim);
    DeepQ::build(config, env, online, target)
}

fn run(agent: &mut DeepQ<DummyEnv, DummyValueFunction>, t_max: usize) -> Result<Vec<StepReport>> {
    agent.begin()?;
    let mut clock = TrainingClock::new(0);
    let mut reports = vec![];
    while clock.t() < t_max {
        reports.push(agent.step(&clock)?);
        clock.tick();
    }
    Ok(reports)
}

#[test]
fn learns_and_syncs_on_schedule() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(1)
        .memory_size(100)
        .batch_size(4)
        .t_learn_start(4)
        .t_train_freq(2)
        .t_target_q_update_freq(3);
    let mut agent = agent(config, env(5, vec![0.0])?)?;
    let reports = run(&mut agent, 12)?;

    let updated: Vec<usize> = reports.iter().filter(|r| r.updated).map(|r| r.t).collect();
    let synced: Vec<usize> = reports.iter().filter(|r| r.synced).map(|r| r.t).collect();
    assert_eq!(updated, vec![6, 8, 10]);
    assert_eq!(synced, vec![5, 8, 11]);

    assert_eq!(agent.online().updates().len(), 3);
    assert!(agent.online().updates().iter().all(|u| u.actions.len() == 4));
    // One sync in begin() and one per sync step.
    assert_eq!(agent.target_sync().n_syncs(), 4);
    assert_eq!(agent.target().n_copies(), 4);

    for r in reports.iter().filter(|r| !r.updated) {
        assert!(r.q_values.is_empty());
        assert_eq!(r.loss, 0.0);
    }
    Ok(())
}

#[test]
fn targets_bootstrap_from_target_network() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(1)
        .memory_size(50)
        .batch_size(2)
        .t_learn_start(0)
        .t_train_freq(1)
        .t_target_q_update_freq(1000)
        .discount_r(0.5)
        .learning_rate(0.1);
    // begin() copies the online values into the target network.
    let online = DummyValueFunction::new(2, 1).with_params(vec![4.0, 8.0]);
    let target = DummyValueFunction::new(2, 1);
    let mut agent = DeepQ::build(config, env(100, vec![0.5])?, online, target)?;
    run(&mut agent, 5)?;

    let updates = agent.online().updates();
    assert_eq!(updates.len(), 4);
    for update in updates.iter() {
        assert_eq!(update.targets, vec![4.5, 4.5]);
    }
    assert_ne!(agent.online().params(), &[4.0, 8.0][..]);
    assert_eq!(agent.target().params(), &[4.0, 8.0][..]);
    Ok(())
}

#[test]
fn params_are_saved_per_role() -> Result<()> {
    let config = DeepQConfig::default().history_length(1).memory_size(20);
    let online = DummyValueFunction::new(2, 1).with_params(vec![1.0, 2.0]);
    let target = DummyValueFunction::new(2, 1);
    let agent = DeepQ::build(config, env(5, vec![0.0])?, online, target)?;
    let dir = TempDir::new("deep_q_params")?;
    agent.save_params(dir.path())?;

    let online_path = DeepQ::<DummyEnv, DummyValueFunction>::params_path(dir.path(), Role::Online);
    let target_path = DeepQ::<DummyEnv, DummyValueFunction>::params_path(dir.path(), Role::Target);
    assert_eq!(online_path, dir.path().join("online.yaml"));
    assert_eq!(target_path, dir.path().join("target.yaml"));
    assert!(online_path.is_file());
    assert!(target_path.is_file());

    let mut restored = DummyValueFunction::new(2, 1);
    restored.load(&online_path)?;
    assert_eq!(restored.params(), &[1.0, 2.0][..]);
    Ok(())
}

#[test]
fn update_is_skipped_without_enough_history() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(3)
        .memory_size(20)
        .batch_size(2)
        .t_learn_start(0)
        .t_train_freq(1)
        .t_target_q_update_freq(1000);
    let mut agent = agent(config, env(100, vec![0.0])?)?;
    let reports = run(&mut agent, 6)?;

    let updated: Vec<bool> = reports.iter().map(|r| r.updated).collect();
    assert_eq!(updated, vec![false, false, false, true, true, true]);
    Ok(())
}

#[test]
fn rewards_are_clipped_before_storage() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(1)
        .memory_size(50)
        .reward_range(-1.0, 1.0)
        .t_learn_start(1000);
    let mut agent = agent(config, env(4, vec![5.0, -5.0, 0.25])?)?;
    let reports = run(&mut agent, 6)?;

    let stored: Vec<f32> = agent.memory().transitions().iter().map(|tr| tr.reward).collect();
    assert_eq!(stored, vec![1.0, -1.0, 0.25, 1.0, -1.0, 0.25]);
    let raw: Vec<f32> = reports.iter().map(|r| r.reward).collect();
    assert_eq!(raw, vec![5.0, -5.0, 0.25, 5.0, -5.0, 0.25]);
    Ok(())
}

#[test]
fn history_is_reprimed_after_terminal_step() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(2)
        .memory_size(20)
        .t_learn_start(1000);
    let mut agent = agent(config, env(3, vec![0.0])?)?;
    run(&mut agent, 3)?;

    assert_eq!(agent.env().n_games(), 2);
    assert_eq!(agent.history().get(), vec![-2.0, -2.0]);
    Ok(())
}

#[test]
fn history_keeps_previous_frames_without_repriming() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(2)
        .memory_size(20)
        .t_learn_start(1000)
        .reprime_history_on_reset(false);
    let mut agent = agent(config, env(3, vec![0.0])?)?;
    run(&mut agent, 3)?;

    assert_eq!(agent.history().get(), vec![2.0, 3.0]);
    Ok(())
}

#[test]
fn random_start_uses_random_game() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(1)
        .memory_size(20)
        .t_learn_start(1000)
        .random_start(true);
    let mut agent = agent(config, env(2, vec![0.0])?)?;
    run(&mut agent, 4)?;

    assert_eq!(agent.env().n_random_games(), 3);
    Ok(())
}

#[test]
fn greedy_actions_come_from_online_network() -> Result<()> {
    let config = DeepQConfig::default()
        .history_length(1)
        .memory_size(20)
        .epsilon(0.0, 0.0)
        .t_learn_start(1000);
    let online = DummyValueFunction::new(2, 1).with_params(vec![0.0, 1.0]);
    let target = DummyValueFunction::new(2, 1);
    let mut agent = DeepQ::build(config, env(5, vec![0.0])?, online, target)?;
    run(&mut agent, 8)?;

    assert!(agent.env().actions().iter().all(|&a| a == 1));
    Ok(())
}

#[test]
fn build_rejects_mismatched_state_dim() -> Result<()> {
    let config = DeepQConfig::default().history_length(2).memory_size(20);
    let online = DummyValueFunction::new(2, 3);
    let target = DummyValueFunction::new(2, 3);
    let err = DeepQ::build(config, env(5, vec![0.0])?, online, target)
        .err()
        .expect("build should fail");
    assert_eq!(
        err.downcast_ref::<DeepQError>(),
        Some(&DeepQError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    );
    Ok(())
}
