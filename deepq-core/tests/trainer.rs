use anyhow::Result;
use deepq_core::{
    dummy::{DummyEnv, DummyEnvConfig, DummyValueFunction},
    record::{BufferedRecorder, Record, Recorder, StatRecorder},
    trainer::{Checkpoint, LATEST_DIR},
    DeepQ, DeepQConfig, Env, Trainer, TrainerConfig,
};
use tempdir::TempDir;

fn agent() -> Result<DeepQ<DummyEnv, DummyValueFunction>> {
    let env_config = DummyEnvConfig {
        action_size: 2,
        obs_dim: 1,
        episode_length: 4,
        rewards: vec![1.0, 0.0],
    };
    let config = DeepQConfig::default()
        .history_length(1)
        .memory_size(100)
        .batch_size(4)
        .t_learn_start(2)
        .t_train_freq(1)
        .t_target_q_update_freq(5)
        .learning_rate(0.5)
        .learning_rate_decay(1.0, 1000, 0.0);
    DeepQ::build(
        config,
        DummyEnv::build(&env_config, 0)?,
        DummyValueFunction::new(2, 1),
        DummyValueFunction::new(2, 1),
    )
}

#[test]
fn flushes_and_saves_on_schedule() -> Result<()> {
    let dir = TempDir::new("trainer")?;
    let model_dir = dir.path().to_str().unwrap().to_string();
    let config = TrainerConfig::default()
        .t_train_max(20)
        .t_save(10)
        .t_test(5)
        .model_dir(model_dir);

    let mut agent = agent()?;
    let mut recorder = BufferedRecorder::new();
    let clock = Trainer::build(config).train(&mut agent, &mut recorder)?;

    assert_eq!(clock.t(), 20);
    assert_eq!(recorder.len(), 20);
    assert_eq!(recorder.flushed_at().to_vec(), vec![5i64, 10, 15, 20]);
    assert!(agent.online().updates().len() > 0);

    // Every stored step carries its step counter and update flag.
    for (t, record) in recorder.iter().enumerate() {
        assert_eq!(record.get_scalar("t"), Ok(t as f32));
        let updated = if t > 2 { 1.0 } else { 0.0 };
        assert_eq!(record.get_scalar("updated"), Ok(updated));
    }

    for t in ["10", "20", LATEST_DIR].iter() {
        let d = dir.path().join(t);
        assert!(d.join("online.yaml").exists());
        assert!(d.join("target.yaml").exists());
    }
    assert_eq!(
        Checkpoint::load(&dir.path().join("10"))?,
        Some(Checkpoint { t: 10 })
    );
    assert_eq!(
        Checkpoint::load(&dir.path().join(LATEST_DIR))?,
        Some(Checkpoint { t: 20 })
    );
    Ok(())
}

#[test]
fn resumes_from_latest_checkpoint() -> Result<()> {
    let dir = TempDir::new("trainer_resume")?;
    let model_dir = dir.path().to_str().unwrap().to_string();
    let config = TrainerConfig::default()
        .t_train_max(10)
        .t_save(10)
        .t_test(5)
        .model_dir(model_dir);

    let mut first = agent()?;
    Trainer::build(config.clone()).train(&mut first, &mut BufferedRecorder::new())?;

    let mut second = agent()?;
    let clock = Trainer::build(config.clone()).resume(&mut second)?;
    assert_eq!(clock.t(), 10);
    for (p, q) in first.online().params().iter().zip(second.online().params()) {
        assert!((p - q).abs() < 1e-6);
    }

    let mut third = agent()?;
    let mut recorder = BufferedRecorder::new();
    let clock = Trainer::build(config.t_train_max(16)).train(&mut third, &mut recorder)?;
    assert_eq!(clock.t(), 16);
    assert_eq!(recorder.len(), 6);
    assert_eq!(recorder.flushed_at().to_vec(), vec![15i64, 16]);
    Ok(())
}

#[test]
fn stat_recorder_receives_aggregates() -> Result<()> {
    let config = TrainerConfig::default().t_train_max(12).t_save(0).t_test(6);
    let written = std::rc::Rc::new(std::cell::RefCell::new(BufferedRecorder::new()));

    struct Shared(std::rc::Rc<std::cell::RefCell<BufferedRecorder>>);
    impl Recorder for Shared {
        fn write(&mut self, record: Record) {
            self.0.borrow_mut().write(record);
        }
    }

    let mut recorder = StatRecorder::new(Box::new(Shared(written.clone())));
    let mut agent = agent()?;
    Trainer::build(config).train(&mut agent, &mut recorder)?;

    let written = written.borrow();
    assert_eq!(written.len(), 2);
    let first = written.iter().next().unwrap();
    assert_eq!(first.get_scalar("t"), Ok(6.0));
    // Episodes of 4 steps with rewards 1, 0, 1, 0.
    assert_eq!(first.get_scalar("n_episodes"), Ok(1.0));
    assert_eq!(first.get_scalar("episode_reward_mean"), Ok(2.0));
    assert!(first.get("steps_per_sec").is_some());
    Ok(())
}
