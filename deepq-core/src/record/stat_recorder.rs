use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Aggregates per-step records of the agent and writes them to a [`Recorder`].
///
/// Besides the aggregation done by [`RecordStorage`], episode returns are
/// accumulated from the `reward` and `terminal` entries of the stored records
/// and reported as `n_episodes`, `episode_reward_min`, `episode_reward_max`
/// and `episode_reward_mean` on each flush.
pub struct StatRecorder {
    storage: RecordStorage,
    inner: Box<dyn Recorder>,
    episode_reward: f32,
    episode_rewards: Vec<f32>,
    n_episodes_total: usize,
}

impl StatRecorder {
    /// Constructs the recorder writing aggregates to `inner`.
    pub fn new(inner: Box<dyn Recorder>) -> Self {
        Self {
            storage: RecordStorage::new(),
            inner,
            episode_reward: 0.0,
            episode_rewards: vec![],
            n_episodes_total: 0,
        }
    }

    /// The number of episodes finished since construction.
    pub fn n_episodes_total(&self) -> usize {
        self.n_episodes_total
    }

    fn track_episode(&mut self, record: &Record) {
        if let Ok(reward) = record.get_scalar("reward") {
            self.episode_reward += reward;
        }
        if let Ok(terminal) = record.get_scalar("terminal") {
            if terminal > 0.5 {
                self.episode_rewards.push(self.episode_reward);
                self.episode_reward = 0.0;
                self.n_episodes_total += 1;
            }
        }
    }

    fn episode_record(&mut self) -> Record {
        let rewards = std::mem::take(&mut self.episode_rewards);
        let mut record = Record::from_scalar("n_episodes", rewards.len() as f32);
        if !rewards.is_empty() {
            let sum: f32 = rewards.iter().sum();
            let min = rewards.iter().copied().fold(f32::INFINITY, f32::min);
            let max = rewards.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            record.insert("episode_reward_min", RecordValue::Scalar(min));
            record.insert("episode_reward_max", RecordValue::Scalar(max));
            record.insert(
                "episode_reward_mean",
                RecordValue::Scalar(sum / rewards.len() as f32),
            );
        }
        record
    }
}

fn fmt_scalar(record: &Record, key: &str) -> String {
    match record.get_scalar(key) {
        Ok(v) => format!("{:.4}", v),
        Err(_) => "-".to_string(),
    }
}

impl AggregateRecorder for StatRecorder {
    fn store(&mut self, record: Record) {
        self.track_episode(&record);
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.aggregate();
        record.merge_inplace(self.episode_record());
        record.insert("t", RecordValue::Scalar(step as f32));

        info!(
            "t: {}, episodes: {}, avg_ep_r: {}, avg_r: {}, avg_loss: {}, epsilon: {}, lr: {}",
            step,
            fmt_scalar(&record, "n_episodes"),
            fmt_scalar(&record, "episode_reward_mean"),
            fmt_scalar(&record, "reward_mean"),
            fmt_scalar(&record, "loss_mean"),
            fmt_scalar(&record, "epsilon_min"),
            fmt_scalar(&record, "learning_rate_min"),
        );

        self.inner.write(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    struct SharedRecorder(Rc<RefCell<Vec<Record>>>);

    impl Recorder for SharedRecorder {
        fn write(&mut self, record: Record) {
            self.0.borrow_mut().push(record);
        }
    }

    fn step(reward: f32, terminal: bool) -> Record {
        Record::from_slice(&[
            ("reward", RecordValue::Scalar(reward)),
            ("terminal", RecordValue::Scalar(terminal as i32 as f32)),
        ])
    }

    #[test]
    fn test_episode_rewards() {
        let written = Rc::new(RefCell::new(vec![]));
        let mut recorder = StatRecorder::new(Box::new(SharedRecorder(written.clone())));

        recorder.store(step(0.0, false));
        recorder.store(step(1.0, true));
        recorder.store(step(-1.0, false));
        recorder.store(step(0.0, true));
        recorder.store(step(0.5, false));
        recorder.flush(5);

        let written = written.borrow();
        assert_eq!(written.len(), 1);
        let record = &written[0];
        assert_eq!(record.get_scalar("t"), Ok(5.0));
        assert_eq!(record.get_scalar("n_episodes"), Ok(2.0));
        assert_eq!(record.get_scalar("episode_reward_max"), Ok(1.0));
        assert_eq!(record.get_scalar("episode_reward_min"), Ok(-1.0));
        assert_eq!(record.get_scalar("episode_reward_mean"), Ok(0.0));
        assert_eq!(recorder.n_episodes_total(), 2);
    }
}
