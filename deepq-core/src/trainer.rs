//! Train [`DeepQ`].
mod checkpoint;
mod config;
use crate::{
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    DeepQ, Env, TrainingClock, ValueFunction,
};
use anyhow::Result;
pub use checkpoint::{load_latest_checkpoint, save_checkpoint, Checkpoint, LATEST_DIR};
pub use config::TrainerConfig;
use log::info;
use std::{path::Path, time::SystemTime};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs the training loop of [`DeepQ`].
///
/// # Training loop
///
/// 1. If a checkpoint exists in `model_dir/latest`, load the parameters and
///    resume from the saved step. Otherwise start at `t = 0`.
/// 2. Begin the agent: synchronize the target network and prime the history
///    window with the first observation of an episode.
/// 3. While `t < t_train_max`:
///     1. Perform a step of the agent at `t` and store its report in the recorder.
///     2. If `(t + 1) % t_test == 0`, flush the recorder.
///     3. If `(t + 1) % t_save == 0`, save a checkpoint resuming at `t + 1`.
///     4. `t += 1`.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[TrainingClock]-->|t|B[DeepQ]
///     B -->|action|C[Env]
///     C -->|"Step&lt;E: Env&gt;"|B
///     B -->|transition|D[ReplayMemory]
///     D -->|TransitionBatch|B
///     B -->|StepReport|E[AggregateRecorder]
/// ```
pub struct Trainer {
    /// The loop stops when the step counter reaches this value.
    t_train_max: usize,

    /// Interval of saving checkpoints in steps.
    t_save: usize,

    /// Interval of flushing records in steps.
    t_test: usize,

    /// Where to save checkpoints.
    model_dir: Option<String>,

    /// Steps since the last flush, for computing steps per second.
    steps_for_sps: usize,

    /// Timer for computing steps per second.
    timer_for_sps: SystemTime,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            t_train_max: config.t_train_max,
            t_save: config.t_save,
            t_test: config.t_test.max(1),
            model_dir: config.model_dir,
            steps_for_sps: 0,
            timer_for_sps: SystemTime::now(),
        }
    }

    /// Returns environment steps per second, then resets the internal counter.
    fn steps_per_sec(&mut self) -> Result<f32> {
        let elapsed = self.timer_for_sps.elapsed()?.as_secs_f32();
        let sps = if elapsed > 0.0 {
            self.steps_for_sps as f32 / elapsed
        } else {
            0.0
        };
        self.steps_for_sps = 0;
        self.timer_for_sps = SystemTime::now();
        Ok(sps)
    }

    /// Returns the step at which training starts, loading the latest checkpoint if any.
    pub fn resume<E, V>(&self, agent: &mut DeepQ<E, V>) -> Result<TrainingClock>
    where
        E: Env,
        V: ValueFunction,
    {
        let start_t = match &self.model_dir {
            Some(model_dir) => load_latest_checkpoint(agent, Path::new(model_dir))?.unwrap_or(0),
            None => 0,
        };
        Ok(TrainingClock::new(start_t))
    }

    /// Trains the agent until the step counter reaches `t_train_max`.
    ///
    /// Returns the clock at the end of training.
    pub fn train<E, V>(
        &mut self,
        agent: &mut DeepQ<E, V>,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<TrainingClock>
    where
        E: Env,
        V: ValueFunction,
    {
        let mut clock = self.resume(agent)?;
        agent.begin()?;
        info!(
            "Start training at t = {}, t_train_max = {}",
            clock.t(),
            self.t_train_max
        );
        self.timer_for_sps = SystemTime::now();
        self.steps_for_sps = 0;

        while clock.t() < self.t_train_max {
            let report = agent.step(&clock)?;
            self.steps_for_sps += 1;
            let mut record: Record = report.into();
            let t_next = clock.t() + 1;

            if t_next % self.t_test == 0 {
                record.insert("steps_per_sec", Scalar(self.steps_per_sec()?));
                recorder.store(record);
                recorder.flush(t_next as i64);
            } else {
                recorder.store(record);
            }

            if self.t_save > 0 && t_next % self.t_save == 0 {
                if let Some(model_dir) = &self.model_dir {
                    save_checkpoint(agent, Path::new(model_dir), t_next)?;
                }
            }

            clock.tick();
        }

        if clock.t() % self.t_test != 0 {
            recorder.flush(clock.t() as i64);
        }
        info!("Finished training at t = {}", clock.t());

        Ok(clock)
    }
}
