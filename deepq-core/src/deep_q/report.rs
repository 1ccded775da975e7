//! Per-step report of the agent.
use crate::record::{Record, RecordValue};

/// Outcome of a minibatch Q-learning update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LearnOutput {
    /// Action-values of the minibatch, `batch_size * action_size` values.
    /// Empty when no update was performed.
    pub q_values: Vec<f32>,

    /// Loss of the minibatch, `0` when no update was performed.
    pub loss: f32,

    /// `true` if the online network was updated.
    pub updated: bool,

    /// Learning rate of the update.
    pub learning_rate: Option<f64>,
}

impl LearnOutput {
    /// The result of a step without update.
    pub fn skipped() -> Self {
        Self::default()
    }
}

/// Everything observable about one step of the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Global step counter.
    pub t: usize,

    /// Action taken.
    pub action: usize,

    /// Reward returned by the environment, before clipping.
    pub reward: f32,

    /// `true` if the step ended the episode.
    pub terminal: bool,

    /// Exploration probability used to select the action.
    pub epsilon: f64,

    /// Action-values of the minibatch if an update was performed.
    pub q_values: Vec<f32>,

    /// Loss of the update, `0` without update.
    pub loss: f32,

    /// `true` if the online network was updated.
    pub updated: bool,

    /// Learning rate of the update.
    pub learning_rate: Option<f64>,

    /// `true` if the target network was synchronized.
    pub synced: bool,
}

impl From<StepReport> for Record {
    fn from(report: StepReport) -> Self {
        let mut record = Record::from_slice(&[
            ("t", RecordValue::Scalar(report.t as f32)),
            ("action", RecordValue::Scalar(report.action as f32)),
            ("reward", RecordValue::Scalar(report.reward)),
            ("terminal", RecordValue::Scalar(report.terminal as i32 as f32)),
            ("epsilon", RecordValue::Scalar(report.epsilon as f32)),
            ("updated", RecordValue::Scalar(report.updated as i32 as f32)),
        ]);

        if report.updated {
            let n = report.q_values.len().max(1) as f32;
            let q_mean = report.q_values.iter().sum::<f32>() / n;
            record.insert("loss", RecordValue::Scalar(report.loss));
            record.insert(
                "loss_is_finite",
                RecordValue::Scalar(report.loss.is_finite() as i32 as f32),
            );
            record.insert("q_mean", RecordValue::Scalar(q_mean));
            record.insert("q_values", RecordValue::Array1(report.q_values));
        }
        if let Some(lr) = report.learning_rate {
            record.insert("learning_rate", RecordValue::Scalar(lr as f32));
        }
        if report.synced {
            record.insert("target_synced", RecordValue::Scalar(1.0));
        }

        record
    }
}
