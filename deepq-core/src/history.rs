//! Sliding window of the most recent observations.
use serde::{Deserialize, Serialize};

/// Memory layout of a stacked state.
///
/// With `ChannelsFirst` a stacked state is `history_length` observations laid
/// out one after another (`[history_length, obs_dim]`). With `ChannelsLast`
/// the history axis is innermost (`[obs_dim, history_length]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum DataFormat {
    /// `NCHW`, history axis first.
    ChannelsFirst,

    /// `NHWC`, history axis last.
    ChannelsLast,
}

impl Default for DataFormat {
    fn default() -> Self {
        Self::ChannelsFirst
    }
}

impl std::str::FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NCHW" | "channels_first" => Ok(Self::ChannelsFirst),
            "NHWC" | "channels_last" => Ok(Self::ChannelsLast),
            _ => Err(format!("unknown data format: {}", s)),
        }
    }
}

/// Stacks frames given in chronological order into `out`.
pub(crate) fn stack_frames<'a, I>(frames: I, obs_dim: usize, data_format: DataFormat, out: &mut [f32])
where
    I: Iterator<Item = &'a [f32]>,
{
    let history_length = out.len() / obs_dim;
    for (k, frame) in frames.enumerate() {
        match data_format {
            DataFormat::ChannelsFirst => {
                out[k * obs_dim..(k + 1) * obs_dim].copy_from_slice(frame);
            }
            DataFormat::ChannelsLast => {
                for (d, &v) in frame.iter().enumerate() {
                    out[d * history_length + k] = v;
                }
            }
        }
    }
}

/// Maintains the most recent `history_length` observations.
///
/// The window is a ring over a fixed buffer: [`HistoryBuffer::add`] overwrites
/// the oldest observation. The window must be primed by adding
/// `history_length` observations before [`HistoryBuffer::get`] is called,
/// typically with [`HistoryBuffer::fill`] at the start of an episode.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    history_length: usize,
    obs_dim: usize,
    data_format: DataFormat,
    window: Vec<f32>,

    // Slot of the oldest observation.
    head: usize,

    n_added: usize,
}

impl HistoryBuffer {
    /// Creates an empty window.
    pub fn new(history_length: usize, obs_dim: usize, data_format: DataFormat) -> Self {
        assert!(history_length > 0, "history_length must be positive");
        Self {
            history_length,
            obs_dim,
            data_format,
            window: vec![0.0; history_length * obs_dim],
            head: 0,
            n_added: 0,
        }
    }

    /// Appends an observation, evicting the oldest one.
    ///
    /// Panics if the length of `observation` is not `obs_dim`.
    pub fn add(&mut self, observation: &[f32]) {
        assert_eq!(
            observation.len(),
            self.obs_dim,
            "observation length does not match the history window"
        );
        let start = self.head * self.obs_dim;
        self.window[start..start + self.obs_dim].copy_from_slice(observation);
        self.head = (self.head + 1) % self.history_length;
        self.n_added += 1;
    }

    /// Fills the whole window with `observation`.
    pub fn fill(&mut self, observation: &[f32]) {
        for _ in 0..self.history_length {
            self.add(observation);
        }
    }

    /// Returns `true` once `history_length` observations have been added.
    pub fn is_primed(&self) -> bool {
        self.n_added >= self.history_length
    }

    /// Observations in the window, oldest first.
    pub fn frames(&self) -> Vec<&[f32]> {
        (0..self.history_length)
            .map(|k| {
                let slot = (self.head + k) % self.history_length;
                &self.window[slot * self.obs_dim..(slot + 1) * self.obs_dim]
            })
            .collect()
    }

    /// The stacked state, laid out according to the data format.
    ///
    /// Panics if the window has not been primed.
    pub fn get(&self) -> Vec<f32> {
        assert!(
            self.is_primed(),
            "HistoryBuffer::get() called before {} observations were added",
            self.history_length
        );
        let mut state = vec![0.0; self.history_length * self.obs_dim];
        stack_frames(
            self.frames().into_iter(),
            self.obs_dim,
            self.data_format,
            &mut state,
        );
        state
    }

    /// The number of observations in the window.
    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// The length of an observation.
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_slides() {
        let mut history = HistoryBuffer::new(3, 2, DataFormat::ChannelsFirst);
        history.add(&[1.0, 1.5]);
        history.add(&[2.0, 2.5]);
        history.add(&[3.0, 3.5]);
        assert_eq!(history.get(), vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);

        history.add(&[4.0, 4.5]);
        assert_eq!(history.get(), vec![2.0, 2.5, 3.0, 3.5, 4.0, 4.5]);
        assert_eq!(
            history.frames(),
            vec![&[2.0f32, 2.5][..], &[3.0, 3.5][..], &[4.0, 4.5][..]]
        );
    }

    #[test]
    fn test_get_is_not_destructive() {
        let mut history = HistoryBuffer::new(2, 1, DataFormat::ChannelsFirst);
        history.fill(&[7.0]);
        assert_eq!(history.get(), history.get());
        assert_eq!(history.get(), vec![7.0, 7.0]);
    }

    #[test]
    fn test_channels_last_layout() {
        let mut history = HistoryBuffer::new(2, 3, DataFormat::ChannelsLast);
        history.add(&[1.0, 2.0, 3.0]);
        history.add(&[4.0, 5.0, 6.0]);
        assert_eq!(history.get(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    #[should_panic]
    fn test_dimension_mismatch_panics() {
        let mut history = HistoryBuffer::new(2, 3, DataFormat::ChannelsFirst);
        history.add(&[1.0, 2.0]);
    }

    #[test]
    #[should_panic]
    fn test_get_before_priming_panics() {
        let mut history = HistoryBuffer::new(4, 1, DataFormat::ChannelsFirst);
        history.add(&[1.0]);
        let _ = history.get();
    }
}
