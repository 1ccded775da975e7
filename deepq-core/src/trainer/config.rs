//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The training loop stops when the global step counter reaches this value.
    pub t_train_max: usize,

    /// Interval of saving checkpoints in steps, `0` disables saving.
    pub t_save: usize,

    /// Interval of flushing records in steps.
    pub t_test: usize,

    /// Where to save checkpoints.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            t_train_max: 100000,
            t_save: 5000,
            t_test: 1000,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of steps of the training loop.
    pub fn t_train_max(mut self, v: usize) -> Self {
        self.t_train_max = v;
        self
    }

    /// Sets the interval of saving checkpoints.
    pub fn t_save(mut self, v: usize) -> Self {
        self.t_save = v;
        self
    }

    /// Sets the interval of flushing records.
    pub fn t_test(mut self, v: usize) -> Self {
        self.t_test = v;
        self
    }

    /// Sets the directory where checkpoints are saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of trainer from {}", path_.display());
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of trainer into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .t_train_max(1000)
            .t_save(100)
            .t_test(10)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
