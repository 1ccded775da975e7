//! Checkpoints of the training loop.
use crate::{DeepQ, Env, ValueFunction};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

const CHECKPOINT_FILE: &str = "checkpoint.yaml";

/// Name of the directory holding the most recent checkpoint.
pub const LATEST_DIR: &str = "latest";

/// Training state saved alongside the network parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Checkpoint {
    /// The step at which training resumes.
    pub t: usize,
}

impl Checkpoint {
    fn save(&self, dir: &Path) -> Result<()> {
        let mut file = File::create(dir.join(CHECKPOINT_FILE))?;
        file.write_all(serde_yaml::to_string(self)?.as_bytes())?;
        Ok(())
    }

    /// Reads the checkpoint in `dir`, `None` if there is none.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CHECKPOINT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let rdr = BufReader::new(File::open(path)?);
        Ok(Some(serde_yaml::from_reader(rdr)?))
    }
}

/// Saves the agent's parameters and the step counter in `model_dir/<t>` and
/// `model_dir/latest`.
pub fn save_checkpoint<E, V>(agent: &DeepQ<E, V>, model_dir: &Path, t: usize) -> Result<()>
where
    E: Env,
    V: ValueFunction,
{
    let checkpoint = Checkpoint { t };
    for dir in [model_dir.join(t.to_string()), model_dir.join(LATEST_DIR)].iter() {
        fs::create_dir_all(dir)?;
        agent.save_params(dir)?;
        checkpoint.save(dir)?;
    }
    info!("Saved checkpoint at t = {} in {}", t, model_dir.display());
    Ok(())
}

/// Loads the latest checkpoint in `model_dir` into the agent.
///
/// Returns the step to resume from, `None` if `model_dir` holds no checkpoint.
pub fn load_latest_checkpoint<E, V>(agent: &mut DeepQ<E, V>, model_dir: &Path) -> Result<Option<usize>>
where
    E: Env,
    V: ValueFunction,
{
    let dir: PathBuf = model_dir.join(LATEST_DIR);
    match Checkpoint::load(&dir)? {
        Some(checkpoint) => {
            agent.load_params(&dir)?;
            info!("Loaded checkpoint at t = {} from {}", checkpoint.t, dir.display());
            Ok(Some(checkpoint.t))
        }
        None => Ok(None),
    }
}
