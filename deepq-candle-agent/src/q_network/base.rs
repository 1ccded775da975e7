use super::QNetworkConfig;
use crate::{
    opt::Optimizer,
    util::{clip_grad_norm, copy_varmap, parameter_count},
    Mlp, MlpConfig,
};
use anyhow::{ensure, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use deepq_core::{Stabilization, UpdateOutput, UpdateRequest, ValueFunction};
use log::{info, trace};
use std::path::Path;

/// Multilayer perceptron mapping a stacked state to action-values.
///
/// Parameters live in a [`VarMap`], saved and loaded in the safetensors format.
pub struct QNetwork {
    config: QNetworkConfig,
    device: Device,
    varmap: VarMap,
    mlp: Mlp,
    opt: Optimizer,
}

impl QNetwork {
    /// Constructs the network with randomly initialized parameters.
    pub fn build(config: QNetworkConfig) -> Result<Self> {
        ensure!(config.state_dim > 0, "state_dim is not set");
        ensure!(config.action_size > 0, "action_size is not set");
        let device = config.device.open()?;
        let varmap = VarMap::new();
        let mlp = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            let mlp_config = MlpConfig::new(
                config.state_dim,
                config.hidden_sizes.clone(),
                config.action_size,
                config.activation,
            );
            Mlp::build(vb, mlp_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            config,
            device,
            varmap,
            mlp,
            opt,
        })
    }

    /// Configuration.
    pub fn config(&self) -> &QNetworkConfig {
        &self.config
    }

    /// Parameters of the network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// The current learning rate of the optimizer.
    pub fn learning_rate(&self) -> f64 {
        self.opt.learning_rate()
    }

    fn states_tensor(&self, states: &[f32]) -> Result<Tensor> {
        let state_dim = self.config.state_dim;
        ensure!(
            states.len() % state_dim == 0,
            "states of length {} are not a batch of states of length {}",
            states.len(),
            state_dim
        );
        Ok(Tensor::from_slice(
            states,
            (states.len() / state_dim, state_dim),
            &self.device,
        )?)
    }

    /// Action-values of a batch of stacked states, `[batch_size, action_size]`.
    pub fn forward(&self, states: &[f32]) -> Result<Tensor> {
        self.mlp.forward(&self.states_tensor(states)?)
    }
}

impl ValueFunction for QNetwork {
    const PARAMS_EXTENSION: &'static str = "safetensors";

    fn action_size(&self) -> usize {
        self.config.action_size
    }

    fn state_dim(&self) -> usize {
        self.config.state_dim
    }

    fn parameter_count(&self) -> usize {
        parameter_count(&self.varmap)
    }

    fn predict_values(&self, state: &[f32]) -> Result<Vec<f32>> {
        ensure!(state.len() == self.config.state_dim, "state length {}", state.len());
        Ok(self.forward(state)?.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn predict_max_value(&self, states: &[f32]) -> Result<Vec<f32>> {
        Ok(self.forward(states)?.max(D::Minus1)?.to_vec1::<f32>()?)
    }

    fn copy_parameters_from(&mut self, other: &Self) -> Result<()> {
        copy_varmap(&self.varmap, &other.varmap)
    }

    fn update(&mut self, request: &UpdateRequest) -> Result<UpdateOutput> {
        let batch_size = request.batch_size();
        ensure!(request.targets.len() == batch_size, "targets length");
        ensure!(
            request.states.len() == batch_size * self.config.state_dim,
            "states length"
        );

        self.opt.set_learning_rate(request.learning_rate);
        let actions = request.actions.iter().map(|&a| a as u32).collect::<Vec<_>>();
        let actions = Tensor::from_vec(actions, (batch_size, 1), &self.device)?;
        let targets = Tensor::from_slice(request.targets, batch_size, &self.device)?;

        let q = self.forward(request.states)?;
        let q_acted = q.gather(&actions, D::Minus1)?.squeeze(D::Minus1)?;
        let delta = (targets - q_acted)?;
        let delta = match request.stabilization {
            Stabilization::DeltaClip {
                min_delta,
                max_delta,
            } => delta.clamp(min_delta, max_delta)?,
            _ => delta,
        };
        let loss = delta.sqr()?.mean_all()?;

        let mut grads = loss.backward()?;
        if let Stabilization::GradNormClip { max_grad_norm } = request.stabilization {
            let norm = clip_grad_norm(&mut grads, &self.varmap.all_vars(), max_grad_norm)?;
            trace!("Gradient norm before clipping: {}", norm);
        }
        self.opt.step(&grads)?;

        Ok(UpdateOutput {
            q_values: q.flatten_all()?.to_vec1::<f32>()?,
            loss: loss.to_scalar::<f32>()?,
        })
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.varmap.save(path)?;
        info!("Save QNetwork to {:?}", path);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.varmap.load(path)?;
        info!("Load QNetwork from {:?}", path);
        Ok(())
    }
}
