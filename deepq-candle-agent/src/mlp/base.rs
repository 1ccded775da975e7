use super::{Activation, MlpConfig};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().copied());
    dims.push(config.out_dim);
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| -> Result<Linear> { Ok(linear(w[0], w[1], vs.pp(format!("ln{}", i)))?) })
        .collect()
}

/// Multilayer perceptron with a linear output layer.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Constructs the network with parameters registered in `vs`.
    pub fn build(vs: VarBuilder, config: MlpConfig) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    /// Forward pass of a batch of inputs, `[batch_size, in_dim]`.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.to_device(&self.device)?;
        let n_layers = self.layers.len();

        for layer in self.layers[..n_layers - 1].iter() {
            xs = self.config.activation.forward(&layer.forward(&xs)?)?;
        }

        Ok(self.layers[n_layers - 1].forward(&xs)?)
    }

    /// Configuration.
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Activation function of the hidden layers.
    pub fn activation(&self) -> Activation {
        self.config.activation
    }
}
