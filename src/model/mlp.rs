//! GPT-2 feed-forward network.

use candle_core::{DType, Device, Module, Result, Tensor};
use candle_nn::{Linear, VarBuilder};

use super::conv1d;

/// GPT-2 MLP: `c_proj(gelu(c_fc(x)))`.
///
/// GELU is the tanh approximation (`gelu_new` in GPT-2 checkpoints).
#[derive(Debug, Clone)]
pub struct Gpt2Mlp {
    /// Expansion [n_embd] -> [inner].
    c_fc: Linear,
    /// Contraction [inner] -> [n_embd].
    c_proj: Linear,
    hidden_size: usize,
    intermediate_size: usize,
}

impl Gpt2Mlp {
    /// Creates a new Gpt2Mlp from a VarBuilder.
    ///
    /// # Arguments
    ///
    /// * `hidden_size` - Input/output dimension
    /// * `intermediate_size` - Inner dimension (usually `4 * hidden_size`)
    /// * `vb` - VarBuilder for loading weights
    pub fn new(hidden_size: usize, intermediate_size: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            c_fc: conv1d(hidden_size, intermediate_size, vb.pp("c_fc"))?,
            c_proj: conv1d(intermediate_size, hidden_size, vb.pp("c_proj"))?,
            hidden_size,
            intermediate_size,
        })
    }

    /// Creates a new Gpt2Mlp with random weights for testing.
    pub fn new_random(
        hidden_size: usize,
        intermediate_size: usize,
        dtype: DType,
        device: &Device,
    ) -> Result<Self> {
        let scale = 0.02;
        let fc_weight =
            Tensor::randn(0.0f32, scale, (intermediate_size, hidden_size), device)?.to_dtype(dtype)?;
        let proj_weight =
            Tensor::randn(0.0f32, scale, (hidden_size, intermediate_size), device)?.to_dtype(dtype)?;

        Ok(Self {
            c_fc: Linear::new(fc_weight, Some(Tensor::zeros(intermediate_size, dtype, device)?)),
            c_proj: Linear::new(proj_weight, Some(Tensor::zeros(hidden_size, dtype, device)?)),
            hidden_size,
            intermediate_size,
        })
    }

    /// Returns the hidden size.
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Returns the intermediate size.
    pub fn intermediate_size(&self) -> usize {
        self.intermediate_size
    }
}

impl Module for Gpt2Mlp {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.c_fc.forward(x)?.gelu()?;
        self.c_proj.forward(&x)
    }
}
