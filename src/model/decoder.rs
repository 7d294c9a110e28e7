//! GPT-2 transformer block.

use candle_core::{DType, Device, Module, Result, Tensor};
use candle_nn::{layer_norm, LayerNorm, VarBuilder};

use super::attention::Gpt2Attention;
use super::mlp::Gpt2Mlp;

/// GPT-2 block with pre-norm residual connections.
///
/// ```text
/// x ──┬─▶ ln_1 ─▶ attn ─▶ + ──┬─▶ ln_2 ─▶ mlp ─▶ + ─▶ out
///     └───────────────────┘   └───────────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct Gpt2Block {
    ln_1: LayerNorm,
    attn: Gpt2Attention,
    ln_2: LayerNorm,
    mlp: Gpt2Mlp,
}

impl Gpt2Block {
    /// Creates a new Gpt2Block from a VarBuilder.
    ///
    /// # Arguments
    ///
    /// * `n_embd` - Model hidden dimension
    /// * `n_inner` - MLP inner dimension
    /// * `n_head` - Number of attention heads
    /// * `eps` - LayerNorm epsilon
    /// * `vb` - VarBuilder for loading weights
    pub fn new(n_embd: usize, n_inner: usize, n_head: usize, eps: f64, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            ln_1: layer_norm(n_embd, eps, vb.pp("ln_1"))?,
            attn: Gpt2Attention::new(n_embd, n_head, vb.pp("attn"))?,
            ln_2: layer_norm(n_embd, eps, vb.pp("ln_2"))?,
            mlp: Gpt2Mlp::new(n_embd, n_inner, vb.pp("mlp"))?,
        })
    }

    /// Creates a new Gpt2Block with random weights for testing.
    pub fn new_random(
        n_embd: usize,
        n_inner: usize,
        n_head: usize,
        eps: f64,
        dtype: DType,
        device: &Device,
    ) -> Result<Self> {
        let norm = || -> Result<LayerNorm> {
            Ok(LayerNorm::new(
                Tensor::ones(n_embd, dtype, device)?,
                Tensor::zeros(n_embd, dtype, device)?,
                eps,
            ))
        };
        Ok(Self {
            ln_1: norm()?,
            attn: Gpt2Attention::new_random(n_embd, n_head, dtype, device)?,
            ln_2: norm()?,
            mlp: Gpt2Mlp::new_random(n_embd, n_inner, dtype, device)?,
        })
    }

    /// Returns a reference to the attention module.
    pub fn attn(&self) -> &Gpt2Attention {
        &self.attn
    }

    /// Forward pass through the block.
    ///
    /// # Arguments
    ///
    /// * `hidden_states` - Input tensor [batch, seq_len, n_embd]
    /// * `past` - This layer's cached keys/values
    ///
    /// # Returns
    ///
    /// Output tensor [batch, seq_len, n_embd] and the extended keys/values.
    pub fn forward(
        &self,
        hidden_states: &Tensor,
        past: Option<&(Tensor, Tensor)>,
    ) -> Result<(Tensor, (Tensor, Tensor))> {
        let residual = hidden_states;
        let (attn_out, present) = self.attn.forward(&self.ln_1.forward(hidden_states)?, past)?;
        let hidden_states = (residual + attn_out)?;

        let mlp_out = self.mlp.forward(&self.ln_2.forward(&hidden_states)?)?;
        Ok(((hidden_states + mlp_out)?, present))
    }
}
