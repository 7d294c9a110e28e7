//! Language model implementations.
//!
//! This module contains:
//! - The `LanguageModel` seam used by the generation engine
//! - A GPT-2 decoder with token-type embeddings and per-layer past
//! - Model loading from HuggingFace or a local checkpoint directory

pub mod attention;
pub mod decoder;
pub mod gpt2;
pub mod loader;
pub mod mlp;

pub use attention::Gpt2Attention;
pub use decoder::Gpt2Block;
pub use gpt2::{Gpt2LMHeadModel, Gpt2Past};
pub use loader::{download_model, load_config, load_safetensors, locate_model, Gpt2Config, ModelFiles};
pub use mlp::Gpt2Mlp;

use candle_core::Tensor;
use candle_nn::{Linear, VarBuilder};

use crate::error::Result;

/// An autoregressive language model with cached state.
///
/// The first call for a context usually passes a multi-token prefix and no
/// past; later calls pass one token each together with the past returned by
/// the previous call.
pub trait LanguageModel {
    /// Accumulated context ("past") carried between calls.
    type State: Clone;

    /// Run the model over `input_ids` (with parallel `token_type_ids`) on top
    /// of `past`, returning next-token logits `[vocab_size]` for the last
    /// position and the updated state.
    fn step(
        &mut self,
        input_ids: &[u32],
        token_type_ids: &[u32],
        past: Option<Self::State>,
    ) -> Result<(Tensor, Self::State)>;
}

/// GPT-2 style `Conv1D` projection: weights are stored `[in, out]`.
pub(crate) fn conv1d(in_dim: usize, out_dim: usize, vb: VarBuilder) -> candle_core::Result<Linear> {
    let weight = vb.get((in_dim, out_dim), "weight")?.t()?.contiguous()?;
    let bias = vb.get(out_dim, "bias")?;
    Ok(Linear::new(weight, Some(bias)))
}
