//! GPT-2 language model with token-type embeddings.
//!
//! Segment types share the word embedding table: the embedding of each
//! position is `wte[token] + wpe[position] + wte[token_type]`.
//!
//! ## Architecture
//!
//! ```text
//! input_ids, token_type_ids, past
//!       │
//!       ▼
//! ┌────────────────────┐
//! │ wte + wpe + wte(tt)│  positions continue after the past
//! └────────────────────┘
//!       │
//!       ▼
//! ┌────────────────────┐
//! │ Gpt2Block          │ × n_layer   (each extends its own past)
//! └────────────────────┘
//!       │
//!       ▼
//! ┌────────────────────┐
//! │ ln_f               │
//! └────────────────────┘
//!       │
//!       ▼
//! ┌────────────────────┐
//! │ lm_head (tied wte) │  last position only
//! └────────────────────┘
//!       │
//!       ▼
//! logits [vocab_size], past
//! ```

use std::collections::HashMap;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{embedding, layer_norm, Embedding, LayerNorm, Linear, VarBuilder};

use super::decoder::Gpt2Block;
use super::loader::Gpt2Config;
use super::LanguageModel;
use crate::error::{Error, Result};

/// Keys and values of every processed position, per layer.
#[derive(Debug, Clone)]
pub struct Gpt2Past {
    /// `(key, value)` per layer, each [1, n_head, seq_len, head_dim].
    layers: Vec<(Tensor, Tensor)>,
    /// Number of positions covered.
    seq_len: usize,
}

impl Gpt2Past {
    /// Number of positions covered.
    pub fn len(&self) -> usize {
        self.seq_len
    }

    /// Whether no position is covered.
    pub fn is_empty(&self) -> bool {
        self.seq_len == 0
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

/// GPT-2 with a tied language-model head.
#[derive(Debug, Clone)]
pub struct Gpt2LMHeadModel {
    /// Word embeddings, also used for token types.
    wte: Embedding,
    /// Position embeddings.
    wpe: Embedding,
    blocks: Vec<Gpt2Block>,
    ln_f: LayerNorm,
    lm_head: Linear,
    config: Gpt2Config,
    device: Device,
    dtype: DType,
}

impl Gpt2LMHeadModel {
    /// Creates a new model from a VarBuilder.
    ///
    /// Checkpoints saved with or without the `transformer.` prefix are both
    /// accepted.
    pub fn new(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        let device = vb.device().clone();
        let dtype = vb.dtype();
        let vb = if vb.contains_tensor("transformer.wte.weight") {
            vb.pp("transformer")
        } else {
            vb
        };

        let wte = embedding(config.vocab_size, config.n_embd, vb.pp("wte"))?;
        let wpe = embedding(config.n_positions, config.n_embd, vb.pp("wpe"))?;

        let mut blocks = Vec::with_capacity(config.n_layer);
        for i in 0..config.n_layer {
            blocks.push(Gpt2Block::new(
                config.n_embd,
                config.inner_dim(),
                config.n_head,
                config.layer_norm_epsilon,
                vb.pp(format!("h.{i}")),
            )?);
        }

        let ln_f = layer_norm(config.n_embd, config.layer_norm_epsilon, vb.pp("ln_f"))?;
        let lm_head = Linear::new(wte.embeddings().clone(), None);

        Ok(Self {
            wte,
            wpe,
            blocks,
            ln_f,
            lm_head,
            config: config.clone(),
            device,
            dtype,
        })
    }

    /// Creates a model with random weights for testing.
    pub fn new_random(config: &Gpt2Config, device: &Device) -> Result<Self> {
        let scale = 0.02f32;
        let (n_embd, inner) = (config.n_embd, config.inner_dim());
        let mut tensors: HashMap<String, Tensor> = HashMap::new();
        let mut randn = |name: String, shape: &[usize]| -> Result<()> {
            tensors.insert(name, Tensor::randn(0.0f32, scale, shape, device)?);
            Ok(())
        };

        randn("wte.weight".into(), &[config.vocab_size, n_embd])?;
        randn("wpe.weight".into(), &[config.n_positions, n_embd])?;
        for i in 0..config.n_layer {
            let p = format!("h.{i}");
            randn(format!("{p}.attn.c_attn.weight"), &[n_embd, 3 * n_embd])?;
            randn(format!("{p}.attn.c_attn.bias"), &[3 * n_embd])?;
            randn(format!("{p}.attn.c_proj.weight"), &[n_embd, n_embd])?;
            randn(format!("{p}.attn.c_proj.bias"), &[n_embd])?;
            randn(format!("{p}.mlp.c_fc.weight"), &[n_embd, inner])?;
            randn(format!("{p}.mlp.c_fc.bias"), &[inner])?;
            randn(format!("{p}.mlp.c_proj.weight"), &[inner, n_embd])?;
            randn(format!("{p}.mlp.c_proj.bias"), &[n_embd])?;
        }

        let mut norm = |name: String| -> Result<()> {
            tensors.insert(format!("{name}.weight"), Tensor::ones(n_embd, DType::F32, device)?);
            tensors.insert(format!("{name}.bias"), Tensor::zeros(n_embd, DType::F32, device)?);
            Ok(())
        };
        for i in 0..config.n_layer {
            norm(format!("h.{i}.ln_1"))?;
            norm(format!("h.{i}.ln_2"))?;
        }
        norm("ln_f".into())?;

        Self::new(config, VarBuilder::from_tensors(tensors, DType::F32, device))
    }

    /// Forward pass over new tokens on top of `past`.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - New token ids
    /// * `token_type_ids` - Segment type per new token
    /// * `past` - State returned by the previous call, if any
    ///
    /// # Returns
    ///
    /// Logits for the last position [vocab_size] and the extended past.
    pub fn forward(
        &self,
        input_ids: &[u32],
        token_type_ids: &[u32],
        past: Option<&Gpt2Past>,
    ) -> Result<(Tensor, Gpt2Past)> {
        if input_ids.is_empty() {
            return Err(Error::Model("empty input".into()));
        }
        if input_ids.len() != token_type_ids.len() {
            return Err(Error::Model(format!(
                "input_ids ({}) and token_type_ids ({}) differ in length",
                input_ids.len(),
                token_type_ids.len()
            )));
        }
        let past_len = past.map_or(0, Gpt2Past::len);
        let seq_len = input_ids.len();
        if past_len + seq_len > self.config.n_positions {
            return Err(Error::Model(format!(
                "sequence of {} positions exceeds n_positions {}",
                past_len + seq_len,
                self.config.n_positions
            )));
        }

        let ids = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let types = Tensor::new(token_type_ids, &self.device)?.unsqueeze(0)?;
        let positions =
            Tensor::arange(past_len as u32, (past_len + seq_len) as u32, &self.device)?.unsqueeze(0)?;

        let mut hidden_states = self
            .wte
            .forward(&ids)?
            .add(&self.wpe.forward(&positions)?)?
            .add(&self.wte.forward(&types)?)?;

        let mut layers = Vec::with_capacity(self.blocks.len());
        for (i, block) in self.blocks.iter().enumerate() {
            let layer_past = past.and_then(|p| p.layers.get(i));
            let (out, present) = block.forward(&hidden_states, layer_past)?;
            hidden_states = out;
            layers.push(present);
        }

        let hidden_states = self.ln_f.forward(&hidden_states)?;
        let last_hidden = hidden_states.narrow(1, seq_len - 1, 1)?.squeeze(1)?;
        let logits = self.lm_head.forward(&last_hidden)?.squeeze(0)?;

        Ok((
            logits,
            Gpt2Past {
                layers,
                seq_len: past_len + seq_len,
            },
        ))
    }

    /// Returns the model configuration.
    pub fn config(&self) -> &Gpt2Config {
        &self.config
    }

    /// Returns the device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of blocks.
    pub fn num_layers(&self) -> usize {
        self.blocks.len()
    }
}

impl LanguageModel for Gpt2LMHeadModel {
    type State = Gpt2Past;

    fn step(
        &mut self,
        input_ids: &[u32],
        token_type_ids: &[u32],
        past: Option<Gpt2Past>,
    ) -> Result<(Tensor, Gpt2Past)> {
        self.forward(input_ids, token_type_ids, past.as_ref())
    }
}
