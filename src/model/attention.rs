//! GPT-2 self-attention.
//!
//! Multi-head causal attention with a fused QKV projection and per-layer
//! key/value past for incremental decoding.

use candle_core::{DType, Device, Module, Result, Tensor, D};
use candle_nn::{Linear, VarBuilder};

use super::conv1d;

/// GPT-2 multi-head self-attention.
#[derive(Debug, Clone)]
pub struct Gpt2Attention {
    /// Fused Q, K, V projection [n_embd] -> [3 * n_embd].
    c_attn: Linear,
    /// Output projection [n_embd] -> [n_embd].
    c_proj: Linear,
    /// Number of heads.
    num_heads: usize,
    /// Dimension per head.
    head_dim: usize,
    /// Scaling factor for attention scores.
    scale: f64,
}

impl Gpt2Attention {
    /// Creates a new Gpt2Attention from a VarBuilder.
    ///
    /// # Arguments
    ///
    /// * `n_embd` - Model hidden dimension
    /// * `num_heads` - Number of attention heads
    /// * `vb` - VarBuilder for loading weights
    pub fn new(n_embd: usize, num_heads: usize, vb: VarBuilder) -> Result<Self> {
        let c_attn = conv1d(n_embd, 3 * n_embd, vb.pp("c_attn"))?;
        let c_proj = conv1d(n_embd, n_embd, vb.pp("c_proj"))?;
        Ok(Self::from_parts(c_attn, c_proj, n_embd, num_heads))
    }

    /// Creates a new Gpt2Attention with random weights for testing.
    pub fn new_random(n_embd: usize, num_heads: usize, dtype: DType, device: &Device) -> Result<Self> {
        let scale_init = 0.02;
        let attn_weight =
            Tensor::randn(0.0f32, scale_init, (3 * n_embd, n_embd), device)?.to_dtype(dtype)?;
        let attn_bias = Tensor::zeros(3 * n_embd, dtype, device)?;
        let proj_weight = Tensor::randn(0.0f32, scale_init, (n_embd, n_embd), device)?.to_dtype(dtype)?;
        let proj_bias = Tensor::zeros(n_embd, dtype, device)?;

        Ok(Self::from_parts(
            Linear::new(attn_weight, Some(attn_bias)),
            Linear::new(proj_weight, Some(proj_bias)),
            n_embd,
            num_heads,
        ))
    }

    fn from_parts(c_attn: Linear, c_proj: Linear, n_embd: usize, num_heads: usize) -> Self {
        let head_dim = n_embd / num_heads;
        Self {
            c_attn,
            c_proj,
            num_heads,
            head_dim,
            scale: 1.0 / (head_dim as f64).sqrt(),
        }
    }

    /// Returns the number of heads.
    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    /// Returns the head dimension.
    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Forward pass through the attention layer.
    ///
    /// # Arguments
    ///
    /// * `hidden_states` - Input tensor [batch, seq_len, n_embd]
    /// * `past` - Keys and values of earlier positions, each
    ///   [batch, num_heads, past_len, head_dim]
    ///
    /// # Returns
    ///
    /// Output tensor [batch, seq_len, n_embd] and the extended keys/values.
    pub fn forward(
        &self,
        hidden_states: &Tensor,
        past: Option<&(Tensor, Tensor)>,
    ) -> Result<(Tensor, (Tensor, Tensor))> {
        let (batch_size, seq_len, n_embd) = hidden_states.dims3()?;

        // 1. Fused projection, split into Q, K, V
        let qkv = self.c_attn.forward(hidden_states)?;
        let q = qkv.narrow(D::Minus1, 0, n_embd)?;
        let k = qkv.narrow(D::Minus1, n_embd, n_embd)?;
        let v = qkv.narrow(D::Minus1, 2 * n_embd, n_embd)?;

        // 2. [batch, seq_len, n_embd] -> [batch, num_heads, seq_len, head_dim]
        let q = self.split_heads(&q, batch_size, seq_len)?;
        let k = self.split_heads(&k, batch_size, seq_len)?;
        let v = self.split_heads(&v, batch_size, seq_len)?;

        // 3. Extend past
        let (k, v) = match past {
            Some((past_k, past_v)) => (
                Tensor::cat(&[past_k, &k], 2)?.contiguous()?,
                Tensor::cat(&[past_v, &v], 2)?.contiguous()?,
            ),
            None => (k, v),
        };
        let kv_seq_len = k.dim(2)?;
        let start_pos = kv_seq_len - seq_len;

        // 4. Scores: Q @ K^T / sqrt(d)
        let attn_weights = (q.matmul(&k.transpose(D::Minus2, D::Minus1)?.contiguous()?)? * self.scale)?;

        // 5. Causal mask
        let mask = causal_mask(seq_len, kv_seq_len, start_pos, q.device())?.to_dtype(attn_weights.dtype())?;
        let attn_weights = attn_weights.broadcast_add(&mask)?;

        // 6. Softmax, weighted values
        let attn_weights = candle_nn::ops::softmax_last_dim(&attn_weights)?;
        let attn_output = attn_weights.matmul(&v)?;

        // 7. Merge heads and project
        let attn_output = attn_output
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch_size, seq_len, n_embd))?;
        let output = self.c_proj.forward(&attn_output)?;

        Ok((output, (k, v)))
    }

    fn split_heads(&self, x: &Tensor, batch_size: usize, seq_len: usize) -> Result<Tensor> {
        x.reshape((batch_size, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }
}

/// Additive causal mask [1, 1, seq_len, kv_seq_len].
///
/// Query `i` sits at absolute position `start_pos + i` and may attend to every
/// key at or before it.
fn causal_mask(seq_len: usize, kv_seq_len: usize, start_pos: usize, device: &Device) -> Result<Tensor> {
    if seq_len == 1 {
        return Tensor::zeros((1, 1, 1, kv_seq_len), DType::F32, device);
    }
    let mask: Vec<f32> = (0..seq_len)
        .flat_map(|i| {
            let query_pos = start_pos + i;
            (0..kv_seq_len).map(move |key_pos| {
                if key_pos > query_pos {
                    f32::NEG_INFINITY
                } else {
                    0.0
                }
            })
        })
        .collect();
    Tensor::from_vec(mask, (1, 1, seq_len, kv_seq_len), device)
}
