//! Token selection.
//!
//! Turns one step of model logits into a token id:
//!
//! ```text
//! Logits [vocab_size]
//!     │
//!     ▼ Temperature scaling
//! Logits / temperature
//!     │
//!     ▼ LogitsFilter (top-k, top-p)
//! Filtered logits
//!     │
//!     ▼ Softmax
//! Probabilities
//!     │
//!     ▼ Argmax (no_sample) or categorical draw
//! Selected token
//! ```
//!
//! The distribution is computed once per step and kept, so that a rejected
//! draw can be repeated against exactly the same probabilities.

use candle_core::{DType, Tensor, D};
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;

use super::filter::LogitsFilter;
use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// Token sampler with configurable sampling strategies.
#[derive(Debug, Clone)]
pub struct Sampler {
    /// Temperature for scaling logits.
    temperature: f32,
    /// Top-k / top-p filter.
    filter: LogitsFilter,
    /// Greedy decoding.
    greedy: bool,
    /// Random number generator.
    rng: rand::rngs::StdRng,
}

impl Sampler {
    /// Creates a sampler seeded from the configuration.
    pub fn new(config: &GenerationConfig) -> Self {
        Self::with_seed(config, config.seed)
    }

    /// Creates a sampler with a specific seed for reproducibility.
    pub fn with_seed(config: &GenerationConfig, seed: u64) -> Self {
        Self {
            temperature: config.temperature,
            filter: LogitsFilter::new(config.top_k, config.top_p),
            greedy: config.no_sample,
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    /// Next-token probabilities for 1-D logits.
    pub fn distribution(&self, logits: &Tensor) -> Result<Vec<f32>> {
        if logits.rank() != 1 {
            return Err(Error::InvalidLogits(format!(
                "expected 1D logits, got {}D",
                logits.rank()
            )));
        }
        let logits = logits.to_dtype(DType::F32)?;
        let logits = (logits / self.temperature as f64)?;
        let logits = self.filter.apply(&logits)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?;
        Ok(probs.to_vec1()?)
    }

    /// Select a token: argmax when greedy, otherwise one categorical draw.
    pub fn select(&mut self, probs: &[f32]) -> Result<u32> {
        if self.greedy {
            argmax(probs)
        } else {
            self.draw(probs)
        }
    }

    /// Draw one token from the categorical distribution.
    pub fn draw(&mut self, probs: &[f32]) -> Result<u32> {
        let dist = WeightedIndex::new(probs)
            .map_err(|e| Error::Sampling(format!("failed to create distribution: {e}")))?;
        Ok(dist.sample(&mut self.rng) as u32)
    }

    /// Whether selection is greedy.
    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// The logits filter in use.
    pub fn filter(&self) -> &LogitsFilter {
        &self.filter
    }
}

/// Index of the highest probability; the first one wins on ties.
pub fn argmax(probs: &[f32]) -> Result<u32> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in probs.iter().enumerate() {
        match best {
            Some((_, b)) if p <= b => {}
            _ if p.is_nan() => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i as u32)
        .ok_or_else(|| Error::Sampling("no selectable token in distribution".into()))
}
