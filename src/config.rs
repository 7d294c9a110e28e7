//! Configuration types for squash-qgen.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Decoding configuration, fixed for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of question tokens to generate.
    pub max_length: usize,
    /// Number of tokens that must be produced before a special token may end the question.
    pub min_length: usize,
    /// Softmax temperature (must be > 0).
    pub temperature: f32,
    /// Top-k filtering (0 = disabled).
    pub top_k: usize,
    /// Nucleus filtering (0.0 = disabled).
    pub top_p: f32,
    /// Greedy decoding instead of sampling.
    pub no_sample: bool,
    /// Seed for the sampling RNG.
    pub seed: u64,
    /// Cap on redraws while rejecting special tokens before `min_length` (None = unbounded).
    #[serde(default)]
    pub max_resamples: Option<usize>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 50,
            min_length: 1,
            temperature: 0.7,
            top_k: 0,
            top_p: 0.9,
            no_sample: false,
            seed: 42,
            max_resamples: None,
        }
    }
}

impl GenerationConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(Error::Config(format!(
                "temperature must be a positive number, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(Error::Config(format!(
                "top_p must lie in [0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    /// Set the maximum question length.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the minimum question length.
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set top-k.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set top-p.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Switch to greedy decoding.
    pub fn greedy(mut self) -> Self {
        self.no_sample = true;
        self
    }

    /// Set the RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Bound the special-token resampling guard.
    pub fn max_resamples(mut self, max_resamples: usize) -> Self {
        self.max_resamples = Some(max_resamples);
        self
    }
}
