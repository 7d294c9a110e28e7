//! Logits filtering before sampling.
//!
//! Three filters run in a fixed order, each one seeing the output of the
//! previous one:
//!
//! ```text
//! Logits [vocab_size]
//!     │
//!     ▼ Top-k (top_k > 0)
//! Drop everything below the k-th largest score
//!     │
//!     ▼ Top-p (top_p > 0)
//! Keep the smallest prefix whose softmax mass exceeds p
//!     │
//!     ▼ Threshold
//! Drop everything below a fixed score
//!     │
//!     ▼
//! Filtered logits [vocab_size]
//! ```
//!
//! Dropped entries are overwritten with [`FILTER_VALUE`] so that a later
//! softmax gives them zero probability. The highest-scoring entry always
//! survives.

use std::cmp::Ordering;

use candle_core::{DType, Tensor};

use crate::error::{Error, Result};

/// Score written over filtered entries.
pub const FILTER_VALUE: f32 = f32::NEG_INFINITY;

/// Top-k / nucleus / threshold filter over a single score vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitsFilter {
    /// Keep the k highest scores (0 = disabled).
    pub top_k: usize,
    /// Keep the nucleus covering this probability mass (0.0 = disabled).
    pub top_p: f32,
    /// Drop scores strictly below this value.
    pub threshold: f32,
    /// Replacement for dropped scores.
    pub filter_value: f32,
}

impl Default for LogitsFilter {
    fn default() -> Self {
        Self {
            top_k: 0,
            top_p: 0.0,
            threshold: f32::NEG_INFINITY,
            filter_value: FILTER_VALUE,
        }
    }
}

impl LogitsFilter {
    /// Create a filter with the given top-k and top-p settings.
    pub fn new(top_k: usize, top_p: f32) -> Self {
        Self {
            top_k,
            top_p,
            ..Self::default()
        }
    }

    /// Set the minimum score to keep.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the replacement value for dropped scores.
    pub fn with_filter_value(mut self, filter_value: f32) -> Self {
        self.filter_value = filter_value;
        self
    }

    /// Filter a 1-D logits tensor, returning a new f32 tensor of the same length.
    pub fn apply(&self, logits: &Tensor) -> Result<Tensor> {
        if logits.rank() != 1 {
            return Err(Error::InvalidLogits(format!(
                "expected 1D logits, got {}D",
                logits.rank()
            )));
        }
        let mut values: Vec<f32> = logits.to_dtype(DType::F32)?.to_vec1()?;
        if values.is_empty() {
            return Err(Error::InvalidLogits("empty vocabulary".into()));
        }
        self.apply_in_place(&mut values);
        let len = values.len();
        Ok(Tensor::from_vec(values, len, logits.device())?)
    }

    /// Filter a score slice in place.
    pub fn apply_in_place(&self, logits: &mut [f32]) {
        if logits.is_empty() {
            return;
        }
        if self.top_k > 0 {
            self.apply_top_k(logits);
        }
        if self.top_p > 0.0 {
            self.apply_top_p(logits);
        }
        self.apply_threshold(logits);
    }

    /// Drop every score strictly below the k-th largest; ties at the boundary survive.
    fn apply_top_k(&self, logits: &mut [f32]) {
        let k = self.top_k.min(logits.len());
        let mut sorted = logits.to_vec();
        sorted.sort_by(|a, b| descending(*a, *b));
        let kth = sorted[k - 1];

        for x in logits.iter_mut() {
            if *x < kth {
                *x = self.filter_value;
            }
        }
    }

    /// Keep the highest-probability prefix up to and including the first token
    /// whose cumulative probability exceeds `top_p`.
    fn apply_top_p(&self, logits: &mut [f32]) {
        let mut order: Vec<usize> = (0..logits.len()).collect();
        order.sort_by(|&i, &j| descending(logits[i], logits[j]));

        let max = logits[order[0]];
        if max == f32::NEG_INFINITY || max.is_nan() {
            return;
        }

        let exp: Vec<f32> = order.iter().map(|&i| (logits[i] - max).exp()).collect();
        let sum: f32 = exp.iter().sum();

        // The removal mask is shifted right by one, so position r is dropped
        // when the mass strictly before it already exceeds top_p.
        let mut cumulative = 0.0f32;
        let mut remove = Vec::with_capacity(order.len());
        for e in &exp {
            remove.push(cumulative > self.top_p);
            cumulative += e / sum;
        }
        remove[0] = false;

        for (&index, drop) in order.iter().zip(remove) {
            if drop {
                logits[index] = self.filter_value;
            }
        }
    }

    fn apply_threshold(&self, logits: &mut [f32]) {
        for x in logits.iter_mut() {
            if *x < self.threshold {
                *x = self.filter_value;
            }
        }
    }
}

/// Descending order with NaN sorted last.
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
