//! Cached model state for the active paragraph group.
//!
//! All questions about one paragraph share its encoded context. The cache
//! encodes the paragraph once (`prime`), then lends the state to the
//! generator for each question and takes the advanced state back:
//!
//! ```text
//!   para_index changes           same para_index
//!          │                            │
//!          ▼                            ▼
//!   reset() ─▶ prime() ─▶ take() ─▶ generate ─▶ store()
//!                           ▲                     │
//!                           └─────────────────────┘
//! ```

use tracing::debug;

use crate::core::instance::{Instance, ParaIndex};
use crate::core::segments::{context_prefix, SpecialTokens};
use crate::error::Result;
use crate::model::LanguageModel;

/// Owner of the model state ("past") for one paragraph group.
#[derive(Debug, Clone)]
pub struct GenerationStateCache<S> {
    /// Paragraph group the state belongs to.
    para_index: Option<ParaIndex>,
    /// Cached state; `None` when empty or lent out.
    past: Option<S>,
    /// Number of `prime` calls over the cache's lifetime.
    num_primes: usize,
}

impl<S> Default for GenerationStateCache<S> {
    fn default() -> Self {
        Self {
            para_index: None,
            past: None,
            num_primes: 0,
        }
    }
}

impl<S> GenerationStateCache<S> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the cached state and its paragraph group.
    pub fn reset(&mut self) {
        if let Some(para_index) = self.para_index.take() {
            debug!(para_index, "discarding cached paragraph state");
        }
        self.past = None;
    }

    /// Whether an instance from `para_index` needs a fresh priming pass.
    pub fn needs_prime(&self, para_index: ParaIndex) -> bool {
        self.para_index != Some(para_index)
    }

    /// Encode the instance's paragraph segment into a fresh state.
    ///
    /// The model is called once with an empty past; its logits are discarded.
    pub fn prime<M>(&mut self, model: &mut M, instance: &Instance, special: &SpecialTokens) -> Result<()>
    where
        M: LanguageModel<State = S>,
    {
        let input = context_prefix(instance, special);
        let (_logits, past) = model.step(&input.input_ids, &input.token_type_ids, None)?;

        debug!(
            para_index = instance.para_index,
            context_len = input.len(),
            "primed paragraph state"
        );

        self.para_index = Some(instance.para_index);
        self.past = Some(past);
        self.num_primes += 1;
        Ok(())
    }

    /// Borrow the cached state.
    pub fn get(&self) -> Option<&S> {
        self.past.as_ref()
    }

    /// Lend the cached state out, leaving the slot empty until `store`.
    pub fn take(&mut self) -> Option<S> {
        self.past.take()
    }

    /// Put back the state advanced by the generator.
    pub fn store(&mut self, past: S) {
        self.past = Some(past);
    }

    /// Paragraph group of the cached state.
    pub fn para_index(&self) -> Option<ParaIndex> {
        self.para_index
    }

    /// Whether a state is currently held.
    pub fn is_primed(&self) -> bool {
        self.past.is_some()
    }

    /// Number of `prime` calls so far.
    pub fn num_primes(&self) -> usize {
        self.num_primes
    }
}
