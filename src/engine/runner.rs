//! Question generation run loop.
//!
//! The runner drives an ordered stream of instances through the cache,
//! generator and assembler:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      QuestionRunner                         │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                 step(instance) for each instance
//!                            ▼
//!                ┌────────────────────────┐
//!                │ para_index changed?    │
//!                └────────────────────────┘
//!                  yes │            │ no
//!                      ▼            │
//!         ┌────────────────────┐    │
//!         │ NewParagraph       │    │
//!         │ cache.reset/prime  │    │
//!         └────────────────────┘    │
//!                      │            │
//!                      ▼            ▼
//!                ┌────────────────────────┐
//!                │ Generating             │
//!                │ take → generate → store│
//!                └────────────────────────┘
//!                            │
//!                            ▼
//!                ┌────────────────────────┐
//!                │ ResultAssembler::push  │
//!                └────────────────────────┘
//! ```
//!
//! Processing is strictly sequential; the document is only produced once the
//! whole stream has succeeded.

use tracing::{debug, info, info_span};

use super::generator::QuestionGenerator;
use crate::config::GenerationConfig;
use crate::core::cache::GenerationStateCache;
use crate::core::instance::{GeneratedInstance, Instance};
use crate::core::segments::SpecialTokens;
use crate::error::Result;
use crate::model::LanguageModel;
use crate::output::{OutputDocument, ResultAssembler};
use crate::tokenizer::TokenCodec;

/// Position of the runner in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No instance processed yet.
    Idle,
    /// Priming the cache for a new paragraph group.
    NewParagraph,
    /// Generating questions within the current group.
    Generating,
}

/// Drives generation for a stream of instances.
pub struct QuestionRunner<M: LanguageModel, T: TokenCodec> {
    /// The language model.
    model: M,
    /// Tokenizer for decoding results.
    tokenizer: T,
    /// Special token ids.
    special: SpecialTokens,
    /// Token-by-token question generation.
    generator: QuestionGenerator,
    /// Past for the active paragraph group.
    cache: GenerationStateCache<M::State>,
    /// Collected output.
    assembler: ResultAssembler,
    /// Current state.
    state: RunState,
}

impl<M: LanguageModel, T: TokenCodec> QuestionRunner<M, T> {
    /// Create a runner, resolving special tokens from the tokenizer vocabulary.
    ///
    /// # Arguments
    ///
    /// * `model` - Language model to generate with
    /// * `tokenizer` - Tokenizer holding the special tokens
    /// * `config` - Generation settings for the whole run
    pub fn new(model: M, tokenizer: T, config: GenerationConfig) -> Result<Self> {
        let special = SpecialTokens::resolve(&tokenizer)?;
        Self::with_special_tokens(model, tokenizer, config, special)
    }

    /// Create a runner with explicit special token ids.
    pub fn with_special_tokens(
        model: M,
        tokenizer: T,
        config: GenerationConfig,
        special: SpecialTokens,
    ) -> Result<Self> {
        let generator = QuestionGenerator::new(config, special)?;
        Ok(Self {
            model,
            tokenizer,
            special,
            generator,
            cache: GenerationStateCache::new(),
            assembler: ResultAssembler::new(),
            state: RunState::Idle,
        })
    }

    /// Process one instance: prime on paragraph change, generate, assemble.
    pub fn step(&mut self, instance: Instance) -> Result<GeneratedInstance> {
        // A failed generation leaves the group without a state; prime again.
        if self.cache.needs_prime(instance.para_index) || !self.cache.is_primed() {
            self.state = RunState::NewParagraph;
            info!(para_index = instance.para_index, "new paragraph");
            self.cache.reset();
            self.cache.prime(&mut self.model, &instance, &self.special)?;
        }

        self.state = RunState::Generating;
        let past = self.cache.take();
        let (generated, past) = self.generator.generate(&mut self.model, instance, past)?;
        self.cache.store(past);

        let record = self.assembler.push(&self.tokenizer, &generated)?;
        debug!(
            id = %record.id,
            question = %record.question,
            finish_reason = ?generated.finish_reason,
            "question done"
        );
        Ok(generated)
    }

    /// Process every instance in order and return the assembled document.
    pub fn run<I>(mut self, instances: I) -> Result<OutputDocument>
    where
        I: IntoIterator<Item = Instance>,
    {
        let span = info_span!("run");
        let _enter = span.enter();

        for instance in instances {
            self.step(instance)?;
        }

        info!(
            paragraphs = self.assembler.num_paragraphs(),
            questions = self.assembler.num_questions(),
            primes = self.cache.num_primes(),
            "generation finished"
        );
        Ok(self.finish())
    }

    /// Consume the runner and return the document assembled so far.
    pub fn finish(self) -> OutputDocument {
        self.assembler.finish()
    }

    /// Get the model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get the current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Get the state cache.
    pub fn cache(&self) -> &GenerationStateCache<M::State> {
        &self.cache
    }

    /// Get the generator.
    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    /// Get the assembler.
    pub fn assembler(&self) -> &ResultAssembler {
        &self.assembler
    }
}
