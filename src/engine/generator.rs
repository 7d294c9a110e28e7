//! Autoregressive question generation.
//!
//! One call produces one question for one instance on top of the cached
//! paragraph state:
//!
//! ```text
//! past (primed paragraph)
//!     │
//!     ▼ model.step(<answer-c> A... <question-c>)
//! logits, past
//!     │
//!     ▼ ┌──────────────────────────────────────────┐
//!       │ distribution → select → guard             │ × max_length
//!       │ special? ──yes──▶ stop                    │
//!       │   no ──▶ model.step(token), append token  │
//!       └──────────────────────────────────────────┘
//! question tokens, advanced past
//! ```

use tracing::{debug, warn};

use super::sampler::Sampler;
use crate::config::GenerationConfig;
use crate::core::instance::{FinishReason, GeneratedInstance, Instance};
use crate::core::segments::{question_prompt, SpecialTokens};
use crate::error::{Error, Result};
use crate::model::LanguageModel;

/// Generates one question per call, advancing the cached state it is given.
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    config: GenerationConfig,
    special: SpecialTokens,
    sampler: Sampler,
}

impl QuestionGenerator {
    /// Create a generator; the configuration is validated.
    pub fn new(config: GenerationConfig, special: SpecialTokens) -> Result<Self> {
        config.validate()?;
        let sampler = Sampler::new(&config);
        Ok(Self {
            config,
            special,
            sampler,
        })
    }

    /// Generation settings.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Special token ids.
    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }

    /// Generate a question for `instance` on top of `past`.
    ///
    /// Returns the instance with its question and the state advanced over the
    /// prompt and every appended token.
    pub fn generate<M: LanguageModel>(
        &mut self,
        model: &mut M,
        instance: Instance,
        past: Option<M::State>,
    ) -> Result<(GeneratedInstance, M::State)> {
        let prompt = question_prompt(&instance, &self.special);
        let token_type = self.special.question_marker(instance.class);

        let (mut logits, mut past) = model.step(&prompt.input_ids, &prompt.token_type_ids, past)?;
        let mut question: Vec<u32> = Vec::with_capacity(self.config.max_length);
        let mut finish_reason = FinishReason::MaxLength;

        for _ in 0..self.config.max_length {
            let probs = self.sampler.distribution(&logits)?;
            let token = self.select_token(&probs, question.len())?;

            if self.special.contains(token) {
                finish_reason = FinishReason::EndOfSequence;
                break;
            }

            let (next_logits, next_past) = model.step(&[token], &[token_type], Some(past))?;
            logits = next_logits;
            past = next_past;
            question.push(token);
        }

        debug!(
            para_index = instance.para_index,
            tokens = question.len(),
            finish_reason = ?finish_reason,
            "generated question"
        );

        Ok((
            GeneratedInstance {
                instance,
                question,
                finish_reason,
            },
            past,
        ))
    }

    /// Select a token, redrawing special tokens while fewer than `min_length`
    /// tokens have been produced.
    ///
    /// Redraws use the same distribution without renormalisation.
    fn select_token(&mut self, probs: &[f32], produced: usize) -> Result<u32> {
        let mut token = self.sampler.select(probs)?;
        if produced >= self.config.min_length || !self.special.contains(token) {
            return Ok(token);
        }

        let fallback = self
            .best_content_token(probs)
            .ok_or(Error::SpecialTokensOnly { produced })?;

        let mut attempts = 0usize;
        while self.special.contains(token) {
            if let Some(limit) = self.config.max_resamples {
                if attempts >= limit {
                    warn!(
                        attempts,
                        fallback, "special-token resampling cap reached, taking most probable content token"
                    );
                    return Ok(fallback);
                }
            }
            token = self.sampler.draw(probs)?;
            attempts += 1;
        }
        Ok(token)
    }

    /// Most probable non-special token with positive probability.
    fn best_content_token(&self, probs: &[f32]) -> Option<u32> {
        probs
            .iter()
            .enumerate()
            .filter(|(id, &p)| p > 0.0 && !self.special.contains(*id as u32))
            .fold(None, |best: Option<(usize, f32)>, (id, &p)| match best {
                Some((_, b)) if b >= p => best,
                _ => Some((id, p)),
            })
            .map(|(id, _)| id as u32)
    }
}
