//! squash-qgen: answer-conditioned question generation with a GPT-2 decoder.
//!
//! The crate turns a stream of (paragraph, answer, class) instances into a
//! SQuAD-style document of generated questions:
//! - Per-paragraph cached model state, primed once and advanced per question
//! - Top-k / top-p logits filtering with temperature sampling
//! - A special-token guard enforcing a minimum question length
//! - Paragraph-grouped result assembly with consistency checks

pub mod config;
pub mod error;

pub mod core;
pub mod engine;
pub mod model;
pub mod output;
pub mod tokenizer;

pub use config::GenerationConfig;
pub use crate::core::{load_instances, FinishReason, GeneratedInstance, GenerationStateCache, Instance, QuestionClass, SpecialTokens};
pub use engine::{LogitsFilter, QuestionGenerator, QuestionRunner, RunState, Sampler};
pub use error::{Error, Result};
pub use model::{download_model, load_safetensors, locate_model, Gpt2Config, Gpt2LMHeadModel, LanguageModel, ModelFiles};
pub use output::{OutputDocument, ResultAssembler};
pub use tokenizer::{load_tokenizer, TokenCodec};
