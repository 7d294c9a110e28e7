//! Core data types for question generation.
//!
//! This module contains:
//! - Instance stages and question classes
//! - SpecialTokens and the decoder input layout
//! - GenerationStateCache for the per-paragraph model state
//! - Instance file loading

pub mod cache;
pub mod dataset;
pub mod instance;
pub mod segments;

pub use cache::GenerationStateCache;
pub use dataset::{load_instances, RawInstance};
pub use instance::{FinishReason, GeneratedInstance, Instance, ParaIndex, QuestionClass};
pub use segments::{SegmentInput, SpecialTokens, SPECIAL_TOKENS};
