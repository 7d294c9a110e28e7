//! Generation engine.
//!
//! This module contains:
//! - LogitsFilter for top-k / top-p / threshold filtering
//! - Sampler for token selection
//! - QuestionGenerator for one question per instance
//! - QuestionRunner for the instance stream

pub mod filter;
pub mod generator;
pub mod runner;
pub mod sampler;

pub use filter::{LogitsFilter, FILTER_VALUE};
pub use generator::QuestionGenerator;
pub use runner::{QuestionRunner, RunState};
pub use sampler::Sampler;
