//! Instance file loading.
//!
//! The input file is a JSON array of raw text instances:
//!
//! ```json
//! [
//!   {"para_index": 0, "paragraph": "...", "answer": "...", "class": "general", "algorithm": "rule"}
//! ]
//! ```
//!
//! Instances keep file order; instances of one paragraph must be adjacent.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::core::instance::{Instance, ParaIndex, QuestionClass};
use crate::error::Result;
use crate::tokenizer::TokenCodec;

/// An instance as stored on disk, before tokenization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawInstance {
    pub para_index: ParaIndex,
    pub paragraph: String,
    pub answer: String,
    pub class: QuestionClass,
    pub algorithm: String,
}

impl RawInstance {
    /// Tokenize paragraph and answer.
    pub fn tokenize<T: TokenCodec + ?Sized>(&self, tokenizer: &T) -> Result<Instance> {
        Ok(Instance::new(
            self.para_index,
            tokenizer.encode(&self.paragraph)?,
            tokenizer.encode(&self.answer)?,
            self.class,
            self.algorithm.clone(),
        ))
    }
}

/// Parse raw instances from JSON text.
pub fn parse_raw_instances(json: &str) -> Result<Vec<RawInstance>> {
    Ok(serde_json::from_str(json)?)
}

/// Tokenize raw instances in order.
pub fn tokenize_instances<T: TokenCodec + ?Sized>(
    raw: &[RawInstance],
    tokenizer: &T,
) -> Result<Vec<Instance>> {
    raw.iter().map(|r| r.tokenize(tokenizer)).collect()
}

/// Read and tokenize an instance file.
pub fn load_instances<T: TokenCodec + ?Sized>(
    path: impl AsRef<Path>,
    tokenizer: &T,
) -> Result<Vec<Instance>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let raw = parse_raw_instances(&content)?;
    let instances = tokenize_instances(&raw, tokenizer)?;

    info!(
        path = %path.as_ref().display(),
        instances = instances.len(),
        "loaded instances"
    );
    Ok(instances)
}
