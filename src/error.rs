//! Error types for squash-qgen.

use thiserror::Error;

/// Result type alias for squash-qgen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for squash-qgen.
#[derive(Error, Debug)]
pub enum Error {
    /// Two instances of one paragraph group decoded to different paragraph text.
    #[error("paragraph {para_index} decoded inconsistently: stored {expected:?}, got {found:?}")]
    ParagraphMismatch {
        para_index: usize,
        expected: String,
        found: String,
    },

    /// The decoded answer does not occur verbatim in the decoded paragraph.
    #[error("answer {answer:?} not found in paragraph {para_index}")]
    AnswerNotFound { para_index: usize, answer: String },

    /// Every token with probability mass is special while `min_length` is not reached.
    #[error("only special tokens carry probability mass after {produced} generated tokens")]
    SpecialTokensOnly { produced: usize },

    /// Logits were not a non-empty 1-D score vector.
    #[error("invalid logits: {0}")]
    InvalidLogits(String),

    /// Model loading failed.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Model forward pass rejected its input.
    #[error("model error: {0}")]
    Model(String),

    /// Tokenization error.
    #[error("tokenization error: {0}")]
    Tokenization(String),

    /// Token selection failed.
    #[error("sampling error: {0}")]
    Sampling(String),

    /// Tensor operation error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
