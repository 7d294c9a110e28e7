//! Question-generation instances.
//!
//! An instance moves through explicit stages, each a separate value:
//!
//! ```text
//! Instance ──generate──▶ GeneratedInstance ──assemble──▶ QaRecord
//! ```

use serde::{Deserialize, Serialize};

/// Index grouping all instances that share one source paragraph.
pub type ParaIndex = usize;

/// Target question class; selects the answer/question segment markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionClass {
    /// Broad question about the paragraph.
    General,
    /// Question about a specific detail.
    Specific,
}

impl QuestionClass {
    /// Get the class label as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Specific => "specific",
        }
    }
}

/// One (paragraph, answer, class, algorithm) request awaiting a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Source paragraph group.
    pub para_index: ParaIndex,
    /// Paragraph token ids.
    pub paragraph: Vec<u32>,
    /// Answer token ids.
    pub answer: Vec<u32>,
    /// Target question class.
    pub class: QuestionClass,
    /// Label of the answer-selection algorithm that produced this instance.
    pub algorithm: String,
}

impl Instance {
    /// Create a new instance.
    pub fn new(
        para_index: ParaIndex,
        paragraph: Vec<u32>,
        answer: Vec<u32>,
        class: QuestionClass,
        algorithm: impl Into<String>,
    ) -> Self {
        Self {
            para_index,
            paragraph,
            answer,
            class,
            algorithm: algorithm.into(),
        }
    }
}

/// Reason a question stopped growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// A special token was selected.
    EndOfSequence,
    /// `max_length` tokens were produced.
    MaxLength,
}

/// An instance together with its generated question.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInstance {
    /// The source instance.
    pub instance: Instance,
    /// Generated question token ids (never contains special tokens).
    pub question: Vec<u32>,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

impl GeneratedInstance {
    /// Paragraph group of the source instance.
    pub fn para_index(&self) -> ParaIndex {
        self.instance.para_index
    }

    /// Number of generated question tokens.
    pub fn question_len(&self) -> usize {
        self.question.len()
    }
}
