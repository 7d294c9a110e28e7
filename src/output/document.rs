//! Output document in SQuAD 2.0 style.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::instance::QuestionClass;
use crate::error::Result;

/// Version tag written into every document.
pub const DOCUMENT_VERSION: &str = "squash-2.0";

/// Top-level document: one article holding every paragraph entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub version: String,
    pub data: Vec<Article>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            data: Vec::new(),
        }
    }
}

impl OutputDocument {
    /// Wrap paragraph entries in a single article.
    pub fn from_paragraphs(paragraphs: Vec<ParagraphEntry>) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            data: vec![Article { paragraphs }],
        }
    }

    /// All paragraph entries across articles.
    pub fn paragraphs(&self) -> impl Iterator<Item = &ParagraphEntry> {
        self.data.iter().flat_map(|a| a.paragraphs.iter())
    }

    /// Total number of QA records.
    pub fn num_questions(&self) -> usize {
        self.paragraphs().map(|p| p.qas.len()).sum()
    }

    /// Serialize as JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the document as JSON, creating parent directories as needed.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json_string()?)?;

        info!(
            path = %path.display(),
            paragraphs = self.paragraphs().count(),
            questions = self.num_questions(),
            "wrote output document"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub paragraphs: Vec<ParagraphEntry>,
}

/// A paragraph and the questions generated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphEntry {
    /// Decoded paragraph text, special tokens included.
    pub context: String,
    pub qas: Vec<QaRecord>,
}

/// One generated question with its answer span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    /// `question_<n>`, unique over the run.
    pub id: String,
    pub question: String,
    pub answers: Vec<AnswerSpan>,
    pub class: QuestionClass,
    pub algorithm: String,
    pub is_impossible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSpan {
    pub text: String,
    /// Character offset of `text` in the paragraph context.
    pub answer_start: usize,
}
