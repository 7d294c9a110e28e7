//! Groups generated questions by paragraph into the output document.
//!
//! Paragraph entries are keyed by an explicit `para_index → position` map and
//! appended in first-seen order. Every later occurrence of a paragraph must
//! decode to exactly the text stored on its first occurrence.

use std::collections::HashMap;

use tracing::debug;

use super::document::{AnswerSpan, OutputDocument, ParagraphEntry, QaRecord};
use crate::core::instance::{GeneratedInstance, ParaIndex};
use crate::error::{Error, Result};
use crate::tokenizer::TokenCodec;

/// Accumulates QA records in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    paragraphs: Vec<ParagraphEntry>,
    positions: HashMap<ParaIndex, usize>,
    next_id: usize,
}

impl ResultAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a generated instance and append its QA record.
    ///
    /// # Errors
    ///
    /// * `ParagraphMismatch` if the paragraph decodes differently from the
    ///   text already stored for its `para_index`
    /// * `AnswerNotFound` if the answer text does not occur in the paragraph
    pub fn push<T: TokenCodec + ?Sized>(
        &mut self,
        tokenizer: &T,
        generated: &GeneratedInstance,
    ) -> Result<&QaRecord> {
        let instance = &generated.instance;
        let context = tokenizer.decode(&instance.paragraph, false)?;
        let question = tokenizer.decode(&generated.question, true)?;
        let answer = tokenizer.decode(&instance.answer, true)?;

        let existing = self.positions.get(&instance.para_index).copied();
        if let Some(position) = existing {
            let stored = &self.paragraphs[position].context;
            if *stored != context {
                return Err(Error::ParagraphMismatch {
                    para_index: instance.para_index,
                    expected: stored.clone(),
                    found: context,
                });
            }
        }

        // Nothing is recorded unless the whole record can be built.
        let answer_start = char_offset(&context, &answer).ok_or_else(|| Error::AnswerNotFound {
            para_index: instance.para_index,
            answer: answer.clone(),
        })?;

        let position = match existing {
            Some(position) => position,
            None => {
                let position = self.paragraphs.len();
                self.paragraphs.push(ParagraphEntry {
                    context,
                    qas: Vec::new(),
                });
                self.positions.insert(instance.para_index, position);
                position
            }
        };
        let entry = &mut self.paragraphs[position];

        let id = format!("question_{}", self.next_id);
        self.next_id += 1;
        debug!(id = %id, para_index = instance.para_index, question = %question, "assembled record");

        entry.qas.push(QaRecord {
            id,
            question,
            answers: vec![AnswerSpan {
                text: answer,
                answer_start,
            }],
            class: instance.class,
            algorithm: instance.algorithm.clone(),
            is_impossible: false,
        });
        Ok(&entry.qas[entry.qas.len() - 1])
    }

    /// Number of paragraph entries so far.
    pub fn num_paragraphs(&self) -> usize {
        self.paragraphs.len()
    }

    /// Number of QA records so far.
    pub fn num_questions(&self) -> usize {
        self.next_id
    }

    pub fn finish(self) -> OutputDocument {
        OutputDocument::from_paragraphs(self.paragraphs)
    }
}

/// Character (not byte) offset of the first occurrence of `needle`.
fn char_offset(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}
