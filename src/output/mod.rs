//! Output document and its assembly.

pub mod assembler;
pub mod document;

pub use assembler::ResultAssembler;
pub use document::{AnswerSpan, Article, OutputDocument, ParagraphEntry, QaRecord, DOCUMENT_VERSION};
