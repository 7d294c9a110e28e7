//! Decoder input layout.
//!
//! A full training sequence for one instance looks like:
//!
//! ```text
//! input_ids       <bos> P...  <answer-c> A...  <question-c> Q...  [<eos>]
//! token_type_ids  <paragraph>  <answer-c>       <question-c>
//! ```
//!
//! where `c` is the instance's question class. Generation splits it in two:
//! the paragraph segment primes the cached state once per paragraph, and the
//! answer segment plus the question marker prompts each question.

use crate::core::instance::{Instance, QuestionClass};
use crate::error::{Error, Result};
use crate::tokenizer::TokenCodec;

/// Special token names, in `SpecialTokens` field order.
pub const SPECIAL_TOKENS: [&str; 8] = [
    "<bos>",
    "<eos>",
    "<paragraph>",
    "<answer-general>",
    "<answer-specific>",
    "<question-general>",
    "<question-specific>",
    "<pad>",
];

/// Ids of the structural tokens. Every one of them ends a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub bos: u32,
    pub eos: u32,
    pub paragraph: u32,
    pub answer_general: u32,
    pub answer_specific: u32,
    pub question_general: u32,
    pub question_specific: u32,
    pub pad: u32,
}

impl SpecialTokens {
    /// Build from ids listed in [`SPECIAL_TOKENS`] order.
    pub fn from_ids(ids: [u32; 8]) -> Self {
        let [bos, eos, paragraph, answer_general, answer_specific, question_general, question_specific, pad] =
            ids;
        Self {
            bos,
            eos,
            paragraph,
            answer_general,
            answer_specific,
            question_general,
            question_specific,
            pad,
        }
    }

    /// Look every special token up in the tokenizer vocabulary.
    pub fn resolve<T: TokenCodec + ?Sized>(tokenizer: &T) -> Result<Self> {
        let mut ids = [0u32; 8];
        for (slot, name) in ids.iter_mut().zip(SPECIAL_TOKENS) {
            *slot = tokenizer.token_to_id(name).ok_or_else(|| {
                Error::Tokenization(format!("special token {name} missing from vocabulary"))
            })?;
        }
        Ok(Self::from_ids(ids))
    }

    /// All ids in [`SPECIAL_TOKENS`] order.
    pub fn ids(&self) -> [u32; 8] {
        [
            self.bos,
            self.eos,
            self.paragraph,
            self.answer_general,
            self.answer_specific,
            self.question_general,
            self.question_specific,
            self.pad,
        ]
    }

    /// Whether `token` is a special token.
    pub fn contains(&self, token: u32) -> bool {
        self.ids().contains(&token)
    }

    /// Answer segment marker for a class.
    pub fn answer_marker(&self, class: QuestionClass) -> u32 {
        match class {
            QuestionClass::General => self.answer_general,
            QuestionClass::Specific => self.answer_specific,
        }
    }

    /// Question segment marker for a class.
    pub fn question_marker(&self, class: QuestionClass) -> u32 {
        match class {
            QuestionClass::General => self.question_general,
            QuestionClass::Specific => self.question_specific,
        }
    }
}

/// Parallel token and segment-type ids fed to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentInput {
    pub input_ids: Vec<u32>,
    pub token_type_ids: Vec<u32>,
}

impl SegmentInput {
    fn push_segment(&mut self, marker: u32, token_type: u32, content: &[u32]) {
        self.input_ids.push(marker);
        self.input_ids.extend_from_slice(content);
        self.token_type_ids
            .extend(std::iter::repeat(token_type).take(content.len() + 1));
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Segment type of the last token.
    pub fn last_token_type(&self) -> Option<u32> {
        self.token_type_ids.last().copied()
    }
}

/// Full sequence for an instance with the given question tokens.
pub fn build_input_from_segments(
    instance: &Instance,
    question: &[u32],
    special: &SpecialTokens,
    with_eos: bool,
) -> SegmentInput {
    let answer_marker = special.answer_marker(instance.class);
    let question_marker = special.question_marker(instance.class);

    let mut input = SegmentInput::default();
    input.push_segment(special.bos, special.paragraph, &instance.paragraph);
    input.push_segment(answer_marker, answer_marker, &instance.answer);
    input.push_segment(question_marker, question_marker, question);
    if with_eos {
        input.input_ids.push(special.eos);
        input.token_type_ids.push(question_marker);
    }
    input
}

/// Paragraph segment used to prime the cached state: `<bos> P...`.
///
/// The answer segment is left out so the primed state is the same for every
/// instance of the paragraph; [`question_prompt`] carries the answer.
pub fn context_prefix(instance: &Instance, special: &SpecialTokens) -> SegmentInput {
    let mut input = SegmentInput::default();
    input.push_segment(special.bos, special.paragraph, &instance.paragraph);
    input
}

/// Prompt continuing a primed paragraph: `<answer-c> A... <question-c>`.
pub fn question_prompt(instance: &Instance, special: &SpecialTokens) -> SegmentInput {
    let full = build_input_from_segments(instance, &[], special, false);
    let skip = instance.paragraph.len() + 1;
    SegmentInput {
        input_ids: full.input_ids[skip..].to_vec(),
        token_type_ids: full.token_type_ids[skip..].to_vec(),
    }
}
