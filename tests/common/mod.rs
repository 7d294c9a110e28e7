//! Shared test doubles: a scripted language model and a word-list tokenizer.

#![allow(dead_code)]

use candle_core::{Device, Tensor};
use squash_qgen::core::segments::SPECIAL_TOKENS;
use squash_qgen::{Error, Instance, LanguageModel, QuestionClass, Result, SpecialTokens, TokenCodec};

/// One recorded model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub input_ids: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    /// Length of the past received, `None` for an empty past.
    pub past: Option<usize>,
}

/// Model whose n-th call returns logits favouring `script[n]`.
///
/// Once the script is exhausted every call favours `fallback`. The state is
/// the number of tokens seen so far.
pub struct ScriptedModel {
    vocab_size: usize,
    script: Vec<u32>,
    fallback: u32,
    fail_at: Option<usize>,
    pub calls: Vec<ModelCall>,
}

impl ScriptedModel {
    pub fn new(vocab_size: usize, script: Vec<u32>, fallback: u32) -> Self {
        Self {
            vocab_size,
            script,
            fallback,
            fail_at: None,
            calls: Vec::new(),
        }
    }

    /// Make the call with this index fail after it is recorded.
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn num_calls(&self) -> usize {
        self.calls.len()
    }
}

impl LanguageModel for ScriptedModel {
    type State = usize;

    fn step(
        &mut self,
        input_ids: &[u32],
        token_type_ids: &[u32],
        past: Option<usize>,
    ) -> Result<(Tensor, usize)> {
        assert_eq!(input_ids.len(), token_type_ids.len());
        let favoured = self
            .script
            .get(self.calls.len())
            .copied()
            .unwrap_or(self.fallback);
        self.calls.push(ModelCall {
            input_ids: input_ids.to_vec(),
            token_type_ids: token_type_ids.to_vec(),
            past,
        });
        if self.fail_at == Some(self.calls.len() - 1) {
            return Err(Error::Model("scripted failure".to_string()));
        }

        let mut logits = vec![0.0f32; self.vocab_size];
        logits[favoured as usize] = 10.0;
        let tensor = Tensor::new(logits.as_slice(), &Device::Cpu)?;
        Ok((tensor, past.unwrap_or(0) + input_ids.len()))
    }
}

/// Model that always returns the same logits.
pub struct FixedModel {
    pub logits: Vec<f32>,
}

impl LanguageModel for FixedModel {
    type State = usize;

    fn step(&mut self, input_ids: &[u32], _: &[u32], past: Option<usize>) -> Result<(Tensor, usize)> {
        let tensor = Tensor::new(self.logits.as_slice(), &Device::Cpu)?;
        Ok((tensor, past.unwrap_or(0) + input_ids.len()))
    }
}

/// Whitespace tokenizer over a fixed word list.
///
/// The special tokens follow the words, in `SPECIAL_TOKENS` order.
pub struct WordCodec {
    vocab: Vec<String>,
}

pub const WORDS: [&str; 11] = [
    "the", "cat", "sat", "on", "mat", "who", "what", "dog", "ran", "?", "café",
];

impl WordCodec {
    pub fn new() -> Self {
        let vocab = WORDS
            .iter()
            .chain(SPECIAL_TOKENS.iter())
            .map(|s| s.to_string())
            .collect();
        Self { vocab }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn id(&self, word: &str) -> u32 {
        self.token_to_id(word).unwrap()
    }

    pub fn ids(&self, text: &str) -> Vec<u32> {
        self.encode(text).unwrap()
    }

    pub fn special(&self) -> SpecialTokens {
        SpecialTokens::resolve(self).unwrap()
    }
}

impl TokenCodec for WordCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        text.split_whitespace()
            .map(|w| {
                self.token_to_id(w)
                    .ok_or_else(|| Error::Tokenization(format!("unknown word {w}")))
            })
            .collect()
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        let mut words = Vec::new();
        for &id in ids {
            let word = self
                .vocab
                .get(id as usize)
                .ok_or_else(|| Error::Tokenization(format!("unknown id {id}")))?;
            if skip_special_tokens && SPECIAL_TOKENS.contains(&word.as_str()) {
                continue;
            }
            words.push(word.as_str());
        }
        Ok(words.join(" "))
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.vocab.iter().position(|w| w == token).map(|i| i as u32)
    }
}

pub fn instance(codec: &WordCodec, para_index: usize, paragraph: &str, answer: &str) -> Instance {
    Instance::new(
        para_index,
        codec.ids(paragraph),
        codec.ids(answer),
        QuestionClass::General,
        "rule",
    )
}
