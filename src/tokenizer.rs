//! Text ↔ token id conversion.

use tokenizers::Tokenizer;

use crate::error::{Error, Result};

/// Tokenizer capability used by the dataset loader and the result assembler.
pub trait TokenCodec {
    /// Encode text without adding special tokens.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Decode token ids to text.
    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String>;

    /// Id of a vocabulary entry, if present.
    fn token_to_id(&self, token: &str) -> Option<u32>;
}

// Calls go through the inner `TokenizerImpl` so they resolve to the
// tokenizers crate's methods rather than back into this trait.
impl TokenCodec for Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = (**self)
            .encode(text, false)
            .map_err(|e| Error::Tokenization(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        (**self)
            .decode(ids, skip_special_tokens)
            .map_err(|e| Error::Tokenization(e.to_string()))
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        (**self).token_to_id(token)
    }
}

impl<T: TokenCodec + ?Sized> TokenCodec for &T {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        (**self).encode(text)
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        (**self).decode(ids, skip_special_tokens)
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        (**self).token_to_id(token)
    }
}

/// Load a `tokenizer.json` file.
pub fn load_tokenizer(path: impl AsRef<std::path::Path>) -> Result<Tokenizer> {
    Tokenizer::from_file(path.as_ref()).map_err(|e| {
        Error::Tokenization(format!(
            "failed to load tokenizer from {}: {e}",
            path.as_ref().display()
        ))
    })
}
