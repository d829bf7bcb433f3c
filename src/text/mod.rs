//! Text processing: the tokenize/encode/decode boundary.
//!
//! The harness never interprets transcript text itself; everything goes
//! through [`TextProcessor`]. The bundled [`WordVocab`] is a word-level
//! vocabulary sufficient for phone-transcript corpora where symbols are
//! whitespace-separated.

mod vocab;

pub use vocab::{WordVocab, PAD_ID, UNK_ID};

/// Tokenizer/vocabulary capability set used by the training strategies.
pub trait TextProcessor {
    /// Split raw text into tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Map tokens to integer ids.
    fn text_to_ids(&self, tokens: &[String]) -> Vec<i64>;

    /// Map integer ids back to text, dropping padding.
    fn ids_to_text(&self, ids: &[i64]) -> String;
}
