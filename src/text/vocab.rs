//! Word-level vocabulary implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::TextProcessor;

/// Padding id. Targets are padded to the batch maximum with this value.
pub const PAD_ID: i64 = 0;
/// Out-of-vocabulary id.
pub const UNK_ID: i64 = 1;

const PAD_TOKEN: &str = "<pad>";
const UNK_TOKEN: &str = "<unk>";

/// Word-level vocabulary over whitespace-separated tokens.
///
/// Ids 0 and 1 are reserved for padding and unknown tokens; corpus words are
/// assigned ids in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordVocab {
    token_to_id: HashMap<String, i64>,
    id_to_token: Vec<String>,
}

impl WordVocab {
    /// Build a vocabulary from a transcript corpus.
    pub fn from_corpus<'a>(corpus: impl IntoIterator<Item = &'a str>) -> Self {
        let mut token_to_id = HashMap::new();
        let mut id_to_token = vec![PAD_TOKEN.to_string(), UNK_TOKEN.to_string()];

        for text in corpus {
            for token in text.split_whitespace() {
                if !token_to_id.contains_key(token) {
                    token_to_id.insert(token.to_string(), id_to_token.len() as i64);
                    id_to_token.push(token.to_string());
                }
            }
        }

        Self { token_to_id, id_to_token }
    }

    /// Vocabulary size including the two reserved ids.
    pub fn vocab_size(&self) -> usize {
        self.id_to_token.len()
    }

    /// Id for a token, if present.
    pub fn token_id(&self, token: &str) -> Option<i64> {
        self.token_to_id.get(token).copied()
    }
}

impl TextProcessor for WordVocab {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn text_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        tokens
            .iter()
            .map(|t| self.token_to_id.get(t.as_str()).copied().unwrap_or(UNK_ID))
            .collect()
    }

    fn ids_to_text(&self, ids: &[i64]) -> String {
        let mut words = Vec::with_capacity(ids.len());
        for &id in ids {
            if id == PAD_ID {
                continue;
            }
            match self.id_to_token.get(id as usize) {
                Some(token) => words.push(token.as_str()),
                None => words.push(UNK_TOKEN),
            }
        }
        words.join(" ")
    }
}
