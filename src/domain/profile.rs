// ============================================================
// Layer 3 — Resolved Tokenizer Profile
// ============================================================
// The special-token ids and strings resolved once from the
// tokenizer and the experiment config. Built by
// infra::tokenizer_store and passed down by value; nothing
// writes to it after construction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerProfile {
    pub eos_token:     String,
    pub eos_token_id:  u32,
    pub pad_token_id:  u32,
    /// Used to join multi-column prompts when no explicit separator is given.
    pub sep_token:     String,
    /// unk → mask → pad → last vocabulary id.
    pub mask_token_id: u32,
    /// Every special token string the profile knows about.
    pub special_tokens: Vec<String>,
    /// Tokenised `prediction.stop_tokens`, same order.
    pub stop_words_ids: Vec<Vec<u32>>,
    pub vocab_size:    usize,
}

impl TokenizerProfile {
    pub fn is_special_token(&self, token: &str) -> bool {
        self.special_tokens.iter().any(|t| t == token)
    }
}
